//! `/metrics` handler behavior against real registries and report files.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::Response;

use promscope_core::{Counter, Gatherer, Gatherers, Gauge, Opts, Registry, StaticCollector};
use promscope_exporter::app_state::AppState;
use promscope_exporter::collectors::ScrapeStats;
use promscope_exporter::config;
use promscope_exporter::ops;

fn temp_report(name: &str, body: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("promscope-{}-{name}.yaml", std::process::id()));
    fs::write(&path, body).unwrap();
    path
}

fn state_for(yaml: &str) -> AppState {
    AppState::new(config::load_from_str(yaml).unwrap()).unwrap()
}

async fn scrape(state: &AppState, accept: Option<&str>) -> (StatusCode, String, Option<String>) {
    let mut headers = HeaderMap::new();
    if let Some(a) = accept {
        headers.insert(header::ACCEPT, HeaderValue::from_str(a).unwrap());
    }
    let resp: Response = ops::metrics(State(state.clone()), Method::GET, headers).await;
    let status = resp.status();
    let ct = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap(), ct)
}

#[tokio::test]
async fn serves_merged_cluster_zones() {
    let db = temp_report(
        "zones-db",
        "hosts:\n  foo.example.org: { oom_crashes: 3, ram_usage_bytes: 42.5 }\n  bar.example.org: { oom_crashes: 0, ram_usage_bytes: 10 }\n",
    );
    let ca = temp_report(
        "zones-ca",
        "hosts:\n  foo.example.org: { oom_crashes: 1, ram_usage_bytes: 7 }\n",
    );
    let state = state_for(&format!(
        "version: 1\nclusters:\n  - zone: db\n    reports: {}\n  - zone: ca\n    reports: {}\n",
        db.display(),
        ca.display()
    ));

    let (status, body, ct) = scrape(&state, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ct.as_deref(), Some("text/plain; version=0.0.4; charset=utf-8"));
    assert!(body.contains("# TYPE clustermanager_oom_crashes_total counter"));
    assert!(body.contains("clustermanager_oom_crashes_total{host=\"foo.example.org\",zone=\"db\"} 3"));
    assert!(body.contains("clustermanager_oom_crashes_total{host=\"foo.example.org\",zone=\"ca\"} 1"));
    assert!(body.contains("clustermanager_ram_usage_bytes{host=\"foo.example.org\",zone=\"db\"} 42.5"));
    assert!(body.contains("promscope_build_info{version=\""));
    assert_eq!(body.matches("# TYPE clustermanager_ram_usage_bytes gauge").count(), 1);

    fs::remove_file(db).ok();
    fs::remove_file(ca).ok();
}

#[tokio::test]
async fn every_scrape_reassesses() {
    let path = temp_report("fresh", "hosts:\n  host-a: { oom_crashes: 5, ram_usage_bytes: 1 }\n");
    let state = state_for(&format!(
        "version: 1\nclusters:\n  - zone: db\n    reports: {}\n",
        path.display()
    ));

    let (_, first, _) = scrape(&state, None).await;
    assert!(first.contains("clustermanager_oom_crashes_total{host=\"host-a\",zone=\"db\"} 5"));

    fs::write(&path, "hosts:\n  host-a: { oom_crashes: 9, ram_usage_bytes: 1 }\n").unwrap();
    let (_, second, _) = scrape(&state, None).await;
    assert!(second.contains("clustermanager_oom_crashes_total{host=\"host-a\",zone=\"db\"} 9"));

    fs::remove_file(path).ok();
}

#[tokio::test]
async fn missing_report_continue_on_error() {
    let missing = std::env::temp_dir().join("promscope-does-not-exist.yaml");
    let state = state_for(&format!(
        "version: 1\nclusters:\n  - zone: db\n    reports: {}\n",
        missing.display()
    ));

    let (status, body, _) = scrape(&state, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("promscope_start_time_seconds"));
    assert!(!body.contains("clustermanager_"));
}

#[tokio::test]
async fn missing_report_http_error_mode() {
    let missing = std::env::temp_dir().join("promscope-does-not-exist-either.yaml");
    let state = state_for(&format!(
        "version: 1\nexporter:\n  error_handling: http_error\nclusters:\n  - zone: db\n    reports: {}\n",
        missing.display()
    ));

    let (status, body, _) = scrape(&state, None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("An error has occurred while serving metrics"));
    assert!(body.contains("clustermanager/db"));
}

#[tokio::test]
async fn schema_conflict_is_a_server_error() {
    let counter = Counter::new(Opts::new("x_total", "x")).unwrap();
    let gauge = Gauge::new(Opts::new("x_total", "x")).unwrap();
    let a = Registry::new();
    a.register(Arc::new(StaticCollector::new("a").with(counter))).unwrap();
    let b = Registry::new();
    b.register(Arc::new(StaticCollector::new("b").with(gauge))).unwrap();

    let cfg = config::load_from_str("version: 1\n").unwrap();
    let state = AppState::from_parts(
        cfg,
        Gatherers::new().with(Arc::new(a)).with(Arc::new(b)),
        Arc::new(ScrapeStats::new().unwrap()),
    );

    let (status, body, _) = scrape(&state, None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("x_total"));
    assert!(!body.contains("# TYPE"));
}

#[tokio::test]
async fn empty_snapshot_is_a_server_error() {
    let cfg = config::load_from_str("version: 1\n").unwrap();
    let stats = Arc::new(ScrapeStats::new().unwrap());
    let state = AppState::from_parts(
        cfg,
        Gatherers::new().with(Arc::new(Registry::new())),
        Arc::clone(&stats),
    );

    let (status, body, _) = scrape(&state, None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("No metrics encoded"));

    // Counted on arrival, then once more under the failure code.
    let reg = Registry::new();
    reg.register(stats).unwrap();
    let out = reg.gather().unwrap();
    let requests = out.family("promscope_http_requests_total").unwrap();
    assert_eq!(requests.value_of(&["200", "get"]), Some(1.0));
    assert_eq!(requests.value_of(&["500", "get"]), Some(1.0));
    assert_eq!(stats_size(&out), Some(0.0));
}

fn stats_size(out: &promscope_core::Gathered) -> Option<f64> {
    out.family("promscope_http_response_size_bytes_total")
        .and_then(|f| f.value_of(&[]))
}

#[tokio::test]
async fn json_when_requested() {
    let state = state_for("version: 1\n");
    let (status, body, ct) = scrape(&state, Some("application/json")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ct.as_deref(), Some("application/json"));

    let v: serde_json::Value = serde_json::from_str(&body).unwrap();
    let names: Vec<&str> = v
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"promscope_build_info"));
}

#[tokio::test]
async fn scrapes_are_self_counted() {
    let state = state_for("version: 1\n");
    let (_, first, _) = scrape(&state, None).await;
    assert!(first.contains("promscope_http_requests_total{code=\"200\",method=\"get\"} 1"));

    let (_, second, _) = scrape(&state, None).await;
    assert!(second.contains("promscope_http_requests_total{code=\"200\",method=\"get\"} 2"));
    assert!(state.scrape_stats().response_size() >= (first.len() + second.len()) as u64);
    let size_line = format!("promscope_http_response_size_bytes_total {}", first.len());
    assert!(second.contains(&size_line), "{second}");
}

#[tokio::test]
async fn pedantic_config_builds() {
    let state = state_for("version: 1\nexporter:\n  pedantic: true\n");
    let (status, _, _) = scrape(&state, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn healthz_ok() {
    use axum::response::IntoResponse;
    let resp = ops::healthz().await.into_response();
    assert_eq!(resp.status(), StatusCode::OK);
}
