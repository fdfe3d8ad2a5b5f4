//! Operational HTTP endpoints.
//!
//! - `/healthz` : liveness
//! - `/metrics` : snapshot in the negotiated exposition format
//!
//! The body is fully encoded before the response is built, so a failure is
//! always a clean 500 and never a truncated snapshot.

use axum::{
    extract::State,
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use tracing::{error, warn};

use promscope_core::expose::{self, Format};
use promscope_core::Gatherer;

use crate::app_state::AppState;
use crate::config::ErrorHandling;

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn metrics(State(state): State<AppState>, method: Method, headers: HeaderMap) -> Response {
    let format = Format::negotiate(headers.get(header::ACCEPT).and_then(|v| v.to_str().ok()));

    // Counted on arrival so the body includes its own request. A failed
    // scrape is additionally counted under its 500.
    state.scrape_stats().record(StatusCode::OK.as_u16(), method.as_str());

    // Assessments may block on I/O; keep them off the async workers.
    let worker = state.clone();
    let rendered = tokio::task::spawn_blocking(move || render(&worker, format))
        .await
        .unwrap_or_else(|e| Err(format!("metrics collection aborted: {e}")));

    match rendered {
        Ok(body) => {
            state.scrape_stats().add_response_size(body.len());
            ([(header::CONTENT_TYPE, format.content_type())], body).into_response()
        }
        Err(msg) => {
            error!(%msg, "scrape failed");
            state
                .scrape_stats()
                .record(StatusCode::INTERNAL_SERVER_ERROR.as_u16(), method.as_str());
            (StatusCode::INTERNAL_SERVER_ERROR, msg).into_response()
        }
    }
}

/// Gather and encode one snapshot. `Err` carries the human-readable 500 body.
pub fn render(state: &AppState, format: Format) -> Result<Bytes, String> {
    let gathered = state
        .gatherers()
        .gather()
        .map_err(|e| format!("An error has occurred while gathering metrics:\n\n{e}"))?;

    if !gathered.errors.is_empty() {
        for e in &gathered.errors {
            warn!(class = e.class().as_str(), error = %e, "error during metrics collection");
        }
        let joined = gathered
            .errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        if state.error_handling() == ErrorHandling::HttpError {
            return Err(format!(
                "An error has occurred while serving metrics:\n\n{joined}"
            ));
        }
        if gathered.families.is_empty() {
            return Err(format!("No metrics gathered, errors:\n\n{joined}"));
        }
    }

    let body = expose::encode(&gathered.families, format)
        .map_err(|e| format!("An error has occurred during metrics encoding:\n\n{e}"))?;
    if body.is_empty() {
        return Err("No metrics encoded".into());
    }
    Ok(body)
}
