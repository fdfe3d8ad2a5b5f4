#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use promscope_exporter::config::{self, ErrorHandling};

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
exporter:
  listen: "0.0.0.0:9100"
clusters:
  - zone: "db"
    report: "reports/db.yaml" # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.class().as_str(), "CONFIG");
}

#[test]
fn ok_minimal_config() {
    let ok = r#"
version: 1
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.exporter.listen, "0.0.0.0:9100");
    assert_eq!(cfg.exporter.metrics_path, "/metrics");
    assert_eq!(cfg.exporter.error_handling, ErrorHandling::Continue);
    assert!(!cfg.exporter.pedantic);
    assert!(cfg.clusters.is_empty());
}

#[test]
fn ok_full_config() {
    let ok = r#"
version: 1
exporter:
  listen: "127.0.0.1:9200"
  metrics_path: "/metric"
  error_handling: http_error
  pedantic: true
clusters:
  - zone: db
    reports: reports/db.yaml
  - zone: ca
    reports: reports/ca.yaml
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.exporter.listen_addr().unwrap().port(), 9200);
    assert_eq!(cfg.exporter.error_handling, ErrorHandling::HttpError);
    assert_eq!(cfg.clusters.len(), 2);
    assert_eq!(cfg.clusters[1].zone, "ca");
}

#[test]
fn rejects_bad_values() {
    let cases = [
        ("version: 2\n", "unsupported config version"),
        ("version: 1\nexporter:\n  listen: \"nowhere\"\n", "not a socket address"),
        ("version: 1\nexporter:\n  metrics_path: \"metrics\"\n", "must start with '/'"),
        ("version: 1\nexporter:\n  metrics_path: \"/healthz\"\n", "collides with /healthz"),
        ("version: 1\nexporter:\n  error_handling: panic\n", "invalid yaml"),
        (
            "version: 1\nclusters:\n  - zone: db\n    reports: a.yaml\n  - zone: db\n    reports: b.yaml\n",
            "duplicate zone",
        ),
        ("version: 1\nclusters:\n  - zone: \"\"\n    reports: a.yaml\n", "zone must not be empty"),
    ];
    for (yaml, want) in cases {
        let err = config::load_from_str(yaml).expect_err(yaml);
        assert_eq!(err.class().as_str(), "CONFIG", "{yaml}");
        assert!(err.to_string().contains(want), "yaml={yaml} err={err}");
    }
}
