//! promscope exporter binary.
//!
//! Loads `promscope.yaml` (or `$PROMSCOPE_CONFIG`), builds the registries and
//! serves `/metrics` until SIGINT/SIGTERM.

use std::process::ExitCode;

use tracing_subscriber::{fmt, EnvFilter};

use promscope_exporter::{app_state, config, router};

#[tokio::main]
async fn main() -> ExitCode {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "promscope-exporter failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let path = config::config_path();
    let cfg = config::load_from_file(&path)?;
    let listen = cfg.exporter.listen_addr()?;

    let state = app_state::AppState::new(cfg)?;
    let metrics_path = state.cfg().exporter.metrics_path.clone();
    let app = router::build_router(state);

    tracing::info!(%listen, %metrics_path, config = %path, "promscope-exporter starting");
    let listener = tokio::net::TcpListener::bind(listen).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("promscope-exporter stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
