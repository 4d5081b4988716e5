//! `vigil` binary: long-running host supervisor.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use vigil_module::ErrorCode;
use vigil_server::{App, ServerError};

/// Long-running host supervising pluggable monitoring modules.
#[derive(Debug, Parser)]
#[command(name = "vigil", version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, code = err.code(), "fatal");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), ServerError> {
    let app = App::build(cli.config)?;
    app.supervisor.start_all();

    let addr = format!("{}:{}", app.http.bind, app.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!(%addr, "command endpoint listening");

    let router = vigil_server::http::router(Arc::clone(&app.dispatcher));
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)?;

    // Supervisor teardown joins lane threads; keep it off the async
    // workers.
    let supervisor = Arc::clone(&app.supervisor);
    if tokio::task::spawn_blocking(move || supervisor.shutdown())
        .await
        .is_err()
    {
        error!("shutdown task panicked");
    }
    info!("host stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown signal received");
}
