pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::Router;

pub use config::AppConfig;
pub use state::{AppState, StartupError};

/// Build the application from the process environment without binding a socket.
///
/// This is the entry point for hosts that provide their own listener. A missing
/// `JWT_SECRET` is returned as an error, so no handler is ever built.
pub async fn app_from_env() -> Result<Router, StartupError> {
    let _ = dotenvy::dotenv();
    let config = AppConfig::from_env()?;
    let state = AppState::connect(config).await?;
    Ok(routes::build(state))
}

/// Install the `tracing` subscriber for the server (stdout, `info` unless `RUST_LOG` says otherwise)
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Install the `tracing` subscriber for the operator CLI.
///
/// Logs go to stderr and default to `warn`, so stdout carries only command output
/// (and stays parseable with `--json`).
pub fn init_cli_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
