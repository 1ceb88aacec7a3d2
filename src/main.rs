use clap::Parser;
use darshan_api::{config::ConfigError, routes, AppConfig, AppState};

#[derive(Parser)]
#[command(name = "darshan-api")]
#[command(about = "Divine Darshan API server")]
#[command(version)]
struct Args {
    #[arg(long, help = "Listen on this port instead of PORT")]
    port: Option<u16>,

    #[arg(long, help = "Use a process-local store instead of MongoDB (development only)")]
    in_memory: bool,
}

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up JWT_SECRET, MONGO_URI, etc.
    let _ = dotenvy::dotenv();
    darshan_api::init_tracing();

    let args = Args::parse();

    let mut config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => fatal(&e),
    };
    if let Some(port) = args.port {
        config.server.port = port;
    }
    tracing::info!("Starting Divine Darshan API in {:?} mode", config.environment);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    let state = if args.in_memory {
        tracing::warn!("Using in-memory store; data is lost on exit");
        AppState::in_memory(config)
    } else {
        match AppState::connect(config).await {
            Ok(state) => state,
            Err(e) => {
                tracing::error!("Startup failed: {}", e);
                std::process::exit(1);
            }
        }
    };

    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("failed to bind {}: {}", bind_addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server running on http://{}", bind_addr);

    if let Err(e) = axum::serve(listener, routes::build(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

fn fatal(err: &ConfigError) -> ! {
    for line in err.diagnostic() {
        tracing::error!("{}", line);
    }
    std::process::exit(1);
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections");
}
