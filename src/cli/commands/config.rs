use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{load_config, output_success};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ConfigCommands {
    #[command(about = "Check required variables and print the effective settings")]
    Check,
}

pub async fn handle(cmd: ConfigCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ConfigCommands::Check => {
            let config = load_config()?;
            let database = match &config.database.uri {
                Some(_) => "configured",
                None => "missing (degraded mode)",
            };

            output_success(
                output_format,
                "Configuration is valid",
                Some(json!({
                    "environment": format!("{:?}", config.environment),
                    "listen": format!("{}:{}", config.server.host, config.server.port),
                    "database": database,
                    "databaseName": config.database.name,
                    "startupPolicy": format!("{:?}", config.database.startup_policy),
                    "tokenLifetimeSecs": config.security.jwt_expiry.as_secs(),
                    "registration": config.security.allow_registration,
                })),
            )
        }
    }
}
