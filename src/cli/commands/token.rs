use clap::Subcommand;
use serde_json::json;

use crate::auth::{JwtKeys, Principal, Role};
use crate::cli::utils::{load_config, output_success};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Sign a token with JWT_SECRET for the given principal")]
    Mint {
        #[arg(long, help = "Principal id (user _id)")]
        id: String,
        #[arg(long, default_value = "user", help = "Role: user or admin")]
        role: Role,
    },

    #[command(about = "Verify a token against JWT_SECRET and show its principal")]
    Inspect {
        #[arg(help = "Token to verify")]
        token: String,
    },
}

pub async fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = load_config()?;
    let keys = JwtKeys::from_config(&config.security);

    match cmd {
        TokenCommands::Mint { id, role } => {
            let token = keys.issue(&Principal::new(id, role))?;
            output_success(
                output_format,
                "Token issued",
                Some(json!({ "token": token, "expiresInSecs": keys.lifetime_secs() })),
            )
        }
        TokenCommands::Inspect { token } => {
            let principal = keys
                .verify(token.trim())
                .map_err(|e| anyhow::anyhow!("Token rejected: {}", e))?;
            output_success(
                output_format,
                "Token is valid",
                Some(json!({ "id": principal.id, "role": principal.role })),
            )
        }
    }
}
