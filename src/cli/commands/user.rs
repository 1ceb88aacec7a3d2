use clap::Subcommand;
use serde_json::json;

use crate::auth::{password, Role};
use crate::cli::utils::{load_config, output_success};
use crate::cli::OutputFormat;
use crate::database::{self, models::User, MongoStore, UserStore};
use crate::handlers::public::auth::utils::{validate_email_format, validate_password};

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create an account (the only way to create admins)")]
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "user", help = "Role: user or admin")]
        role: Role,
    },

    #[command(about = "List accounts")]
    List,
}

pub async fn handle(cmd: UserCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = load_config()?;
    let connection = database::connect(&config.database).await?;
    let store = MongoStore::new(connection.database);

    match cmd {
        UserCommands::Create {
            name,
            email,
            password,
            role,
        } => {
            validate_email_format(&email).map_err(anyhow::Error::msg)?;
            validate_password(&password).map_err(anyhow::Error::msg)?;

            let hash = password::hash_password(&password, config.security.bcrypt_cost).await?;
            let user = store.insert(User::new(name.trim(), &email, hash, role)).await?;
            output_success(
                output_format,
                &format!("Created {} account", user.role),
                Some(json!({ "id": user.id, "email": user.email })),
            )
        }
        UserCommands::List => {
            let users: Vec<_> = UserStore::list(&store).await?.iter().map(User::profile).collect();
            output_success(
                output_format,
                &format!("{} account(s)", users.len()),
                Some(json!({ "users": users })),
            )
        }
    }
}
