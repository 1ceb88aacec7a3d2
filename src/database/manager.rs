use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use std::time::Duration;
use tracing::{error, info};

use super::DatabaseError;
use crate::config::DatabaseConfig;

const APP_NAME: &str = "darshan-api";

/// An established connection: the database all stores share (it holds the client)
#[derive(Clone, Debug)]
pub struct Connection {
    pub database: Database,
    pub hosts: Vec<String>,
}

/// One best-effort connection attempt: parse, build the client, ping once.
/// The outcome is logged; whether a failure is fatal is the caller's decision.
pub async fn connect(config: &DatabaseConfig) -> Result<Connection, DatabaseError> {
    let uri = config
        .uri
        .as_deref()
        .ok_or(DatabaseError::ConfigMissing("MONGO_URI"))?;

    match try_connect(uri, config).await {
        Ok(connection) => {
            info!(
                "MongoDB Connected: {} (database '{}')",
                connection.hosts.join(","),
                connection.database.name()
            );
            Ok(connection)
        }
        Err(e) => {
            error!("Error connecting to MongoDB: {}", e);
            Err(e)
        }
    }
}

async fn try_connect(uri: &str, config: &DatabaseConfig) -> Result<Connection, DatabaseError> {
    let mut options = ClientOptions::parse(uri)
        .await
        .map_err(|e| DatabaseError::ConnectionFailure(e.to_string()))?;
    options.app_name = Some(APP_NAME.to_string());
    options.server_selection_timeout = Some(Duration::from_millis(config.connect_timeout_ms));
    options.connect_timeout = Some(Duration::from_millis(config.connect_timeout_ms));

    let hosts = options.hosts.iter().map(|h| h.to_string()).collect();
    let database_name = database_name(&options, config);

    let client = Client::with_options(options)
        .map_err(|e| DatabaseError::ConnectionFailure(e.to_string()))?;
    let database = client.database(&database_name);

    database
        .run_command(doc! { "ping": 1 }, None)
        .await
        .map_err(|e| DatabaseError::ConnectionFailure(e.to_string()))?;

    Ok(Connection { database, hosts })
}

/// Database named in the URI path wins over `MONGO_DB_NAME`
fn database_name(options: &ClientOptions, config: &DatabaseConfig) -> String {
    options
        .default_database
        .clone()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| config.name.clone())
}
