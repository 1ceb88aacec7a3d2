use std::sync::Arc;
use thiserror::Error;
use tracing::{error, warn};

use crate::auth::JwtKeys;
use crate::config::{AppConfig, ConfigError, StartupPolicy};
use crate::database::{self, DatabaseError, MemoryStore, MongoStore, ResourceStore, UnavailableStore, UserStore};

/// Whether the document store is reachable, as decided at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseStatus {
    Connected,
    Unavailable,
}

impl DatabaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseStatus::Connected => "connected",
            DatabaseStatus::Unavailable => "unavailable",
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Everything a request needs, constructed once at startup and shared by reference
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub keys: Arc<JwtKeys>,
    pub users: Arc<dyn UserStore>,
    pub resources: Arc<dyn ResourceStore>,
    pub database: DatabaseStatus,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        users: Arc<dyn UserStore>,
        resources: Arc<dyn ResourceStore>,
        database: DatabaseStatus,
    ) -> Self {
        let keys = Arc::new(JwtKeys::from_config(&config.security));
        Self {
            config: Arc::new(config),
            keys,
            users,
            resources,
            database,
        }
    }

    pub fn in_memory(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(config, store.clone(), store, DatabaseStatus::Connected)
    }

    pub fn degraded(config: AppConfig, reason: impl Into<String>) -> Self {
        let store = Arc::new(UnavailableStore::new(reason));
        Self::new(config, store.clone(), store, DatabaseStatus::Unavailable)
    }

    /// Connect to MongoDB and apply the configured startup policy to any failure
    pub async fn connect(config: AppConfig) -> Result<Self, StartupError> {
        let policy = config.database.startup_policy;

        match database::connect(&config.database).await {
            Ok(connection) => {
                let store = Arc::new(MongoStore::new(connection.database));
                Ok(Self::new(config, store.clone(), store, DatabaseStatus::Connected))
            }
            Err(e) if policy == StartupPolicy::FailFast => {
                error!("Refusing to start without a database (DB_STARTUP_POLICY=fail-fast)");
                Err(e.into())
            }
            Err(e) => {
                if matches!(e, DatabaseError::ConfigMissing(_)) {
                    error!("MONGO_URI is not defined in the environment variables.");
                }
                warn!("Running in degraded mode: database-backed routes will answer 503");
                Ok(Self::degraded(config, e.to_string()))
            }
        }
    }
}
