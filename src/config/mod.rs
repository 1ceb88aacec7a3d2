use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_DB_NAME: &str = "darshan";
/// Work factors bcrypt accepts
pub const BCRYPT_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;
/// Upper bound for `JWT_EXPIRES_IN` (ten years)
pub const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// Errors raised while reading configuration at startup. All of them are fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not defined in the environment variables")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

impl ConfigError {
    /// Operator-facing lines explaining how to fix the problem.
    pub fn diagnostic(&self) -> Vec<String> {
        match self {
            ConfigError::Missing("JWT_SECRET") => vec![
                "FATAL ERROR: JWT_SECRET is not defined in the environment variables.".to_string(),
                "The server cannot start without a secret key for signing tokens.".to_string(),
                "1. Open the \".env\" file next to the server binary (or export the variable).".to_string(),
                "2. Add a line for JWT_SECRET with a long, random, secret string.".to_string(),
                "Example: JWT_SECRET=your_super_secret_and_random_string_here".to_string(),
            ],
            ConfigError::Missing(var) => vec![
                format!("FATAL ERROR: {} is not defined in the environment variables.", var),
                format!("Set {} in \".env\" or in the process environment.", var),
            ],
            ConfigError::Invalid { var, reason } => vec![
                format!("FATAL ERROR: {} has an invalid value ({}).", var, reason),
                format!("Fix or unset {} and restart.", var),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// What to do when the database is not configured or the first connection fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartupPolicy {
    /// Keep serving; database-backed routes answer 503
    Degrade,
    /// Refuse to start
    FailFast,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub uri: Option<String>,
    pub name: String,
    pub connect_timeout_ms: u64,
    pub startup_policy: StartupPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: Secret,
    #[serde(with = "duration_secs")]
    pub jwt_expiry: Duration,
    pub bcrypt_cost: u32,
    pub allow_registration: bool,
    pub cors_origins: Vec<String>,
}

/// Signing secret; never printed
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup (the process environment in production,
    /// a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup("JWT_SECRET")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        let config = match environment {
            Environment::Production => Self::production(secret),
            Environment::Staging => Self::staging(secret),
            Environment::Development => Self::development(secret),
        };
        config.with_env_overrides(&lookup)
    }

    fn with_env_overrides<F>(mut self, lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server
        if let Some(v) = lookup("PORT") {
            self.server.port = v.trim().parse().unwrap_or(self.server.port);
        }

        // Database
        self.database.uri = lookup("MONGO_URI")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        if let Some(v) = lookup("MONGO_DB_NAME") {
            if !v.trim().is_empty() {
                self.database.name = v.trim().to_string();
            }
        }
        if let Some(v) = lookup("MONGO_CONNECT_TIMEOUT_MS") {
            self.database.connect_timeout_ms = v.parse().unwrap_or(self.database.connect_timeout_ms);
        }
        if let Some(v) = lookup("DB_STARTUP_POLICY") {
            self.database.startup_policy = match v.trim() {
                "degrade" => StartupPolicy::Degrade,
                "fail-fast" | "fail_fast" => StartupPolicy::FailFast,
                other => {
                    return Err(ConfigError::Invalid {
                        var: "DB_STARTUP_POLICY",
                        reason: format!("expected 'degrade' or 'fail-fast', got '{}'", other),
                    })
                }
            };
        }

        // Security
        if let Some(v) = lookup("JWT_EXPIRES_IN") {
            let expiry = parse_duration(&v).map_err(|reason| ConfigError::Invalid {
                var: "JWT_EXPIRES_IN",
                reason,
            })?;
            if expiry > MAX_TOKEN_LIFETIME {
                return Err(ConfigError::Invalid {
                    var: "JWT_EXPIRES_IN",
                    reason: format!("'{}' exceeds the maximum of 3650d", v.trim()),
                });
            }
            self.security.jwt_expiry = expiry;
        }
        if let Some(v) = lookup("BCRYPT_COST") {
            self.security.bcrypt_cost = v
                .trim()
                .parse()
                .ok()
                .filter(|cost| BCRYPT_COST_RANGE.contains(cost))
                .unwrap_or(self.security.bcrypt_cost);
        }
        if let Some(v) = lookup("ALLOW_REGISTRATION") {
            self.security.allow_registration = v.parse().unwrap_or(self.security.allow_registration);
        }
        if let Some(v) = lookup("CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        Ok(self)
    }

    fn development(secret: String) -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: DEFAULT_HOST.to_string(),
                port: DEFAULT_PORT,
            },
            database: DatabaseConfig {
                uri: None,
                name: DEFAULT_DB_NAME.to_string(),
                connect_timeout_ms: 10_000,
                startup_policy: StartupPolicy::Degrade,
            },
            security: SecurityConfig {
                jwt_secret: Secret::new(secret),
                jwt_expiry: Duration::from_secs(30 * 24 * 60 * 60),
                bcrypt_cost: 10,
                allow_registration: true,
                cors_origins: vec!["*".to_string()],
            },
        }
    }

    fn staging(secret: String) -> Self {
        let mut config = Self::development(secret);
        config.environment = Environment::Staging;
        config.database.connect_timeout_ms = 5_000;
        config.security.jwt_expiry = Duration::from_secs(7 * 24 * 60 * 60);
        config
    }

    fn production(secret: String) -> Self {
        let mut config = Self::development(secret);
        config.environment = Environment::Production;
        config.database.connect_timeout_ms = 5_000;
        config.security.jwt_expiry = Duration::from_secs(24 * 60 * 60);
        config.security.bcrypt_cost = 12;
        config
    }
}

/// Parse `30d`, `12h`, `15m`, `90s` or a bare number of seconds.
pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("empty duration".to_string());
    }

    let (digits, unit) = match value.char_indices().find(|(_, c)| !c.is_ascii_digit()) {
        Some((idx, _)) => value.split_at(idx),
        None => (value, "s"),
    };

    let amount: u64 = digits
        .parse()
        .map_err(|_| format!("'{}' is not a duration", value))?;
    let multiplier = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        other => return Err(format!("unknown duration unit '{}'", other)),
    };

    if amount == 0 {
        return Err("duration must be positive".to_string());
    }
    amount
        .checked_mul(multiplier)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("'{}' is too large", value))
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
