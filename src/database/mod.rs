use thiserror::Error;

pub mod manager;
pub mod memory;
pub mod models;
pub mod mongo;
pub mod store;

pub use manager::{connect, Connection};
pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use store::{Document, ResourceStore, UnavailableStore, UserStore};

/// Errors from the connector and the stores
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Connection failed: {0}")]
    ConnectionFailure(String),

    #[error("Database unavailable: {0}")]
    Unavailable(String),

    #[error("Duplicate key: {0}")]
    Duplicate(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error(transparent)]
    Mongo(#[from] mongodb::error::Error),
}
