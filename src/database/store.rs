use async_trait::async_trait;
use serde_json::{Map, Value};

use super::models::User;
use super::DatabaseError;

/// A resource document as exchanged with controllers. Always carries a string `id`.
pub type Document = Map<String, Value>;

/// Persistence for principals
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, DatabaseError>;

    /// Fails with `DatabaseError::Duplicate` if the email is taken.
    async fn insert(&self, user: User) -> Result<User, DatabaseError>;

    async fn list(&self) -> Result<Vec<User>, DatabaseError>;
}

/// Generic document persistence behind the opaque resource groups (temples, bookings, ...)
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn list(&self, collection: &str) -> Result<Vec<Document>, DatabaseError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, DatabaseError>;

    /// Assigns a fresh id; any `id` in `document` is overwritten.
    async fn insert(&self, collection: &str, document: Document) -> Result<Document, DatabaseError>;

    /// Merges `changes` into the stored document. `None` if no document has `id`.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        changes: Document,
    ) -> Result<Option<Document>, DatabaseError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, DatabaseError>;
}

/// Stand-in used in degraded mode: every call fails at call time.
#[derive(Debug, Clone)]
pub struct UnavailableStore {
    reason: String,
}

impl UnavailableStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn fail<T>(&self) -> Result<T, DatabaseError> {
        Err(DatabaseError::Unavailable(self.reason.clone()))
    }
}

#[async_trait]
impl UserStore for UnavailableStore {
    async fn find_by_email(&self, _email: &str) -> Result<Option<User>, DatabaseError> {
        self.fail()
    }

    async fn find_by_id(&self, _id: &str) -> Result<Option<User>, DatabaseError> {
        self.fail()
    }

    async fn insert(&self, _user: User) -> Result<User, DatabaseError> {
        self.fail()
    }

    async fn list(&self) -> Result<Vec<User>, DatabaseError> {
        self.fail()
    }
}

#[async_trait]
impl ResourceStore for UnavailableStore {
    async fn list(&self, _collection: &str) -> Result<Vec<Document>, DatabaseError> {
        self.fail()
    }

    async fn get(&self, _collection: &str, _id: &str) -> Result<Option<Document>, DatabaseError> {
        self.fail()
    }

    async fn insert(&self, _collection: &str, _document: Document) -> Result<Document, DatabaseError> {
        self.fail()
    }

    async fn update(
        &self,
        _collection: &str,
        _id: &str,
        _changes: Document,
    ) -> Result<Option<Document>, DatabaseError> {
        self.fail()
    }

    async fn delete(&self, _collection: &str, _id: &str) -> Result<bool, DatabaseError> {
        self.fail()
    }
}
