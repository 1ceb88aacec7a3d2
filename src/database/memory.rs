use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{normalize_email, User};
use super::store::{Document, ResourceStore, UserStore};
use super::DatabaseError;

/// Process-local store used by tests and `--in-memory` development runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let email = normalize_email(email);
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, DatabaseError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, DatabaseError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(DatabaseError::Duplicate(format!(
                "User with email {} already exists",
                user.email
            )));
        }
        users.push(user.clone());
        Ok(user)
    }

    async fn list(&self) -> Result<Vec<User>, DatabaseError> {
        Ok(self.users.read().await.clone())
    }
}

fn id_of(document: &Document) -> Option<&str> {
    document.get("id").and_then(Value::as_str)
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn list(&self, collection: &str) -> Result<Vec<Document>, DatabaseError> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).cloned().unwrap_or_default())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, DatabaseError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| id_of(d) == Some(id)))
            .cloned())
    }

    async fn insert(&self, collection: &str, mut document: Document) -> Result<Document, DatabaseError> {
        document.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(document.clone());
        Ok(document)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        changes: Document,
    ) -> Result<Option<Document>, DatabaseError> {
        let mut collections = self.collections.write().await;
        let Some(existing) = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| id_of(d) == Some(id)))
        else {
            return Ok(None);
        };

        for (key, value) in changes {
            if key != "id" {
                existing.insert(key, value);
            }
        }
        Ok(Some(existing.clone()))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, DatabaseError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|d| id_of(d) != Some(id));
        Ok(docs.len() != before)
    }
}
