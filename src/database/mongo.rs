use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{self, doc, Bson};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use mongodb::{Collection, Database};
use serde_json::Value;
use uuid::Uuid;

use super::models::{normalize_email, User};
use super::store::{Document, ResourceStore, UserStore};
use super::DatabaseError;

const USERS: &str = "users";
const DUPLICATE_KEY: i32 = 11000;

/// MongoDB-backed store over a single long-lived database handle
#[derive(Clone, Debug)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn users(&self) -> Collection<User> {
        self.db.collection(USERS)
    }

    fn collection(&self, name: &str) -> Collection<bson::Document> {
        self.db.collection(name)
    }
}

fn map_write_error(err: mongodb::error::Error) -> DatabaseError {
    if let ErrorKind::Write(WriteFailure::WriteError(write)) = err.kind.as_ref() {
        if write.code == DUPLICATE_KEY {
            return DatabaseError::Duplicate(write.message.clone());
        }
    }
    DatabaseError::Mongo(err)
}

/// Stored `_id` becomes the API-facing `id`
pub(crate) fn to_api_document(mut stored: bson::Document) -> Document {
    if let Some(id) = stored.remove("_id") {
        stored.insert("id", id);
    }
    match Bson::Document(stored).into_relaxed_extjson() {
        Value::Object(map) => map,
        _ => Document::new(),
    }
}

/// API document to stored form; any `id` in the body is dropped
pub(crate) fn to_stored_document(mut document: Document) -> Result<bson::Document, DatabaseError> {
    document.remove("id");
    document.remove("_id");
    bson::to_document(&document).map_err(|e| DatabaseError::InvalidDocument(e.to_string()))
}

#[async_trait]
impl UserStore for MongoStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let filter = doc! { "email": normalize_email(email) };
        Ok(self.users().find_one(filter, None).await?)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, DatabaseError> {
        Ok(self.users().find_one(doc! { "_id": id }, None).await?)
    }

    async fn insert(&self, user: User) -> Result<User, DatabaseError> {
        // No unique index is assumed, so check first; a unique index still maps to Duplicate.
        if self.find_by_email(&user.email).await?.is_some() {
            return Err(DatabaseError::Duplicate(format!(
                "User with email {} already exists",
                user.email
            )));
        }
        self.users()
            .insert_one(&user, None)
            .await
            .map_err(map_write_error)?;
        Ok(user)
    }

    async fn list(&self) -> Result<Vec<User>, DatabaseError> {
        let cursor = self.users().find(None, None).await?;
        Ok(cursor.try_collect().await?)
    }
}

#[async_trait]
impl ResourceStore for MongoStore {
    async fn list(&self, collection: &str) -> Result<Vec<Document>, DatabaseError> {
        let cursor = self.collection(collection).find(None, None).await?;
        let stored: Vec<bson::Document> = cursor.try_collect().await?;
        Ok(stored.into_iter().map(to_api_document).collect())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, DatabaseError> {
        let found = self
            .collection(collection)
            .find_one(doc! { "_id": id }, None)
            .await?;
        Ok(found.map(to_api_document))
    }

    async fn insert(&self, collection: &str, document: Document) -> Result<Document, DatabaseError> {
        let mut stored = to_stored_document(document)?;
        stored.insert("_id", Uuid::new_v4().to_string());
        self.collection(collection)
            .insert_one(&stored, None)
            .await
            .map_err(map_write_error)?;
        Ok(to_api_document(stored))
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        changes: Document,
    ) -> Result<Option<Document>, DatabaseError> {
        let set = to_stored_document(changes)?;
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let updated = self
            .collection(collection)
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set }, options)
            .await
            .map_err(map_write_error)?;
        Ok(updated.map(to_api_document))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, DatabaseError> {
        let result = self
            .collection(collection)
            .delete_one(doc! { "_id": id }, None)
            .await?;
        Ok(result.deleted_count > 0)
    }
}
