pub mod mongo_repository;
pub mod test_repository;

use std::sync::Arc;

use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Bson, Document};

use crate::error;

pub trait Entity {
    fn id(&self) -> ObjectId;
}

/// Optimistic-versioning hook: `update_one` refuses to overwrite a record
/// whose stored `last_modified` differs from the one the caller read.
pub trait HasLastModified {
    fn last_modified(&self) -> i64;
    fn set_last_modified(&mut self, timestamp: i64);
}

#[async_trait]
pub trait Repository<T>: Send + Sync {
    /// Inserts the item unless a record with the same id exists; returns
    /// whether the insert happened.
    async fn insert(&self, item: &T) -> error::Result<bool>;
    async fn find(&self, field: &str, value: &Bson) -> error::Result<Option<T>>;
    async fn find_many(&self, field: &str, value: &Bson) -> error::Result<Vec<T>>;
    async fn find_all(&self, skip: u32, limit: u32) -> error::Result<Vec<T>>;
    /// Replaces the record matching `filter`, guarded by the version the
    /// caller read. A lost race fails with `Conflict`. Returns the stored
    /// record after the update.
    async fn update_one(&self, filter: Document, update: &T) -> error::Result<T>;
    async fn delete(&self, field: &str, id: &ObjectId) -> error::Result<Option<T>>;
}

pub type RepositoryObject<T> = Arc<dyn Repository<T>>;
