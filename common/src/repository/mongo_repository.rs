use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, to_document, Bson, Document},
    options::FindOptions,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{self, AddKind, ErrorKind, ServiceError};

use super::{Entity, HasLastModified, Repository};

pub struct MongoRepository<T> {
    pub collection: mongodb::Collection<T>,
}

impl<T> MongoRepository<T> {
    pub async fn new(mongo_uri: &str, database: &str, collection: &str) -> Self {
        let collection = mongodb::Client::with_uri_str(mongo_uri)
            .await
            .unwrap()
            .database(database)
            .collection(collection);
        Self { collection }
    }
}

/// Driver network failures surface as `Timeout` so callers know the
/// operation is safe to retry.
fn store_error(err: mongodb::error::Error) -> ServiceError {
    let kind = match *err.kind {
        mongodb::error::ErrorKind::Io(_) | mongodb::error::ErrorKind::ServerSelection { .. } => {
            ErrorKind::Timeout
        }
        _ => ErrorKind::Internal,
    };
    anyhow::Error::new(err).kind(kind)
}

#[async_trait]
impl<T> Repository<T> for MongoRepository<T>
where
    T: Entity + HasLastModified + Serialize + DeserializeOwned + Unpin + Clone + Send + Sync,
{
    async fn insert(&self, item: &T) -> error::Result<bool> {
        let result = self
            .collection
            .find_one(doc! {"id": item.id()}, None)
            .await
            .map_err(store_error)?
            .is_none();

        if result {
            self.collection
                .insert_one(item, None)
                .await
                .map_err(store_error)?;
        }
        Ok(result)
    }

    async fn find(&self, field: &str, value: &Bson) -> error::Result<Option<T>> {
        let result = self
            .collection
            .find_one(doc! {field: value}, None)
            .await
            .map_err(store_error)?;
        Ok(result)
    }

    async fn find_many(&self, field: &str, value: &Bson) -> error::Result<Vec<T>> {
        let result: Vec<mongodb::error::Result<T>> = self
            .collection
            .find(doc! {field: value}, None)
            .await
            .map_err(store_error)?
            .collect()
            .await;
        result
            .into_iter()
            .collect::<mongodb::error::Result<_>>()
            .map_err(store_error)
    }

    async fn find_all(&self, skip: u32, limit: u32) -> error::Result<Vec<T>> {
        let find_options = FindOptions::builder()
            .skip(skip as u64)
            .limit(limit as i64)
            .build();

        let results: Vec<mongodb::error::Result<T>> = self
            .collection
            .find(None, find_options)
            .await
            .map_err(store_error)?
            .collect()
            .await;

        results
            .into_iter()
            .collect::<mongodb::error::Result<_>>()
            .map_err(store_error)
    }

    async fn update_one(&self, mut filter: Document, update: &T) -> error::Result<T> {
        filter.extend(doc! {
            "$or": [
                { "last_modified": Bson::Int64(update.last_modified()) },
                { "last_modified": { "$exists": false } }
            ]
        });

        let mut update = update.clone();
        update.set_last_modified(Utc::now().timestamp_micros());

        let result = self
            .collection
            .find_one_and_update(filter, doc! {"$set": to_document(&update)?}, None)
            .await
            .map_err(store_error)?;

        if result.is_none() {
            return Err(anyhow::anyhow!("Failed to save changes").kind(ErrorKind::Conflict));
        }

        Ok(update)
    }

    async fn delete(&self, field: &str, id: &ObjectId) -> error::Result<Option<T>> {
        let result = self
            .collection
            .find_one_and_delete(doc! {field: id}, None)
            .await
            .map_err(store_error)?;
        Ok(result)
    }
}
