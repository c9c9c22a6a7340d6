use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::{self, oid::ObjectId, Bson, Document};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{self, AddKind, ErrorKind};

use super::{Entity, HasLastModified, Repository};

/// In-memory stand-in for `MongoRepository`, used by tests. Keeps the same
/// optimistic `last_modified` guard so conflict behavior is testable.
pub struct TestRepository<T> {
    _t: std::marker::PhantomData<T>,
    pub db: Mutex<Vec<Bson>>,
}

impl<T> TestRepository<T> {
    pub fn new() -> Self {
        Self {
            _t: std::marker::PhantomData,
            db: Mutex::new(Vec::new()),
        }
    }
}

impl<T> Default for TestRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn matches_filter(doc: &Document, filter: &Document) -> bool {
    filter
        .iter()
        .all(|(key, value)| doc.get(key) == Some(value))
}

#[async_trait]
impl<T> Repository<T> for TestRepository<T>
where
    T: Entity + HasLastModified + Clone + Send + Sync + Serialize + DeserializeOwned,
{
    async fn insert(&self, item: &T) -> error::Result<bool> {
        let mut db = self.db.lock().unwrap();

        let contains = db
            .iter()
            .any(|x| x.as_document().unwrap().get_object_id("id").unwrap() == item.id());
        if !contains {
            db.push(bson::to_bson(item)?);
        }
        Ok(!contains)
    }

    async fn find(&self, field: &str, value: &Bson) -> error::Result<Option<T>> {
        let db = self.db.lock().unwrap();
        db.iter()
            .find(|x| x.as_document().unwrap().get(field) == Some(value))
            .cloned()
            .map(|x| bson::from_bson(x).map_err(Into::into))
            .transpose()
    }

    async fn find_many(&self, field: &str, value: &Bson) -> error::Result<Vec<T>> {
        let db = self.db.lock().unwrap();
        db.iter()
            .filter(|x| x.as_document().unwrap().get(field) == Some(value))
            .map(|x| bson::from_bson(x.clone()).map_err(Into::into))
            .collect()
    }

    async fn find_all(&self, skip: u32, limit: u32) -> error::Result<Vec<T>> {
        let db = self.db.lock().unwrap();
        db.iter()
            .skip(skip as usize)
            .take(limit as usize)
            .map(|x| bson::from_bson(x.clone()).map_err(Into::into))
            .collect()
    }

    async fn update_one(&self, filter: Document, update: &T) -> error::Result<T> {
        let mut db = self.db.lock().unwrap();

        let pos = db.iter().position(|x| {
            let doc = x.as_document().unwrap();
            matches_filter(doc, &filter)
                && doc
                    .get_i64("last_modified")
                    .map_or(true, |stored| stored == update.last_modified())
        });

        let Some(pos) = pos else {
            return Err(anyhow::anyhow!("Failed to save changes").kind(ErrorKind::Conflict));
        };

        let mut update = update.clone();
        update.set_last_modified(Utc::now().timestamp_micros());
        db[pos] = bson::to_bson(&update)?;

        Ok(update)
    }

    async fn delete(&self, field: &str, id: &ObjectId) -> error::Result<Option<T>> {
        let mut db = self.db.lock().unwrap();
        let pos = db.iter().position(|x| {
            x.as_document()
                .unwrap()
                .get_object_id(field)
                .map_or(false, |oid| oid == *id)
        });

        pos.map(|pos| bson::from_bson(db.remove(pos)).map_err(Into::into))
            .transpose()
    }
}
