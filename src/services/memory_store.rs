//! In-process `ObjectStore` for local development and tests.
//!
//! Mirrors the parts of S3 behaviour the gateway relies on: keys list in
//! lexicographic order, a put replaces the whole object, the entity tag is the
//! hex MD5 of the body and user metadata keys are lowercased.

use super::object_store::{
    ObjectBody, ObjectHead, ObjectStore, ObjectSummary, PutObject, StoreError, StoreResult,
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::{StreamExt, stream};
use std::{
    collections::{BTreeMap, HashMap},
    io,
};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct StoredObject {
    body: Bytes,
    content_type: String,
    metadata: HashMap<String, String>,
    e_tag: String,
    last_modified: DateTime<Utc>,
}

pub struct MemoryStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
    base_url: String,
}

impl MemoryStore {
    /// `base_url` prefixes every object URL, e.g. `https://s3.example.com/bucket`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            objects: RwLock::new(BTreeMap::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Number of objects currently held.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new("memory://local")
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_objects(&self) -> StoreResult<Vec<ObjectSummary>> {
        let objects = self.objects.read().await;
        Ok(objects
            .iter()
            .map(|(key, obj)| ObjectSummary {
                key: key.clone(),
                e_tag: Some(obj.e_tag.clone()),
                last_modified: obj.last_modified,
                size_bytes: obj.body.len() as i64,
            })
            .collect())
    }

    async fn get_object(&self, key: &str) -> StoreResult<ObjectBody> {
        let objects = self.objects.read().await;
        let obj = objects.get(key).ok_or_else(|| StoreError::NotFound {
            key: key.to_string(),
        })?;

        let body = obj.body.clone();
        Ok(ObjectBody {
            content_type: Some(obj.content_type.clone()),
            content_length: Some(body.len() as i64),
            stream: stream::once(async move { Ok::<_, io::Error>(body) }).boxed(),
        })
    }

    async fn put_object(&self, request: PutObject) -> StoreResult<()> {
        let e_tag = format!("{:x}", md5::compute(&request.body));
        let metadata = request
            .metadata
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();

        let object = StoredObject {
            body: request.body,
            content_type: request.content_type,
            metadata,
            e_tag,
            last_modified: Utc::now(),
        };
        self.objects.write().await.insert(request.key, object);
        Ok(())
    }

    async fn head_object(&self, key: &str) -> StoreResult<ObjectHead> {
        let objects = self.objects.read().await;
        let obj = objects.get(key).ok_or_else(|| StoreError::NotFound {
            key: key.to_string(),
        })?;
        Ok(ObjectHead {
            e_tag: Some(obj.e_tag.clone()),
            metadata: obj.metadata.clone(),
        })
    }

    async fn probe(&self) -> StoreResult<()> {
        Ok(())
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}
