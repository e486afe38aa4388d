//! The seam between the gateway and whatever holds the bytes.
//!
//! The gateway only needs four object operations (list, get, put, head) plus
//! a cheap reachability probe. Implementations live next to this file:
//! `S3Store` for a real S3-compatible endpoint and `MemoryStore` for local
//! runs and tests.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use std::{collections::HashMap, io};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object `{key}` not found")]
    NotFound { key: String },
    #[error("{0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// One entry of a bucket listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    /// Entity tag with surrounding quotes removed.
    pub e_tag: Option<String>,
    pub last_modified: DateTime<Utc>,
    pub size_bytes: i64,
}

/// Metadata returned by a head request.
#[derive(Debug, Clone, Default)]
pub struct ObjectHead {
    pub e_tag: Option<String>,
    /// User metadata, keys lowercased as S3 reports them.
    pub metadata: HashMap<String, String>,
}

/// An object body ready to be streamed out.
pub struct ObjectBody {
    pub content_type: Option<String>,
    pub content_length: Option<i64>,
    pub stream: BoxStream<'static, io::Result<Bytes>>,
}

/// A full-object write. Overwrites any existing object under `key`.
#[derive(Debug, Clone)]
pub struct PutObject {
    pub key: String,
    pub body: Bytes,
    pub content_type: String,
    pub metadata: HashMap<String, String>,
}

/// Object operations against a single, fixed bucket.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// List the bucket. Only the first page the store returns is read.
    async fn list_objects(&self) -> StoreResult<Vec<ObjectSummary>>;

    async fn get_object(&self, key: &str) -> StoreResult<ObjectBody>;

    async fn put_object(&self, request: PutObject) -> StoreResult<()>;

    async fn head_object(&self, key: &str) -> StoreResult<ObjectHead>;

    /// Check the bucket is reachable with the configured credentials.
    async fn probe(&self) -> StoreResult<()>;

    /// Public URL of `key` (endpoint + bucket + key).
    fn object_url(&self, key: &str) -> String;
}

/// Strip the double quotes S3 wraps around entity tags.
pub fn strip_etag(tag: &str) -> &str {
    tag.trim_matches('"')
}
