//! Represents a file (object) held in the backing bucket.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::format_timestamp;

/// A single object in the bucket, as reported by the store.
///
/// `name` is unique within the bucket. Re-uploading under the same name
/// replaces the object wholesale, including its digest and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Object key.
    pub name: String,

    /// Entity tag or explicitly computed digest, depending on the caller.
    pub content_hash: String,

    /// Public URL derived from endpoint, bucket and key.
    pub url: String,

    /// Store-reported last-modified time.
    pub upload_timestamp: DateTime<Utc>,

    pub size_bytes: i64,
}

/// One row of `GET /history`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct HistoryEntry {
    pub name: String,
    pub hash: String,
    pub url: String,
    pub timestamp: String,
    /// 1-based position in the store's native listing order.
    pub block_number: usize,
}

impl HistoryEntry {
    pub fn new(block_number: usize, file: &StoredFile) -> Self {
        Self {
            name: file.name.clone(),
            hash: file.content_hash.clone(),
            url: file.url.clone(),
            timestamp: format_timestamp(&file.upload_timestamp),
            block_number,
        }
    }
}
