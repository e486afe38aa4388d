//! Read-time "blockchain" views derived from the bucket listing.
//!
//! Nothing here is persisted. Entries are rebuilt from the listing on every
//! request and `previous_hash` is informational only: it is never embedded in
//! or checked against the entry that follows it.

use serde::{Deserialize, Serialize};

use super::{format_timestamp, stored_file::StoredFile};

/// A stored file positioned in the current listing.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ChainEntry {
    /// 1-based position in the listing.
    pub index: usize,
    pub file_name: String,
    pub hash: String,
    pub timestamp: String,
    /// Digest of the object listed immediately before this one, if any.
    pub previous_hash: Option<String>,
}

impl ChainEntry {
    pub fn new(index: usize, file: &StoredFile, previous_hash: Option<String>) -> Self {
        Self {
            index,
            file_name: file.name.clone(),
            hash: file.content_hash.clone(),
            timestamp: format_timestamp(&file.upload_timestamp),
            previous_hash,
        }
    }
}

/// Body of `GET /blockchain-info`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct BlockchainInfo {
    pub total_blocks: usize,
    pub latest_block: Option<LatestBlock>,
    pub blockchain_status: String,
}

/// The first object of the native listing order (not necessarily the newest).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LatestBlock {
    pub timestamp: String,
    pub file_name: String,
    pub size: i64,
}

impl From<&StoredFile> for LatestBlock {
    fn from(file: &StoredFile) -> Self {
        Self {
            timestamp: format_timestamp(&file.upload_timestamp),
            file_name: file.name.clone(),
            size: file.size_bytes,
        }
    }
}
