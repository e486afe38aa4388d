//! GatewayService: the file operations exposed over HTTP.
//!
//! Every call goes straight through to the configured `ObjectStore`; no state
//! is kept between requests. The "chain" views (history, verify, info) are
//! rebuilt from a fresh listing each time.

use super::object_store::{ObjectBody, ObjectStore, ObjectSummary, PutObject, StoreError};
use crate::models::{
    api::{HashResponse, UploadResponse, VerifyRequest},
    chain::{BlockchainInfo, ChainEntry, LatestBlock},
    stored_file::{HistoryEntry, StoredFile},
};
use bytes::Bytes;
use std::{collections::HashMap, sync::Arc};
use thiserror::Error;

/// User metadata key the upload digest is stored under.
pub const FILE_HASH_METADATA_KEY: &str = "file_hash";
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
pub const BLOCKCHAIN_STATUS: &str = "active";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    Backend(String),
}

/// Every store failure is a backend failure at this layer, including a key
/// that vanished between listing and lookup. Download reports its own 404.
impl From<StoreError> for GatewayError {
    fn from(err: StoreError) -> Self {
        GatewayError::Backend(err.to_string())
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// A file received from a client, not yet written anywhere.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub content: Bytes,
    pub content_type: Option<String>,
}

/// Hex MD5 of `content`. Used for integrity checks, not for security.
pub fn content_digest(content: &[u8]) -> String {
    format!("{:x}", md5::compute(content))
}

/// Shared handle to the store. Cheap to clone; cloned into every handler.
#[derive(Clone)]
pub struct GatewayService {
    store: Arc<dyn ObjectStore>,
}

impl GatewayService {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// All objects, newest first. `block_number` keeps the listing position.
    pub async fn list_history(&self) -> GatewayResult<Vec<HistoryEntry>> {
        let listing = self.store.list_objects().await?;
        let files = self.stored_files(listing);
        Ok(build_history(files))
    }

    /// Open an object for streaming. Callers decide how to report failures;
    /// the HTTP layer collapses every error to 404.
    pub async fn download(&self, file_name: &str) -> GatewayResult<ObjectBody> {
        Ok(self.store.get_object(file_name).await?)
    }

    /// Write `upload` under its file name with its MD5 attached as metadata.
    ///
    /// Empty content is rejected before the store is touched.
    pub async fn upload(&self, upload: FileUpload) -> GatewayResult<UploadResponse> {
        if upload.content.is_empty() {
            return Err(GatewayError::InvalidInput("Empty file provided".into()));
        }

        let file_hash = content_digest(&upload.content);
        let request = PutObject {
            key: upload.file_name.clone(),
            body: upload.content,
            content_type: upload
                .content_type
                .filter(|ct| !ct.is_empty())
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            metadata: HashMap::from([(FILE_HASH_METADATA_KEY.to_string(), file_hash.clone())]),
        };
        self.store.put_object(request).await?;

        Ok(UploadResponse {
            message: "File uploaded successfully".into(),
            file_url: self.store.object_url(&upload.file_name),
            file_name: upload.file_name,
            file_hash,
        })
    }

    /// Scan the whole bucket for objects whose stored digest equals
    /// `request.file_hash` (case-insensitive).
    ///
    /// `request.file_name` does not narrow the scan. Any store failure aborts
    /// the scan and drops matches found so far.
    pub async fn verify(&self, request: &VerifyRequest) -> GatewayResult<Vec<ChainEntry>> {
        let listing = self.store.list_objects().await?;
        let mut digests = Vec::with_capacity(listing.len());
        for summary in listing {
            let head = self.store.head_object(&summary.key).await?;
            let stored = head
                .metadata
                .get(FILE_HASH_METADATA_KEY)
                .cloned()
                .or(head.e_tag)
                .unwrap_or_default();
            digests.push((self.stored_file(summary), stored));
        }
        Ok(chain_matches(digests, &request.file_hash))
    }

    /// Digest `content` without storing it.
    pub fn calculate_hash(&self, file_name: &str, content: &[u8]) -> HashResponse {
        HashResponse {
            file_name: file_name.to_string(),
            hash: content_digest(content),
        }
    }

    /// Block count plus the first object of the native listing order.
    pub async fn blockchain_info(&self) -> GatewayResult<BlockchainInfo> {
        let listing = self.store.list_objects().await?;
        let files = self.stored_files(listing);
        Ok(summarize_chain(&files))
    }

    fn stored_file(&self, summary: ObjectSummary) -> StoredFile {
        StoredFile {
            url: self.store.object_url(&summary.key),
            content_hash: summary.e_tag.unwrap_or_default(),
            name: summary.key,
            upload_timestamp: summary.last_modified,
            size_bytes: summary.size_bytes,
        }
    }

    fn stored_files(&self, listing: Vec<ObjectSummary>) -> Vec<StoredFile> {
        listing.into_iter().map(|s| self.stored_file(s)).collect()
    }
}

/// Number files by listing position, then order newest first.
fn build_history(files: Vec<StoredFile>) -> Vec<HistoryEntry> {
    let mut numbered: Vec<(usize, StoredFile)> =
        files.into_iter().enumerate().map(|(i, f)| (i + 1, f)).collect();
    numbered.sort_by(|a, b| b.1.upload_timestamp.cmp(&a.1.upload_timestamp));
    numbered
        .iter()
        .map(|(block_number, file)| HistoryEntry::new(*block_number, file))
        .collect()
}

/// Walk `(file, stored digest)` pairs in listing order and keep those matching
/// `target`. `previous_hash` is the prior pair's digest whether or not it matched.
fn chain_matches(entries: Vec<(StoredFile, String)>, target: &str) -> Vec<ChainEntry> {
    let target = target.to_lowercase();
    let mut matches = Vec::new();
    let mut previous_hash: Option<String> = None;

    for (i, (mut file, digest)) in entries.into_iter().enumerate() {
        if digest.to_lowercase() == target {
            file.content_hash = digest.clone();
            matches.push(ChainEntry::new(i + 1, &file, previous_hash.clone()));
        }
        previous_hash = Some(digest);
    }
    matches
}

fn summarize_chain(files: &[StoredFile]) -> BlockchainInfo {
    BlockchainInfo {
        total_blocks: files.len(),
        latest_block: files.first().map(LatestBlock::from),
        blockchain_status: BLOCKCHAIN_STATUS.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        memory_store::MemoryStore,
        object_store::{ObjectHead, StoreResult},
    };
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn file(name: &str, hash: &str, ts: DateTime<Utc>) -> StoredFile {
        StoredFile {
            name: name.into(),
            content_hash: hash.into(),
            url: format!("memory://local/{}", name),
            upload_timestamp: ts,
            size_bytes: 1,
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn digest_of_hello() {
        assert_eq!(content_digest(b"hello"), "5d41402abc4b2a76b9719d911017c592");
    }

    #[test]
    fn history_is_newest_first_for_any_listing_order() {
        let base = vec![
            file("a", "1", t0()),
            file("b", "2", t0() + Duration::seconds(30)),
            file("c", "3", t0() - Duration::seconds(30)),
        ];
        let orders = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
        for order in orders {
            let listing: Vec<StoredFile> = order.iter().map(|&i| base[i].clone()).collect();
            let history = build_history(listing.clone());

            let names: Vec<&str> = history.iter().map(|h| h.name.as_str()).collect();
            assert_eq!(names, vec!["b", "a", "c"]);

            for entry in &history {
                let pos = listing.iter().position(|f| f.name == entry.name).unwrap();
                assert_eq!(entry.block_number, pos + 1);
            }
        }
    }

    #[test]
    fn chain_matches_track_previous_hash_of_non_matches() {
        let entries = vec![
            (file("a.txt", "", t0()), "AAA".to_string()),
            (file("b.txt", "", t0()), "bbb".to_string()),
            (file("c.txt", "", t0()), "ccc".to_string()),
            (file("d.txt", "", t0()), "BBB".to_string()),
        ];
        let matches = chain_matches(entries, "bBb");

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].index, 2);
        assert_eq!(matches[0].file_name, "b.txt");
        assert_eq!(matches[0].hash, "bbb");
        assert_eq!(matches[0].previous_hash.as_deref(), Some("AAA"));
        assert_eq!(matches[1].index, 4);
        assert_eq!(matches[1].hash, "BBB");
        assert_eq!(matches[1].previous_hash.as_deref(), Some("ccc"));
    }

    #[test]
    fn first_entry_has_no_previous_hash() {
        let entries = vec![(file("a.txt", "", t0()), "abc".to_string())];
        let matches = chain_matches(entries, "abc");
        assert_eq!(matches[0].previous_hash, None);
    }

    #[test]
    fn chain_summary_uses_listing_order_not_time() {
        let files = vec![
            file("old.txt", "1", t0() - Duration::days(1)),
            file("new.txt", "2", t0()),
        ];
        let info = summarize_chain(&files);
        assert_eq!(info.total_blocks, 2);
        assert_eq!(info.latest_block.unwrap().file_name, "old.txt");
        assert_eq!(info.blockchain_status, "active");

        let empty = summarize_chain(&[]);
        assert_eq!(empty.total_blocks, 0);
        assert!(empty.latest_block.is_none());
    }

    #[tokio::test]
    async fn empty_upload_never_reaches_the_store() {
        let store = Arc::new(MemoryStore::default());
        let service = GatewayService::new(store.clone());

        let err = service
            .upload(FileUpload {
                file_name: "empty.txt".into(),
                content: Bytes::new(),
                content_type: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::InvalidInput(_)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn verify_prefers_metadata_digest_over_etag() {
        let store = Arc::new(MemoryStore::default());
        store
            .put_object(PutObject {
                key: "tagged.bin".into(),
                body: Bytes::from_static(b"payload"),
                content_type: DEFAULT_CONTENT_TYPE.into(),
                metadata: HashMap::from([(
                    FILE_HASH_METADATA_KEY.to_string(),
                    "custom-digest".to_string(),
                )]),
            })
            .await
            .unwrap();
        let service = GatewayService::new(store);

        let by_metadata = service
            .verify(&VerifyRequest {
                file_hash: "CUSTOM-DIGEST".into(),
                file_name: "ignored".into(),
            })
            .await
            .unwrap();
        assert_eq!(by_metadata.len(), 1);
        assert_eq!(by_metadata[0].hash, "custom-digest");

        let by_etag = service
            .verify(&VerifyRequest {
                file_hash: content_digest(b"payload"),
                file_name: "tagged.bin".into(),
            })
            .await
            .unwrap();
        assert!(by_etag.is_empty());
    }

    #[tokio::test]
    async fn verify_falls_back_to_etag_without_metadata() {
        let store = Arc::new(MemoryStore::default());
        store
            .put_object(PutObject {
                key: "plain.bin".into(),
                body: Bytes::from_static(b"payload"),
                content_type: DEFAULT_CONTENT_TYPE.into(),
                metadata: HashMap::new(),
            })
            .await
            .unwrap();
        let service = GatewayService::new(store);

        let matches = service
            .verify(&VerifyRequest {
                file_hash: content_digest(b"payload"),
                file_name: "plain.bin".into(),
            })
            .await
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].file_name, "plain.bin");
    }

    /// Delegates to a `MemoryStore` but reports `vanished` as missing on head,
    /// as if it were deleted between listing and lookup.
    struct VanishingStore {
        inner: MemoryStore,
        vanished: &'static str,
    }

    #[async_trait::async_trait]
    impl ObjectStore for VanishingStore {
        async fn list_objects(&self) -> StoreResult<Vec<ObjectSummary>> {
            self.inner.list_objects().await
        }

        async fn get_object(&self, key: &str) -> StoreResult<ObjectBody> {
            self.inner.get_object(key).await
        }

        async fn put_object(&self, request: PutObject) -> StoreResult<()> {
            self.inner.put_object(request).await
        }

        async fn head_object(&self, key: &str) -> StoreResult<ObjectHead> {
            if key == self.vanished {
                return Err(StoreError::NotFound {
                    key: key.to_string(),
                });
            }
            self.inner.head_object(key).await
        }

        async fn probe(&self) -> StoreResult<()> {
            Ok(())
        }

        fn object_url(&self, key: &str) -> String {
            self.inner.object_url(key)
        }
    }

    #[tokio::test]
    async fn verify_reports_key_vanished_mid_scan_as_backend_error() {
        let inner = MemoryStore::default();
        for (key, body) in [("a.txt", "hello"), ("b.txt", "world")] {
            inner
                .put_object(PutObject {
                    key: key.into(),
                    body: Bytes::from_static(body.as_bytes()),
                    content_type: DEFAULT_CONTENT_TYPE.into(),
                    metadata: HashMap::new(),
                })
                .await
                .unwrap();
        }
        let service = GatewayService::new(Arc::new(VanishingStore {
            inner,
            vanished: "b.txt",
        }));

        // a.txt matches before b.txt fails; the match is discarded.
        let err = service
            .verify(&VerifyRequest {
                file_hash: content_digest(b"hello"),
                file_name: "a.txt".into(),
            })
            .await
            .unwrap_err();

        match err {
            GatewayError::Backend(msg) => assert!(msg.contains("b.txt"), "{msg}"),
            other => panic!("expected backend error, got {other:?}"),
        }
    }
}
