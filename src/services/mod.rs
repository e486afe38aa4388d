pub mod gateway_service;
pub mod memory_store;
pub mod object_store;
pub mod s3_store;

use crate::config::{AppConfig, Backend};
use anyhow::Result;
use memory_store::MemoryStore;
use object_store::ObjectStore;
use s3_store::S3Store;
use std::sync::Arc;

/// Construct the process-wide store selected by configuration.
pub async fn build_store(cfg: &AppConfig) -> Result<Arc<dyn ObjectStore>> {
    let store: Arc<dyn ObjectStore> = match cfg.backend {
        Backend::S3 => Arc::new(S3Store::connect(&cfg.store).await?),
        Backend::Memory => {
            let base_url = match (&cfg.store.endpoint, &cfg.store.bucket) {
                (Some(endpoint), Some(bucket)) => format!("{}/{}", endpoint, bucket),
                _ => "memory://local".to_string(),
            };
            Arc::new(MemoryStore::new(base_url))
        }
    };
    Ok(store)
}
