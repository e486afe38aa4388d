//! `ObjectStore` backed by an S3-compatible endpoint through `aws-sdk-s3`.
//!
//! The client is built once at startup and shared read-only. Retries are the
//! SDK's standard mode capped at three attempts; no other retry or timeout
//! policy is layered on top.

use super::object_store::{
    ObjectBody, ObjectHead, ObjectStore, ObjectSummary, PutObject, StoreError, StoreResult,
    strip_etag,
};
use crate::config::StoreConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, retry::RetryConfig};
use aws_sdk_s3::{
    Client,
    config::Credentials,
    error::{DisplayErrorContext, ProvideErrorMetadata},
    operation::list_objects_v2::ListObjectsV2Output,
    primitives::ByteStream,
    types::Object,
};
use chrono::DateTime;
use futures::StreamExt;
use tokio_util::io::ReaderStream;
use tracing::debug;

const MAX_ATTEMPTS: u32 = 3;

pub struct S3Store {
    client: Client,
    bucket: String,
    endpoint: String,
}

impl S3Store {
    /// Build the shared client from configuration.
    ///
    /// Static credentials are used when both keys are configured; otherwise
    /// the default AWS provider chain applies. Path-style addressing is forced
    /// since most S3-compatible providers expect it.
    pub async fn connect(cfg: &StoreConfig) -> Result<Self> {
        let endpoint = cfg.endpoint.clone().context("S3 endpoint is not configured")?;
        let bucket = cfg.bucket.clone().context("S3 bucket is not configured")?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()))
            .endpoint_url(endpoint.clone())
            .retry_config(RetryConfig::standard().with_max_attempts(MAX_ATTEMPTS));
        if let (Some(access_key), Some(secret_key)) = (&cfg.access_key, &cfg.secret_key) {
            loader = loader.credentials_provider(Credentials::new(
                access_key.clone(),
                secret_key.clone(),
                None,
                None,
                "gateway-config",
            ));
        }
        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(s3_config),
            bucket,
            endpoint,
        })
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list_objects(&self) -> StoreResult<Vec<ObjectSummary>> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(backend_error)?;

        first_page(&self.bucket, &output)
    }

    async fn get_object(&self, key: &str) -> StoreResult<ObjectBody> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                if err.as_service_error().is_some_and(|e| e.is_no_such_key()) {
                    StoreError::NotFound {
                        key: key.to_string(),
                    }
                } else {
                    backend_error(err)
                }
            })?;

        let content_type = output.content_type().map(str::to_string);
        let content_length = output.content_length();
        let stream = ReaderStream::new(output.body.into_async_read()).boxed();

        Ok(ObjectBody {
            content_type,
            content_length,
            stream,
        })
    }

    async fn put_object(&self, request: PutObject) -> StoreResult<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&request.key)
            .body(ByteStream::from(request.body))
            .content_type(request.content_type)
            .set_metadata(Some(request.metadata))
            .send()
            .await
            .map_err(backend_error)?;
        Ok(())
    }

    async fn head_object(&self, key: &str) -> StoreResult<ObjectHead> {
        let output = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                if err.as_service_error().is_some_and(|e| e.is_not_found()) {
                    StoreError::NotFound {
                        key: key.to_string(),
                    }
                } else {
                    backend_error(err)
                }
            })?;

        Ok(ObjectHead {
            e_tag: output.e_tag().map(|t| strip_etag(t).to_string()),
            metadata: output.metadata().cloned().unwrap_or_default(),
        })
    }

    async fn probe(&self) -> StoreResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(backend_error)?;
        Ok(())
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket, key)
    }
}

/// Keep the SDK's full error chain (code, message, request id) as the detail text.
fn backend_error<E>(err: E) -> StoreError
where
    E: std::error::Error + ProvideErrorMetadata,
{
    let detail = match (err.code(), err.message()) {
        (Some(code), Some(message)) => Some(format!("{}: {}", code, message)),
        _ => None,
    };
    StoreError::Backend(detail.unwrap_or_else(|| DisplayErrorContext(err).to_string()))
}

/// Summaries of a single listing page. A truncated page is not followed:
/// continuation tokens are ignored and only the returned entries are reported.
fn first_page(bucket: &str, output: &ListObjectsV2Output) -> StoreResult<Vec<ObjectSummary>> {
    if output.is_truncated().unwrap_or(false) {
        debug!(
            bucket = %bucket,
            "listing truncated; continuation pages are not fetched"
        );
    }
    output.contents().iter().map(summary_from).collect()
}

fn summary_from(object: &Object) -> StoreResult<ObjectSummary> {
    let key = object
        .key()
        .ok_or_else(|| StoreError::Backend("listing entry is missing its key".into()))?;
    let modified = object.last_modified().ok_or_else(|| {
        StoreError::Backend(format!("listing entry `{}` is missing LastModified", key))
    })?;
    let last_modified = DateTime::from_timestamp(modified.secs(), modified.subsec_nanos())
        .ok_or_else(|| {
            StoreError::Backend(format!("listing entry `{}` has an invalid timestamp", key))
        })?;

    Ok(ObjectSummary {
        key: key.to_string(),
        e_tag: object.e_tag().map(|t| strip_etag(t).to_string()),
        last_modified,
        size_bytes: object.size().unwrap_or(0),
    })
}
