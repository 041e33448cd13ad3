//! # contract: the narrow interface to the object-storage API
//!
//! The deploy pipeline never talks to a storage SDK directly. Everything it needs
//! from the backend is expressed by the [`ObjectStore`] trait below, implemented by
//! the S3 client in the CLI crate and by `mockall` mocks in tests.
//!
//! ## Mocking & Testing
//! - `MockObjectStore` is generated for `cfg(test)` and whenever the
//!   `test-export-mocks` feature is enabled, so downstream tests can use it too.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

/// Static website hosting settings of a bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebsiteConfig {
    /// Suffix served for directory requests, e.g. `index.html`.
    pub index_document: Option<String>,
    /// Object key served on 4xx errors.
    pub error_document: Option<String>,
}

/// One file on its way into the bucket.
///
/// Owns the open read handle; the handle is closed when the record is dropped,
/// whether or not the upload succeeded.
#[derive(Debug)]
pub struct UploadRecord {
    pub source: PathBuf,
    pub bucket: String,
    pub key: String,
    pub content_type: String,
    pub acl: String,
    /// `None` means the encryption header is omitted entirely.
    pub encryption: Option<String>,
    pub body: tokio::fs::File,
}

/// Errors reported by an [`ObjectStore`] implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The bucket has no website configuration
    #[error("The specified bucket does not have a website configuration")]
    NotConfigured,

    /// Any error returned by the storage service or its transport
    #[error("Object store error: {0}")]
    Service(String),

    /// The request could not be built from the given values
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Operations the deploy pipeline needs from the storage backend.
///
/// Every call is a single round trip; callers await them one after another.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Names of all buckets visible to the current credentials.
    async fn list_buckets(&self) -> Result<Vec<String>, StoreError>;

    async fn create_bucket(&self, bucket: &str) -> Result<(), StoreError>;

    /// Blocks until the bucket is reported as existing, using the backend's own
    /// polling and timeout policy.
    async fn wait_until_bucket_exists(&self, bucket: &str) -> Result<(), StoreError>;

    /// Current website configuration, or [`StoreError::NotConfigured`].
    async fn get_bucket_website(&self, bucket: &str) -> Result<WebsiteConfig, StoreError>;

    /// Replaces the website configuration of the bucket as a whole.
    async fn put_bucket_website(
        &self,
        bucket: &str,
        config: &WebsiteConfig,
    ) -> Result<(), StoreError>;

    /// Uploads the full content of `record.body` to `record.bucket`/`record.key`.
    async fn put_object(&self, record: UploadRecord) -> Result<(), StoreError>;
}
