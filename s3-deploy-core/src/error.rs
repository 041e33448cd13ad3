//! Error types for a deploy run

use std::path::PathBuf;

use thiserror::Error;

use crate::contract::StoreError;

/// Fatal errors that abort a deploy run.
///
/// Website configuration failures never surface here; that stage only logs.
#[derive(Error, Debug)]
pub enum DeployError {
    /// Settings are missing or unsafe; raised before any object-store call
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An inclusion or exclusion pattern could not be parsed
    #[error("Invalid glob pattern {pattern:?}: {message}")]
    Glob { pattern: String, message: String },

    /// Listing buckets failed while provisioning
    #[error("Unable to list buckets: {0}")]
    ListBuckets(#[source] StoreError),

    /// Creating the target bucket failed
    #[error("Unable to create bucket {bucket}: {source}")]
    CreateBucket {
        bucket: String,
        #[source]
        source: StoreError,
    },

    /// The created bucket never became visible
    #[error("Error occurred while waiting for bucket {bucket} to be created: {source}")]
    WaitForBucket {
        bucket: String,
        #[source]
        source: StoreError,
    },

    /// A matched file could not be opened for reading
    #[error("Problem opening file {}: {source}", path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Uploading a file failed
    #[error("Could not upload file {} to {key}: {source}", path.display())]
    PutObject {
        path: PathBuf,
        key: String,
        #[source]
        source: StoreError,
    },
}
