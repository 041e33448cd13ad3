//! High-level pipeline: one deploy run from configuration to uploaded objects.
//!
//! The stages run strictly in order and each one sees the bucket name resolved at
//! the start:
//!   1. security pre-flight on the credentials
//!   2. bucket name resolution
//!   3. bucket provisioning (when `create_bucket` is set)
//!   4. website hosting setup (when `hosting` is set, best effort)
//!   5. file matching
//!   6. uploads
//!
//! # Error Handling
//! Any fatal error is logged where it happens and returned immediately; nothing
//! already written to the bucket is rolled back.
//!
//! # Dry run
//! `dry_run` only affects the upload stage: files are matched, keyed and logged
//! but not uploaded. Provisioning and hosting run as configured.

use serde::Serialize;
use tracing::info;

use crate::bucket_name::resolve_bucket_name;
use crate::config::DeployConfig;
use crate::contract::ObjectStore;
use crate::error::DeployError;
use crate::matcher::match_files;
use crate::provision::ensure_bucket;
use crate::upload::{upload_files, UploadedObject};
use crate::website::configure_website;

/// Outcome of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct DeployReport {
    pub bucket: String,
    pub bucket_created: bool,
    pub website_url: Option<String>,
    pub uploaded: Vec<UploadedObject>,
}

/// Runs the whole pipeline for `config` against `store`.
pub async fn deploy<S>(config: &DeployConfig, store: &S) -> Result<DeployReport, DeployError>
where
    S: ObjectStore + ?Sized,
{
    config.verify_credentials()?;

    let bucket = resolve_bucket_name(config);
    info!(bucket = %bucket, dry_run = config.dry_run, "[DEPLOY] Starting deploy");

    let bucket_created = if config.create_bucket {
        ensure_bucket(store, &bucket).await?
    } else {
        false
    };

    let website_url = if config.hosting {
        configure_website(store, &bucket, config).await
    } else {
        None
    };

    let matches = match_files(&config.source, &config.exclude)?;
    let uploaded = upload_files(store, config, &bucket, &matches).await?;

    info!(
        bucket = %bucket,
        uploaded = uploaded.len(),
        "[DEPLOY] Deploy complete"
    );
    Ok(DeployReport {
        bucket,
        bucket_created,
        website_url,
        uploaded,
    })
}
