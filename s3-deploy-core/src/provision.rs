//! Makes sure the target bucket exists before anything is written to it.

use tracing::{error, info};

use crate::contract::ObjectStore;
use crate::error::DeployError;

/// Creates `bucket` unless a bucket of exactly that name is already listed, then
/// waits for it to become visible.
///
/// Returns `true` when the bucket was created by this call. Every failure is fatal.
pub async fn ensure_bucket<S>(store: &S, bucket: &str) -> Result<bool, DeployError>
where
    S: ObjectStore + ?Sized,
{
    let buckets = store.list_buckets().await.map_err(|e| {
        error!(error = %e, "ListBucket");
        DeployError::ListBuckets(e)
    })?;

    let exists = buckets.iter().any(|name| name == bucket);
    info!(bucket, is_bucket_existing = exists, "Checked bucket existence");
    if exists {
        return Ok(false);
    }

    store.create_bucket(bucket).await.map_err(|e| {
        error!(bucket, error = %e, "Unable to create bucket");
        DeployError::CreateBucket {
            bucket: bucket.to_string(),
            source: e,
        }
    })?;

    info!(bucket, "Waiting for bucket to be created...");
    store.wait_until_bucket_exists(bucket).await.map_err(|e| {
        error!(bucket, error = %e, "Error occurred while waiting for bucket to be created");
        DeployError::WaitForBucket {
            bucket: bucket.to_string(),
            source: e,
        }
    })?;

    info!(bucket, "Bucket created");
    Ok(true)
}
