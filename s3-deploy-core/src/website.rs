//! Static website hosting setup. Best effort: nothing in here aborts a run.

use tracing::{error, info, warn};

use crate::config::DeployConfig;
use crate::contract::{ObjectStore, StoreError, WebsiteConfig};

/// Website configuration written for the given document names.
///
/// The error document is only attached together with an index document; with an
/// empty index document the result is empty, which clears hosting on write.
pub fn build_website_config(index_document: &str, error_document: &str) -> WebsiteConfig {
    if index_document.is_empty() {
        return WebsiteConfig::default();
    }

    WebsiteConfig {
        index_document: Some(index_document.to_string()),
        error_document: (!error_document.is_empty()).then(|| error_document.to_string()),
    }
}

/// Public website endpoint of `bucket` in `region`.
pub fn website_url(bucket: &str, region: &str) -> String {
    format!("{bucket}.s3-website.{region}.amazonaws.com")
}

/// Logs the current website configuration of `bucket`, then replaces it with the
/// one described by `config`.
///
/// Returns the website URL when the new configuration was written.
pub async fn configure_website<S>(store: &S, bucket: &str, config: &DeployConfig) -> Option<String>
where
    S: ObjectStore + ?Sized,
{
    match store.get_bucket_website(bucket).await {
        Ok(current) => info!(
            bucket,
            index_document = ?current.index_document,
            error_document = ?current.error_document,
            "Bucket Website Configuration"
        ),
        Err(StoreError::NotConfigured) => {
            warn!(bucket, "Bucket does not have website configuration")
        }
        Err(e) => error!(bucket, error = %e, "Unable to read bucket website configuration"),
    }

    let website = build_website_config(&config.index_document, &config.error_document);
    if let Err(e) = store.put_bucket_website(bucket, &website).await {
        error!(bucket, error = %e, "Unable to set bucket website configuration");
        return None;
    }
    info!(bucket, "Successfully set bucket website configuration");

    let url = website_url(bucket, &config.region);
    info!(url = %url, "S3 URL is available");
    Some(url)
}
