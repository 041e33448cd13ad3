//! Upload driver: turns matched paths into object keys and PUTs them one by one.
//!
//! # Responsibilities
//! - Skip paths that cannot be stat'ed and directories picked up by `**` patterns
//! - Derive the destination key from the target prefix and strip-prefix
//! - Guess the content type from the file extension
//! - Open each file and hand it to [`ObjectStore::put_object`]
//!
//! # Error Handling
//! Opening or uploading a file is fatal and stops the run at that file. Objects
//! uploaded before the failure stay in the bucket.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, error, info};

use crate::config::DeployConfig;
use crate::contract::{ObjectStore, UploadRecord};
use crate::error::DeployError;

/// A file that was uploaded during the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedObject {
    pub source: PathBuf,
    pub key: String,
    pub content_type: String,
}

/// Object key for `path`: `strip_prefix` removed from its start, joined under
/// `target` with a single `/`, always starting with `/`.
pub fn destination_key(target: &str, strip_prefix: &str, path: &Path) -> String {
    let path = path.to_string_lossy();
    let relative = path.strip_prefix(strip_prefix).unwrap_or(&*path);

    let joined = if target.is_empty() {
        relative.to_string()
    } else {
        format!("{target}/{relative}")
    };
    format!("/{}", clean_key(&joined))
}

/// Lexically normalises a `/`-separated key: empty and `.` segments are dropped
/// and `..` removes the previous segment. A `..` with nothing left to remove is
/// dropped for rooted keys and kept for relative ones.
fn clean_key(key: &str) -> String {
    let rooted = key.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in key.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|last| *last != "..") {
                    segments.pop();
                } else if !rooted {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// MIME type for `path` by extension, `application/octet-stream` when unknown.
pub fn content_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string()
}

/// Uploads every regular file in `matches` to `bucket`, in order.
pub async fn upload_files<S>(
    store: &S,
    config: &DeployConfig,
    bucket: &str,
    matches: &[PathBuf],
) -> Result<Vec<UploadedObject>, DeployError>
where
    S: ObjectStore + ?Sized,
{
    let mut uploaded = Vec::new();

    for path in matches {
        let metadata = match tokio::fs::metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) => {
                debug!(name = %path.display(), error = %e, "Skipping path that cannot be stat'ed");
                continue;
            }
        };
        if metadata.is_dir() {
            continue;
        }

        let key = destination_key(&config.target, &config.strip_prefix, path);
        let content_type = content_type(path);

        info!(
            name = %path.display(),
            bucket,
            target = %key,
            content_type = %content_type,
            "Uploading file"
        );

        if config.dry_run {
            info!(name = %path.display(), target = %key, "Dry run: skipping upload");
            continue;
        }

        let body = tokio::fs::File::open(path).await.map_err(|e| {
            error!(error = %e, file = %path.display(), "Problem opening file");
            DeployError::FileOpen {
                path: path.clone(),
                source: e,
            }
        })?;

        let record = UploadRecord {
            source: path.clone(),
            bucket: bucket.to_string(),
            key: key.clone(),
            content_type: content_type.clone(),
            acl: config.acl.clone(),
            encryption: config.encryption.clone().filter(|alg| !alg.is_empty()),
            body,
        };

        if let Err(e) = store.put_object(record).await {
            error!(
                name = %path.display(),
                bucket,
                target = %key,
                error = %e,
                "Could not upload file"
            );
            return Err(DeployError::PutObject {
                path: path.clone(),
                key,
                source: e,
            });
        }

        info!(
            name = %path.display(),
            bucket,
            target = %key,
            content_type = %content_type,
            "Uploaded file"
        );
        uploaded.push(UploadedObject {
            source: path.clone(),
            key,
            content_type,
        });
    }

    Ok(uploaded)
}
