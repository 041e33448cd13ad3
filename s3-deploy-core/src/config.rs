use std::fmt;
use tracing::{debug, error, info};

use crate::error::DeployError;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_ACL: &str = "private";

/// All resolved settings for one deploy run.
///
/// Built once at process start and only ever borrowed afterwards. The effective
/// bucket name is derived from it by [`crate::bucket_name::resolve_bucket_name`]
/// rather than written back into it.
#[derive(Clone, PartialEq, Eq)]
pub struct DeployConfig {
    /// Custom endpoint (e.g. a MinIO server). Empty means the provider default.
    pub endpoint: String,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub bucket: String,
    pub region: String,
    /// Canned ACL applied to every uploaded object.
    pub acl: String,
    /// Glob selecting the files to upload, e.g. `public/**/*`.
    pub source: String,
    /// Key prefix the files are uploaded under.
    pub target: String,
    /// Literal prefix removed from each matched path before it is joined to `target`.
    pub strip_prefix: String,
    /// Globs whose matches are removed from the upload set.
    pub exclude: Vec<String>,
    /// Server-side encryption algorithm (`AES256`, `aws:kms`). `None` disables it.
    pub encryption: Option<String>,
    pub path_style: bool,
    pub dry_run: bool,
    /// Set by the CI system when the pipeline definition was signed.
    pub yaml_verified: bool,
    pub create_bucket: bool,
    pub append_branch: bool,
    /// Removed from the start of `commit_branch` before it is appended to the bucket name.
    pub branch_prefix_strip: String,
    pub commit_branch: String,
    pub hosting: bool,
    pub index_document: String,
    pub error_document: String,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            access_key: None,
            secret_key: None,
            bucket: String::new(),
            region: DEFAULT_REGION.to_string(),
            acl: DEFAULT_ACL.to_string(),
            source: String::new(),
            target: String::new(),
            strip_prefix: String::new(),
            exclude: Vec::new(),
            encryption: None,
            path_style: false,
            dry_run: false,
            yaml_verified: false,
            create_bucket: false,
            append_branch: false,
            branch_prefix_strip: String::new(),
            commit_branch: String::new(),
            hosting: false,
            index_document: String::new(),
            error_document: String::new(),
        }
    }
}

impl DeployConfig {
    /// Returns the access key and secret when both are present and non-empty.
    pub fn static_credentials(&self) -> Option<(&str, &str)> {
        match (self.access_key.as_deref(), self.secret_key.as_deref()) {
            (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => {
                Some((key, secret))
            }
            _ => None,
        }
    }

    /// Pre-flight security check, run before any object-store call.
    ///
    /// Falling back to ambient (instance role) credentials is only allowed when the
    /// pipeline definition has been verified.
    pub fn verify_credentials(&self) -> Result<(), DeployError> {
        if self.static_credentials().is_some() || self.yaml_verified {
            return Ok(());
        }
        error!("No access key/secret supplied and pipeline definition is not verified");
        Err(DeployError::Configuration(
            "Security issue: When using instance role you must have the yaml verified"
                .to_string(),
        ))
    }

    pub fn trace_loaded(&self) {
        info!(
            bucket = %self.bucket,
            region = %self.region,
            source = %self.source,
            target = %self.target,
            exclude_count = self.exclude.len(),
            create_bucket = self.create_bucket,
            hosting = self.hosting,
            dry_run = self.dry_run,
            "Loaded DeployConfig"
        );
        debug!(config = ?self, "DeployConfig loaded (full debug)");
    }
}

impl fmt::Debug for DeployConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeployConfig")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("acl", &self.acl)
            .field("source", &self.source)
            .field("target", &self.target)
            .field("strip_prefix", &self.strip_prefix)
            .field("exclude", &self.exclude)
            .field("encryption", &self.encryption)
            .field("path_style", &self.path_style)
            .field("dry_run", &self.dry_run)
            .field("yaml_verified", &self.yaml_verified)
            .field("create_bucket", &self.create_bucket)
            .field("append_branch", &self.append_branch)
            .field("branch_prefix_strip", &self.branch_prefix_strip)
            .field("commit_branch", &self.commit_branch)
            .field("hosting", &self.hosting)
            .field("index_document", &self.index_document)
            .field("error_document", &self.error_document)
            .finish()
    }
}
