//! Derives the effective bucket name of a run.

use tracing::debug;

use crate::config::DeployConfig;

/// Effective bucket name for `config`.
///
/// With `append_branch` set, the commit branch (minus `branch_prefix_strip`,
/// lower-cased) is appended as `{bucket}-{branch}`. Underscores are always
/// replaced by hyphens since S3 rejects them in bucket names.
pub fn resolve_bucket_name(config: &DeployConfig) -> String {
    let name = if config.append_branch {
        let suffix = branch_suffix(&config.commit_branch, &config.branch_prefix_strip);
        format!("{}-{}", config.bucket, suffix)
    } else {
        config.bucket.clone()
    };

    let resolved = name.replace('_', "-");
    debug!(raw = %config.bucket, resolved = %resolved, "Resolved bucket name");
    resolved
}

/// Branch name with a literal `prefix` removed, lower-cased.
pub fn branch_suffix(branch: &str, prefix: &str) -> String {
    let trimmed = if prefix.is_empty() {
        branch
    } else {
        branch.strip_prefix(prefix).unwrap_or(branch)
    };
    trimmed.to_lowercase()
}
