///
/// This module implements the CLI interface for s3-deploy: flag and environment
/// parsing, the async `run` entrypoint, and the final report logging.
///
/// All pipeline logic (bucket naming, matching, provisioning, hosting, uploads)
/// lives in the [`s3-deploy-core`] crate. This module is strictly CLI glue.
///
/// ## How To Use
/// - In CI: set the `PLUGIN_*` environment variables and run `s3-deploy`.
/// - Locally: pass flags, see `s3-deploy --help`.
/// - Programmatically and in tests: call [`run`] with a constructed [`Cli`].
///
/// [`s3-deploy-core`]: ../../s3-deploy-core/
use crate::load_config::resolve_config;
use crate::s3::S3Client;
use anyhow::Result;
use clap::builder::BoolishValueParser;
use clap::Parser;
use s3_deploy_core::bucket_name::resolve_bucket_name;
use s3_deploy_core::deploy::{deploy, DeployReport};
use std::path::PathBuf;

/// Publish local files to an S3 bucket from a CI pipeline.
///
/// Every flag can also be set through the environment variable shown in `--help`.
/// Values given here take precedence over the `--config` file.
#[derive(Parser, Debug, Default)]
#[clap(
    name = "s3-deploy",
    version,
    about = "Publish local files to an S3 bucket, optionally creating it and enabling website hosting"
)]
pub struct Cli {
    /// Endpoint for the S3 connection (also S3_ENDPOINT)
    #[clap(long, env = "PLUGIN_ENDPOINT")]
    pub endpoint: Option<String>,

    /// AWS access key (also AWS_ACCESS_KEY_ID)
    #[clap(long, env = "PLUGIN_ACCESS_KEY", hide_env_values = true)]
    pub access_key: Option<String>,

    /// AWS secret key (also AWS_SECRET_ACCESS_KEY)
    #[clap(long, env = "PLUGIN_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Target bucket (also S3_BUCKET)
    #[clap(long, env = "PLUGIN_BUCKET")]
    pub bucket: Option<String>,

    /// AWS region [default: us-east-1] (also S3_REGION)
    #[clap(long, env = "PLUGIN_REGION")]
    pub region: Option<String>,

    /// Canned ACL for uploaded files [default: private]
    #[clap(long, env = "PLUGIN_ACL")]
    pub acl: Option<String>,

    /// Glob selecting the files to upload
    #[clap(long, env = "PLUGIN_SOURCE")]
    pub source: Option<String>,

    /// Key prefix the files are uploaded under
    #[clap(long, env = "PLUGIN_TARGET")]
    pub target: Option<String>,

    /// Prefix removed from file paths before they become keys
    #[clap(long, env = "PLUGIN_STRIP_PREFIX")]
    pub strip_prefix: Option<String>,

    /// Ignore files matching this glob; repeatable
    #[clap(long, env = "PLUGIN_EXCLUDE", value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Server-side encryption algorithm, disabled when empty
    #[clap(long, env = "PLUGIN_ENCRYPTION")]
    pub encryption: Option<String>,

    /// Use path style instead of virtual-hosted bucket addressing (MinIO)
    #[clap(long, env = "PLUGIN_PATH_STYLE", value_parser = BoolishValueParser::new(), num_args = 0..=1, default_missing_value = "true")]
    pub path_style: Option<bool>,

    /// Match and log the files without uploading them
    #[clap(long, env = "PLUGIN_DRY_RUN", value_parser = BoolishValueParser::new(), num_args = 0..=1, default_missing_value = "true")]
    pub dry_run: Option<bool>,

    /// The pipeline definition was verified; required when no access key is given
    #[clap(long, env = "DRONE_YAML_VERIFIED", value_parser = BoolishValueParser::new(), num_args = 0..=1, default_missing_value = "true")]
    pub yaml_verified: Option<bool>,

    /// Create the bucket if it does not exist yet
    #[clap(long, env = "PLUGIN_CREATE_BUCKET", value_parser = BoolishValueParser::new(), num_args = 0..=1, default_missing_value = "true")]
    pub create_bucket: Option<bool>,

    /// Append the commit branch to the bucket name
    #[clap(long, env = "PLUGIN_APPEND_BRANCH", value_parser = BoolishValueParser::new(), num_args = 0..=1, default_missing_value = "true")]
    pub append_branch: Option<bool>,

    /// Prefix removed from the branch name before it is appended (also BRANCH_PREFIX_RM)
    #[clap(long, env = "PLUGIN_PREFIX_RM")]
    pub branch_prefix_strip: Option<String>,

    /// Commit branch name
    #[clap(long, env = "DRONE_COMMIT_BRANCH")]
    pub commit_branch: Option<String>,

    /// Enable static website hosting on the bucket (also S3_HOSTING)
    #[clap(long, env = "PLUGIN_HOSTING", value_parser = BoolishValueParser::new(), num_args = 0..=1, default_missing_value = "true")]
    pub hosting: Option<bool>,

    /// Index document of the website configuration (also S3_INDEX_DOCUMENT)
    #[clap(long, env = "PLUGIN_INDEX_DOCUMENT")]
    pub index_document: Option<String>,

    /// Error document of the website configuration (also S3_ERROR_DOCUMENT)
    #[clap(long, env = "PLUGIN_ERROR_DOCUMENT")]
    pub error_document: Option<String>,

    /// YAML file providing defaults for any of the settings above
    #[clap(long, env = "PLUGIN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Env file loaded before the flags are resolved
    #[clap(long)]
    pub env_file: Option<PathBuf>,
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<DeployReport> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "s3-deploy starting");

    let config = resolve_config(&cli)?;
    config.trace_loaded();

    // Fails before the client (and its credential chain) is touched.
    config.verify_credentials()?;

    let store = S3Client::new(&config).await;
    match deploy(&config, &store).await {
        Ok(report) => {
            tracing::info!(
                bucket = %report.bucket,
                uploaded = report.uploaded.len(),
                bucket_created = report.bucket_created,
                website_url = ?report.website_url,
                "Deploy complete"
            );
            match serde_json::to_string_pretty(&report) {
                Ok(json) => tracing::debug!(json = %json, "Deploy report"),
                Err(e) => tracing::error!(error = ?e, "Failed to serialize deploy report"),
            }
            Ok(report)
        }
        Err(e) => {
            tracing::error!(
                bucket = %resolve_bucket_name(&config),
                error = %e,
                "Deploy failed"
            );
            Err(e.into())
        }
    }
}
