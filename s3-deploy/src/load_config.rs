/// `load_config` module: turns CLI flags, environment aliases and an optional YAML
/// file into the immutable `DeployConfig` used for the run.
///
/// This module is the only place where untrusted YAML is parsed.
///
/// # Precedence
/// For each setting the first available value wins:
///   1. the flag, or its primary `PLUGIN_*` environment variable (resolved by clap)
///   2. the secondary environment variable (`S3_BUCKET`, `AWS_ACCESS_KEY_ID`, ...)
///   3. the YAML config file
///   4. the built-in default
///
/// # Errors
/// All errors in this module use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::Result;
use s3_deploy_core::config::{DeployConfig, DEFAULT_ACL, DEFAULT_REGION};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{error, info};

use crate::cli::Cli;

/// Settings accepted in the YAML config file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub bucket: Option<String>,
    pub region: Option<String>,
    pub acl: Option<String>,
    pub source: Option<String>,
    pub target: Option<String>,
    pub strip_prefix: Option<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    pub encryption: Option<String>,
    pub path_style: Option<bool>,
    pub dry_run: Option<bool>,
    pub create_bucket: Option<bool>,
    pub append_branch: Option<bool>,
    pub branch_prefix_strip: Option<String>,
    pub hosting: Option<bool>,
    pub index_document: Option<String>,
    pub error_document: Option<String>,
}

/// Loads a YAML config file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FileConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    match serde_yaml::from_str::<Option<FileConfig>>(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            Ok(conf.unwrap_or_default())
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

/// Merges flags, environment aliases, the optional config file and defaults.
///
/// `yaml_verified` and `commit_branch` are only taken from flags or the CI
/// environment, never from the file.
pub fn resolve_config(cli: &Cli) -> Result<DeployConfig> {
    let file = match &cli.config {
        Some(path) => load_config(path)?,
        None => FileConfig::default(),
    };

    let bucket = pick(&cli.bucket, &["S3_BUCKET"], file.bucket);
    let source = cli.source.clone().or(file.source);

    let (bucket, source) = match (bucket, source) {
        (Some(bucket), Some(source)) if !bucket.is_empty() && !source.is_empty() => {
            (bucket, source)
        }
        (bucket, _) => {
            let missing = if bucket.map_or(true, |b| b.is_empty()) {
                "bucket (--bucket / PLUGIN_BUCKET)"
            } else {
                "source (--source / PLUGIN_SOURCE)"
            };
            error!(missing, "Required setting not provided");
            anyhow::bail!("Missing required setting: {missing}");
        }
    };

    let exclude = if cli.exclude.is_empty() {
        file.exclude
    } else {
        cli.exclude.clone()
    };

    let config = DeployConfig {
        endpoint: pick(&cli.endpoint, &["S3_ENDPOINT"], file.endpoint).unwrap_or_default(),
        access_key: pick(&cli.access_key, &["AWS_ACCESS_KEY_ID"], file.access_key),
        secret_key: pick(&cli.secret_key, &["AWS_SECRET_ACCESS_KEY"], file.secret_key),
        bucket,
        region: pick(&cli.region, &["S3_REGION"], file.region)
            .unwrap_or_else(|| DEFAULT_REGION.to_string()),
        acl: cli
            .acl
            .clone()
            .or(file.acl)
            .unwrap_or_else(|| DEFAULT_ACL.to_string()),
        source,
        target: cli.target.clone().or(file.target).unwrap_or_default(),
        strip_prefix: cli.strip_prefix.clone().or(file.strip_prefix).unwrap_or_default(),
        exclude,
        encryption: cli
            .encryption
            .clone()
            .or(file.encryption)
            .filter(|alg| !alg.is_empty()),
        path_style: cli.path_style.or(file.path_style).unwrap_or(false),
        dry_run: cli.dry_run.or(file.dry_run).unwrap_or(false),
        yaml_verified: cli.yaml_verified.unwrap_or(false),
        create_bucket: cli.create_bucket.or(file.create_bucket).unwrap_or(false),
        append_branch: cli.append_branch.or(file.append_branch).unwrap_or(false),
        branch_prefix_strip: pick(
            &cli.branch_prefix_strip,
            &["BRANCH_PREFIX_RM"],
            file.branch_prefix_strip,
        )
        .unwrap_or_default(),
        commit_branch: cli.commit_branch.clone().unwrap_or_default(),
        hosting: pick_bool(cli.hosting, &["S3_HOSTING"], file.hosting).unwrap_or(false),
        index_document: pick(&cli.index_document, &["S3_INDEX_DOCUMENT"], file.index_document)
            .unwrap_or_default(),
        error_document: pick(&cli.error_document, &["S3_ERROR_DOCUMENT"], file.error_document)
            .unwrap_or_default(),
    };

    Ok(config)
}

/// First non-empty value of: the flag, the alias environment variables in order,
/// the file value.
fn pick(flag: &Option<String>, aliases: &[&str], file: Option<String>) -> Option<String> {
    flag.clone()
        .filter(|v| !v.is_empty())
        .or_else(|| aliases.iter().find_map(|name| env_value(name)))
        .or(file)
}

fn pick_bool(flag: Option<bool>, aliases: &[&str], file: Option<bool>) -> Option<bool> {
    flag.or_else(|| {
        aliases
            .iter()
            .find_map(|name| env_value(name).and_then(|v| parse_bool(&v)))
    })
    .or(file)
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Same spellings clap's boolish parser accepts.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "t" | "true" | "on" | "1" => Some(true),
        "n" | "no" | "f" | "false" | "off" | "0" => Some(false),
        _ => None,
    }
}
