#![doc = "s3-deploy-core: core pipeline for publishing local files to an object-storage bucket."]

//! This crate holds every step of a deploy run: resolving the effective bucket
//! name, matching files, provisioning the bucket, configuring static website
//! hosting and uploading. Storage access goes through the [`contract::ObjectStore`]
//! trait; the concrete S3 client lives in the `s3-deploy` binary crate.
//!
//! # Usage
//! Build a [`config::DeployConfig`] and hand it to [`deploy::deploy`] together with
//! an `ObjectStore` implementation.

pub mod bucket_name;
pub mod config;
pub mod contract;
pub mod deploy;
pub mod error;
pub mod matcher;
pub mod provision;
pub mod upload;
pub mod website;

pub use config::DeployConfig;
pub use contract::{ObjectStore, StoreError, UploadRecord, WebsiteConfig};
pub use deploy::{deploy, DeployReport};
pub use error::DeployError;
