//! S3 implementation of the core `ObjectStore` trait

use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::client::Waiters;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CreateBucketConfiguration, ErrorDocument, IndexDocument,
    ObjectCannedAcl, ServerSideEncryption, WebsiteConfiguration,
};
use aws_sdk_s3::Client;
use s3_deploy_core::config::{DeployConfig, DEFAULT_REGION};
use s3_deploy_core::contract::{ObjectStore, StoreError, UploadRecord, WebsiteConfig};
use tracing::{debug, info};

const NO_SUCH_WEBSITE_CONFIGURATION: &str = "NoSuchWebsiteConfiguration";
const BUCKET_WAIT_TIMEOUT_SECS: u64 = 5 * 60;
const CREDENTIALS_PROVIDER_NAME: &str = "s3-deploy";

/// S3 client bound to the region and endpoint of one deploy run
pub struct S3Client {
    client: Client,
    region: String,
}

impl S3Client {
    /// Creates a new client from the run configuration.
    ///
    /// Static credentials are used when both access key and secret are set;
    /// otherwise the default provider chain (environment, profile, instance role)
    /// applies. Callers are expected to have run
    /// [`DeployConfig::verify_credentials`] first.
    pub async fn new(config: &DeployConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let Some((access_key, secret_key)) = config.static_credentials() {
            loader = loader.credentials_provider(Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                CREDENTIALS_PROVIDER_NAME,
            ));
        }

        if !config.endpoint.is_empty() {
            loader = loader.endpoint_url(&config.endpoint);
        }

        let sdk_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.path_style)
            .build();

        info!(
            region = %config.region,
            endpoint = %config.endpoint,
            path_style = config.path_style,
            static_credentials = config.static_credentials().is_some(),
            "Initialized S3 client"
        );

        Self::with_client(Client::from_conf(s3_config), config.region.clone())
    }

    /// Wraps an already configured SDK client.
    pub fn with_client(client: Client, region: impl Into<String>) -> Self {
        Self {
            client,
            region: region.into(),
        }
    }
}

/// Object keys are absolute-style (`/web/index.html`); S3 stores them without
/// the leading `/`.
fn object_key(key: &str) -> &str {
    key.trim_start_matches('/')
}

fn service_error<E, R>(error: SdkError<E, R>) -> StoreError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    StoreError::Service(DisplayErrorContext(error).to_string())
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn list_buckets(&self) -> Result<Vec<String>, StoreError> {
        let output = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(service_error)?;

        let names: Vec<String> = output
            .buckets()
            .iter()
            .filter_map(|bucket| bucket.name().map(str::to_owned))
            .collect();
        debug!(count = names.len(), "Listed buckets");
        Ok(names)
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), StoreError> {
        let mut request = self.client.create_bucket().bucket(bucket);

        // us-east-1 rejects an explicit location constraint
        if self.region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }

        request.send().await.map_err(service_error)?;
        Ok(())
    }

    async fn wait_until_bucket_exists(&self, bucket: &str) -> Result<(), StoreError> {
        self.client
            .wait_until_bucket_exists()
            .bucket(bucket)
            .wait(Duration::from_secs(BUCKET_WAIT_TIMEOUT_SECS))
            .await
            .map_err(|e| StoreError::Service(e.to_string()))?;
        Ok(())
    }

    async fn get_bucket_website(&self, bucket: &str) -> Result<WebsiteConfig, StoreError> {
        match self.client.get_bucket_website().bucket(bucket).send().await {
            Ok(output) => Ok(WebsiteConfig {
                index_document: output.index_document().map(|doc| doc.suffix().to_owned()),
                error_document: output.error_document().map(|doc| doc.key().to_owned()),
            }),
            Err(e) => {
                let code = e.as_service_error().and_then(|err| err.code());
                if code == Some(NO_SUCH_WEBSITE_CONFIGURATION) {
                    Err(StoreError::NotConfigured)
                } else {
                    Err(service_error(e))
                }
            }
        }
    }

    async fn put_bucket_website(
        &self,
        bucket: &str,
        config: &WebsiteConfig,
    ) -> Result<(), StoreError> {
        let mut website = WebsiteConfiguration::builder();

        if let Some(suffix) = &config.index_document {
            let index = IndexDocument::builder()
                .suffix(suffix)
                .build()
                .map_err(|e| StoreError::InvalidRequest(e.to_string()))?;
            website = website.index_document(index);
        }

        if let Some(key) = &config.error_document {
            let error = ErrorDocument::builder()
                .key(key)
                .build()
                .map_err(|e| StoreError::InvalidRequest(e.to_string()))?;
            website = website.error_document(error);
        }

        self.client
            .put_bucket_website()
            .bucket(bucket)
            .website_configuration(website.build())
            .send()
            .await
            .map_err(service_error)?;
        Ok(())
    }

    async fn put_object(&self, record: UploadRecord) -> Result<(), StoreError> {
        let UploadRecord {
            source,
            bucket,
            key,
            content_type,
            acl,
            encryption,
            body,
        } = record;

        let body = ByteStream::read_from()
            .file(body)
            .build()
            .await
            .map_err(|e| StoreError::Service(format!("reading {}: {e}", source.display())))?;

        let mut request = self
            .client
            .put_object()
            .bucket(bucket)
            .key(object_key(&key))
            .acl(ObjectCannedAcl::from(acl.as_str()))
            .content_type(content_type)
            .body(body);

        if let Some(algorithm) = encryption {
            request = request.server_side_encryption(ServerSideEncryption::from(algorithm.as_str()));
        }

        request.send().await.map_err(service_error)?;
        Ok(())
    }
}
