// ai
//! 🪣📡 S3 Store: create-if-absent buckets and `raw/` uploads.
//!
//! COLD OPEN. EXT. DATA CENTER. 12:07 AM
//!
//! The CSV is on disk. The bucket might be in the cloud. Nobody is sure.
//! The gateway sends a HEAD request into the dark and waits. A 404 comes back.
//! "Fine," it says, and builds the bucket itself. Then it uploads the file
//! under `raw/` and goes back to sleep until tomorrow.
//!
//! 🧠 Knowledge graph:
//! - `StorageConfig`: bucket, optional static credentials, region, optional endpoint. Co-located here.
//! - `S3Store::connect`: static credentials when both halves are configured, the AWS
//!   default chain (env vars, ~/.aws, IAM role) otherwise.
//! - `ensure_bucket`: HEAD, then CREATE on 404. "Already owned by you" counts as already there.
//! - `put_object`: reads the local file first. A missing file is `StoreError::NotFound`
//!   and never reaches the network.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::{
    Client,
    config::{BehaviorVersion, Credentials, Region, timeout::TimeoutConfig},
    error::DisplayErrorContext,
    primitives::ByteStream,
    types::{BucketLocationConstraint, CreateBucketConfiguration},
};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::backends::{BucketState, ObjectStore, remote_key};
use crate::errors::StoreError;

// -- 🏖️ the one region where CreateBucket must NOT carry a location constraint
const DEFAULT_REGION: &str = "us-east-1";

// ============================================================
//  🔧 StorageConfig: where the artifact retires to
// ============================================================

/// 🔧 Object store settings.
///
/// `access_key_id` and `secret_access_key` travel as a pair. Leave both out and
/// the AWS default credential chain takes over.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub bucket: String,
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
    #[serde(default = "default_region")]
    pub region: String,
    /// 🧪 MinIO, localstack, or a mock server. `None` means real AWS.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub path_style: bool,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

// ============================================================
//  🪣 S3Store
// ============================================================

#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
    region: String,
}

impl S3Store {
    /// 🔌 Build a client. Nothing goes over the wire here; a bad credential shows
    /// up on the first request, not on connect.
    pub async fn connect(config: &StorageConfig) -> Result<Self, StoreError> {
        let the_timeouts = TimeoutConfig::builder()
            .connect_timeout(Duration::from_secs(10))
            .build();

        let mut the_builder = match (&config.access_key_id, &config.secret_access_key) {
            (Some(access_key_id), Some(secret_access_key)) => {
                let the_credentials = Credentials::new(
                    access_key_id,
                    secret_access_key,
                    None,
                    None,
                    "rdx-static",
                );
                aws_sdk_s3::Config::builder()
                    .behavior_version(BehaviorVersion::latest())
                    .credentials_provider(the_credentials)
                    .region(Region::new(config.region.clone()))
            }
            (None, None) => {
                debug!("🔑 no static credentials configured, asking the AWS default chain");
                let the_sdk_config = aws_config::defaults(BehaviorVersion::latest())
                    .region(Region::new(config.region.clone()))
                    .load()
                    .await;
                aws_sdk_s3::config::Builder::from(&the_sdk_config)
            }
            _ => {
                return Err(StoreError::Connect(
                    "storage.access_key_id and storage.secret_access_key must be set together"
                        .to_string(),
                ));
            }
        };

        the_builder = the_builder
            .timeout_config(the_timeouts)
            .force_path_style(config.path_style);
        if let Some(endpoint) = &config.endpoint {
            the_builder = the_builder.endpoint_url(endpoint);
        }

        info!(
            "🪣 S3 client ready (region: {}, endpoint: {})",
            config.region,
            config.endpoint.as_deref().unwrap_or("aws")
        );

        Ok(Self {
            client: Client::from_conf(the_builder.build()),
            region: config.region.clone(),
        })
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    #[instrument(skip(self))]
    async fn ensure_bucket(&self, bucket: &str) -> Result<BucketState, StoreError> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => {
                info!("🪣 Bucket '{bucket}' already exists");
                return Ok(BucketState::AlreadyExists);
            }
            Err(err) => {
                let the_bucket_is_missing = err
                    .as_service_error()
                    .is_some_and(|service| service.is_not_found())
                    || err.raw_response().map(|raw| raw.status().as_u16()) == Some(404);
                if !the_bucket_is_missing {
                    return Err(StoreError::Bucket {
                        bucket: bucket.to_string(),
                        reason: DisplayErrorContext(&err).to_string(),
                    });
                }
            }
        }

        let mut the_request = self.client.create_bucket().bucket(bucket);
        if self.region != DEFAULT_REGION {
            the_request = the_request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }

        match the_request.send().await {
            Ok(_) => {
                info!("🪣 Bucket '{bucket}' created");
                Ok(BucketState::Created)
            }
            // -- lost a race with ourselves. still ours, still there.
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|service| service.is_bucket_already_owned_by_you()) =>
            {
                info!("🪣 Bucket '{bucket}' already exists");
                Ok(BucketState::AlreadyExists)
            }
            Err(err) => Err(StoreError::Bucket {
                bucket: bucket.to_string(),
                reason: DisplayErrorContext(&err).to_string(),
            }),
        }
    }

    #[instrument(skip(self))]
    async fn put_object(
        &self,
        local_path: &Path,
        bucket: &str,
        remote_name: &str,
    ) -> Result<String, StoreError> {
        let the_bytes = match tokio::fs::read(local_path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    path: local_path.to_path_buf(),
                });
            }
            Err(err) => {
                return Err(StoreError::Read {
                    path: local_path.to_path_buf(),
                    source: err,
                });
            }
        };

        let the_key = remote_key(remote_name);
        debug!(
            "📦 uploading {} bytes to s3://{}/{}",
            the_bytes.len(),
            bucket,
            the_key
        );

        self.client
            .put_object()
            .bucket(bucket)
            .key(&the_key)
            .content_type("text/csv")
            .body(ByteStream::from(the_bytes))
            .send()
            .await
            .map_err(|err| StoreError::Transport {
                key: the_key.clone(),
                reason: DisplayErrorContext(&err).to_string(),
            })?;

        info!("✅ Uploaded s3://{bucket}/{the_key}");
        Ok(the_key)
    }
}
