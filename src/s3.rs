//! S3-compatible object storage for the published stats history.
//!
//! Credentials and region come from the usual AWS environment/profile chain.
//! A custom endpoint (`S3_ENDPOINT`) switches to path-style addressing so
//! MinIO, R2 and similar services work too.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;

#[derive(Debug, thiserror::Error)]
pub enum S3Error {
    /// `GetObject` failed or the body could not be read.
    #[error("Failed to download s3://{bucket}/{key}: {source}")]
    Download {
        bucket: String,
        key: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// `PutObject` failed.
    #[error("Failed to upload s3://{bucket}/{key}: {source}")]
    Upload {
        bucket: String,
        key: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Minimal key/value view of a bucket.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Vec<u8>, S3Error>;
    async fn put(&self, key: &str, body: Vec<u8>) -> Result<(), S3Error>;
}

pub struct S3Store {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_read: bool,
}

impl S3Store {
    pub async fn connect(bucket: &str, endpoint: Option<&str>, public_read: bool) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(endpoint) = endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let shared = loader.load().await;

        let config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(endpoint.is_some())
            .build();

        Self {
            client: aws_sdk_s3::Client::from_conf(config),
            bucket: bucket.to_string(),
            public_read,
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn get(&self, key: &str) -> Result<Vec<u8>, S3Error> {
        let download_error = |source: Box<dyn std::error::Error + Send + Sync>| S3Error::Download {
            bucket: self.bucket.clone(),
            key: key.to_string(),
            source,
        };

        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| download_error(Box::new(e)))?;

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| download_error(Box::new(e)))?;

        Ok(bytes.into_bytes().to_vec())
    }

    async fn put(&self, key: &str, body: Vec<u8>) -> Result<(), S3Error> {
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type("application/json");

        if self.public_read {
            request = request.acl(ObjectCannedAcl::PublicRead);
        }

        request.send().await.map_err(|e| S3Error::Upload {
            bucket: self.bucket.clone(),
            key: key.to_string(),
            source: Box::new(e),
        })?;

        Ok(())
    }
}
