use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use thiserror::Error;

const RECORD_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to encode result record: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write object '{key}': {message}")]
    Write { key: String, message: String },
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<(), StoreError>;
}

pub struct S3ObjectStore {
    bucket: String,
    s3_client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    pub fn new(s3_client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            s3_client,
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<(), StoreError> {
        self.s3_client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(RECORD_CONTENT_TYPE)
            .body(ByteStream::from(body))
            .send()
            .await
            .map(|_| ())
            .map_err(|error| StoreError::Write {
                key: key.to_string(),
                message: aws_sdk_s3::error::DisplayErrorContext(&error).to_string(),
            })
    }
}
