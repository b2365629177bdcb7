use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::info;

use crate::backend::ObjectBackend;
use crate::error::StorageError;

/// S3-compatible backend.
///
/// The bucket is assumed to pre-exist; no existence check is made at
/// construction. Credentials come from the SDK's default provider chain.
pub(crate) struct S3Backend {
    client: Client,
    bucket: String,
}

impl S3Backend {
    /// Build a client bound to `region` (SDK default chain when absent)
    /// targeting `bucket`.
    pub(crate) async fn connect(region: Option<String>, bucket: String) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }
        let sdk_config = loader.load().await;
        let client = Client::new(&sdk_config);
        info!(bucket = %bucket, "connected S3 storage backend");

        Self { client, bucket }
    }

    fn object_uri(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, key)
    }
}

#[async_trait]
impl ObjectBackend for S3Backend {
    fn label(&self) -> &'static str {
        "AWS S3"
    }

    async fn upload(&self, key: &str, content: Vec<u8>) -> Result<String, StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(content))
            .send()
            .await
            .map_err(|err| StorageError::upload(key, DisplayErrorContext(&err)))?;

        Ok(self.object_uri(key))
    }

    async fn download(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                if let SdkError::ServiceError(context) = &err {
                    if context.err().is_no_such_key() {
                        return StorageError::NotFound(key.to_string());
                    }
                }
                StorageError::download(key, DisplayErrorContext(&err))
            })?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|err| StorageError::download(key, err))?;

        Ok(body.into_bytes().to_vec())
    }

    async fn list(&self) -> Result<Vec<String>, StorageError> {
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .into_paginator()
            .send();

        let mut keys = Vec::new();
        while let Some(page) = pages.next().await {
            let page =
                page.map_err(|err| StorageError::List(DisplayErrorContext(&err).to_string()))?;
            for object in page.contents() {
                if let Some(key) = object.key() {
                    keys.push(key.to_string());
                }
            }
        }

        Ok(keys)
    }
}
