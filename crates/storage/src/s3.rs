//! S3-compatible storage driver. Server-side encryption (AES-256) is only
//! requested against real AWS; a custom endpoint (MinIO, R2, etc. in local
//! dev/CI) disables it since those targets rarely implement SSE the same
//! way (spec §4.5).

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ServerSideEncryption;
use aws_sdk_s3::Client;
use justifai_errors::{Error, Result};
use justifai_types::{BatchId, TenantId};

use crate::{object_key, StorageGateway, StoreOptions};

pub struct S3Storage {
    client: Client,
    bucket: String,
    public_base_url: Option<String>,
    /// `true` unless a custom (non-AWS) endpoint was configured.
    use_server_side_encryption: bool,
}

impl S3Storage {
    pub fn new(client: Client, bucket: impl Into<String>, custom_endpoint_configured: bool) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            public_base_url: None,
            use_server_side_encryption: !custom_endpoint_configured,
        }
    }

    pub fn with_public_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.public_base_url = Some(base_url.into());
        self
    }

    /// Build a client from the ambient AWS config (env vars, instance
    /// profile, etc.), optionally overriding the endpoint for
    /// S3-compatible non-AWS targets.
    pub async fn from_env(bucket: impl Into<String>, custom_endpoint: Option<&str>) -> Self {
        let config = aws_config::load_from_env().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&config);
        if let Some(endpoint) = custom_endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        let client = Client::from_conf(builder.build());
        Self::new(client, bucket, custom_endpoint.is_some())
    }
}

#[async_trait]
impl StorageGateway for S3Storage {
    async fn store(
        &self,
        bytes: bytes::Bytes,
        tenant_id: TenantId,
        batch_id: BatchId,
        object_id: &str,
        options: &StoreOptions,
    ) -> Result<String> {
        let relative = object_key(tenant_id, batch_id, object_id, options);
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&relative)
            .content_type(options.content_type_or_default())
            .body(ByteStream::from(bytes));

        if self.use_server_side_encryption {
            request = request.server_side_encryption(ServerSideEncryption::Aes256);
        }

        request
            .send()
            .await
            .map_err(|e| Error::storage(format!("s3 put_object failed for {relative}: {e}")))?;
        Ok(relative)
    }

    async fn retrieve(&self, relative_path: &str) -> Result<bytes::Bytes> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(relative_path)
            .send()
            .await
            .map_err(|e| Error::storage(format!("s3 get_object failed for {relative_path}: {e}")))?;
        let data = output
            .body
            .collect()
            .await
            .map_err(|e| Error::storage(format!("s3 body read failed for {relative_path}: {e}")))?;
        Ok(data.into_bytes())
    }

    fn public_url(&self, relative_path: &str) -> String {
        match &self.public_base_url {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), relative_path),
            None => format!("https://{}.s3.amazonaws.com/{}", self.bucket, relative_path),
        }
    }

    fn name(&self) -> &'static str {
        "s3"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_url_falls_back_to_virtual_hosted_style() {
        let client = Client::from_conf(aws_sdk_s3::Config::builder().behavior_version_latest().build());
        let storage = S3Storage::new(client, "justifai-certs", false);
        assert_eq!(
            storage.public_url("certificates/t/b/j.pdf"),
            "https://justifai-certs.s3.amazonaws.com/certificates/t/b/j.pdf"
        );
    }

    #[test]
    fn public_url_uses_configured_base_when_present() {
        let client = Client::from_conf(aws_sdk_s3::Config::builder().behavior_version_latest().build());
        let storage = S3Storage::new(client, "justifai-certs", true).with_public_base_url("https://cdn.example.com/");
        assert_eq!(
            storage.public_url("certificates/t/b/j.pdf"),
            "https://cdn.example.com/certificates/t/b/j.pdf"
        );
    }
}
