//! Storage gateway (spec §4.5): two drivers behind one trait, keyed the
//! same way regardless of backend.

pub mod local;
pub mod s3;

use async_trait::async_trait;
use justifai_errors::Result;
use justifai_types::{BatchId, TenantId};

pub const DEFAULT_FOLDER: &str = "certificates";
pub const DEFAULT_EXTENSION: &str = ".pdf";

/// Per-call overrides; any field left `None` falls back to the defaults.
#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    pub folder: Option<String>,
    pub extension: Option<String>,
    pub content_type: Option<String>,
}

impl StoreOptions {
    pub fn folder_or_default(&self) -> &str {
        self.folder.as_deref().unwrap_or(DEFAULT_FOLDER)
    }

    pub fn extension_or_default(&self) -> &str {
        self.extension.as_deref().unwrap_or(DEFAULT_EXTENSION)
    }

    pub fn content_type_or_default(&self) -> &str {
        self.content_type.as_deref().unwrap_or("application/pdf")
    }
}

/// `{folder}/{tenantId}/{batchId}/{objectId}{ext}` (spec §4.5 keying rule).
pub fn object_key(tenant_id: TenantId, batch_id: BatchId, object_id: &str, options: &StoreOptions) -> String {
    format!(
        "{}/{}/{}/{}{}",
        options.folder_or_default(),
        tenant_id,
        batch_id,
        object_id,
        options.extension_or_default()
    )
}

#[async_trait]
pub trait StorageGateway: Send + Sync {
    async fn store(
        &self,
        bytes: bytes::Bytes,
        tenant_id: TenantId,
        batch_id: BatchId,
        object_id: &str,
        options: &StoreOptions,
    ) -> Result<String>;

    async fn retrieve(&self, relative_path: &str) -> Result<bytes::Bytes>;

    /// A URL a browser/verifier can dereference directly; purely local
    /// backends may return a `file://`-style or API-relative path instead
    /// of a world-reachable URL.
    fn public_url(&self, relative_path: &str) -> String;

    fn name(&self) -> &'static str;
}

pub use local::LocalFilesystemStorage;
pub use s3::S3Storage;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_key_uses_defaults_when_options_are_empty() {
        let tenant = TenantId::new();
        let batch = BatchId::new();
        let key = object_key(tenant, batch, "job-1", &StoreOptions::default());
        assert_eq!(key, format!("certificates/{tenant}/{batch}/job-1.pdf"));
    }

    #[test]
    fn object_key_honors_overrides() {
        let tenant = TenantId::new();
        let batch = BatchId::new();
        let options = StoreOptions {
            folder: Some("qr-embedded-certificates".into()),
            extension: Some(".png".into()),
            content_type: Some("image/png".into()),
        };
        let key = object_key(tenant, batch, "job-1", &options);
        assert_eq!(key, format!("qr-embedded-certificates/{tenant}/{batch}/job-1.png"));
    }
}
