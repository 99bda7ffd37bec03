//! Local filesystem storage driver.

use async_trait::async_trait;
use justifai_errors::{Error, Result};
use justifai_types::{BatchId, TenantId};
use std::path::PathBuf;

use crate::{object_key, StorageGateway, StoreOptions};

pub struct LocalFilesystemStorage {
    root: PathBuf,
}

impl LocalFilesystemStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl StorageGateway for LocalFilesystemStorage {
    async fn store(
        &self,
        bytes: bytes::Bytes,
        tenant_id: TenantId,
        batch_id: BatchId,
        object_id: &str,
        options: &StoreOptions,
    ) -> Result<String> {
        let relative = object_key(tenant_id, batch_id, object_id, options);
        let absolute = self.root.join(&relative);
        if let Some(parent) = absolute.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::storage(format!("failed to create {}: {e}", parent.display())))?;
        }
        tokio::fs::write(&absolute, &bytes)
            .await
            .map_err(|e| Error::storage(format!("failed to write {}: {e}", absolute.display())))?;
        Ok(relative)
    }

    async fn retrieve(&self, relative_path: &str) -> Result<bytes::Bytes> {
        let absolute = self.root.join(relative_path);
        let data = tokio::fs::read(&absolute)
            .await
            .map_err(|e| Error::storage(format!("failed to read {}: {e}", absolute.display())))?;
        Ok(bytes::Bytes::from(data))
    }

    fn public_url(&self, relative_path: &str) -> String {
        format!("file://{}", self.root.join(relative_path).display())
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_then_retrieve_round_trips_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFilesystemStorage::new(dir.path());
        let tenant = TenantId::new();
        let batch = BatchId::new();

        let relative = storage
            .store(
                bytes::Bytes::from_static(b"pdf-bytes"),
                tenant,
                batch,
                "job-1",
                &StoreOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(relative, format!("certificates/{tenant}/{batch}/job-1.pdf"));

        let data = storage.retrieve(&relative).await.unwrap();
        assert_eq!(&data[..], b"pdf-bytes");
    }

    #[tokio::test]
    async fn public_url_is_a_file_uri() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFilesystemStorage::new(dir.path());
        let url = storage.public_url("certificates/t/b/j.pdf");
        assert!(url.starts_with("file://"));
    }
}
