//! Shared composition-root wiring for the three binaries in this crate:
//! build the same gateway set from [`justifai_config::Config`] that the
//! issuer daemon, offline verifier, and sign-intake helper each need a
//! subset of.

use std::sync::Arc;

use justifai_chain::{ChainAnchor, ChainConfig};
use justifai_config::{Config, StorageDriver};
use justifai_errors::{Error, Result};
use justifai_storage::{LocalFilesystemStorage, S3Storage, StorageGateway};

/// Builds the configured storage driver. Local defaults to `./data` when
/// `STORAGE_PATH` is unset; S3 requires AWS credentials in the ambient
/// environment (instance profile, env vars, or `~/.aws`).
pub async fn build_storage(config: &Config) -> Result<Arc<dyn StorageGateway>> {
    match config.storage.driver {
        StorageDriver::Local => {
            let root = config.storage.storage_path.clone().unwrap_or_else(|| "./data".to_string());
            Ok(Arc::new(LocalFilesystemStorage::new(root)))
        }
        StorageDriver::S3 => {
            let bucket = config
                .storage
                .s3_bucket_name
                .clone()
                .ok_or_else(|| Error::configuration("S3_BUCKET_NAME is required when STORAGE_DRIVER=s3"))?;
            let storage = S3Storage::from_env(bucket, config.storage.aws_endpoint.as_deref()).await;
            Ok(Arc::new(storage))
        }
    }
}

/// Connects to the anchor contract's RPC endpoint. Callers that can run
/// without an anchorer (pure offline verification) should treat a
/// connection error as non-fatal and log instead of propagating.
pub async fn build_chain(config: &Config) -> Result<ChainAnchor> {
    let anchorstore_address = config
        .chain
        .anchorstore_address
        .parse()
        .map_err(|e| Error::configuration(format!("invalid ANCHORSTORE_ADDRESS: {e}")))?;

    let chain_config = ChainConfig {
        rpc_url: config.chain.rpc_url.clone(),
        private_key: config.chain.private_key.clone(),
        anchorstore_address,
        contract_type: config.chain.contract_type,
        chain_id: config.chain.chain_id,
        min_priority_fee_gwei: config.chain.min_priority_fee_gwei,
        min_max_fee_gwei: config.chain.min_max_fee_gwei,
        explorer_base_url: config.chain.explorer_base_url.clone(),
        network_name: config.chain.network_name.clone(),
    };
    ChainAnchor::connect(chain_config).await
}
