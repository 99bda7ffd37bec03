//! Blockchain anchor client (spec §4.7): submit `MRU` to the anchor
//! contract under an EIP-1559 fee policy, and independently verify a
//! submitted transaction by reading back the `MerkleRootSubmitted` event.

pub mod contract;
pub mod fees;

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, TxHash, B256, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::BlockNumberOrTag;
use alloy::signers::local::PrivateKeySigner;
use contract::{AnchorStore, ContractType};
use fees::{compute_fees, FeePolicyInput, DEFAULT_MIN_PRIORITY_FEE_GWEI};
use justifai_errors::{Error, Result};

#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub private_key: String,
    pub anchorstore_address: Address,
    pub contract_type: ContractType,
    pub chain_id: u64,
    pub min_priority_fee_gwei: u64,
    pub min_max_fee_gwei: Option<u64>,
    /// Shown in `verifyTransaction`'s `explorerUrl`; `None` suppresses it.
    pub explorer_base_url: Option<String>,
    pub network_name: String,
}

impl ChainConfig {
    pub fn min_priority_fee_gwei_or_default(&self) -> u64 {
        if self.min_priority_fee_gwei == 0 {
            DEFAULT_MIN_PRIORITY_FEE_GWEI
        } else {
            self.min_priority_fee_gwei
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnchorResult {
    pub tx_hash: TxHash,
    pub network: String,
    pub block_number: u64,
}

#[derive(Debug, Clone)]
pub struct SubmittedEvent {
    pub time_window: U256,
    pub root: B256,
    pub issuer: Address,
    pub block_number: U256,
}

#[derive(Debug, Clone)]
pub struct VerifyResult {
    pub verified: bool,
    pub block_number: Option<u64>,
    pub mru_from_event: Option<B256>,
    pub mru_matches: Option<bool>,
    pub explorer_url: Option<String>,
}

pub struct ChainAnchor {
    config: ChainConfig,
    provider: Box<dyn Provider + Send + Sync>,
}

impl ChainAnchor {
    pub async fn connect(config: ChainConfig) -> Result<Self> {
        let signer: PrivateKeySigner = config
            .private_key
            .parse()
            .map_err(|e| Error::configuration(format!("invalid PRIVATE_KEY: {e}")))?;
        let wallet = EthereumWallet::from(signer);
        let url = config
            .rpc_url
            .parse()
            .map_err(|e| Error::configuration(format!("invalid RPC_URL: {e}")))?;
        let provider = ProviderBuilder::new().wallet(wallet).connect_http(url);
        Ok(Self {
            config,
            provider: Box::new(provider),
        })
    }

    /// `anchor(mruBytes32, timeWindow)` (§4.7). `mru` must be exactly 32
    /// bytes; `time_window` is seconds-since-epoch of the oldest batch in
    /// the ultimate set being anchored.
    pub async fn anchor(&self, mru: [u8; 32], time_window: u64) -> Result<AnchorResult> {
        let root = B256::from(mru);
        let time_window_u256 = U256::from(time_window);

        let base_fee = self.latest_base_fee().await?;
        let suggested_priority = self
            .provider
            .get_max_priority_fee_per_gas()
            .await
            .map_err(|e| Error::chain(format!("failed to read suggested priority fee: {e}")))?;

        let fees = compute_fees(&FeePolicyInput {
            suggested_priority_fee: suggested_priority,
            base_fee,
            min_priority_fee_gwei: self.config.min_priority_fee_gwei_or_default(),
            min_max_fee_gwei: self.config.min_max_fee_gwei,
        });

        let contract = AnchorStore::new(self.config.anchorstore_address, &self.provider);
        let call = match self.config.contract_type {
            ContractType::Legacy => contract.putRootLegacy(time_window_u256, root),
            ContractType::EmitOnly => contract.putRootEmitOnly(time_window_u256, root),
        };

        let pending = call
            .max_fee_per_gas(fees.max_fee_per_gas.to::<u128>())
            .max_priority_fee_per_gas(fees.max_priority_fee_per_gas.to::<u128>())
            .send()
            .await
            .map_err(|e| Error::chain(format!("anchor submission failed: {e}")))?;

        // Wait for 1 confirmation (§4.7).
        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| Error::chain(format!("failed waiting for anchor confirmation: {e}")))?;

        if !receipt.status() {
            return Err(Error::chain("anchor transaction reverted"));
        }

        Ok(AnchorResult {
            tx_hash: receipt.transaction_hash,
            network: self.config.network_name.clone(),
            block_number: receipt.block_number.unwrap_or_default(),
        })
    }

    async fn latest_base_fee(&self) -> Result<U256> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await
            .map_err(|e| Error::chain(format!("failed to read latest block: {e}")))?
            .ok_or_else(|| Error::chain("latest block unavailable"))?;
        let base_fee = block.header.base_fee_per_gas.unwrap_or_default();
        Ok(U256::from(base_fee))
    }

    /// `verifyTransaction(txHash, expectedMRU?)` (§4.7, spec §4.9 step 9).
    /// Checks existence and success status, then parses the
    /// `MerkleRootSubmitted` event to recover the anchored root. If
    /// `expected_mru` is supplied, a mismatch forces `verified = false`.
    pub async fn verify_transaction(&self, tx_hash: TxHash, expected_mru: Option<[u8; 32]>) -> Result<VerifyResult> {
        let Some(receipt) = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| Error::chain(format!("failed to fetch transaction receipt: {e}")))?
        else {
            return Ok(VerifyResult {
                verified: false,
                block_number: None,
                mru_from_event: None,
                mru_matches: None,
                explorer_url: self.explorer_url(tx_hash),
            });
        };

        if !receipt.status() {
            return Ok(VerifyResult {
                verified: false,
                block_number: receipt.block_number,
                mru_from_event: None,
                mru_matches: None,
                explorer_url: self.explorer_url(tx_hash),
            });
        }

        let mru_from_event = receipt
            .inner
            .logs()
            .iter()
            .find_map(|log| AnchorStore::MerkleRootSubmitted::decode_log(&log.inner).ok())
            .map(|decoded| decoded.data.root);

        let mru_matches = match (expected_mru, mru_from_event) {
            (Some(expected), Some(found)) => Some(B256::from(expected) == found),
            (Some(_), None) => Some(false),
            (None, _) => None,
        };

        let verified = mru_from_event.is_some() && mru_matches != Some(false);

        Ok(VerifyResult {
            verified,
            block_number: receipt.block_number,
            mru_from_event,
            mru_matches,
            explorer_url: self.explorer_url(tx_hash),
        })
    }

    fn explorer_url(&self, tx_hash: TxHash) -> Option<String> {
        self.config
            .explorer_base_url
            .as_ref()
            .map(|base| format!("{}/tx/{tx_hash}", base.trim_end_matches('/')))
    }
}
