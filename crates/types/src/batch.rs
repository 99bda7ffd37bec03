//! Batch entity (§3) and its Merkle/anchoring lifecycle.

use crate::ids::{BatchId, TemplateId, TenantId};

/// Document/invalidation expiry pair, 0 meaning "lifetime" (§3, §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct Expiries {
    /// Document-expiry, epoch seconds. `None` encodes to 0 on the wire.
    pub document_expiry: Option<i64>,
    /// Invalidation-expiry, epoch seconds. `None` encodes to 0 on the wire.
    pub invalidation_expiry: Option<i64>,
}

/// Merkle commitment state for a batch. Once `intermediate` is set it is
/// immutable (invariant i); once `ultimate` is set `ultimate_proof` is
/// non-null (invariant ii).
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BatchMerkleState {
    /// MRI, hex-encoded, no `0x` prefix.
    pub intermediate_root: Option<String>,
    /// MRU, hex-encoded, no `0x` prefix.
    pub ultimate_root: Option<String>,
    /// MPU: sibling hashes from MRI up to MRU, hex-encoded.
    pub ultimate_proof: Option<Vec<String>>,
}

impl BatchMerkleState {
    pub fn has_intermediate(&self) -> bool {
        self.intermediate_root.is_some()
    }

    pub fn has_ultimate(&self) -> bool {
        self.ultimate_root.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChainAnchorState {
    pub tx_hash: Option<String>,
    pub network: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SigningStatus {
    PendingSigning,
    Signed,
    Finalized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BatchStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Batch {
    pub id: BatchId,
    pub tenant_id: TenantId,
    pub template_id: TemplateId,
    pub status: BatchStatus,
    pub expiries: Expiries,
    /// Nullable; may be auto-captured from the first valid signature.
    pub issuer_public_key: Option<String>,
    pub merkle: BatchMerkleState,
    pub chain: ChainAnchorState,
    pub signing_status: SigningStatus,
    /// Unix seconds; set when `signing_status` transitions to `Finalized`.
    pub finalized_at: Option<i64>,
}

impl Batch {
    pub fn new(tenant_id: TenantId, template_id: TemplateId) -> Self {
        Self {
            id: BatchId::new(),
            tenant_id,
            template_id,
            status: BatchStatus::Pending,
            expiries: Expiries::default(),
            issuer_public_key: None,
            merkle: BatchMerkleState::default(),
            chain: ChainAnchorState::default(),
            signing_status: SigningStatus::PendingSigning,
            finalized_at: None,
        }
    }

    /// Invariant (iii): `status == Completed` implies every job has an
    /// augmented PDF and `tx_hash` is set. Callers combine this with the
    /// job list before flipping status; this just checks the chain half.
    pub fn can_complete(&self) -> bool {
        self.chain.tx_hash.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_batch_starts_pending_signing() {
        let b = Batch::new(TenantId::new(), TemplateId::new());
        assert_eq!(b.signing_status, SigningStatus::PendingSigning);
        assert!(!b.merkle.has_intermediate());
        assert!(!b.can_complete());
    }
}
