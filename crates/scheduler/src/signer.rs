//! Issuing/holding signing keys is a Non-goal (spec §1) — this crate never
//! touches a private key. A batch's "auto-signing key" (P1's optional
//! immediate-sign path) is therefore an external collaborator interface
//! only; the composition root wires in whatever key-custody mechanism its
//! deployment uses, or leaves it unset so every job waits on P2 intake.

use async_trait::async_trait;
use justifai_types::Batch;

#[derive(Debug, Clone)]
pub struct AutoSignature {
    /// `SI`, hex, no `0x` prefix.
    pub signature: String,
    pub public_key: String,
}

#[async_trait]
pub trait AutoSigner: Send + Sync {
    /// Returns `Some` if `batch` has a configured auto-signing key, signing
    /// `fingerprint_hash_hex` (`H(DI)`) immediately; `None` means P1 should
    /// leave the job in `PendingSigning` for external P2 intake.
    async fn try_sign(&self, batch: &Batch, fingerprint_hash_hex: &str) -> Option<AutoSignature>;
}

/// Always defers to P2 external intake. The default when no auto-signing
/// collaborator is configured.
pub struct NoAutoSigner;

#[async_trait]
impl AutoSigner for NoAutoSigner {
    async fn try_sign(&self, _batch: &Batch, _fingerprint_hash_hex: &str) -> Option<AutoSignature> {
        None
    }
}
