//! Tenant entity (§3).

use crate::ids::TenantId;

/// A tenant issuing certificates. Carries an optional issuer public key used
/// as the verification fallback when a batch does not specify its own.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    /// Hex-encoded secp256k1 public key, no `0x` prefix.
    pub issuer_public_key: Option<String>,
}
