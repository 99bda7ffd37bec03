//! The Verification Bundle (VD, spec §6): the canonical JSON object
//! embedded in augmented PDFs and returned over the wire.

use serde::{Deserialize, Serialize};

pub const ORIGINAL_PDF_ATTACHMENT_NAME: &str = "Justifai_Original_PDF.pdf";
pub const VERIFICATION_BUNDLE_ATTACHMENT_NAME: &str = "Justifai_Verification_Bundle.json";
/// Pre-Justifai-2 deployments used this name; §4.9 step 1 still recognizes it.
pub const LEGACY_ORIGINAL_PDF_NAME: &str = "original.pdf";
/// Older deployments attached under these prefixes; §4.9 step 1 still
/// recognizes them as a read-only fallback.
pub const LEGACY_ORIGINAL_PDF_PREFIXES: &[&str] = &["LegitDoc_", "QuestVerify_"];

/// The issuer name `rewrite_metadata` stamps into `Producer`/`Creator`
/// (§4.8 step 6); §4.9 step 10f accepts this or `LIBRARY_DEFAULT_PRODUCER`.
pub const KNOWN_ISSUER_PRODUCER: &str = "Justifai";
/// `lopdf`'s own identity, accepted as the "PDF library's default" producer.
pub const LIBRARY_DEFAULT_PRODUCER: &str = "lopdf";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationBundle {
    #[serde(rename = "documentHash")]
    pub document_hash: String,
    #[serde(rename = "documentFingerprint")]
    pub document_fingerprint: String,
    #[serde(rename = "fingerprintHash")]
    pub fingerprint_hash: String,
    #[serde(rename = "issuerSignature")]
    pub issuer_signature: String,
    #[serde(rename = "merkleLeaf")]
    pub merkle_leaf: String,
    /// ISO-8601 or `null` (spec §6): 0/absent expiry encodes to `None`.
    #[serde(rename = "expiryDate")]
    pub expiry_date: Option<String>,
    #[serde(rename = "invalidationExpiry")]
    pub invalidation_expiry: Option<String>,
    #[serde(rename = "issuerId")]
    pub issuer_id: String,
    #[serde(rename = "issuerPublicKey", skip_serializing_if = "Option::is_none")]
    pub issuer_public_key: Option<String>,
    #[serde(rename = "merkleProofIntermediate")]
    pub merkle_proof_intermediate: Vec<String>,
    #[serde(rename = "merkleRootIntermediate")]
    pub merkle_root_intermediate: String,
    #[serde(rename = "merkleRootUltimate")]
    pub merkle_root_ultimate: String,
    #[serde(rename = "merkleProofUltimate")]
    pub merkle_proof_ultimate: Vec<String>,
    #[serde(rename = "txHash", skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(rename = "network", skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
}

impl VerificationBundle {
    pub fn to_json(&self) -> Result<String, justifai_errors::Error> {
        serde_json::to_string(self)
            .map_err(|e| justifai_errors::Error::validation(format!("VD serialize failed: {e}")))
    }

    pub fn from_json(s: &str) -> Result<Self, justifai_errors::Error> {
        serde_json::from_str(s).map_err(|e| justifai_errors::Error::validation(format!("VD parse failed: {e}")))
    }

    /// §4.9 step 2: a JSON blob "looks like" a VD if it carries any of
    /// these keys, used to recognize VD JSON among arbitrary attachments
    /// or legacy `Subject`/`Keywords` metadata.
    pub fn looks_like_vd(value: &serde_json::Value) -> bool {
        let Some(map) = value.as_object() else {
            return false;
        };
        ["documentHash", "fingerprintHash", "merkleRootIntermediate", "issuerSignature", "merkleLeaf"]
            .iter()
            .any(|key| map.contains_key(*key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> VerificationBundle {
        VerificationBundle {
            document_hash: "a".repeat(64),
            document_fingerprint: "b".repeat(96),
            fingerprint_hash: "c".repeat(64),
            issuer_signature: "d".repeat(128),
            merkle_leaf: "e".repeat(64),
            expiry_date: None,
            invalidation_expiry: None,
            issuer_id: "issuer-1".into(),
            issuer_public_key: Some("02".to_string() + &"11".repeat(32)),
            merkle_proof_intermediate: vec!["f".repeat(64)],
            merkle_root_intermediate: "22".repeat(32),
            merkle_root_ultimate: "33".repeat(32),
            merkle_proof_ultimate: vec!["44".repeat(32)],
            tx_hash: Some("55".repeat(32)),
            network: Some("polygon-amoy".into()),
        }
    }

    #[test]
    fn round_trips_through_json() {
        let vd = sample();
        let json = vd.to_json().unwrap();
        let parsed = VerificationBundle::from_json(&json).unwrap();
        assert_eq!(parsed.document_hash, vd.document_hash);
        assert_eq!(parsed.merkle_proof_intermediate, vd.merkle_proof_intermediate);
    }

    #[test]
    fn looks_like_vd_detects_any_marker_key() {
        let value = serde_json::json!({"documentHash": "x"});
        assert!(VerificationBundle::looks_like_vd(&value));

        let not_vd = serde_json::json!({"unrelated": true});
        assert!(!VerificationBundle::looks_like_vd(&not_vd));
    }
}
