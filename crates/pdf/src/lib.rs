//! PDF augmentor and verifier (spec §4.8, §4.9).

pub mod augment;
pub mod bundle;
pub mod verify;

pub use augment::{augment, css_px_to_pt, AugmentInput};
pub use bundle::VerificationBundle;
pub use verify::VerifyOutcome;

use justifai_errors::Error;
use justifai_fingerprint::DocumentFingerprint;
use justifai_hash::{keccak256, to_hex};
use lopdf::Document;

/// A verified/externally-resolved on-chain check, injected by the caller
/// (the `justifai-chain` crate owns RPC access; this crate stays
/// chain-agnostic) — §4.9 step 9.
pub trait ChainVerifier {
    /// Returns `Some(mru_matches)` if the transaction was found, `None` if
    /// it could not be located at all.
    fn verify_tx(&self, tx_hash: &str, expected_mru: &str) -> Option<bool>;
}

/// Full §4.9 pipeline over a candidate PDF's raw bytes. `issuer_public_key_env`
/// is the last-resort key source (priority: VD > QR > env, step 5).
pub fn verify_pdf(
    candidate_bytes: &[u8],
    qr_issuer_public_key: Option<&str>,
    issuer_public_key_env: Option<&str>,
    chain: &dyn ChainVerifier,
) -> Result<VerifyOutcome, Error> {
    let mut outcome = VerifyOutcome::default();

    let outer_doc = Document::load_mem(candidate_bytes).map_err(|e| Error::pdf(format!("failed to parse candidate PDF: {e}")))?;

    // Step 1: extract original PDF.
    let original_bytes = verify::extract_original_pdf(&outer_doc);
    if original_bytes.is_none() {
        outcome.warnings.push("could not recover the embedded original PDF; verification continues against the outer PDF".to_string());
    }

    // Step 2: extract VD.
    let Some(vd_value) = verify::extract_verification_bundle(&outer_doc) else {
        outcome.errors.push("no verification bundle found in the candidate PDF".to_string());
        return Ok(outcome.finish());
    };
    let vd: VerificationBundle = serde_json::from_value(vd_value).map_err(|e| Error::validation(format!("VD does not match schema: {e}")))?;

    // Step 3: recompute H(d) over the recovered original, warn on mismatch.
    if let Some(original) = &original_bytes {
        let recomputed_hash = to_hex(&keccak256(original));
        if recomputed_hash != vd.document_hash {
            outcome.warn(format!(
                "recomputed document hash {recomputed_hash} does not match VD.documentHash {}",
                vd.document_hash
            ));
        }
    }

    // Step 4: rebuild DI, recompute H(DI).
    let document_hash_bytes = decode_hash32(&vd.document_hash, &mut outcome, "VD.documentHash");
    let document_expiry = parse_optional_epoch(&vd.expiry_date);
    let invalidation_expiry = parse_optional_epoch(&vd.invalidation_expiry);
    let fingerprint_hash_hex = document_hash_bytes.map(|hash| {
        let fingerprint = DocumentFingerprint::new(hash, document_expiry, invalidation_expiry);
        to_hex(&fingerprint.fingerprint_hash())
    });
    if let Some(computed) = &fingerprint_hash_hex {
        if *computed != vd.fingerprint_hash {
            outcome.error(format!(
                "recomputed H(DI) {computed} does not match VD.fingerprintHash {}",
                vd.fingerprint_hash
            ));
        }
    }

    // Step 5: verify signature, priority VD > QR > env.
    let issuer_public_key = vd.issuer_public_key.as_deref().or(qr_issuer_public_key).or(issuer_public_key_env);
    match (issuer_public_key, &fingerprint_hash_hex) {
        (Some(key), Some(hash_hex)) => {
            if !justifai_hash::verify(hash_hex, &vd.issuer_signature, key) {
                outcome.error("issuer signature does not verify against H(DI)".to_string());
            }
        }
        (None, _) => outcome.warn("no issuer public key available from VD, QR, or environment; skipping signature check".to_string()),
        _ => {}
    }

    // Step 6: recompute L = H(SI).
    let recomputed_leaf = decode_hex_vec(&vd.issuer_signature).map(|sig| to_hex(&keccak256(&sig)));
    if let Some(leaf) = &recomputed_leaf {
        if *leaf != vd.merkle_leaf {
            outcome.error(format!("recomputed merkle leaf {leaf} does not match VD.merkleLeaf {}", vd.merkle_leaf));
        }
    }

    // Step 7: verify MPI.
    let leaf32 = decode_hash32(&vd.merkle_leaf, &mut outcome, "VD.merkleLeaf");
    let mri32 = decode_hash32(&vd.merkle_root_intermediate, &mut outcome, "VD.merkleRootIntermediate");
    if let (Some(leaf), Some(mri)) = (leaf32, mri32) {
        let proof = decode_hash32_vec(&vd.merkle_proof_intermediate, &mut outcome, "VD.merkleProofIntermediate");
        if let Some(proof) = proof {
            if !justifai_merkle::verify(&leaf, &proof, &mri) {
                outcome.error("merkle intermediate proof (MPI) does not verify against MRI".to_string());
            }
        }
    }

    // Step 8: verify MPU; MRI == MRU is a valid empty-proof case.
    let mru32 = decode_hash32(&vd.merkle_root_ultimate, &mut outcome, "VD.merkleRootUltimate");
    if let (Some(mri), Some(mru)) = (mri32, mru32) {
        let proof = decode_hash32_vec(&vd.merkle_proof_ultimate, &mut outcome, "VD.merkleProofUltimate");
        if let Some(proof) = proof {
            if !justifai_merkle::verify(&mri, &proof, &mru) {
                outcome.error("merkle ultimate proof (MPU) does not verify against MRU".to_string());
            }
        }
    }

    // Step 9: verify on-chain anchor.
    match (&vd.tx_hash, mru32) {
        (Some(tx_hash), Some(_)) => match chain.verify_tx(tx_hash, &vd.merkle_root_ultimate) {
            Some(true) => {}
            Some(false) => outcome.error("on-chain anchor does not match VD.merkleRootUltimate".to_string()),
            None => outcome.error(format!("could not locate anchor transaction {tx_hash}")),
        },
        _ => outcome.error("VD is missing a transaction hash for the on-chain anchor".to_string()),
    }

    // Step 10: content-integrity heuristics, only meaningful when the
    // original could actually be recovered.
    if let Some(original) = &original_bytes {
        if let Ok(original_doc) = Document::load_mem(original) {
            let outer_text = justifai_content_hash::extract_text_layer(&outer_doc).unwrap_or_default();
            let original_text = justifai_content_hash::extract_text_layer(&original_doc).unwrap_or_default();
            if !verify::text_layers_match(&outer_text, &original_text) {
                outcome.error("text layer of the candidate PDF does not match the recovered original (beyond whitespace)".to_string());
            }

            let outer_annots = verify::count_annotations(&outer_doc);
            let original_annots = verify::count_annotations(&original_doc);
            if outer_annots > original_annots + 1 {
                outcome.error(format!(
                    "annotation count increased by {} (at most 1 expected for the marker)",
                    outer_annots.saturating_sub(original_annots)
                ));
            }

            let outer_images = verify::count_images(&outer_doc);
            let original_images = verify::count_images(&original_doc);
            if outer_images > original_images + 1 {
                outcome.error(format!(
                    "image count increased by {} (at most 1 expected for the QR)",
                    outer_images.saturating_sub(original_images)
                ));
            }
        }

        let startxref_count = verify::count_startxref_markers(candidate_bytes);
        if startxref_count > 1 {
            outcome.warn(format!("outer PDF contains {startxref_count} startxref markers, suggesting an incremental edit"));
        }

        match verify::creation_mod_date_delta_seconds(&outer_doc) {
            Some(delta) if delta > 60 => {
                outcome.warn(format!("CreationDate/ModDate differ by {delta}s (expected at most 60s)"));
            }
            Some(_) => {}
            None => outcome.warn("could not read CreationDate/ModDate for the date-delta integrity check".to_string()),
        }

        if !verify::producer_is_known(&outer_doc) {
            outcome.warn("Producer metadata is neither the known issuer string nor the PDF library default".to_string());
        }
    }

    Ok(outcome.finish())
}

fn parse_optional_epoch(iso: &Option<String>) -> Option<i64> {
    use chrono::DateTime;
    iso.as_ref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.timestamp())
}

fn decode_hash32(hex_str: &str, outcome: &mut VerifyOutcome, field: &str) -> Option<[u8; 32]> {
    let bytes = hex::decode(hex_str.strip_prefix("0x").unwrap_or(hex_str)).ok()?;
    if bytes.len() != 32 {
        outcome.error(format!("{field} is not a 32-byte hex value"));
        return None;
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Some(out)
}

fn decode_hex_vec(hex_str: &str) -> Option<Vec<u8>> {
    hex::decode(hex_str.strip_prefix("0x").unwrap_or(hex_str)).ok()
}

fn decode_hash32_vec(items: &[String], outcome: &mut VerifyOutcome, field: &str) -> Option<Vec<[u8; 32]>> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match decode_hash32(item, outcome, field) {
            Some(h) => out.push(h),
            None => return None,
        }
    }
    Some(out)
}
