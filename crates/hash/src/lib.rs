//! Hash kernel (spec §4.1): Keccak-256 primitives and secp256k1
//! sign/verify/recover.
//!
//! Hex encoding convention used throughout this crate and its callers:
//! lowercase, no `0x` prefix for storage; `with_0x_prefix` is provided for
//! the chain boundary where a `bytes32` literal is expected.

use secp256k1::ecdsa::{RecoverableSignature, RecoveryId, Signature as CompactSignature};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use sha3::{Digest, Keccak256};

/// `H(x) := keccak256(x)`, 32 bytes.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let out = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&out);
    bytes
}

/// Lowercase hex, no `0x` prefix — the storage convention.
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Lowercase hex with `0x` prefix — the chain/`bytes32` convention.
pub fn to_hex_prefixed(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn decode_hex(s: &str) -> Result<Vec<u8>, justifai_errors::Error> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(s).map_err(|e| justifai_errors::Error::crypto(format!("invalid hex: {e}")))
}

fn decode_hash32(hex_str: &str) -> Option<[u8; 32]> {
    let bytes = decode_hex(hex_str).ok()?;
    if bytes.len() != 32 {
        return None;
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Some(out)
}

/// Parse any of the three accepted signature encodings (§4.1) into a plain
/// 64-byte compact `(r, s)` signature usable for non-recovering
/// verification. Returns `None` on any parse error rather than propagating,
/// matching `verify`'s "false on any parse error" contract.
fn parse_to_compact(sig_bytes: &[u8]) -> Option<CompactSignature> {
    match sig_bytes.len() {
        64 => CompactSignature::from_compact(sig_bytes).ok(),
        65 => CompactSignature::from_compact(&sig_bytes[..64]).ok(),
        _ => CompactSignature::from_der(sig_bytes).ok(),
    }
}

/// `verify(sigHashHex, sigHex, pubKeyHex) -> bool` (§4.1). The hash is the
/// message digest directly; no extra hashing is applied. Any parse failure
/// (hash, signature, or public key) returns `false`.
pub fn verify(sig_hash_hex: &str, sig_hex: &str, pub_key_hex: &str) -> bool {
    let Some(hash) = decode_hash32(sig_hash_hex) else {
        return false;
    };
    let Ok(sig_bytes) = decode_hex(sig_hex) else {
        return false;
    };
    let Some(signature) = parse_to_compact(&sig_bytes) else {
        return false;
    };
    let Ok(pk_bytes) = decode_hex(pub_key_hex) else {
        return false;
    };
    let Ok(public_key) = PublicKey::from_slice(&pk_bytes) else {
        return false;
    };
    let Ok(message) = Message::from_digest_slice(&hash) else {
        return false;
    };

    let secp = Secp256k1::verification_only();
    secp.verify_ecdsa(&message, &signature, &public_key).is_ok()
}

/// `recoverPublicKey(hashHex, sigHex) -> pubKeyHex | ⊥` (§4.1). Only
/// defined for the 65-byte `r‖s‖v` form; anything else returns `None`.
pub fn recover_public_key(hash_hex: &str, sig_hex: &str) -> Option<String> {
    let hash = decode_hash32(hash_hex)?;
    let sig_bytes = decode_hex(sig_hex).ok()?;
    if sig_bytes.len() != 65 {
        return None;
    }

    let v = sig_bytes[64];
    let recid_value = match v {
        0 | 1 => v as i32,
        27 | 28 => (v - 27) as i32,
        _ => return None,
    };
    let recovery_id = RecoveryId::from_i32(recid_value).ok()?;
    let recoverable = RecoverableSignature::from_compact(&sig_bytes[..64], recovery_id).ok()?;
    let message = Message::from_digest_slice(&hash).ok()?;

    let secp = Secp256k1::verification_only();
    let public_key = secp.recover_ecdsa(&message, &recoverable).ok()?;
    Some(to_hex(&public_key.serialize()))
}

/// `sign(hashHex, privHex) -> hex(r‖s)` (§4.1), `r` and `s` each left-padded
/// to 32 bytes (which `serialize_compact` already guarantees).
pub fn sign(hash_hex: &str, priv_hex: &str) -> Result<String, justifai_errors::Error> {
    let hash = decode_hash32(hash_hex)
        .ok_or_else(|| justifai_errors::Error::crypto("hash must be 32 bytes"))?;
    let priv_bytes = decode_hex(priv_hex)?;
    let secret_key = SecretKey::from_slice(&priv_bytes)
        .map_err(|e| justifai_errors::Error::crypto(format!("invalid private key: {e}")))?;
    let message = Message::from_digest_slice(&hash)
        .map_err(|e| justifai_errors::Error::crypto(format!("invalid digest: {e}")))?;

    let secp = Secp256k1::signing_only();
    let signature = secp.sign_ecdsa(&message, &secret_key);
    Ok(to_hex(&signature.serialize_compact()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secp256k1::rand::rngs::OsRng;

    #[test]
    fn keccak256_is_deterministic_and_32_bytes() {
        let a = keccak256(b"hello world");
        let b = keccak256(b"hello world");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn keccak256_matches_known_vector() {
        // keccak256("") per the canonical Keccak (not NIST SHA3) test vector.
        let empty = keccak256(b"");
        assert_eq!(
            to_hex(&empty),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a47"
        );
    }

    fn keypair() -> (SecretKey, PublicKey) {
        let secp = Secp256k1::new();
        let (sk, pk) = secp.generate_keypair(&mut OsRng);
        (sk, pk)
    }

    #[test]
    fn sign_then_verify_round_trips() {
        let (sk, pk) = keypair();
        let hash = keccak256(b"a document fingerprint");
        let hash_hex = to_hex(&hash);

        let sig = sign(&hash_hex, &to_hex(&sk.secret_bytes())).unwrap();
        assert!(verify(&hash_hex, &sig, &to_hex(&pk.serialize())));
    }

    #[test]
    fn verify_rejects_wrong_message() {
        let (sk, pk) = keypair();
        let hash = keccak256(b"message a");
        let other_hash = keccak256(b"message b");
        let sig = sign(&to_hex(&hash), &to_hex(&sk.secret_bytes())).unwrap();
        assert!(!verify(&to_hex(&other_hash), &sig, &to_hex(&pk.serialize())));
    }

    #[test]
    fn verify_returns_false_on_garbage_input() {
        assert!(!verify("not-hex", "also-not-hex", "nope"));
        assert!(!verify(&to_hex(&[0u8; 32]), "", ""));
    }

    #[test]
    fn recover_public_key_only_supports_65_byte_form() {
        let (sk, pk) = keypair();
        let hash = keccak256(b"recoverable");
        let hash_hex = to_hex(&hash);

        let secp = Secp256k1::new();
        let message = Message::from_digest_slice(&hash).unwrap();
        let recoverable = secp.sign_ecdsa_recoverable(&message, &sk);
        let (recid, compact) = recoverable.serialize_compact();
        let mut sig65 = compact.to_vec();
        sig65.push(recid.to_i32() as u8 + 27);

        let recovered = recover_public_key(&hash_hex, &to_hex(&sig65)).unwrap();
        assert_eq!(recovered, to_hex(&pk.serialize()));

        // 64-byte compact form is not recoverable.
        assert!(recover_public_key(&hash_hex, &to_hex(&compact)).is_none());
    }
}
