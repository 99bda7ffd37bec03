//! Fingerprint codec (spec §4.2):
//!
//! ```text
//! DI = H(d)[32 bytes] || Ed[int64 big-endian] || Ei[int64 big-endian]
//! ```
//!
//! `Ed`/`Ei` are "document-expiry"/"invalidation-expiry", epoch seconds,
//! `None`/null encoding to `0`. The codec guarantees byte-identical `DI` for
//! identical inputs on any platform so the signed digest matches at
//! verification time.

use chrono::{DateTime, Utc};
use justifai_errors::Error;
use justifai_hash::{keccak256, to_hex};

pub const FINGERPRINT_LEN: usize = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentFingerprint {
    /// `H(d)`, 32 bytes.
    pub document_hash: [u8; 32],
    /// `Ed`, epoch seconds; 0 means "lifetime".
    pub document_expiry: i64,
    /// `Ei`, epoch seconds; 0 means "lifetime".
    pub invalidation_expiry: i64,
}

impl DocumentFingerprint {
    pub fn new(document_hash: [u8; 32], document_expiry: Option<i64>, invalidation_expiry: Option<i64>) -> Self {
        Self {
            document_hash,
            document_expiry: document_expiry.unwrap_or(0),
            invalidation_expiry: invalidation_expiry.unwrap_or(0),
        }
    }

    /// Encode to the 48-byte `DI` wire form.
    pub fn encode(&self) -> [u8; FINGERPRINT_LEN] {
        let mut out = [0u8; FINGERPRINT_LEN];
        out[..32].copy_from_slice(&self.document_hash);
        out[32..40].copy_from_slice(&self.document_expiry.to_be_bytes());
        out[40..48].copy_from_slice(&self.invalidation_expiry.to_be_bytes());
        out
    }

    pub fn encode_hex(&self) -> String {
        to_hex(&self.encode())
    }

    /// `H(DI) := keccak256(DI)`.
    pub fn fingerprint_hash(&self) -> [u8; 32] {
        keccak256(&self.encode())
    }

    /// Decode `(H(d), Ed, Ei)` back out of a 48-byte `DI`. The round-trip
    /// `decode(encode(x)) == x` must hold exactly (spec §8).
    pub fn decode(di: &[u8]) -> Result<Self, Error> {
        if di.len() != FINGERPRINT_LEN {
            return Err(Error::crypto(format!(
                "fingerprint must be {FINGERPRINT_LEN} bytes, got {}",
                di.len()
            )));
        }
        let mut document_hash = [0u8; 32];
        document_hash.copy_from_slice(&di[..32]);
        let document_expiry = i64::from_be_bytes(di[32..40].try_into().unwrap());
        let invalidation_expiry = i64::from_be_bytes(di[40..48].try_into().unwrap());
        Ok(Self {
            document_hash,
            document_expiry,
            invalidation_expiry,
        })
    }

    pub fn decode_hex(hex_str: &str) -> Result<Self, Error> {
        let bytes = hex::decode(hex_str.strip_prefix("0x").unwrap_or(hex_str))
            .map_err(|e| Error::crypto(format!("invalid hex: {e}")))?;
        Self::decode(&bytes)
    }
}

/// Accepted expiry input forms: epoch-seconds or ISO-8601. Conversion from
/// a sub-second timestamp must use integer floor of `ms/1000` (spec §4.2).
#[derive(Debug, Clone)]
pub enum ExpiryInput {
    EpochSeconds(i64),
    EpochMillis(i64),
    Iso8601(String),
    None,
}

impl ExpiryInput {
    pub fn resolve(&self) -> Result<Option<i64>, Error> {
        match self {
            ExpiryInput::None => Ok(None),
            ExpiryInput::EpochSeconds(s) => Ok(Some(*s)),
            ExpiryInput::EpochMillis(ms) => Ok(Some(ms.div_euclid(1000))),
            ExpiryInput::Iso8601(s) => {
                let dt: DateTime<Utc> = DateTime::parse_from_rfc3339(s)
                    .map_err(|e| Error::validation(format!("invalid ISO-8601 date {s:?}: {e}")))?
                    .with_timezone(&Utc);
                Ok(Some(dt.timestamp_millis().div_euclid(1000)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_encode_decode() {
        let hash = keccak256(b"document bytes");
        let original = DocumentFingerprint::new(hash, Some(1699833600), Some(1700784000));
        let decoded = DocumentFingerprint::decode(&original.encode()).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn null_expiries_encode_as_zero() {
        let hash = keccak256(b"doc");
        let fp = DocumentFingerprint::new(hash, None, None);
        let encoded = fp.encode();
        assert_eq!(&encoded[32..40], &[0u8; 8]);
        assert_eq!(&encoded[40..48], &[0u8; 8]);
    }

    #[test]
    fn matches_scenario_2_from_spec() {
        // spec.md §8 scenario 2.
        let hash_hex = "30917ef3".to_string() + &"0".repeat(52) + "6279";
        let hash_bytes = hex::decode(&hash_hex).unwrap();
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&hash_bytes);

        let fp = DocumentFingerprint::new(hash, Some(1699833600), Some(1700784000));
        let encoded = fp.encode();
        assert_eq!(&encoded[..32], hash.as_slice());
        assert_eq!(
            i64::from_be_bytes(encoded[32..40].try_into().unwrap()),
            1699833600
        );
        assert_eq!(
            i64::from_be_bytes(encoded[40..48].try_into().unwrap()),
            1700784000
        );
    }

    #[test]
    fn fingerprint_hash_is_deterministic() {
        let hash = keccak256(b"doc");
        let fp = DocumentFingerprint::new(hash, Some(1), Some(2));
        assert_eq!(fp.fingerprint_hash(), fp.fingerprint_hash());
    }

    #[test]
    fn decode_rejects_wrong_length() {
        assert!(DocumentFingerprint::decode(&[0u8; 47]).is_err());
    }

    #[test]
    fn epoch_millis_floor_matches_integer_division() {
        let input = ExpiryInput::EpochMillis(1699833600_999);
        assert_eq!(input.resolve().unwrap(), Some(1699833600));
    }

    #[test]
    fn iso8601_resolves_to_epoch_seconds() {
        let input = ExpiryInput::Iso8601("2023-11-13T00:00:00Z".to_string());
        assert_eq!(input.resolve().unwrap(), Some(1699833600));
    }
}
