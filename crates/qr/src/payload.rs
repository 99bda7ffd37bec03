//! QR payload v2 (spec §4.10): the JSON object embedded in (or pointed to
//! by) the certificate's QR code, and its compressed link-form encoding.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use justifai_canonical::canonicalize_to_string;
use justifai_errors::Error;
use justifai_hash::{keccak256, to_hex};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Write;

const SCHEMA_VERSION: &str = "qr-payload-v2";

/// The v2 QR payload object, keys exactly as named in the spec.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrPayload {
    pub v: u8,
    #[serde(rename = "jobId")]
    pub job_id: String,
    #[serde(rename = "batchId")]
    pub batch_id: String,
    #[serde(rename = "tenantId")]
    pub tenant_id: String,
    #[serde(rename = "templateId")]
    pub template_id: String,
    #[serde(rename = "templateHash")]
    pub template_hash: String,
    pub fields: Value,
    #[serde(rename = "fieldsHash")]
    pub fields_hash: String,
    #[serde(rename = "documentHash")]
    pub document_hash: String,
    #[serde(rename = "txHash")]
    pub tx_hash: String,
    pub network: String,
    #[serde(rename = "MPU")]
    pub mpu: Vec<String>,
    #[serde(rename = "MPI")]
    pub mpi: Vec<String>,
    #[serde(rename = "issuerId")]
    pub issuer_id: String,
    #[serde(rename = "issuerPublicKey", skip_serializing_if = "Option::is_none")]
    pub issuer_public_key: Option<String>,
    #[serde(rename = "MRI")]
    pub mri: String,
    #[serde(rename = "MRU")]
    pub mru: String,
    #[serde(rename = "Ed")]
    pub ed: Option<i64>,
    #[serde(rename = "Ei")]
    pub ei: Option<i64>,
    #[serde(rename = "SI")]
    pub si: String,
}

/// `templateHash = keccak256(utf8(templateContent))`.
pub fn template_hash(template_content: &str) -> String {
    to_hex(&keccak256(template_content.as_bytes()))
}

/// `fieldsHash = keccak256(canonicalJson({templateId, templateHash, fields}))`.
pub fn fields_hash(template_id: &str, template_hash: &str, fields: &Value) -> Result<String, Error> {
    let payload = serde_json::json!({
        "templateId": template_id,
        "templateHash": template_hash,
        "fields": fields,
    });
    let canonical = canonicalize_to_string(&payload, SCHEMA_VERSION)?;
    Ok(to_hex(&keccak256(canonical.as_bytes())))
}

/// Restrict an arbitrary input-data object to the field names declared by a
/// template; an empty `declared` list means "pass the whole object through"
/// (§4.10 `fields` rule).
pub fn restrict_fields(input: &Value, declared: &[String]) -> Value {
    let Value::Object(map) = input else {
        return input.clone();
    };
    if declared.is_empty() {
        return input.clone();
    }
    let mut out = serde_json::Map::new();
    for name in declared {
        if let Some(v) = map.get(name) {
            out.insert(name.clone(), v.clone());
        }
    }
    Value::Object(out)
}

/// Serialize to plain JSON (not the canonicalized/`_schema`-wrapped form —
/// this is the payload that is embedded verbatim, not hashed).
pub fn to_json(payload: &QrPayload) -> Result<String, Error> {
    serde_json::to_string(payload).map_err(|e| Error::validation(format!("qr payload serialize failed: {e}")))
}

pub fn from_json(s: &str) -> Result<QrPayload, Error> {
    serde_json::from_str(s).map_err(|e| Error::validation(format!("qr payload parse failed: {e}")))
}

/// `deflateRaw(utf8(JSON.stringify(payload))) -> base64url (no padding)`.
pub fn compress_to_base64url(payload: &QrPayload) -> Result<String, Error> {
    let json = to_json(payload)?;
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
    encoder
        .write_all(json.as_bytes())
        .map_err(|e| Error::validation(format!("deflate failed: {e}")))?;
    let compressed = encoder
        .finish()
        .map_err(|e| Error::validation(format!("deflate finish failed: {e}")))?;
    Ok(URL_SAFE_NO_PAD.encode(compressed))
}

/// Inverse of [`compress_to_base64url`], used by the verifier when a
/// candidate QR carries the full-payload link form.
pub fn decompress_from_base64url(encoded: &str) -> Result<QrPayload, Error> {
    use flate2::write::DeflateDecoder;
    let compressed = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|e| Error::validation(format!("invalid base64url: {e}")))?;
    let mut decoder = DeflateDecoder::new(Vec::new());
    decoder
        .write_all(&compressed)
        .map_err(|e| Error::validation(format!("inflate failed: {e}")))?;
    let json_bytes = decoder
        .finish()
        .map_err(|e| Error::validation(format!("inflate finish failed: {e}")))?;
    let json = String::from_utf8(json_bytes)
        .map_err(|e| Error::validation(format!("decompressed payload is not utf-8: {e}")))?;
    from_json(&json)
}

/// The content a QR image should encode, chosen per §4.10's QR content
/// strategy.
pub enum QrContent {
    /// Short URL form: portal fetches the persisted payload by job id.
    JobIdUrl { verify_base_url: String, job_id: String },
    /// Full payload form: `…/verify?p=<deflateRaw+base64url(payload)>`.
    CompressedPayloadUrl { fragment: String },
    /// Last-resort fallback when even the compressed form overflows the QR
    /// capacity at the lowest error-correction level.
    MinimalJobId { job_id: String },
}

impl QrContent {
    pub fn to_encoded_string(&self) -> String {
        match self {
            QrContent::JobIdUrl { verify_base_url, job_id } => {
                format!("{verify_base_url}/verify?jobId={job_id}")
            }
            QrContent::CompressedPayloadUrl { fragment } => {
                format!("/verify?p={fragment}")
            }
            QrContent::MinimalJobId { job_id } => {
                format!("{{\"jobId\":\"{job_id}\"}}")
            }
        }
    }
}

/// Choose QR content per §4.10: a `VERIFY_BASE_URL`-backed short URL if
/// configured, else the compressed full-payload URL.
pub fn choose_content(payload: &QrPayload, verify_base_url: Option<&str>) -> Result<QrContent, Error> {
    match verify_base_url {
        Some(base) => Ok(QrContent::JobIdUrl {
            verify_base_url: base.to_string(),
            job_id: payload.job_id.clone(),
        }),
        None => {
            let fragment = compress_to_base64url(payload)?;
            Ok(QrContent::CompressedPayloadUrl { fragment })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_payload() -> QrPayload {
        QrPayload {
            v: 2,
            job_id: "job-1".into(),
            batch_id: "batch-1".into(),
            tenant_id: "tenant-1".into(),
            template_id: "template-1".into(),
            template_hash: "aa".repeat(32),
            fields: json!({"name": "Ada"}),
            fields_hash: "bb".repeat(32),
            document_hash: "cc".repeat(32),
            tx_hash: "dd".repeat(32),
            network: "polygon-amoy".into(),
            mpu: vec!["ee".repeat(32)],
            mpi: vec!["ff".repeat(32)],
            issuer_id: "issuer-1".into(),
            issuer_public_key: Some("02".to_string() + &"11".repeat(32)),
            mri: "22".repeat(32),
            mru: "33".repeat(32),
            ed: Some(1_700_000_000),
            ei: None,
            si: "44".repeat(64),
        }
    }

    #[test]
    fn compress_then_decompress_round_trips() {
        let payload = sample_payload();
        let fragment = compress_to_base64url(&payload).unwrap();
        let recovered = decompress_from_base64url(&fragment).unwrap();
        assert_eq!(recovered.job_id, payload.job_id);
        assert_eq!(recovered.si, payload.si);
        assert_eq!(recovered.ei, None);
    }

    #[test]
    fn restrict_fields_keeps_only_declared_names() {
        let input = json!({"name": "Ada", "age": 31, "secret": "x"});
        let declared = vec!["name".to_string(), "age".to_string()];
        let out = restrict_fields(&input, &declared);
        assert_eq!(out, json!({"name": "Ada", "age": 31}));
    }

    #[test]
    fn restrict_fields_passes_through_when_none_declared() {
        let input = json!({"name": "Ada"});
        let out = restrict_fields(&input, &[]);
        assert_eq!(out, input);
    }

    #[test]
    fn fields_hash_is_deterministic() {
        let fields = json!({"name": "Ada"});
        let a = fields_hash("t1", "hash1", &fields).unwrap();
        let b = fields_hash("t1", "hash1", &fields).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn choose_content_prefers_job_id_url_when_configured() {
        let payload = sample_payload();
        let content = choose_content(&payload, Some("https://verify.example")).unwrap();
        let encoded = content.to_encoded_string();
        assert!(encoded.contains("jobId=job-1"));
    }

    #[test]
    fn choose_content_falls_back_to_compressed_payload() {
        let payload = sample_payload();
        let content = choose_content(&payload, None).unwrap();
        let encoded = content.to_encoded_string();
        assert!(encoded.contains("/verify?p="));
    }
}
