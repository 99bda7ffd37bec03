//! Job entity (§3), modeled as a tagged state enum (§9 redesign note).
//!
//! Rather than a single struct with a pile of nullable crypto columns, each
//! `JobState` variant only carries the fields that are valid in that state.
//! `status = Generated` implying `issuer_signature`/`merkle_leaf` are
//! present (invariant iii) becomes a property of the type instead of a
//! runtime check.

use std::collections::BTreeMap;

use crate::ids::{BatchId, JobId};

/// The fingerprint triple written together in one transition (invariant i):
/// `H(d)`, the encoded `DI`, and `H(DI)`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DocumentFingerprintFields {
    /// `H(d)`, hex, no `0x` prefix.
    pub document_hash: String,
    /// Optional content-canonical hash (§4.12), best-effort.
    pub data_hash: Option<String>,
    /// `DI`, hex, no `0x` prefix (96 hex chars).
    pub document_fingerprint: String,
    /// `H(DI)`, hex, no `0x` prefix.
    pub fingerprint_hash: String,
}

/// Fields present once a job reaches `Generated` (invariant iii: SI and L
/// are present). `merkle_proof_intermediate` is filled in by P3 once the
/// batch's MRI exists (invariant iv), and mirrors the batch's MPU once P4
/// runs; both start `None`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeneratedFields {
    pub fingerprint: DocumentFingerprintFields,
    /// `SI`, hex.
    pub issuer_signature: String,
    /// `L = H(SI)`, hex, no `0x` prefix.
    pub merkle_leaf: String,
    pub merkle_proof_intermediate: Option<Vec<String>>,
    pub merkle_proof_ultimate: Option<Vec<String>>,
    pub verification_bundle: Option<serde_json::Value>,
    pub qr_payload_fragment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "status")]
pub enum JobState {
    Pending,
    Processing,
    /// H(d)/DI/H(DI) have been computed; waiting on an external signer.
    PendingSigning {
        fingerprint: DocumentFingerprintFields,
    },
    Generated(GeneratedFields),
    Failed {
        error_message: String,
    },
}

impl JobState {
    pub fn fingerprint(&self) -> Option<&DocumentFingerprintFields> {
        match self {
            JobState::PendingSigning { fingerprint } => Some(fingerprint),
            JobState::Generated(fields) => Some(&fields.fingerprint),
            _ => None,
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, JobState::Generated(_))
    }
}

/// Artifact paths written by storage (§3, §6). Kept outside `JobState`
/// because they describe storage-layer facts, not the signing/merkle state
/// machine, and accumulate independently as P1/P5/P6 each write one.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct JobArtifacts {
    pub certificate_path: Option<String>,
    pub qr_code_path: Option<String>,
    pub certificate_with_qr_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Job {
    pub id: JobId,
    pub batch_id: BatchId,
    pub data: BTreeMap<String, serde_json::Value>,
    pub state: JobState,
    pub artifacts: JobArtifacts,
}

impl Job {
    pub fn new(batch_id: BatchId, data: BTreeMap<String, serde_json::Value>) -> Self {
        Self {
            id: JobId::new(),
            batch_id,
            data,
            state: JobState::Pending,
            artifacts: JobArtifacts::default(),
        }
    }

    /// Invariant (v): eligible for P6 re-augmentation if generated, MRI+tx
    /// exist (mirrored via `merkle_proof_intermediate`/bundle presence),
    /// and the augmented PDF has not been written yet.
    pub fn eligible_for_pdf_reaugment(&self) -> bool {
        matches!(&self.state, JobState::Generated(fields)
            if fields.merkle_proof_intermediate.is_some())
            && self.artifacts.certificate_with_qr_path.is_none()
            && self.artifacts.certificate_path.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_job_is_pending_with_no_artifacts() {
        let job = Job::new(BatchId::new(), BTreeMap::new());
        assert_eq!(job.state, JobState::Pending);
        assert!(job.artifacts.certificate_path.is_none());
        assert!(!job.eligible_for_pdf_reaugment());
    }

    #[test]
    fn generated_state_exposes_fingerprint() {
        let fp = DocumentFingerprintFields {
            document_hash: "a".repeat(64),
            data_hash: None,
            document_fingerprint: "b".repeat(96),
            fingerprint_hash: "c".repeat(64),
        };
        let state = JobState::Generated(GeneratedFields {
            fingerprint: fp.clone(),
            issuer_signature: "d".repeat(128),
            merkle_leaf: "e".repeat(64),
            merkle_proof_intermediate: None,
            merkle_proof_ultimate: None,
            verification_bundle: None,
            qr_payload_fragment: None,
        });
        assert_eq!(state.fingerprint(), Some(&fp));
        assert!(state.is_generated());
    }

    #[test]
    fn eligible_for_reaugment_requires_mpi_and_missing_augmented_pdf() {
        let mut job = Job::new(BatchId::new(), BTreeMap::new());
        job.state = JobState::Generated(GeneratedFields {
            fingerprint: DocumentFingerprintFields {
                document_hash: "a".repeat(64),
                data_hash: None,
                document_fingerprint: "b".repeat(96),
                fingerprint_hash: "c".repeat(64),
            },
            issuer_signature: "d".repeat(128),
            merkle_leaf: "e".repeat(64),
            merkle_proof_intermediate: Some(vec!["f".repeat(64)]),
            merkle_proof_ultimate: None,
            verification_bundle: None,
            qr_payload_fragment: None,
        });
        job.artifacts.certificate_path = Some("certificates/t/b/j.pdf".into());
        assert!(job.eligible_for_pdf_reaugment());

        job.artifacts.certificate_with_qr_path = Some("qr-embedded-certificates/t/b/j-with-qr.pdf".into());
        assert!(!job.eligible_for_pdf_reaugment());
    }
}
