//! P2 sign intake (spec §4.6): not a polling loop — an external caller
//! submits `{jobId, SI}` directly. Exposed as a plain async function so the
//! sign-intake CLI/API surface can call it without depending on the loop
//! machinery.

use justifai_errors::{Error, Result};
use justifai_hash::{keccak256, to_hex};
use justifai_store::StateStore;
use justifai_types::{GeneratedFields, JobId, JobState};
use std::sync::Arc;

/// Validates `status == PendingSigning`, computes `L = H(SI)`, and moves
/// the job to `Generated`. Returns an error if the job is missing or not in
/// the expected state; returns `Ok(false)` if a concurrent caller already
/// won the transition.
pub async fn sign_intake(store: &Arc<dyn StateStore>, job_id: JobId, issuer_signature_hex: &str) -> Result<bool> {
    let Some(job) = store.get_job(job_id).await? else {
        return Err(Error::validation(format!("no such job {job_id}")));
    };
    let JobState::PendingSigning { fingerprint } = job.state.clone() else {
        return Err(Error::state(format!(
            "job {job_id} is not awaiting a signature (status is not PendingSigning)"
        )));
    };

    let signature_bytes = hex::decode(issuer_signature_hex.strip_prefix("0x").unwrap_or(issuer_signature_hex))
        .map_err(|e| Error::validation(format!("issuer signature is not valid hex: {e}")))?;
    let merkle_leaf = to_hex(&keccak256(&signature_bytes));

    let mut updated = job;
    updated.state = JobState::Generated(GeneratedFields {
        fingerprint,
        issuer_signature: issuer_signature_hex.to_string(),
        merkle_leaf,
        merkle_proof_intermediate: None,
        merkle_proof_ultimate: None,
        verification_bundle: None,
        qr_payload_fragment: None,
    });

    store.update_job(updated, "PendingSigning").await
}

#[cfg(test)]
mod tests {
    use super::*;
    use justifai_store::InMemoryStateStore;
    use justifai_types::{BatchId, DocumentFingerprintFields, Job};
    use std::collections::BTreeMap;

    fn pending_signing_job() -> Job {
        let mut job = Job::new(BatchId::new(), BTreeMap::new());
        job.state = JobState::PendingSigning {
            fingerprint: DocumentFingerprintFields {
                document_hash: "a".repeat(64),
                data_hash: None,
                document_fingerprint: "b".repeat(96),
                fingerprint_hash: "c".repeat(64),
            },
        };
        job
    }

    #[tokio::test]
    async fn sign_intake_moves_job_to_generated_and_derives_leaf() {
        let store: Arc<dyn StateStore> = Arc::new(InMemoryStateStore::new());
        let job = pending_signing_job();
        let job_id = job.id;
        store.insert_job(job).await.unwrap();

        let signature = "11".repeat(65);
        let applied = sign_intake(&store, job_id, &signature).await.unwrap();
        assert!(applied);

        let updated = store.get_job(job_id).await.unwrap().unwrap();
        let JobState::Generated(fields) = updated.state else {
            panic!("expected Generated state");
        };
        assert_eq!(fields.issuer_signature, signature);
        let expected_leaf = to_hex(&keccak256(&hex::decode(&signature).unwrap()));
        assert_eq!(fields.merkle_leaf, expected_leaf);
    }

    #[tokio::test]
    async fn sign_intake_rejects_job_not_awaiting_signature() {
        let store: Arc<dyn StateStore> = Arc::new(InMemoryStateStore::new());
        let job = Job::new(BatchId::new(), BTreeMap::new());
        let job_id = job.id;
        store.insert_job(job).await.unwrap();

        let result = sign_intake(&store, job_id, &"11".repeat(65)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn sign_intake_rejects_missing_job() {
        let store: Arc<dyn StateStore> = Arc::new(InMemoryStateStore::new());
        let result = sign_intake(&store, JobId::new(), &"11".repeat(65)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn sign_intake_rejects_invalid_hex_signature() {
        let store: Arc<dyn StateStore> = Arc::new(InMemoryStateStore::new());
        let job = pending_signing_job();
        let job_id = job.id;
        store.insert_job(job).await.unwrap();

        let result = sign_intake(&store, job_id, "not-hex").await;
        assert!(result.is_err());
    }
}
