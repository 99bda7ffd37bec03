//! State store gateway (spec §4.4): the typed queries/updates the
//! scheduler polls against, plus an in-memory reference implementation.
//!
//! The trait shape follows the pluggable-gateway pattern other networking
//! crates in this ecosystem use for swappable backends (a `Send + Sync`
//! `#[async_trait]` trait with one small error enum), so a relational
//! driver can implement [`StateStore`] without the scheduler crate knowing
//! the difference.

use async_trait::async_trait;
use dashmap::DashMap;
use justifai_errors::{Error, Result};
use justifai_types::{Batch, BatchId, Job, JobId, JobState, Template, TemplateId, Tenant, TenantId};
use std::sync::atomic::{AtomicU64, Ordering};

#[async_trait]
pub trait StateStore: Send + Sync {
    async fn insert_job(&self, job: Job) -> Result<()>;
    async fn insert_batch(&self, batch: Batch) -> Result<()>;
    async fn get_job(&self, id: JobId) -> Result<Option<Job>>;
    async fn get_batch(&self, id: BatchId) -> Result<Option<Batch>>;

    /// Atomic `Pending → Processing` transition on up to `limit` oldest
    /// jobs. Race-safe: a losing caller (under concurrent callers racing
    /// the same rows) sees those jobs excluded from its own result rather
    /// than double-claiming them.
    async fn claim_pending(&self, limit: usize) -> Result<Vec<Job>>;

    /// Jobs in `PendingSigning`, creation order, for one batch.
    async fn find_pending_signature(&self, batch_id: BatchId) -> Result<Vec<Job>>;

    /// Jobs in `Generated`, creation order, for one batch.
    async fn find_signed_jobs(&self, batch_id: BatchId) -> Result<Vec<Job>>;

    /// Batches with at least one `Generated` job, no `PendingSigning` jobs
    /// remaining, and no MRI yet (P3 precondition).
    async fn find_batches_awaiting_mri(&self) -> Result<Vec<Batch>>;

    /// Finalized batches with no MRU yet, oldest `finalized_at` first.
    async fn find_batches_awaiting_mru(&self, limit: usize) -> Result<Vec<Batch>>;

    /// `Generated` jobs whose batch has an MRU+txHash but no `qrCodePath`.
    async fn find_jobs_awaiting_qr(&self, limit: usize) -> Result<Vec<Job>>;

    /// `Generated` jobs with `qrCodePath` set, `certificateWithQRPath`
    /// unset, and `certificatePath` set.
    async fn find_jobs_awaiting_pdf_augment(&self, limit: usize) -> Result<Vec<Job>>;

    /// Optimistic-concurrency update: applies only if the stored job's
    /// current status discriminant matches `expected_status`. Returns
    /// `false` (not an error) when the precondition no longer holds, so a
    /// caller can treat it as "someone else already moved this job".
    async fn update_job(&self, job: Job, expected_status: &str) -> Result<bool>;

    async fn update_batch(&self, batch: Batch, expected_signing_status: &str) -> Result<bool>;
}

/// Read-only lookup for the two reference entities the scheduler needs
/// alongside jobs/batches (tenant issuer keys, template content/placement).
/// Kept separate from [`StateStore`] since spec component C4 scopes that
/// trait to jobs/batches only; relational persistence for tenants/templates
/// is the same "external collaborator" concern, just not part of the named
/// gateway.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_tenant(&self, id: TenantId) -> Result<Option<Tenant>>;
    async fn get_template(&self, id: TemplateId) -> Result<Option<Template>>;
}

/// In-memory reference implementation, seeded by the composition root.
pub struct InMemoryCatalogStore {
    tenants: DashMap<TenantId, Tenant>,
    templates: DashMap<TemplateId, Template>,
}

impl Default for InMemoryCatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self {
            tenants: DashMap::new(),
            templates: DashMap::new(),
        }
    }

    pub fn insert_tenant(&self, tenant: Tenant) {
        self.tenants.insert(tenant.id, tenant);
    }

    pub fn insert_template(&self, template: Template) {
        self.templates.insert(template.id, template);
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn get_tenant(&self, id: TenantId) -> Result<Option<Tenant>> {
        Ok(self.tenants.get(&id).map(|e| e.value().clone()))
    }

    async fn get_template(&self, id: TemplateId) -> Result<Option<Template>> {
        Ok(self.templates.get(&id).map(|e| e.value().clone()))
    }
}

fn status_tag(state: &JobState) -> &'static str {
    match state {
        JobState::Pending => "Pending",
        JobState::Processing => "Processing",
        JobState::PendingSigning { .. } => "PendingSigning",
        JobState::Generated(_) => "Generated",
        JobState::Failed { .. } => "Failed",
    }
}

fn signing_status_tag(status: justifai_types::SigningStatus) -> &'static str {
    use justifai_types::SigningStatus::*;
    match status {
        PendingSigning => "PendingSigning",
        Signed => "Signed",
        Finalized => "Finalized",
    }
}

struct JobRecord {
    job: Job,
    seq: u64,
}

struct BatchRecord {
    batch: Batch,
    seq: u64,
}

/// In-memory reference implementation, used by tests and local/dev runs.
/// Insertion order is tracked by a monotonic sequence counter rather than a
/// wall-clock timestamp, since that is all "creation order" requires.
pub struct InMemoryStateStore {
    jobs: DashMap<JobId, JobRecord>,
    batches: DashMap<BatchId, BatchRecord>,
    seq: AtomicU64,
}

impl Default for InMemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self {
            jobs: DashMap::new(),
            batches: DashMap::new(),
            seq: AtomicU64::new(0),
        }
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    fn jobs_in_batch(&self, batch_id: BatchId) -> Vec<(u64, Job)> {
        let mut out: Vec<(u64, Job)> = self
            .jobs
            .iter()
            .filter(|entry| entry.value().job.batch_id == batch_id)
            .map(|entry| (entry.value().seq, entry.value().job.clone()))
            .collect();
        out.sort_by_key(|(seq, _)| *seq);
        out
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn insert_job(&self, job: Job) -> Result<()> {
        let seq = self.next_seq();
        self.jobs.insert(job.id, JobRecord { job, seq });
        Ok(())
    }

    async fn insert_batch(&self, batch: Batch) -> Result<()> {
        let seq = self.next_seq();
        self.batches.insert(batch.id, BatchRecord { batch, seq });
        Ok(())
    }

    async fn get_job(&self, id: JobId) -> Result<Option<Job>> {
        Ok(self.jobs.get(&id).map(|e| e.value().job.clone()))
    }

    async fn get_batch(&self, id: BatchId) -> Result<Option<Batch>> {
        Ok(self.batches.get(&id).map(|e| e.value().batch.clone()))
    }

    async fn claim_pending(&self, limit: usize) -> Result<Vec<Job>> {
        let mut candidates: Vec<(u64, JobId)> = self
            .jobs
            .iter()
            .filter(|entry| matches!(entry.value().job.state, JobState::Pending))
            .map(|entry| (entry.value().seq, *entry.key()))
            .collect();
        candidates.sort_by_key(|(seq, _)| *seq);
        candidates.truncate(limit);

        let mut claimed = Vec::with_capacity(candidates.len());
        for (_, id) in candidates {
            // Re-check under the per-shard lock DashMap's get_mut gives us,
            // so a racing claimant that already flipped this entry to
            // Processing is simply skipped rather than double-claimed.
            if let Some(mut entry) = self.jobs.get_mut(&id) {
                if matches!(entry.value().job.state, JobState::Pending) {
                    entry.value_mut().job.state = JobState::Processing;
                    claimed.push(entry.value().job.clone());
                }
            }
        }
        Ok(claimed)
    }

    async fn find_pending_signature(&self, batch_id: BatchId) -> Result<Vec<Job>> {
        Ok(self
            .jobs_in_batch(batch_id)
            .into_iter()
            .filter(|(_, job)| matches!(job.state, JobState::PendingSigning { .. }))
            .map(|(_, job)| job)
            .collect())
    }

    async fn find_signed_jobs(&self, batch_id: BatchId) -> Result<Vec<Job>> {
        Ok(self
            .jobs_in_batch(batch_id)
            .into_iter()
            .filter(|(_, job)| job.state.is_generated())
            .map(|(_, job)| job)
            .collect())
    }

    async fn find_batches_awaiting_mri(&self) -> Result<Vec<Batch>> {
        let mut out = Vec::new();
        for entry in self.batches.iter() {
            let batch = &entry.value().batch;
            if batch.merkle.has_intermediate() {
                continue;
            }
            let jobs = self.jobs_in_batch(batch.id);
            let has_generated = jobs.iter().any(|(_, j)| j.state.is_generated());
            let has_pending_signing = jobs
                .iter()
                .any(|(_, j)| matches!(j.state, JobState::PendingSigning { .. }));
            if has_generated && !has_pending_signing {
                out.push(batch.clone());
            }
        }
        Ok(out)
    }

    async fn find_batches_awaiting_mru(&self, limit: usize) -> Result<Vec<Batch>> {
        let mut candidates: Vec<Batch> = self
            .batches
            .iter()
            .map(|e| e.value().batch.clone())
            .filter(|b| {
                matches!(b.signing_status, justifai_types::SigningStatus::Finalized) && !b.merkle.has_ultimate()
            })
            .collect();
        candidates.sort_by_key(|b| b.finalized_at.unwrap_or(i64::MAX));
        candidates.truncate(limit);
        Ok(candidates)
    }

    async fn find_jobs_awaiting_qr(&self, limit: usize) -> Result<Vec<Job>> {
        let mut batch_ready = std::collections::HashSet::new();
        for entry in self.batches.iter() {
            let b = &entry.value().batch;
            if b.merkle.has_ultimate() && b.chain.tx_hash.is_some() {
                batch_ready.insert(b.id);
            }
        }

        let mut out: Vec<(u64, Job)> = self
            .jobs
            .iter()
            .filter(|entry| {
                let job = &entry.value().job;
                job.state.is_generated()
                    && job.artifacts.qr_code_path.is_none()
                    && batch_ready.contains(&job.batch_id)
            })
            .map(|entry| (entry.value().seq, entry.value().job.clone()))
            .collect();
        out.sort_by_key(|(seq, _)| *seq);
        out.truncate(limit);
        Ok(out.into_iter().map(|(_, job)| job).collect())
    }

    async fn find_jobs_awaiting_pdf_augment(&self, limit: usize) -> Result<Vec<Job>> {
        let mut out: Vec<(u64, Job)> = self
            .jobs
            .iter()
            .filter(|entry| entry.value().job.eligible_for_pdf_reaugment())
            .map(|entry| (entry.value().seq, entry.value().job.clone()))
            .collect();
        out.sort_by_key(|(seq, _)| *seq);
        out.truncate(limit);
        Ok(out.into_iter().map(|(_, job)| job).collect())
    }

    async fn update_job(&self, job: Job, expected_status: &str) -> Result<bool> {
        let Some(mut entry) = self.jobs.get_mut(&job.id) else {
            return Err(Error::persistence("update_job: no such job"));
        };
        if status_tag(&entry.value().job.state) != expected_status {
            return Ok(false);
        }
        entry.value_mut().job = job;
        Ok(true)
    }

    async fn update_batch(&self, batch: Batch, expected_signing_status: &str) -> Result<bool> {
        let Some(mut entry) = self.batches.get_mut(&batch.id) else {
            return Err(Error::persistence("update_batch: no such batch"));
        };
        if signing_status_tag(entry.value().batch.signing_status) != expected_signing_status {
            return Ok(false);
        }
        entry.value_mut().batch = batch;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use justifai_types::{Tenant, TenantId, TemplateId};
    use std::collections::BTreeMap;

    fn new_job(batch_id: BatchId) -> Job {
        Job::new(batch_id, BTreeMap::new())
    }

    #[tokio::test]
    async fn claim_pending_is_race_safe_across_two_claimants() {
        let store = InMemoryStateStore::new();
        let batch_id = BatchId::new();
        for _ in 0..5 {
            store.insert_job(new_job(batch_id)).await.unwrap();
        }

        let (a, b) = tokio::join!(store.claim_pending(3), store.claim_pending(3));
        let a = a.unwrap();
        let b = b.unwrap();

        let mut claimed_ids: Vec<JobId> = a.iter().chain(b.iter()).map(|j| j.id).collect();
        claimed_ids.sort();
        claimed_ids.dedup();
        assert_eq!(claimed_ids.len(), a.len() + b.len(), "no job claimed twice");
        assert_eq!(a.len() + b.len(), 5);
    }

    #[tokio::test]
    async fn claim_pending_respects_limit_and_creation_order() {
        let store = InMemoryStateStore::new();
        let batch_id = BatchId::new();
        let mut ids = Vec::new();
        for _ in 0..3 {
            let job = new_job(batch_id);
            ids.push(job.id);
            store.insert_job(job).await.unwrap();
        }

        let claimed = store.claim_pending(2).await.unwrap();
        assert_eq!(claimed.len(), 2);
        assert_eq!(claimed[0].id, ids[0]);
        assert_eq!(claimed[1].id, ids[1]);
    }

    #[tokio::test]
    async fn update_job_fails_precondition_when_status_already_moved() {
        let store = InMemoryStateStore::new();
        let batch_id = BatchId::new();
        let job = new_job(batch_id);
        let id = job.id;
        store.insert_job(job.clone()).await.unwrap();

        store.claim_pending(1).await.unwrap();

        let mut stale = job;
        stale.state = JobState::Failed {
            error_message: "boom".into(),
        };
        let applied = store.update_job(stale, "Pending").await.unwrap();
        assert!(!applied, "stale expected-status should not overwrite the claim");

        let current = store.get_job(id).await.unwrap().unwrap();
        assert!(matches!(current.state, JobState::Processing));
    }

    #[tokio::test]
    async fn find_batches_awaiting_mri_requires_no_pending_signing_jobs() {
        let store = InMemoryStateStore::new();
        let tenant = Tenant {
            id: TenantId::new(),
            name: "acme".into(),
            issuer_public_key: None,
        };
        let _ = tenant;
        let batch = Batch::new(TenantId::new(), TemplateId::new());
        let batch_id = batch.id;
        store.insert_batch(batch).await.unwrap();

        let mut generated = new_job(batch_id);
        generated.state = JobState::Generated(justifai_types::GeneratedFields {
            fingerprint: justifai_types::DocumentFingerprintFields {
                document_hash: "a".repeat(64),
                data_hash: None,
                document_fingerprint: "b".repeat(96),
                fingerprint_hash: "c".repeat(64),
            },
            issuer_signature: "d".repeat(128),
            merkle_leaf: "e".repeat(64),
            merkle_proof_intermediate: None,
            merkle_proof_ultimate: None,
            verification_bundle: None,
            qr_payload_fragment: None,
        });
        store.insert_job(generated).await.unwrap();

        let awaiting = store.find_batches_awaiting_mri().await.unwrap();
        assert_eq!(awaiting.len(), 1);

        let mut still_signing = new_job(batch_id);
        still_signing.state = JobState::PendingSigning {
            fingerprint: justifai_types::DocumentFingerprintFields {
                document_hash: "a".repeat(64),
                data_hash: None,
                document_fingerprint: "b".repeat(96),
                fingerprint_hash: "c".repeat(64),
            },
        };
        store.insert_job(still_signing).await.unwrap();

        let awaiting = store.find_batches_awaiting_mri().await.unwrap();
        assert!(awaiting.is_empty(), "an outstanding PendingSigning job blocks MRI");
    }
}
