//! Core data model for the Justifai issuance pipeline (spec §3).
//!
//! Entities here carry only their semantic fields and invariants; they are
//! storage-agnostic. [`crate::store`]-facing crates translate to/from
//! whatever persistence representation they use.

pub mod batch;
pub mod ids;
pub mod job;
pub mod tenant;
pub mod template;

pub use batch::{Batch, BatchMerkleState, BatchStatus, ChainAnchorState, Expiries, SigningStatus};
pub use ids::{BatchId, JobId, TemplateId, TenantId};
pub use job::{DocumentFingerprintFields, GeneratedFields, Job, JobArtifacts, JobState};
pub use tenant::Tenant;
pub use template::{QrPlacement, Template};
