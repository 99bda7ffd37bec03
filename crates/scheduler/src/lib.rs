//! Issuance scheduler (spec §4.6, C6): six cooperative polling loops that
//! move jobs and batches through the pipeline's state machine.
//!
//! Grounded on the teacher's composition-root pattern (build every gateway
//! once, hand out `Arc`s, `tokio::spawn` one task per concern) and its
//! bounded-concurrency idiom (`tokio::sync::Semaphore` gating P1's render
//! pool, the same shape `hyperscale-production`'s rate limiter uses for
//! per-peer token buckets).

pub mod loops;
pub mod operations;
pub mod render;
pub mod signer;

use justifai_chain::ChainAnchor;
use justifai_store::{CatalogStore, StateStore};
use justifai_storage::StorageGateway;
use render::PdfRenderer;
use signer::AutoSigner;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Per-loop poll intervals and P1's render concurrency limit (spec §6).
#[derive(Debug, Clone)]
pub struct SchedulerIntervals {
    pub job: Duration,
    pub mri: Duration,
    pub mru: Duration,
    pub qr: Duration,
    pub pdf_augment: Duration,
    pub render_concurrency: usize,
    pub batch_limit: usize,
    pub verify_base_url: Option<String>,
    pub issuer_name: String,
    pub qr_render: justifai_config::QrRenderConfig,
}

/// Every gateway handle the six loops share, built once at the composition
/// root and handed out by `Arc` (teacher's "construct once, pass by
/// reference" rule, §9).
pub struct Scheduler {
    pub store: Arc<dyn StateStore>,
    pub catalog: Arc<dyn CatalogStore>,
    pub storage: Arc<dyn StorageGateway>,
    pub chain: Option<Arc<ChainAnchor>>,
    pub renderer: Arc<dyn PdfRenderer>,
    pub signer: Arc<dyn AutoSigner>,
    pub intervals: SchedulerIntervals,
    running: Arc<AtomicBool>,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn StateStore>,
        catalog: Arc<dyn CatalogStore>,
        storage: Arc<dyn StorageGateway>,
        chain: Option<Arc<ChainAnchor>>,
        renderer: Arc<dyn PdfRenderer>,
        signer: Arc<dyn AutoSigner>,
        intervals: SchedulerIntervals,
    ) -> Self {
        Self {
            store,
            catalog,
            storage,
            chain,
            renderer,
            signer,
            intervals,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Signals every loop to exit after its current iteration (spec §5
    /// cancellation policy).
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Spawn all six loops and return their join handles. P1 gets an extra
    /// 30 s drain wait on shutdown (spec §5); the others exit immediately
    /// once their current tick finishes.
    pub fn spawn_all(self: &Arc<Self>) -> Vec<tokio::task::JoinHandle<()>> {
        vec![
            tokio::spawn(loops::run_p1(self.clone())),
            tokio::spawn(loops::run_p3(self.clone())),
            tokio::spawn(loops::run_p4(self.clone())),
            tokio::spawn(loops::run_p5(self.clone())),
            tokio::spawn(loops::run_p6(self.clone())),
        ]
    }
}
