//! Justifai CLI: `serve` runs the issuer daemon (six scheduler loops over
//! an in-memory reference store), `verify` checks a certificate PDF
//! offline/against the chain, `sign` is a thin wrapper around external
//! sign intake (spec §4.6 P2).

use clap::{Parser, Subcommand};
use justifai_cli::{build_chain, build_storage};
use justifai_config::Config;
use justifai_errors::{Error, Result};
use justifai_pdf::ChainVerifier;
use justifai_scheduler::render::UploadedPdfRenderer;
use justifai_scheduler::signer::NoAutoSigner;
use justifai_scheduler::{Scheduler, SchedulerIntervals};
use justifai_store::{InMemoryCatalogStore, InMemoryStateStore};
use justifai_types::{Template, Tenant};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "justifai")]
#[command(about = "Verifiable PDF issuance and verification")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the issuer daemon: all six scheduler loops over an in-memory
    /// reference store, configured entirely from the environment.
    Serve {
        /// JSON file with `{"tenants": [...], "templates": [...]}` to seed
        /// the in-memory catalog at startup (job/batch intake is an
        /// external API surface this crate does not define).
        #[arg(long)]
        seed: Option<String>,
    },
    /// Verify a candidate certificate PDF (spec §4.9).
    Verify {
        /// Path to the candidate PDF.
        path: String,
        /// Skip the on-chain anchor check entirely (fully offline mode).
        #[arg(long)]
        offline: bool,
    },
    /// Submit an externally-produced issuer signature for a pending job
    /// (spec §4.6 P2). Only useful against a deployment whose `StateStore`
    /// is shared (e.g. a relational backend) with the running daemon — the
    /// in-memory reference store in `serve` is private to that process.
    Sign {
        #[arg(long)]
        job_id: String,
        #[arg(long)]
        signature: String,
    },
}

#[derive(serde::Deserialize)]
struct Seed {
    #[serde(default)]
    tenants: Vec<Tenant>,
    #[serde(default)]
    templates: Vec<Template>,
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { seed } => serve(seed).await?,
        Commands::Verify { path, offline } => verify(&path, offline).await?,
        Commands::Sign { job_id, signature } => sign(&job_id, &signature).await?,
    }
    Ok(())
}

async fn serve(seed_path: Option<String>) -> Result<()> {
    let config = Config::from_env()?;

    let storage = build_storage(&config).await?;
    let store = Arc::new(InMemoryStateStore::new());
    let catalog = Arc::new(InMemoryCatalogStore::new());

    if let Some(path) = seed_path {
        let raw = std::fs::read_to_string(&path).map_err(|e| Error::configuration(format!("failed to read seed file {path}: {e}")))?;
        let seed: Seed = serde_json::from_str(&raw).map_err(|e| Error::configuration(format!("invalid seed file {path}: {e}")))?;
        for tenant in seed.tenants {
            catalog.insert_tenant(tenant);
        }
        for template in seed.templates {
            catalog.insert_template(template);
        }
    }

    let chain = match build_chain(&config).await {
        Ok(anchor) => Some(Arc::new(anchor)),
        Err(e) => {
            tracing::warn!(error = %e, "starting without a chain anchor; P4 will wait until RPC/PRIVATE_KEY/ANCHORSTORE_ADDRESS are valid");
            None
        }
    };

    let intervals = SchedulerIntervals {
        job: config.polling.job_interval,
        mri: config.polling.mri_interval,
        mru: config.polling.mru_interval,
        qr: config.polling.qr_interval,
        pdf_augment: config.polling.pdf_augment_interval,
        render_concurrency: config.pdf_concurrency,
        batch_limit: 50,
        verify_base_url: config.verification.verify_base_url.clone(),
        issuer_name: "Justifai".to_string(),
        qr_render: config.qr_render.clone(),
    };

    let scheduler = Arc::new(Scheduler::new(
        store,
        catalog,
        storage,
        chain,
        Arc::new(UploadedPdfRenderer),
        Arc::new(NoAutoSigner),
        intervals,
    ));

    let handles = scheduler.spawn_all();
    tracing::info!("issuer daemon started");

    tokio::signal::ctrl_c().await.map_err(|e| Error::configuration(format!("failed to listen for ctrl-c: {e}")))?;
    tracing::info!("shutdown signal received, draining");
    scheduler.stop();

    for handle in handles {
        let _ = tokio::time::timeout(std::time::Duration::from_secs(30), handle).await;
    }
    Ok(())
}

/// Bridges `ChainAnchor::verify_transaction` (async) to `pdf::ChainVerifier`
/// (sync): `verify_pdf` is meant to run fully offline against bytes on
/// disk, so the chain check is the one step that must step out of async
/// context via `block_in_place`.
struct RuntimeChainVerifier {
    anchor: justifai_chain::ChainAnchor,
}

impl ChainVerifier for RuntimeChainVerifier {
    fn verify_tx(&self, tx_hash: &str, expected_mru: &str) -> Option<bool> {
        let tx_hash: alloy::primitives::TxHash = tx_hash.parse().ok()?;
        let expected_mru = hex::decode(expected_mru.strip_prefix("0x").unwrap_or(expected_mru)).ok()?;
        if expected_mru.len() != 32 {
            return None;
        }
        let mut mru_bytes = [0u8; 32];
        mru_bytes.copy_from_slice(&expected_mru);

        let result = tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(self.anchor.verify_transaction(tx_hash, Some(mru_bytes)))
        });
        match result {
            Ok(v) if v.mru_from_event.is_none() => None,
            Ok(v) => Some(v.verified),
            Err(_) => None,
        }
    }
}

struct OfflineChainVerifier;

impl ChainVerifier for OfflineChainVerifier {
    fn verify_tx(&self, _tx_hash: &str, _expected_mru: &str) -> Option<bool> {
        None
    }
}

async fn verify(path: &str, offline: bool) -> Result<()> {
    let bytes = std::fs::read(path).map_err(|e| Error::validation(format!("failed to read {path}: {e}")))?;
    let config = Config::from_env().ok();

    let outcome = if offline {
        justifai_pdf::verify_pdf(
            &bytes,
            None,
            config.as_ref().and_then(|c| c.verification.issuer_public_key.clone()).as_deref(),
            &OfflineChainVerifier,
        )?
    } else {
        let config = config.ok_or_else(|| Error::configuration("RPC_URL/PRIVATE_KEY/ANCHORSTORE_ADDRESS required for on-chain verification; pass --offline to skip"))?;
        let anchor = build_chain(&config).await?;
        let verifier = RuntimeChainVerifier { anchor };
        justifai_pdf::verify_pdf(&bytes, None, config.verification.issuer_public_key.as_deref(), &verifier)?
    };

    let json = serde_json::to_string_pretty(&serde_json::json!({
        "valid": outcome.valid,
        "errors": outcome.errors,
        "warnings": outcome.warnings,
    }))
    .map_err(|e| Error::validation(format!("failed to serialize verification result: {e}")))?;
    println!("{json}");

    if !outcome.valid {
        std::process::exit(1);
    }
    Ok(())
}

async fn sign(job_id: &str, signature: &str) -> Result<()> {
    let store: Arc<dyn justifai_store::StateStore> = Arc::new(InMemoryStateStore::new());
    let id: justifai_types::JobId = job_id
        .parse()
        .map_err(|e| Error::validation(format!("invalid job id {job_id}: {e}")))?;
    let applied = justifai_scheduler::operations::sign_intake(&store, id, signature).await?;
    if applied {
        println!("job {job_id} signed");
    } else {
        println!("job {job_id} was already moved by another caller");
    }
    Ok(())
}
