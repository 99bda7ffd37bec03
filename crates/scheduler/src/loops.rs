//! The five cooperative polling loops (P2 sign-intake lives in
//! [`crate::operations`] since it is externally triggered, not polled).
//! Each loop: poll its gateway, run its transition, sleep `interval`,
//! check the shared stop flag (spec §5).

use crate::Scheduler;
use justifai_errors::Result;
use justifai_fingerprint::DocumentFingerprint;
use justifai_hash::{keccak256, to_hex};
use justifai_merkle::{build_tree, build_ultimate_tree};
use justifai_pdf::augment::AugmentInput;
use justifai_pdf::bundle::VerificationBundle;
use justifai_config::QrStyle;
use justifai_qr::payload::{self, QrPayload};
use justifai_qr::render::{render_adaptive, RenderOptions};
use justifai_storage::StoreOptions;
use justifai_types::{
    BatchStatus, DocumentFingerprintFields, GeneratedFields, Job, JobState, SigningStatus,
};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn parse_hex_color(s: &str) -> Option<[u8; 3]> {
    let s = s.trim_start_matches('#');
    if s.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&s[0..2], 16).ok()?;
    let g = u8::from_str_radix(&s[2..4], 16).ok()?;
    let b = u8::from_str_radix(&s[4..6], 16).ok()?;
    Some([r, g, b])
}

/// Resolves `QR_DARK_COLOR`/`QR_LIGHT_COLOR` overrides against `QR_STYLE`'s
/// default palette (spec §6): explicit hex wins; otherwise classic and
/// transparent render black-on-white, dark renders white-on-black.
fn render_options_for(cfg: &justifai_config::QrRenderConfig) -> RenderOptions {
    let (style_dark, style_light) = match cfg.style {
        QrStyle::Dark => ([255, 255, 255], [0, 0, 0]),
        QrStyle::Classic | QrStyle::Transparent => ([0, 0, 0], [255, 255, 255]),
    };
    RenderOptions {
        png_width: cfg.png_width,
        margin_modules: cfg.margin,
        dark: cfg.dark_color.as_deref().and_then(parse_hex_color).unwrap_or(style_dark),
        light: cfg.light_color.as_deref().and_then(parse_hex_color).unwrap_or(style_light),
    }
}

fn hex32(s: &str) -> Option<[u8; 32]> {
    let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s)).ok()?;
    if bytes.len() != 32 {
        return None;
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Some(out)
}

/// P1: render/load PDF bytes, compute the fingerprint triple, optionally
/// auto-sign, persist the original and move the job forward (spec §4.6
/// row P1, invariant i: H(d)/DI/H(DI) written together).
pub async fn run_p1(scheduler: Arc<Scheduler>) {
    let permits = scheduler.intervals.render_concurrency.max(1);
    let semaphore = Arc::new(tokio::sync::Semaphore::new(permits));

    while scheduler.is_running() {
        match scheduler.store.claim_pending(scheduler.intervals.batch_limit).await {
            Ok(jobs) => {
                tracing::info!(count = jobs.len(), "P1 claimed jobs");
                let mut handles = Vec::new();
                for job in jobs {
                    let scheduler = scheduler.clone();
                    let permit = semaphore.clone().acquire_owned().await;
                    handles.push(tokio::spawn(async move {
                        let _permit = permit;
                        if let Err(e) = process_p1_job(&scheduler, job).await {
                            tracing::error!(error = %e, "P1 job processing failed");
                        }
                    }));
                }
                for handle in handles {
                    let _ = handle.await;
                }
            }
            Err(e) => tracing::error!(error = %e, "P1 claim_pending failed"),
        }
        tokio::time::sleep(scheduler.intervals.job).await;
    }
}

async fn process_p1_job(scheduler: &Arc<Scheduler>, mut job: Job) -> Result<()> {
    let Some(batch) = scheduler.store.get_batch(job.batch_id).await? else {
        return fail_job(scheduler, job, "batch not found").await;
    };
    let Some(template) = scheduler.catalog.get_template(batch.template_id).await? else {
        return fail_job(scheduler, job, "template not found").await;
    };

    let pdf_bytes = match scheduler.renderer.render(&template, &job.data).await {
        Ok(bytes) => bytes,
        Err(e) => return fail_job(scheduler, job, &format!("render failed: {e}")).await,
    };

    let object_id = job.id.to_string();
    let certificate_path = scheduler
        .storage
        .store(
            bytes::Bytes::from(pdf_bytes.clone()),
            batch.tenant_id,
            batch.id,
            &object_id,
            &StoreOptions::default(),
        )
        .await?;

    let document_hash = keccak256(&pdf_bytes);
    let document_hash_hex = to_hex(&document_hash);
    let data_hash = lopdf::Document::load_mem(&pdf_bytes)
        .ok()
        .and_then(|doc| justifai_content_hash::compute_data_hash(&doc).ok());

    let fingerprint = DocumentFingerprint::new(
        document_hash,
        batch.expiries.document_expiry,
        batch.expiries.invalidation_expiry,
    );
    let fields = DocumentFingerprintFields {
        document_hash: document_hash_hex,
        data_hash,
        document_fingerprint: fingerprint.encode_hex(),
        fingerprint_hash: to_hex(&fingerprint.fingerprint_hash()),
    };

    job.artifacts.certificate_path = Some(certificate_path);

    job.state = match scheduler.signer.try_sign(&batch, &fields.fingerprint_hash).await {
        Some(auto_sig) => {
            let sig_bytes = hex::decode(auto_sig.signature.strip_prefix("0x").unwrap_or(&auto_sig.signature))
                .unwrap_or_default();
            JobState::Generated(GeneratedFields {
                fingerprint: fields,
                issuer_signature: auto_sig.signature,
                merkle_leaf: to_hex(&keccak256(&sig_bytes)),
                merkle_proof_intermediate: None,
                merkle_proof_ultimate: None,
                verification_bundle: None,
                qr_payload_fragment: None,
            })
        }
        None => JobState::PendingSigning { fingerprint: fields },
    };

    scheduler.store.update_job(job, "Processing").await?;
    Ok(())
}

async fn fail_job(scheduler: &Arc<Scheduler>, mut job: Job, message: &str) -> Result<()> {
    job.state = JobState::Failed {
        error_message: message.to_string(),
    };
    scheduler.store.update_job(job, "Processing").await?;
    Ok(())
}

/// P3: build the intermediate tree for any batch whose jobs have all
/// finished signing (spec §4.6 row P3, invariant iv: MPI exists iff batch
/// MRI exists).
pub async fn run_p3(scheduler: Arc<Scheduler>) {
    while scheduler.is_running() {
        match scheduler.store.find_batches_awaiting_mri().await {
            Ok(batches) => {
                for batch in batches {
                    if let Err(e) = process_p3_batch(&scheduler, batch).await {
                        tracing::error!(error = %e, "P3 batch processing failed");
                    }
                }
            }
            Err(e) => tracing::error!(error = %e, "P3 find_batches_awaiting_mri failed"),
        }
        tokio::time::sleep(scheduler.intervals.mri).await;
    }
}

async fn process_p3_batch(scheduler: &Arc<Scheduler>, mut batch: justifai_types::Batch) -> Result<()> {
    let jobs = scheduler.store.find_signed_jobs(batch.id).await?;
    if jobs.is_empty() {
        return Ok(());
    }

    let leaves: Vec<[u8; 32]> = jobs
        .iter()
        .filter_map(|job| match &job.state {
            JobState::Generated(fields) => hex32(&fields.merkle_leaf),
            _ => None,
        })
        .collect();
    if leaves.len() != jobs.len() {
        tracing::warn!(batch = %batch.id, "P3 skipped batch: a signed job has a malformed merkle leaf");
        return Ok(());
    }

    let tree = build_tree(&leaves)?;
    let mri_hex = to_hex(&tree.root());

    for job in jobs {
        let JobState::Generated(mut fields) = job.state.clone() else {
            continue;
        };
        let Some(leaf) = hex32(&fields.merkle_leaf) else { continue };
        let Some(proof) = tree.proof_for_leaf(&leaf) else { continue };
        fields.merkle_proof_intermediate = Some(proof.iter().map(|l| to_hex(l)).collect());
        let mut updated = job;
        updated.state = JobState::Generated(fields);
        scheduler.store.update_job(updated, "Generated").await?;
    }

    batch.merkle.intermediate_root = Some(mri_hex);
    batch.signing_status = SigningStatus::Finalized;
    batch.finalized_at = Some(now_unix());
    scheduler.store.update_batch(batch, "PendingSigning").await?;
    Ok(())
}

/// P4: build the ultimate tree across finalized batches lacking an MRU,
/// submit it to the chain, and fan the result back out (spec §4.6 row P4).
/// A chain failure is logged and retried next tick; MRU/MPU/job state are
/// only written after a successful anchor.
pub async fn run_p4(scheduler: Arc<Scheduler>) {
    while scheduler.is_running() {
        match scheduler.store.find_batches_awaiting_mru(scheduler.intervals.batch_limit).await {
            Ok(batches) if !batches.is_empty() => {
                if let Err(e) = process_p4_batches(&scheduler, batches).await {
                    tracing::error!(error = %e, "P4 anchoring pass failed");
                }
            }
            Ok(_) => {}
            Err(e) => tracing::error!(error = %e, "P4 find_batches_awaiting_mru failed"),
        }
        tokio::time::sleep(scheduler.intervals.mru).await;
    }
}

async fn process_p4_batches(scheduler: &Arc<Scheduler>, batches: Vec<justifai_types::Batch>) -> Result<()> {
    let Some(chain) = &scheduler.chain else {
        tracing::warn!("P4 has finalized batches awaiting anchor but no chain client is configured");
        return Ok(());
    };

    let mris: Vec<[u8; 32]> = batches
        .iter()
        .filter_map(|b| b.merkle.intermediate_root.as_deref().and_then(hex32))
        .collect();
    if mris.len() != batches.len() {
        tracing::warn!("P4 skipped anchoring pass: a finalized batch has a malformed MRI");
        return Ok(());
    }

    let ultimate_tree = build_ultimate_tree(&mris)?;
    let mru = ultimate_tree.root();
    let time_window = batches
        .iter()
        .filter_map(|b| b.finalized_at)
        .min()
        .unwrap_or_else(now_unix) as u64;

    let anchor_result = match chain.anchor(mru, time_window).await {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(error = %e, "P4 anchor submission failed, will retry next tick");
            return Ok(());
        }
    };

    let mru_hex = to_hex(&mru);
    for (batch, mri) in batches.into_iter().zip(mris) {
        let Some(mpu) = ultimate_tree.proof_for_leaf(&mri) else { continue };
        let mpu_hex: Vec<String> = mpu.iter().map(|l| to_hex(l)).collect();

        let mut updated = batch;
        updated.merkle.ultimate_root = Some(mru_hex.clone());
        updated.merkle.ultimate_proof = Some(mpu_hex.clone());
        updated.chain.tx_hash = Some(anchor_result.tx_hash.to_string());
        updated.chain.network = Some(anchor_result.network.clone());

        let jobs = scheduler.store.find_signed_jobs(updated.id).await?;
        for job in jobs {
            let JobState::Generated(mut fields) = job.state.clone() else { continue };
            fields.merkle_proof_ultimate = Some(mpu_hex.clone());
            let mut job = job;
            job.state = JobState::Generated(fields);
            // Invariant (v): clearing the augmented-PDF path makes the job
            // eligible for P6 re-augmentation with the new MRU/MPU.
            job.artifacts.certificate_with_qr_path = None;
            scheduler.store.update_job(job, "Generated").await?;
        }

        scheduler.store.update_batch(updated, "Finalized").await?;
    }
    Ok(())
}

/// P5: generate the v2 QR payload and image for every signed job whose
/// batch has a chain anchor (spec §4.6 row P5).
pub async fn run_p5(scheduler: Arc<Scheduler>) {
    while scheduler.is_running() {
        match scheduler.store.find_jobs_awaiting_qr(scheduler.intervals.batch_limit).await {
            Ok(jobs) => {
                for job in jobs {
                    if let Err(e) = process_p5_job(&scheduler, job).await {
                        tracing::error!(error = %e, "P5 job processing failed");
                    }
                }
            }
            Err(e) => tracing::error!(error = %e, "P5 find_jobs_awaiting_qr failed"),
        }
        tokio::time::sleep(scheduler.intervals.qr).await;
    }
}

/// Rebuilds the v2 QR payload (spec §4.10) from a generated job's
/// persisted fields plus its batch/template. Shared by P5 (first QR
/// render) and P6 (PDF-embedding re-render at a different resolution) so
/// both stages always encode the exact same content.
fn build_qr_payload(
    job: &Job,
    batch: &justifai_types::Batch,
    template: &justifai_types::Template,
    fields: &GeneratedFields,
) -> Result<Option<QrPayload>> {
    let (Some(mri), Some(mru), Some(tx_hash), Some(network)) = (
        batch.merkle.intermediate_root.clone(),
        batch.merkle.ultimate_root.clone(),
        batch.chain.tx_hash.clone(),
        batch.chain.network.clone(),
    ) else {
        return Ok(None);
    };
    let mpi = fields.merkle_proof_intermediate.clone().unwrap_or_default();
    let mpu = fields.merkle_proof_ultimate.clone().unwrap_or_default();

    let template_hash = payload::template_hash(&template.html_content);
    let data_value = serde_json::to_value(&job.data)
        .map_err(|e| justifai_errors::Error::validation(format!("job data is not serializable: {e}")))?;
    let restricted_fields = payload::restrict_fields(&data_value, &template.parameter_names);
    let fields_hash = payload::fields_hash(&template.id.to_string(), &template_hash, &restricted_fields)?;

    Ok(Some(QrPayload {
        v: 2,
        job_id: job.id.to_string(),
        batch_id: batch.id.to_string(),
        tenant_id: batch.tenant_id.to_string(),
        template_id: template.id.to_string(),
        template_hash,
        fields: restricted_fields,
        fields_hash,
        document_hash: fields.fingerprint.document_hash.clone(),
        tx_hash,
        network,
        mpu,
        mpi,
        issuer_id: batch.tenant_id.to_string(),
        issuer_public_key: batch.issuer_public_key.clone(),
        mri,
        mru,
        ed: batch.expiries.document_expiry,
        ei: batch.expiries.invalidation_expiry,
        si: fields.issuer_signature.clone(),
    }))
}

async fn process_p5_job(scheduler: &Arc<Scheduler>, mut job: Job) -> Result<()> {
    let JobState::Generated(fields) = job.state.clone() else {
        return Ok(());
    };
    let Some(batch) = scheduler.store.get_batch(job.batch_id).await? else {
        return Ok(());
    };
    let Some(template) = scheduler.catalog.get_template(batch.template_id).await? else {
        return Ok(());
    };
    let Some(qr_payload) = build_qr_payload(&job, &batch, &template, &fields)? else {
        return Ok(());
    };

    let content = payload::choose_content(&qr_payload, scheduler.intervals.verify_base_url.as_deref())?;
    let options = render_options_for(&scheduler.intervals.qr_render);
    let (_ecl, png_bytes) = render_adaptive(&content.to_encoded_string(), &options)?;

    let qr_path = scheduler
        .storage
        .store(
            bytes::Bytes::from(png_bytes),
            batch.tenant_id,
            batch.id,
            &job.id.to_string(),
            &StoreOptions {
                folder: Some("qr-codes".to_string()),
                extension: Some(".png".to_string()),
                content_type: Some("image/png".to_string()),
            },
        )
        .await?;

    let mut fields = fields;
    fields.qr_payload_fragment = Some(payload::compress_to_base64url(&qr_payload)?);
    job.artifacts.qr_code_path = Some(qr_path);
    job.state = JobState::Generated(fields);
    scheduler.store.update_job(job, "Generated").await?;
    Ok(())
}

/// P6: attach the original PDF + verification bundle and draw the QR image
/// onto the stored certificate (spec §4.6 row P6). Flips the batch to
/// `Completed` once every job in it has an augmented PDF and a chain
/// anchor.
pub async fn run_p6(scheduler: Arc<Scheduler>) {
    while scheduler.is_running() {
        match scheduler
            .store
            .find_jobs_awaiting_pdf_augment(scheduler.intervals.batch_limit)
            .await
        {
            Ok(jobs) => {
                for job in jobs {
                    if let Err(e) = process_p6_job(&scheduler, job).await {
                        tracing::error!(error = %e, "P6 job processing failed");
                    }
                }
            }
            Err(e) => tracing::error!(error = %e, "P6 find_jobs_awaiting_pdf_augment failed"),
        }
        tokio::time::sleep(scheduler.intervals.pdf_augment).await;
    }
}

async fn process_p6_job(scheduler: &Arc<Scheduler>, mut job: Job) -> Result<()> {
    let JobState::Generated(fields) = job.state.clone() else {
        return Ok(());
    };
    let (Some(certificate_path), Some(_qr_code_path)) =
        (job.artifacts.certificate_path.clone(), job.artifacts.qr_code_path.clone())
    else {
        return Ok(());
    };
    let Some(batch) = scheduler.store.get_batch(job.batch_id).await? else {
        return Ok(());
    };
    let Some(template) = scheduler.catalog.get_template(batch.template_id).await? else {
        return Ok(());
    };
    let placement = template.resolve_qr_placement().unwrap_or(justifai_types::QrPlacement {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
        page_index: 0,
    });

    let (Some(mri), Some(mru)) = (batch.merkle.intermediate_root.clone(), batch.merkle.ultimate_root.clone()) else {
        return Ok(());
    };
    let Some(tx_hash) = batch.chain.tx_hash.clone() else {
        return Ok(());
    };

    let original_bytes = scheduler.storage.retrieve(&certificate_path).await?;

    // Re-render at QR_PDF_PNG_WIDTH (spec §6): the PDF-embedded QR is a
    // separate, typically higher, resolution than the standalone artifact
    // P5 already stored, so it scales down into the placement without
    // pixelating. Same content, same payload, same `choose_content` rule.
    let Some(qr_payload) = build_qr_payload(&job, &batch, &template, &fields)? else {
        return Ok(());
    };
    let content = payload::choose_content(&qr_payload, scheduler.intervals.verify_base_url.as_deref())?;
    let mut embed_options = render_options_for(&scheduler.intervals.qr_render);
    embed_options.png_width = scheduler.intervals.qr_render.pdf_png_width;
    let (_ecl, qr_bytes) = render_adaptive(&content.to_encoded_string(), &embed_options)?;

    let vd = VerificationBundle {
        document_hash: fields.fingerprint.document_hash.clone(),
        document_fingerprint: fields.fingerprint.document_fingerprint.clone(),
        fingerprint_hash: fields.fingerprint.fingerprint_hash.clone(),
        issuer_signature: fields.issuer_signature.clone(),
        merkle_leaf: fields.merkle_leaf.clone(),
        expiry_date: batch.expiries.document_expiry.map(|s| epoch_to_iso8601(s)),
        invalidation_expiry: batch.expiries.invalidation_expiry.map(|s| epoch_to_iso8601(s)),
        issuer_id: batch.tenant_id.to_string(),
        issuer_public_key: batch.issuer_public_key.clone(),
        merkle_proof_intermediate: fields.merkle_proof_intermediate.clone().unwrap_or_default(),
        merkle_root_intermediate: mri,
        merkle_root_ultimate: mru,
        merkle_proof_ultimate: fields.merkle_proof_ultimate.clone().unwrap_or_default(),
        tx_hash: Some(tx_hash),
        network: batch.chain.network.clone(),
    };
    let vd_json = vd.to_json()?;

    let augmented = justifai_pdf::augment::augment(AugmentInput {
        original_pdf_bytes: original_bytes.as_ref(),
        vd_json: &vd_json,
        qr_png_bytes: qr_bytes.as_ref(),
        placement,
        issuer_name: &scheduler.intervals.issuer_name,
    })?;

    let augmented_path = scheduler
        .storage
        .store(
            bytes::Bytes::from(augmented),
            batch.tenant_id,
            batch.id,
            &job.id.to_string(),
            &StoreOptions {
                folder: Some("qr-embedded-certificates".to_string()),
                extension: None,
                content_type: None,
            },
        )
        .await?;

    let mut fields = fields;
    fields.verification_bundle = Some(
        serde_json::from_str(&vd_json)
            .map_err(|e| justifai_errors::Error::validation(format!("VD round-trip parse failed: {e}")))?,
    );
    job.artifacts.certificate_with_qr_path = Some(augmented_path);
    job.state = JobState::Generated(fields);
    scheduler.store.update_job(job, "Generated").await?;

    maybe_complete_batch(scheduler, batch).await?;
    Ok(())
}

async fn maybe_complete_batch(scheduler: &Arc<Scheduler>, batch: justifai_types::Batch) -> Result<()> {
    if !batch.can_complete() || batch.status == BatchStatus::Completed {
        return Ok(());
    }
    let jobs = scheduler.store.find_signed_jobs(batch.id).await?;
    let all_augmented = !jobs.is_empty() && jobs.iter().all(|j| j.artifacts.certificate_with_qr_path.is_some());
    if !all_augmented {
        return Ok(());
    }
    let mut updated = batch;
    let expected = match updated.signing_status {
        SigningStatus::PendingSigning => "PendingSigning",
        SigningStatus::Signed => "Signed",
        SigningStatus::Finalized => "Finalized",
    };
    updated.status = BatchStatus::Completed;
    scheduler.store.update_batch(updated, expected).await?;
    Ok(())
}

fn epoch_to_iso8601(epoch_seconds: i64) -> String {
    use chrono::{DateTime, Utc};
    DateTime::<Utc>::from_timestamp(epoch_seconds, 0)
        .unwrap_or_else(|| DateTime::<Utc>::from_timestamp(0, 0).unwrap())
        .to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use justifai_config::QrRenderConfig;

    fn base_cfg(style: QrStyle) -> QrRenderConfig {
        QrRenderConfig {
            png_width: 768,
            pdf_png_width: 1536,
            margin: 8,
            dark_color: None,
            light_color: None,
            style,
        }
    }

    #[test]
    fn parse_hex_color_accepts_with_or_without_hash() {
        assert_eq!(parse_hex_color("#ff0000"), Some([255, 0, 0]));
        assert_eq!(parse_hex_color("00ff00"), Some([0, 255, 0]));
    }

    #[test]
    fn parse_hex_color_rejects_malformed_input() {
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color("not-a-color"), None);
    }

    #[test]
    fn render_options_defaults_to_black_on_white_for_classic_and_transparent() {
        let classic = render_options_for(&base_cfg(QrStyle::Classic));
        assert_eq!(classic.dark, [0, 0, 0]);
        assert_eq!(classic.light, [255, 255, 255]);

        let transparent = render_options_for(&base_cfg(QrStyle::Transparent));
        assert_eq!(transparent.dark, [0, 0, 0]);
        assert_eq!(transparent.light, [255, 255, 255]);
    }

    #[test]
    fn render_options_inverts_palette_for_dark_style() {
        let dark = render_options_for(&base_cfg(QrStyle::Dark));
        assert_eq!(dark.dark, [255, 255, 255]);
        assert_eq!(dark.light, [0, 0, 0]);
    }

    #[test]
    fn render_options_explicit_colors_override_style_default() {
        let mut cfg = base_cfg(QrStyle::Classic);
        cfg.dark_color = Some("#112233".to_string());
        cfg.light_color = Some("#ffeedd".to_string());
        let opts = render_options_for(&cfg);
        assert_eq!(opts.dark, [0x11, 0x22, 0x33]);
        assert_eq!(opts.light, [0xff, 0xee, 0xdd]);
        assert_eq!(opts.png_width, 768);
        assert_eq!(opts.margin_modules, 8);
    }

    #[test]
    fn hex32_round_trips_with_and_without_0x_prefix() {
        let bytes = [7u8; 32];
        let hex_str = to_hex(&bytes);
        assert_eq!(hex32(&hex_str), Some(bytes));
        assert_eq!(hex32(&format!("0x{hex_str}")), Some(bytes));
    }

    #[test]
    fn hex32_rejects_wrong_length() {
        assert_eq!(hex32("abcd"), None);
    }

    #[test]
    fn epoch_to_iso8601_formats_unix_epoch() {
        assert_eq!(epoch_to_iso8601(0), "1970-01-01T00:00:00+00:00");
    }
}
