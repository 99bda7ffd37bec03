//! HTML-to-PDF rendering is an external collaborator per spec §1 ("treated
//! as external collaborators, specified only by interface") — this crate
//! never opens a headless browser itself. P1 depends on whatever concrete
//! renderer the composition root wires in (or a pre-rendered-upload path
//! that never calls this trait at all).

use async_trait::async_trait;
use base64::Engine;
use justifai_errors::{Error, Result};
use justifai_types::Template;
use std::collections::BTreeMap;

#[async_trait]
pub trait PdfRenderer: Send + Sync {
    /// Render `template` bound to `data` into PDF bytes. A 30 s page-load
    /// timeout (spec §5) is the renderer implementation's responsibility.
    async fn render(&self, template: &Template, data: &BTreeMap<String, serde_json::Value>) -> Result<Vec<u8>>;
}

/// "...or load uploaded PDF" (spec §4.6 P1): jobs that already carry a
/// rendered document skip the HTML-to-PDF collaborator entirely. Looks for
/// a base64-encoded `pdf_base64` field in the job's data map.
pub struct UploadedPdfRenderer;

#[async_trait]
impl PdfRenderer for UploadedPdfRenderer {
    async fn render(&self, _template: &Template, data: &BTreeMap<String, serde_json::Value>) -> Result<Vec<u8>> {
        let encoded = data
            .get("pdf_base64")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::validation("job data has no pdf_base64 field and no HTML renderer is configured"))?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| Error::validation(format!("pdf_base64 is not valid base64: {e}")))
    }
}
