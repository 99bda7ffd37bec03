//! QR payload codec and image rendering (spec §4.8 step 3, §4.10).

pub mod payload;
pub mod render;

pub use payload::{
    choose_content, compress_to_base64url, decompress_from_base64url, fields_hash, from_json,
    restrict_fields, template_hash, to_json, QrContent, QrPayload,
};
pub use render::{render_adaptive, RenderOptions};
