//! PDF verifier (spec §4.9): recover the original PDF and VD from an
//! augmented candidate, then re-derive and check every link in the chain.
//! `errors` reject; `warnings` accept with a caveat (§7 user-visible
//! behavior).

use justifai_errors::Result;
use lopdf::{Document, Object};
use regex::Regex;

use crate::bundle::{
    VerificationBundle, KNOWN_ISSUER_PRODUCER, LEGACY_ORIGINAL_PDF_NAME, LEGACY_ORIGINAL_PDF_PREFIXES,
    LIBRARY_DEFAULT_PRODUCER,
};

#[derive(Debug, Clone, Default)]
pub struct VerifyOutcome {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl VerifyOutcome {
    pub fn error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }
    pub fn warn(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }
    pub fn finish(mut self) -> Self {
        self.valid = self.errors.is_empty();
        self
    }
}

/// A name matching `*Original_PDF*`, the legacy bare `original.pdf`, or a
/// legacy `LegitDoc_`/`QuestVerify_` prefix (§4.9 step 1, open question 2).
fn is_original_pdf_name(name: &str) -> bool {
    name.contains("Original_PDF")
        || name.eq_ignore_ascii_case(LEGACY_ORIGINAL_PDF_NAME)
        || LEGACY_ORIGINAL_PDF_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

/// Decode a name that may be UTF-16BE with a `FEFF` BOM (§4.9 step 1), or
/// plain ASCII/UTF-8 otherwise.
fn decode_name(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    String::from_utf8_lossy(bytes).to_string()
}

/// Inflate a `FlateDecode` stream, or raw zlib (`0x78` header) content that
/// was not marked with a filter.
fn decompress_stream(data: &[u8]) -> Vec<u8> {
    use flate2::read::ZlibDecoder;
    use std::io::Read;
    if data.first() == Some(&0x78) || data.is_empty() {
        let mut decoder = ZlibDecoder::new(data);
        let mut out = Vec::new();
        if decoder.read_to_end(&mut out).is_ok() {
            return out;
        }
    }
    data.to_vec()
}

struct FoundFile {
    name: String,
    bytes: Vec<u8>,
}

/// Walk every strategy §4.9 step 1/2 names: the `Names → EmbeddedFiles`
/// tree (recursing through `Kids`), the catalog `AF` array, page-level
/// `FileAttachment` annotations, and finally a full indirect-object scan
/// for `Filespec` dictionaries — in that order, stopping at first match
/// per name, but collecting every attachment found for VD search.
fn collect_attachments(doc: &Document) -> Vec<FoundFile> {
    let mut out = Vec::new();
    let mut seen_filespecs = std::collections::HashSet::new();

    let mut visit_filespec = |doc: &Document, filespec_id: (u32, u16), out: &mut Vec<FoundFile>| {
        if !seen_filespecs.insert(filespec_id) {
            return;
        }
        let Ok(Object::Dictionary(filespec)) = doc.get_object(filespec_id) else {
            return;
        };
        let name = filespec
            .get(b"UF")
            .or_else(|_| filespec.get(b"F"))
            .ok()
            .and_then(|o| o.as_str().ok().map(|s| decode_name(s)))
            .unwrap_or_default();
        let Ok(Object::Dictionary(ef)) = filespec.get(b"EF") else {
            return;
        };
        let Ok(Object::Reference(stream_id)) = ef.get(b"F") else {
            return;
        };
        let Ok(Object::Stream(stream)) = doc.get_object(*stream_id) else {
            return;
        };
        let raw = stream.content.clone();
        let is_flate = stream
            .dict
            .get(b"Filter")
            .ok()
            .and_then(|o| o.as_name_str().ok())
            .map(|n| n == "FlateDecode")
            .unwrap_or(false);
        let bytes = if is_flate { decompress_stream(&raw) } else { raw };
        out.push(FoundFile { name, bytes });
    };

    // (a) Names -> EmbeddedFiles, recursing through Kids.
    if let Ok(Object::Dictionary(catalog)) = doc.trailer.get(b"Root").and_then(|r| match r {
        Object::Reference(id) => doc.get_object(*id),
        other => Ok(other),
    }) {
        if let Ok(Object::Dictionary(names)) = catalog.get(b"Names") {
            if let Ok(Object::Dictionary(ef_tree)) = names.get(b"EmbeddedFiles") {
                walk_name_tree(doc, ef_tree, &mut visit_filespec, &mut out);
            }
        }

        // (b) catalog AF array.
        if let Ok(Object::Array(af)) = catalog.get(b"AF") {
            for entry in af {
                if let Object::Reference(id) = entry {
                    visit_filespec(doc, *id, &mut out);
                }
            }
        }
    }

    // (c) page-level FileAttachment annotations.
    for (_, page_id) in doc.get_pages() {
        if let Ok(Object::Dictionary(page)) = doc.get_object(page_id) {
            if let Ok(Object::Array(annots)) = page.get(b"Annots") {
                for annot in annots {
                    let Object::Reference(annot_id) = annot else { continue };
                    let Ok(Object::Dictionary(annot_dict)) = doc.get_object(*annot_id) else { continue };
                    let is_file_attachment = annot_dict
                        .get(b"Subtype")
                        .ok()
                        .and_then(|o| o.as_name_str().ok())
                        .map(|n| n == "FileAttachment")
                        .unwrap_or(false);
                    if !is_file_attachment {
                        continue;
                    }
                    if let Ok(Object::Reference(fs_id)) = annot_dict.get(b"FS") {
                        visit_filespec(doc, *fs_id, &mut out);
                    }
                }
            }
        }
    }

    // (d) full indirect-object scan for Filespec dictionaries.
    for (id, object) in doc.objects.iter() {
        if let Object::Dictionary(dict) = object {
            let is_filespec = dict
                .get(b"Type")
                .ok()
                .and_then(|o| o.as_name_str().ok())
                .map(|n| n == "Filespec")
                .unwrap_or(false);
            if is_filespec {
                visit_filespec(doc, *id, &mut out);
            }
        }
    }

    out
}

fn walk_name_tree(
    doc: &Document,
    node: &lopdf::Dictionary,
    visit: &mut impl FnMut(&Document, (u32, u16), &mut Vec<FoundFile>),
    out: &mut Vec<FoundFile>,
) {
    if let Ok(Object::Array(names)) = node.get(b"Names") {
        // [name, filespec_ref, name, filespec_ref, ...]
        for pair in names.chunks(2) {
            if let [_, Object::Reference(id)] = pair {
                visit(doc, *id, out);
            }
        }
    }
    if let Ok(Object::Array(kids)) = node.get(b"Kids") {
        for kid in kids {
            if let Object::Reference(kid_id) = kid {
                if let Ok(Object::Dictionary(kid_dict)) = doc.get_object(*kid_id) {
                    walk_name_tree(doc, kid_dict, visit, out);
                }
            }
        }
    }
}

/// §4.9 step 1: recover the original PDF bytes.
pub fn extract_original_pdf(doc: &Document) -> Option<Vec<u8>> {
    collect_attachments(doc)
        .into_iter()
        .find(|f| is_original_pdf_name(&f.name))
        .map(|f| f.bytes)
}

/// §4.9 step 2: recover the VD, falling back to `Subject`/`Keywords`
/// metadata for legacy documents that predate the JSON attachment.
pub fn extract_verification_bundle(doc: &Document) -> Option<serde_json::Value> {
    for file in collect_attachments(doc) {
        if let Ok(value) = serde_json::from_slice::<serde_json::Value>(&file.bytes) {
            if VerificationBundle::looks_like_vd(&value) {
                return Some(value);
            }
        }
    }

    let info = doc.trailer.get(b"Info").ok().and_then(|r| match r {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    });
    let Some(Object::Dictionary(info_dict)) = info else {
        return None;
    };
    for key in [b"Subject".as_slice(), b"Keywords".as_slice()] {
        if let Ok(raw) = info_dict.get(key) {
            if let Ok(bytes) = raw.as_str() {
                if let Ok(value) = serde_json::from_slice::<serde_json::Value>(bytes) {
                    if VerificationBundle::looks_like_vd(&value) {
                        return Some(value);
                    }
                }
            }
        }
    }
    None
}

pub fn count_annotations(doc: &Document) -> usize {
    doc.get_pages()
        .into_iter()
        .filter_map(|(_, id)| doc.get_object(id).ok())
        .filter_map(|obj| match obj {
            Object::Dictionary(d) => d.get(b"Annots").ok(),
            _ => None,
        })
        .filter_map(|annots| match annots {
            Object::Array(arr) => Some(arr.len()),
            _ => None,
        })
        .sum()
}

pub fn count_images(doc: &Document) -> usize {
    doc.objects
        .values()
        .filter(|obj| {
            let Object::Stream(stream) = obj else { return false };
            stream
                .dict
                .get(b"Subtype")
                .ok()
                .and_then(|o| o.as_name_str().ok())
                .map(|n| n == "Image")
                .unwrap_or(false)
        })
        .count()
}

/// Count `startxref` occurrences in the raw bytes of the outer PDF (§4.9
/// step 10e): more than one indicates an incremental update, which is only
/// a warning since many valid workflows append revisions this way but the
/// step flags it as suspicious for a freshly-issued certificate.
pub fn count_startxref_markers(raw_bytes: &[u8]) -> usize {
    static PATTERN: &str = "startxref";
    let text = String::from_utf8_lossy(raw_bytes);
    text.matches(PATTERN).count()
}

/// Parses a PDF date string (`D:YYYYMMDDHHmmSS` with an optional
/// `+HH'mm'`/`-HH'mm'`/`Z` trailer) into a UTC instant, the format
/// `rewrite_metadata` writes (§4.8 step 6).
fn parse_pdf_date(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    use chrono::{NaiveDate, TimeZone, Utc};
    let s = s.strip_prefix("D:").unwrap_or(s);
    if s.len() < 14 {
        return None;
    }
    let year: i32 = s[0..4].parse().ok()?;
    let month: u32 = s[4..6].parse().ok()?;
    let day: u32 = s[6..8].parse().ok()?;
    let hour: u32 = s[8..10].parse().ok()?;
    let minute: u32 = s[10..12].parse().ok()?;
    let second: u32 = s[12..14].parse().ok()?;
    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;
    let utc = Utc.from_utc_datetime(&naive);
    Some(utc - chrono::Duration::seconds(parse_pdf_date_offset(&s[14..])))
}

/// `+HH'mm'`/`-HH'mm'`/`Z`/empty → signed offset seconds east of UTC.
fn parse_pdf_date_offset(rest: &str) -> i64 {
    let rest = rest.trim();
    if rest.is_empty() || rest.starts_with('Z') {
        return 0;
    }
    let sign = if rest.starts_with('-') { -1i64 } else { 1i64 };
    let digits: String = rest.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 4 {
        return 0;
    }
    let hh: i64 = digits[0..2].parse().unwrap_or(0);
    let mm: i64 = digits[2..4].parse().unwrap_or(0);
    sign * (hh * 3600 + mm * 60)
}

fn get_info_dict(doc: &Document) -> Option<&lopdf::Dictionary> {
    let info = doc.trailer.get(b"Info").ok().and_then(|r| match r {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    })?;
    match info {
        Object::Dictionary(d) => Some(d),
        _ => None,
    }
}

/// §4.9 step 10d: `CreationDate`/`ModDate` delta in seconds, or `None` if
/// either field is missing or unparseable.
pub fn creation_mod_date_delta_seconds(doc: &Document) -> Option<i64> {
    let info = get_info_dict(doc)?;
    let creation = info.get(b"CreationDate").ok()?.as_str().ok().map(decode_name)?;
    let modified = info.get(b"ModDate").ok()?.as_str().ok().map(decode_name)?;
    let creation = parse_pdf_date(&creation)?;
    let modified = parse_pdf_date(&modified)?;
    Some((modified - creation).num_seconds().abs())
}

/// §4.9 step 10f: `Producer` matches the known issuer string or the PDF
/// library's own default.
pub fn producer_is_known(doc: &Document) -> bool {
    let Some(info) = get_info_dict(doc) else { return false };
    let Ok(producer_bytes) = info.get(b"Producer").and_then(|o| o.as_str()) else {
        return false;
    };
    let producer = decode_name(producer_bytes);
    producer.eq_ignore_ascii_case(KNOWN_ISSUER_PRODUCER) || producer.eq_ignore_ascii_case(LIBRARY_DEFAULT_PRODUCER)
}

fn normalize_whitespace(s: &str) -> String {
    let re = Regex::new(r"\s+").expect("static regex is valid");
    re.replace_all(s.trim(), " ").to_string()
}

pub fn text_layers_match(outer_text: &str, original_text: &str) -> bool {
    normalize_whitespace(outer_text) == normalize_whitespace(original_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_original_pdf_name_matches_canonical_and_legacy_forms() {
        assert!(is_original_pdf_name("Justifai_Original_PDF.pdf"));
        assert!(is_original_pdf_name("original.pdf"));
        assert!(is_original_pdf_name("LegitDoc_2021.pdf"));
        assert!(is_original_pdf_name("QuestVerify_abc.pdf"));
        assert!(!is_original_pdf_name("unrelated.pdf"));
    }

    #[test]
    fn parse_pdf_date_reads_utc_offset_form() {
        let dt = parse_pdf_date("D:20260726221200+00'00'").unwrap();
        assert_eq!(dt.to_rfc3339(), "2026-07-26T22:12:00+00:00");
    }

    #[test]
    fn parse_pdf_date_applies_nonzero_offset() {
        let plus = parse_pdf_date("D:20260726221200+02'00'").unwrap();
        let utc = parse_pdf_date("D:20260726221200+00'00'").unwrap();
        assert_eq!((utc - plus).num_seconds(), 2 * 3600);
    }

    #[test]
    fn parse_pdf_date_rejects_too_short_input() {
        assert!(parse_pdf_date("D:2026").is_none());
    }

    #[test]
    fn decode_name_handles_utf16be_bom() {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in "hi".encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(decode_name(&bytes), "hi");
    }

    #[test]
    fn decode_name_passes_through_plain_utf8() {
        assert_eq!(decode_name(b"plain.pdf"), "plain.pdf");
    }

    #[test]
    fn text_layers_match_ignores_whitespace_differences() {
        assert!(text_layers_match("hello   world\n", "hello world"));
        assert!(!text_layers_match("hello world", "hello there"));
    }

    #[test]
    fn count_startxref_markers_counts_occurrences() {
        let raw = b"%PDF-1.7\n...\nstartxref\n123\n%%EOF\nstartxref\n456\n%%EOF";
        assert_eq!(count_startxref_markers(raw), 2);
    }
}
