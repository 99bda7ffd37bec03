//! PDF augmentor (spec §4.8): attach the original PDF + verification
//! bundle, draw the QR image, add the marker annotation, and rewrite
//! metadata.

use chrono::Utc;
use justifai_errors::{Error, Result};
use justifai_types::QrPlacement;
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

use crate::bundle::{ORIGINAL_PDF_ATTACHMENT_NAME, VERIFICATION_BUNDLE_ATTACHMENT_NAME};

/// CSS pixels are the default placement unit (§4.8); PDF content streams
/// are in points. `96 px/in → 72 pt/in`.
pub fn css_px_to_pt(px: f64) -> f64 {
    px * 72.0 / 96.0
}

/// Attach `bytes` as a named embedded file, registering it in both the
/// catalog's `Names → EmbeddedFiles` name tree and the `AF` array (§4.8
/// step 1/2), so either traversal strategy §4.9 step 1 uses finds it.
fn attach_file(doc: &mut Document, name: &str, bytes: &[u8], mime: &str) -> Result<()> {
    let file_stream_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "EmbeddedFile",
            "Subtype" => Object::Name(mime.replace('/', "#2F").into_bytes()),
        },
        bytes.to_vec(),
    ));

    let filespec_dict = dictionary! {
        "Type" => "Filespec",
        "F" => Object::string_literal(name),
        "UF" => Object::string_literal(name),
        "EF" => dictionary! { "F" => Object::Reference(file_stream_id) },
    };
    let filespec_id = doc.add_object(Object::Dictionary(filespec_dict));

    let catalog_ref = doc.trailer.get(b"Root").cloned().map_err(|e| Error::pdf(e.to_string()))?;
    let Object::Reference(catalog_object_id) = catalog_ref else {
        return Err(Error::pdf("trailer Root is not a reference"));
    };

    // Append to the `AF` array (§4.8 step 1/2's second traversal path).
    let catalog = doc
        .get_object_mut(catalog_object_id)
        .map_err(|e| Error::pdf(format!("failed to load catalog: {e}")))?;
    let Object::Dictionary(catalog_dict) = catalog else {
        return Err(Error::pdf("catalog object is not a dictionary"));
    };
    match catalog_dict.get_mut(b"AF") {
        Ok(Object::Array(arr)) => arr.push(Object::Reference(filespec_id)),
        _ => {
            catalog_dict.set("AF", Object::Array(vec![Object::Reference(filespec_id)]));
        }
    }

    // Register in Names → EmbeddedFiles as a minimal two-entry name tree
    // (no `Kids` recursion needed since we only ever append a few files).
    let names_entry = Object::Array(vec![Object::string_literal(name), Object::Reference(filespec_id)]);
    match catalog_dict.get_mut(b"Names") {
        Ok(Object::Dictionary(names_dict)) => match names_dict.get_mut(b"EmbeddedFiles") {
            Ok(Object::Dictionary(ef_dict)) => match ef_dict.get_mut(b"Names") {
                Ok(Object::Array(names_array)) => {
                    names_array.push(Object::string_literal(name));
                    names_array.push(Object::Reference(filespec_id));
                }
                _ => {
                    ef_dict.set("Names", names_entry);
                }
            },
            _ => {
                names_dict.set(
                    "EmbeddedFiles",
                    Object::Dictionary(dictionary! { "Names" => names_entry }),
                );
            }
        },
        _ => {
            catalog_dict.set(
                "Names",
                Object::Dictionary(dictionary! {
                    "EmbeddedFiles" => dictionary! { "Names" => names_entry },
                }),
            );
        }
    }

    Ok(())
}

/// Add the QR PNG (already rendered, grayscale) as an Image XObject on
/// `page_index`, drawn at `(x, y, width, height)` in PDF points, and add a
/// 1×1 invisible `Name=/JustifaiQR` annotation next to it as a removal
/// marker (§4.8 steps 3-5).
fn draw_qr_and_marker(
    doc: &mut Document,
    page_index: u32,
    qr_gray: &image::GrayImage,
    placement_pt: (f64, f64, f64, f64),
) -> Result<()> {
    let pages = doc.get_pages();
    let mut page_ids: Vec<_> = pages.into_iter().collect();
    page_ids.sort_by_key(|(n, _)| *n);
    let (_, page_id) = page_ids
        .get(page_index as usize)
        .copied()
        .ok_or_else(|| Error::pdf(format!("template references page index {page_index} but PDF has fewer pages")))?;

    let (width, height) = (qr_gray.width(), qr_gray.height());
    let image_dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => "DeviceGray",
        "BitsPerComponent" => 8,
        "Filter" => "FlateDecode",
    };
    let compressed = deflate(qr_gray.as_raw());
    let image_id = doc.add_object(Stream::new(image_dict, compressed));

    let resource_name = format!("JustifaiQR{}", image_id.0);
    let resources_id = doc
        .get_dictionary(page_id)
        .ok()
        .and_then(|d| d.get(b"Resources").ok().cloned());
    let resources_ref = match resources_id {
        Some(Object::Reference(r)) => r,
        _ => {
            let new_resources = doc.add_object(Object::Dictionary(dictionary! { "XObject" => dictionary!{} }));
            if let Ok(page_dict) = doc.get_dictionary_mut(page_id) {
                page_dict.set("Resources", Object::Reference(new_resources));
            }
            new_resources
        }
    };
    if let Ok(resources_dict) = doc.get_dictionary_mut(resources_ref) {
        let xobjects = match resources_dict.get_mut(b"XObject") {
            Ok(Object::Dictionary(d)) => d,
            _ => {
                resources_dict.set("XObject", Object::Dictionary(dictionary! {}));
                let Object::Dictionary(d) = resources_dict.get_mut(b"XObject").expect("just set") else {
                    unreachable!()
                };
                d
            }
        };
        xobjects.set(resource_name.clone(), Object::Reference(image_id));
    }

    let (x, y, w, h) = placement_pt;
    let draw_ops = format!("q {w:.3} 0 0 {h:.3} {x:.3} {y:.3} cm /{resource_name} Do Q\n");
    let new_content_id = doc.add_object(Stream::new(dictionary! {}, draw_ops.into_bytes()));
    if let Ok(page_dict) = doc.get_dictionary_mut(page_id) {
        match page_dict.get_mut(b"Contents") {
            Ok(Object::Array(arr)) => arr.push(Object::Reference(new_content_id)),
            Ok(existing @ Object::Reference(_)) => {
                let prior = existing.clone();
                *existing = Object::Array(vec![prior, Object::Reference(new_content_id)]);
            }
            _ => page_dict.set("Contents", Object::Reference(new_content_id)),
        }
    }

    // 1x1 invisible marker annotation (§4.8 step 5).
    let annotation_dict = dictionary! {
        "Type" => "Annot",
        "Subtype" => "Square",
        "Name" => Object::Name(b"JustifaiQR".to_vec()),
        "Rect" => Object::Array(vec![x.into(), y.into(), (x + 1.0).into(), (y + 1.0).into()]),
        "F" => 2, // Hidden flag
        "Border" => Object::Array(vec![0.into(), 0.into(), 0.into()]),
    };
    let annotation_id = doc.add_object(Object::Dictionary(annotation_dict));
    if let Ok(page_dict) = doc.get_dictionary_mut(page_id) {
        match page_dict.get_mut(b"Annots") {
            Ok(Object::Array(arr)) => arr.push(Object::Reference(annotation_id)),
            _ => page_dict.set("Annots", Object::Array(vec![Object::Reference(annotation_id)])),
        }
    }

    Ok(())
}

fn deflate(data: &[u8]) -> Vec<u8> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    let _ = encoder.write_all(data);
    encoder.finish().unwrap_or_default()
}

fn rewrite_metadata(doc: &mut Document, issuer_name: &str) -> Result<()> {
    let now = Utc::now();
    let pdf_date = format!("D:{}", now.format("%Y%m%d%H%M%S+00'00'"));

    let info_ref = doc.trailer.get(b"Info").ok().cloned();
    let info_id = match info_ref {
        Some(Object::Reference(id)) => id,
        _ => {
            let id = doc.add_object(Object::Dictionary(dictionary! {}));
            doc.trailer.set("Info", Object::Reference(id));
            id
        }
    };
    if let Ok(info_dict) = doc.get_dictionary_mut(info_id) {
        info_dict.set("Producer", Object::string_literal(issuer_name));
        info_dict.set("Creator", Object::string_literal(issuer_name));
        info_dict.set(
            "CreationDate",
            Object::String(pdf_date.clone().into_bytes(), StringFormat::Literal),
        );
        info_dict.set("ModDate", Object::String(pdf_date.into_bytes(), StringFormat::Literal));
    }
    Ok(())
}

pub struct AugmentInput<'a> {
    pub original_pdf_bytes: &'a [u8],
    pub vd_json: &'a str,
    pub qr_png_bytes: &'a [u8],
    pub placement: QrPlacement,
    pub issuer_name: &'a str,
}

/// Apply all of §4.8's steps and return the augmented PDF's bytes.
pub fn augment(input: AugmentInput) -> Result<Vec<u8>> {
    let mut doc = Document::load_mem(input.original_pdf_bytes).map_err(|e| Error::pdf(format!("load failed: {e}")))?;

    attach_file(&mut doc, ORIGINAL_PDF_ATTACHMENT_NAME, input.original_pdf_bytes, "application/pdf")?;
    attach_file(
        &mut doc,
        VERIFICATION_BUNDLE_ATTACHMENT_NAME,
        input.vd_json.as_bytes(),
        "application/json",
    )?;

    let qr_gray = image::load_from_memory(input.qr_png_bytes)
        .map_err(|e| Error::pdf(format!("failed to decode rendered QR png: {e}")))?
        .into_luma8();

    let placement_pt = (
        css_px_to_pt(input.placement.x),
        css_px_to_pt(input.placement.y),
        css_px_to_pt(input.placement.width),
        css_px_to_pt(input.placement.height),
    );
    draw_qr_and_marker(&mut doc, input.placement.page_index, &qr_gray, placement_pt)?;
    rewrite_metadata(&mut doc, input.issuer_name)?;

    let mut out = Vec::new();
    doc.save_to(&mut out).map_err(|e| Error::pdf(format!("save failed: {e}")))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_px_to_pt_applies_the_96_to_72_ratio() {
        assert!((css_px_to_pt(96.0) - 72.0).abs() < 1e-9);
        assert!((css_px_to_pt(0.0) - 0.0).abs() < 1e-9);
    }
}
