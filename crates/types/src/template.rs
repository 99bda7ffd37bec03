//! Template entity (§3).

use crate::ids::TemplateId;

/// Placement hint for the QR code on the rendered certificate, in CSS
/// pixels on a given page index (0-based).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct QrPlacement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub page_index: u32,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Template {
    pub id: TemplateId,
    pub html_content: String,
    /// Parameter names declared by the template; empty means "accept
    /// whatever the job provides" (§4.10 `fields` derivation).
    pub parameter_names: Vec<String>,
    pub qr_placement: Option<QrPlacement>,
}

impl Template {
    /// Parse a fallback QR placement from a `.qr-placeholder` CSS rule in
    /// the template HTML, per §4.6 P6's fallback path. Looks for the first
    /// `.qr-placeholder { ... }` block and reads `left`/`top`/`width`/
    /// `height` declarations in pixels.
    pub fn qr_placement_from_css(&self) -> Option<QrPlacement> {
        let css = extract_rule_body(&self.html_content, ".qr-placeholder")?;
        let x = extract_px_property(&css, "left")?;
        let y = extract_px_property(&css, "top")?;
        let width = extract_px_property(&css, "width")?;
        let height = extract_px_property(&css, "height")?;
        Some(QrPlacement {
            x,
            y,
            width,
            height,
            page_index: 0,
        })
    }

    /// Resolve the effective QR placement: explicit hint takes priority
    /// over the CSS fallback.
    pub fn resolve_qr_placement(&self) -> Option<QrPlacement> {
        self.qr_placement.or_else(|| self.qr_placement_from_css())
    }
}

fn extract_rule_body<'a>(html: &'a str, selector: &str) -> Option<&'a str> {
    let start = html.find(selector)?;
    let open = html[start..].find('{')? + start + 1;
    let close = html[open..].find('}')? + open;
    Some(&html[open..close])
}

fn extract_px_property(css: &str, property: &str) -> Option<f64> {
    for decl in css.split(';') {
        let mut parts = decl.splitn(2, ':');
        let name = parts.next()?.trim();
        if name.eq_ignore_ascii_case(property) {
            let value = parts.next()?.trim().trim_end_matches("px").trim();
            return value.parse().ok();
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template_with_css(css: &str) -> Template {
        Template {
            id: TemplateId::new(),
            html_content: format!("<html><style>{}</style><body></body></html>", css),
            parameter_names: vec![],
            qr_placement: None,
        }
    }

    #[test]
    fn parses_qr_placeholder_css() {
        let t = template_with_css(
            ".qr-placeholder { left: 10px; top: 20px; width: 100px; height: 100px; }",
        );
        let placement = t.qr_placement_from_css().unwrap();
        assert_eq!(placement.x, 10.0);
        assert_eq!(placement.y, 20.0);
        assert_eq!(placement.width, 100.0);
        assert_eq!(placement.height, 100.0);
    }

    #[test]
    fn explicit_hint_wins_over_css() {
        let mut t = template_with_css(".qr-placeholder { left: 1px; top: 1px; width: 1px; height: 1px; }");
        t.qr_placement = Some(QrPlacement {
            x: 5.0,
            y: 5.0,
            width: 50.0,
            height: 50.0,
            page_index: 2,
        });
        let resolved = t.resolve_qr_placement().unwrap();
        assert_eq!(resolved.page_index, 2);
        assert_eq!(resolved.x, 5.0);
    }

    #[test]
    fn missing_css_rule_yields_none() {
        let t = template_with_css("body { color: red; }");
        assert!(t.qr_placement_from_css().is_none());
    }
}
