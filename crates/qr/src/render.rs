//! Adaptive error-correction-level QR PNG rendering (spec §4.8 step 3).

use image::{GrayImage, Luma};
use justifai_errors::Error;
use qrcode::types::QrError;
use qrcode::{EcLevel, QrCode};

/// Ladder tried highest-resilience first; each step down buys capacity at
/// the cost of error tolerance.
const ECL_LADDER: [EcLevel; 4] = [EcLevel::H, EcLevel::Q, EcLevel::L, EcLevel::M];

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub png_width: u32,
    pub margin_modules: u32,
    pub dark: [u8; 3],
    pub light: [u8; 3],
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            png_width: 768,
            margin_modules: 8,
            dark: [0, 0, 0],
            light: [255, 255, 255],
        }
    }
}

/// Render `content` at the highest ECL that fits, stepping down the ladder
/// on "data too big" errors per §4.8 step 3. Returns the chosen level along
/// with the rendered grayscale PNG bytes.
pub fn render_adaptive(content: &str, options: &RenderOptions) -> Result<(EcLevel, Vec<u8>), Error> {
    let mut last_err: Option<QrError> = None;
    for &level in &ECL_LADDER {
        match QrCode::with_error_correction_level(content, level) {
            Ok(code) => {
                let png = render_png(&code, options)?;
                return Ok((level, png));
            }
            Err(e @ QrError::DataTooLong) => {
                last_err = Some(e);
                continue;
            }
            Err(e) => return Err(Error::validation(format!("qr encode failed: {e}"))),
        }
    }
    Err(Error::validation(format!(
        "qr payload does not fit at any error-correction level: {}",
        last_err.map(|e| e.to_string()).unwrap_or_default()
    )))
}

fn render_png(code: &QrCode, options: &RenderOptions) -> Result<Vec<u8>, Error> {
    let modules_per_side = code.width() as u32;
    let total_modules = modules_per_side + 2 * options.margin_modules;
    let scale = (options.png_width / total_modules).max(1);
    let image_side = total_modules * scale;

    let mut image = GrayImage::from_pixel(image_side, image_side, Luma([options.light[0]]));
    let colors = code.to_colors();

    for y in 0..modules_per_side {
        for x in 0..modules_per_side {
            let is_dark = colors[(y * modules_per_side + x) as usize] == qrcode::Color::Dark;
            let value = if is_dark { options.dark[0] } else { options.light[0] };
            let px0 = (options.margin_modules + x) * scale;
            let py0 = (options.margin_modules + y) * scale;
            for dy in 0..scale {
                for dx in 0..scale {
                    image.put_pixel(px0 + dx, py0 + dy, Luma([value]));
                }
            }
        }
    }

    let mut png_bytes = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut png_bytes), image::ImageFormat::Png)
        .map_err(|e| Error::validation(format!("png encode failed: {e}")))?;
    Ok(png_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_small_payload_at_highest_ecl() {
        let (level, png) = render_adaptive("hello", &RenderOptions::default()).unwrap();
        assert_eq!(level, EcLevel::H);
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn steps_down_ladder_for_large_payload() {
        let large = "x".repeat(2500);
        let result = render_adaptive(&large, &RenderOptions::default());
        assert!(result.is_ok());
        let (level, _) = result.unwrap();
        assert_ne!(level, EcLevel::H, "a 2500-byte payload should not fit at ECL H");
    }

    #[test]
    fn rejects_payload_too_large_for_any_level() {
        let huge = "x".repeat(10_000);
        let result = render_adaptive(&huge, &RenderOptions::default());
        assert!(result.is_err());
    }
}
