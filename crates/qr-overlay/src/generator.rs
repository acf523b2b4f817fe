//! QR code rendering
//!
//! Codes are always generated with error-correction level H, a 32px module
//! scale and a single-module quiet zone.

use image::{codecs::png::PngEncoder, ExtendedColorType, ImageEncoder, Rgba, RgbaImage};
use qrcode::{Color, EcLevel, QrCode};

use crate::error::QrError;

/// Pixels per QR module
pub const MODULE_SCALE: u32 = 32;

/// Quiet-zone width in modules
pub const BORDER_MODULES: u32 = 1;

const LIGHT: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Parse hex color string (e.g., "#7A663C", "7A663C" or "#fff") to an opaque RGBA pixel
pub fn parse_hex_color(color: &str) -> Result<Rgba<u8>, QrError> {
    let hex = color.trim().trim_start_matches('#');
    let invalid = || QrError::InvalidColor(color.to_string());

    if !hex.is_ascii() {
        return Err(invalid());
    }

    let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());
    match hex.len() {
        6 => Ok(Rgba([
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
            255,
        ])),
        3 => {
            let expand = |s: &str| channel(s).map(|v| v * 17);
            Ok(Rgba([
                expand(&hex[0..1])?,
                expand(&hex[1..2])?,
                expand(&hex[2..3])?,
                255,
            ]))
        }
        _ => Err(invalid()),
    }
}

/// Render `payload` as a QR code with dark modules painted in `color`
pub fn generate_qr(payload: &str, color: Rgba<u8>) -> Result<RgbaImage, QrError> {
    let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::H)
        .map_err(|e| QrError::Encode(e.to_string()))?;

    let modules = code.width() as u32;
    let colors = code.to_colors();
    let side = (modules + 2 * BORDER_MODULES) * MODULE_SCALE;

    let mut image = RgbaImage::from_pixel(side, side, LIGHT);
    for my in 0..modules {
        for mx in 0..modules {
            let idx = (my * modules + mx) as usize;
            if !matches!(colors.get(idx), Some(Color::Dark)) {
                continue;
            }
            let x0 = (mx + BORDER_MODULES) * MODULE_SCALE;
            let y0 = (my + BORDER_MODULES) * MODULE_SCALE;
            for y in y0..y0 + MODULE_SCALE {
                for x in x0..x0 + MODULE_SCALE {
                    image.put_pixel(x, y, color);
                }
            }
        }
    }

    Ok(image)
}

/// Encode an RGBA image as PNG
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, QrError> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| QrError::Png(e.to_string()))?;
    Ok(buf)
}
