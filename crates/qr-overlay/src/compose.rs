//! Logo overlay on top of a rendered QR code
//!
//! The overlay is sized from a percentage of the QR data square (the code
//! without its quiet zone) and pasted centred using its own alpha channel.

use image::{
    imageops::{self, FilterType},
    Rgba, RgbaImage,
};
use tracing::{debug, info, warn};

use crate::label::{fit_font_size, Label, LabelFont};

/// Largest resized overlay allowed, as a multiple of the QR image area
pub const MAX_OVERLAY_AREA_FACTOR: u64 = 4;

/// Placement of the overlay on the QR image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayGeometry {
    /// QR side length without the quiet zone
    pub data_square_side: u32,
    /// `floor(data_square_side * percentage)`
    pub overlay_size: u32,
    pub target_width: u32,
    pub target_height: u32,
    pub x: i64,
    pub y: i64,
}

/// Compute the overlay size and position for a QR of `qr_width` x `qr_height`
///
/// Width and height are derived with the overlay's height and width as the
/// respective divisors. For non-square logos this stretches the long side
/// quadratically instead of preserving the aspect ratio; existing clients
/// depend on that output so it is kept as is.
pub fn overlay_geometry(
    qr_width: u32,
    qr_height: u32,
    overlay_width: u32,
    overlay_height: u32,
    percentage: f64,
) -> OverlayGeometry {
    let data_square_side = (qr_width / 25) * 24;
    let overlay_size = (data_square_side as f64 * percentage).floor().max(0.0) as u64;

    let ow = overlay_width.max(1) as u64;
    let oh = overlay_height.max(1) as u64;
    let target_width = (overlay_size * ow / oh).clamp(1, u32::MAX as u64) as u32;
    let target_height = (overlay_size * oh / ow).clamp(1, u32::MAX as u64) as u32;

    OverlayGeometry {
        data_square_side,
        overlay_size: overlay_size as u32,
        target_width,
        target_height,
        x: (qr_width as i64 - target_width as i64).div_euclid(2),
        y: (qr_height as i64 - target_height as i64).div_euclid(2),
    }
}

/// Paste `overlay` (and optionally a label) centred on `qr`
///
/// A missing overlay is not an error: the QR image is returned untouched.
pub fn compose(
    mut qr: RgbaImage,
    overlay: Option<&RgbaImage>,
    percentage: f64,
    label: Option<&Label>,
    font: Option<&LabelFont>,
    label_color: Rgba<u8>,
) -> RgbaImage {
    let Some(overlay) = overlay else {
        info!("No overlay image, returning plain QR code");
        return qr;
    };

    let geometry = overlay_geometry(
        qr.width(),
        qr.height(),
        overlay.width(),
        overlay.height(),
        percentage,
    );
    debug!(?geometry, "Overlay geometry");

    let target_area = geometry.target_width as u64 * geometry.target_height as u64;
    let limit = MAX_OVERLAY_AREA_FACTOR * qr.width() as u64 * qr.height() as u64;
    if target_area > limit {
        warn!(
            target_width = geometry.target_width,
            target_height = geometry.target_height,
            "Overlay would be larger than {}x the QR code, skipping",
            MAX_OVERLAY_AREA_FACTOR
        );
        return qr;
    }

    let mut resized = imageops::resize(
        overlay,
        geometry.target_width,
        geometry.target_height,
        FilterType::CatmullRom,
    );

    if let Some(label) = label.filter(|l| !l.text.trim().is_empty()) {
        match font {
            Some(font) => draw_label(&mut resized, label, font, label_color),
            None => warn!("Text label requested but no label font is configured"),
        }
    }

    imageops::overlay(&mut qr, &resized, geometry.x, geometry.y);
    qr
}

fn draw_label(overlay: &mut RgbaImage, label: &Label, font: &LabelFont, color: Rgba<u8>) {
    let max_width = overlay.width() as f32 / 2.0;
    let size = fit_font_size(font, &label.text, label.font_size, max_width, label.fit);
    if size < label.font_size {
        debug!(
            requested = label.font_size,
            fitted = size,
            "Shrunk label to fit overlay"
        );
    }
    font.draw_centered(overlay, &label.text, size, color);
}
