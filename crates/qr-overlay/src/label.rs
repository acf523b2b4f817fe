//! Text labels drawn on top of the overlay image
//!
//! Font sizes are shrunk one point at a time until the label is at most half
//! the overlay width. Measurement goes through [`TextMeasure`] so the fitting
//! loop does not depend on a concrete font file.

use std::path::Path;
use std::sync::Arc;

use image::{Rgba, RgbaImage};
use rusttype::{point, Font, Scale};

use crate::error::QrError;

/// Smallest font size the fitting loop will produce
pub const MIN_FONT_SIZE: f32 = 1.0;

/// Largest font size a label may be drawn at
pub const MAX_FONT_SIZE: f32 = 1000.0;

/// How the requested font size is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelFit {
    /// Draw at the requested size even if it overflows
    Fixed,
    /// Shrink by 1pt until the text fits the box
    #[default]
    ShrinkToFit,
}

/// A text label to draw centred on the overlay
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    pub font_size: f32,
    pub fit: LabelFit,
}

/// Bounding box of rendered text relative to its drawing origin
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextBounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl TextBounds {
    pub fn width(&self) -> f32 {
        (self.max_x - self.min_x).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.max_y - self.min_y).max(0.0)
    }
}

pub trait TextMeasure {
    /// Pixel bounds of `text` at `size`, with the origin at the top-left of the line box
    fn measure(&self, text: &str, size: f32) -> TextBounds;
}

/// Pick the font size to draw `text` with
///
/// The requested size is clamped to `MIN_FONT_SIZE..=MAX_FONT_SIZE`. Shrinking
/// steps whole points, so it measures at most `MAX_FONT_SIZE` times.
pub fn fit_font_size(
    measure: &dyn TextMeasure,
    text: &str,
    requested: f32,
    max_width: f32,
    fit: LabelFit,
) -> f32 {
    let size = if requested.is_nan() {
        MIN_FONT_SIZE
    } else {
        requested.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
    };
    if fit == LabelFit::Fixed || measure.measure(text, size).width() <= max_width {
        return size;
    }

    let floor = MIN_FONT_SIZE as u32;
    let mut points = size.ceil() as u32;
    while points > floor {
        points -= 1;
        if measure.measure(text, points as f32).width() <= max_width {
            break;
        }
    }
    points as f32
}

/// A TrueType font used to rasterize labels
#[derive(Clone)]
pub struct LabelFont {
    font: Arc<Font<'static>>,
}

impl std::fmt::Debug for LabelFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelFont").finish_non_exhaustive()
    }
}

impl LabelFont {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, QrError> {
        let font = Font::try_from_vec(bytes)
            .ok_or_else(|| QrError::Font("not a TrueType/OpenType font".into()))?;
        Ok(Self {
            font: Arc::new(font),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, QrError> {
        let bytes = std::fs::read(path)
            .map_err(|e| QrError::Font(format!("{}: {}", path.display(), e)))?;
        Self::from_bytes(bytes)
    }

    /// Draw `text` with its bounding box centred inside `target`
    pub fn draw_centered(&self, target: &mut RgbaImage, text: &str, size: f32, color: Rgba<u8>) {
        let bounds = self.measure(text, size);
        let x = (target.width() as f32 - bounds.width()) / 2.0 - bounds.min_x;
        let y = (target.height() as f32 - bounds.height()) / 2.0 - bounds.min_y;
        self.draw_at(target, text, size, x, y, color);
    }

    fn draw_at(&self, target: &mut RgbaImage, text: &str, size: f32, x: f32, y: f32, color: Rgba<u8>) {
        let scale = Scale::uniform(size);
        let ascent = self.font.v_metrics(scale).ascent;

        for glyph in self.font.layout(text, scale, point(x, y + ascent)) {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|gx, gy, coverage| {
                let px = gx as i32 + bb.min.x;
                let py = gy as i32 + bb.min.y;
                if px < 0 || py < 0 || px as u32 >= target.width() || py as u32 >= target.height() {
                    return;
                }
                let a = coverage * (color.0[3] as f32 / 255.0);
                if a <= 0.0 {
                    return;
                }
                let dst = target.get_pixel_mut(px as u32, py as u32);
                let inv = 1.0 - a;
                for c in 0..3 {
                    dst.0[c] = (color.0[c] as f32 * a + dst.0[c] as f32 * inv).round() as u8;
                }
                dst.0[3] = dst.0[3].max((a * 255.0).round() as u8);
            });
        }
    }
}

impl TextMeasure for LabelFont {
    fn measure(&self, text: &str, size: f32) -> TextBounds {
        let scale = Scale::uniform(size);
        let ascent = self.font.v_metrics(scale).ascent;

        let mut bounds: Option<TextBounds> = None;
        for glyph in self.font.layout(text, scale, point(0.0, ascent)) {
            if let Some(bb) = glyph.pixel_bounding_box() {
                let b = bounds.get_or_insert(TextBounds {
                    min_x: bb.min.x as f32,
                    min_y: bb.min.y as f32,
                    max_x: bb.max.x as f32,
                    max_y: bb.max.y as f32,
                });
                b.min_x = b.min_x.min(bb.min.x as f32);
                b.min_y = b.min_y.min(bb.min.y as f32);
                b.max_x = b.max_x.max(bb.max.x as f32);
                b.max_y = b.max_y.max(bb.max.y as f32);
            }
        }
        bounds.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every glyph is `0.5 * size` wide and `size` tall
    struct FixedAdvance;

    impl TextMeasure for FixedAdvance {
        fn measure(&self, text: &str, size: f32) -> TextBounds {
            TextBounds {
                min_x: 0.0,
                min_y: 0.0,
                max_x: text.chars().count() as f32 * size * 0.5,
                max_y: size,
            }
        }
    }

    #[test]
    fn test_fixed_keeps_requested_size() {
        let size = fit_font_size(&FixedAdvance, "overflowing label", 40.0, 10.0, LabelFit::Fixed);
        assert_eq!(size, 40.0);
    }

    #[test]
    fn test_shrink_stops_at_first_fitting_size() {
        // 10 chars * 0.5 => width == size * 5, must be <= 100
        let size = fit_font_size(&FixedAdvance, "0123456789", 40.0, 100.0, LabelFit::ShrinkToFit);
        assert_eq!(size, 20.0);
    }

    #[test]
    fn test_shrink_leaves_fitting_text_alone() {
        let size = fit_font_size(&FixedAdvance, "ok", 12.0, 100.0, LabelFit::ShrinkToFit);
        assert_eq!(size, 12.0);
    }

    #[test]
    fn test_shrink_has_floor() {
        let size = fit_font_size(&FixedAdvance, "never fits", 30.0, 0.0, LabelFit::ShrinkToFit);
        assert_eq!(size, MIN_FONT_SIZE);
    }

    #[test]
    fn test_huge_request_is_clamped_and_terminates() {
        let size = fit_font_size(&FixedAdvance, "Scan me", 1e8, 100.0, LabelFit::ShrinkToFit);
        // 7 chars * 0.5 => width == size * 3.5, must be <= 100
        assert_eq!(size, 28.0);

        let fixed = fit_font_size(&FixedAdvance, "Scan me", f32::MAX, 100.0, LabelFit::Fixed);
        assert_eq!(fixed, MAX_FONT_SIZE);
    }

    #[test]
    fn test_shrink_measures_at_most_once_per_point() {
        struct Counting(std::cell::Cell<u32>);

        impl TextMeasure for Counting {
            fn measure(&self, _text: &str, size: f32) -> TextBounds {
                self.0.set(self.0.get() + 1);
                TextBounds {
                    max_x: size * 10.0,
                    max_y: size,
                    ..Default::default()
                }
            }
        }

        let counter = Counting(std::cell::Cell::new(0));
        let size = fit_font_size(&counter, "x", 1e30, 0.0, LabelFit::ShrinkToFit);
        assert_eq!(size, MIN_FONT_SIZE);
        assert!(counter.0.get() <= MAX_FONT_SIZE as u32 + 1);
    }

    #[test]
    fn test_fractional_request_steps_whole_points() {
        // width == size * 5; 20.5 overflows 100, 20 fits
        let size = fit_font_size(&FixedAdvance, "0123456789", 20.5, 100.0, LabelFit::ShrinkToFit);
        assert_eq!(size, 20.0);
    }

    #[test]
    fn test_empty_bounds_have_zero_size() {
        let bounds = TextBounds::default();
        assert_eq!(bounds.width(), 0.0);
        assert_eq!(bounds.height(), 0.0);
    }

    #[test]
    fn test_invalid_font_bytes_rejected() {
        let result = LabelFont::from_bytes(b"not a font".to_vec());
        assert!(matches!(result, Err(QrError::Font(_))));
    }
}
