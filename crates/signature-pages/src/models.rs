//! Signature entries and layout configuration

use serde::{Deserialize, Serialize};

/// Number of approval levels a request can carry
pub const LEVEL_COUNT: usize = 5;

/// One approval recorded on a signature page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureEntry {
    pub role: String,
    pub name: String,
    /// Directory account name, shown next to the display name when present
    #[serde(default)]
    pub adname: String,
    /// Pre-formatted approval time
    #[serde(default)]
    pub timestamp: String,
}

impl SignatureEntry {
    /// Name line as printed under the role
    pub fn display_name(&self) -> String {
        let adname = self.adname.trim();
        if adname.is_empty() || adname == self.name.trim() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, adname)
        }
    }
}

/// Entries grouped into ordered approval levels 1 to 5
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureLevels {
    levels: [Vec<SignatureEntry>; LEVEL_COUNT],
}

impl SignatureLevels {
    pub fn new(levels: [Vec<SignatureEntry>; LEVEL_COUNT]) -> Self {
        Self { levels }
    }

    /// Non-empty levels in order, with their 1-based level number
    pub fn non_empty(&self) -> impl Iterator<Item = (usize, &[SignatureEntry])> {
        self.levels
            .iter()
            .enumerate()
            .filter(|(_, entries)| !entries.is_empty())
            .map(|(i, entries)| (i + 1, entries.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.levels.iter().all(Vec::is_empty)
    }

    pub fn total_entries(&self) -> usize {
        self.levels.iter().map(Vec::len).sum()
    }
}

/// Page dimensions in PDF points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub const A4: PageSize = PageSize {
        width: 595.0,
        height: 842.0,
    };
}

/// RGB colour with components in 0..=1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RgbColor(pub f32, pub f32, pub f32);

/// Geometry and fixed text of the signature pages
///
/// All vertical offsets are measured from the top of the page.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    pub margin_left: f32,
    pub margin_right: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,

    /// Box each logo is scaled into (aspect preserved)
    pub logo_width: f32,
    pub logo_height: f32,

    pub header_lines: [String; 3],
    pub header_font_size: f32,
    pub header_line_height: f32,

    pub greeting: String,
    pub greeting_font_size: f32,
    pub greeting_line_height: f32,

    /// Caption per level; `{level}` is replaced with the level number
    pub level_caption: String,
    pub caption_font_size: f32,

    /// Space between the header block and the first row
    pub header_gap: f32,

    pub row_height: f32,
    pub column_gap: f32,
    pub role_font_size: f32,
    pub name_font_size: f32,
    pub timestamp_font_size: f32,
    pub name_color: RgbColor,
    pub rule_width: f32,

    pub link_text: String,
    pub link_color: RgbColor,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            margin_left: 50.0,
            margin_right: 50.0,
            margin_top: 36.0,
            margin_bottom: 60.0,
            logo_width: 110.0,
            logo_height: 48.0,
            header_lines: [
                "APPROVAL RECORD".to_string(),
                "This document has been reviewed and electronically approved".to_string(),
                "by the signatories listed below.".to_string(),
            ],
            header_font_size: 12.0,
            header_line_height: 17.0,
            greeting: "Dear reader, each entry below shows the role of the approver, \
                       their name and the date and time at which the approval was recorded. \
                       Approvals are grouped by level and each level starts on its own page."
                .to_string(),
            greeting_font_size: 9.5,
            greeting_line_height: 13.0,
            level_caption: "Approval level {level}".to_string(),
            caption_font_size: 11.0,
            header_gap: 18.0,
            row_height: 72.0,
            column_gap: 24.0,
            role_font_size: 10.0,
            name_font_size: 11.0,
            timestamp_font_size: 8.5,
            name_color: RgbColor(0.05, 0.25, 0.55),
            rule_width: 0.75,
            link_text: "View the original document online".to_string(),
            link_color: RgbColor(0.0, 0.0, 0.8),
        }
    }
}

impl LayoutConfig {
    pub fn content_width(&self, page: PageSize) -> f32 {
        (page.width - self.margin_left - self.margin_right).max(0.0)
    }

    pub fn caption_for(&self, level: usize) -> String {
        self.level_caption.replace("{level}", &level.to_string())
    }
}
