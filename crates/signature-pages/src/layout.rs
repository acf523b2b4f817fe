//! Page geometry for signature levels
//!
//! Layout is computed up front, independent of lopdf, so row wrapping and
//! page breaks can be checked without rendering. Offsets grow downwards from
//! the top edge of the page; the renderer flips them into PDF space.

use crate::metrics::{wrap_text, StandardFont};
use crate::models::{LayoutConfig, PageSize};

/// Entries placed side by side before the row advances
pub const SIGNATURES_PER_ROW: usize = 2;

/// A line of header text positioned on the page
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub font: StandardFont,
    pub size: f32,
    pub x: f32,
    /// Baseline offset from the top of the page
    pub y: f32,
}

/// Header block repeated at the top of every signature page
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderLayout {
    pub lines: Vec<TextLine>,
    /// Offset of the link line, if a link is drawn
    pub link: Option<TextLine>,
    /// Where the first row of entries starts
    pub content_top: f32,
}

/// One entry's cell on a page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Index into the level's entries
    pub entry: usize,
    pub column: usize,
    pub row: usize,
    pub x: f32,
    /// Top of the cell
    pub y: f32,
}

/// Entries that land on one physical page
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PagePlan {
    pub placements: Vec<Placement>,
}

impl PagePlan {
    pub fn rows(&self) -> usize {
        let mut rows: Vec<usize> = self.placements.iter().map(|p| p.row).collect();
        rows.dedup();
        rows.len()
    }
}

/// Lay out the header for one level: three centred lines, the wrapped
/// greeting, the level caption and, optionally, the link line
pub fn layout_header(
    config: &LayoutConfig,
    page: PageSize,
    level: usize,
    link: Option<&str>,
) -> HeaderLayout {
    let content_width = config.content_width(page);
    let centered = |text: &str, font: StandardFont, size: f32, y: f32| {
        let width = font.text_width(text, size);
        TextLine {
            text: text.to_string(),
            font,
            size,
            x: ((page.width - width) / 2.0).max(config.margin_left),
            y,
        }
    };

    let mut lines = Vec::new();
    let mut y = config.margin_top + config.logo_height + config.header_line_height;

    for (i, text) in config.header_lines.iter().enumerate() {
        let font = if i == 0 {
            StandardFont::HelveticaBold
        } else {
            StandardFont::Helvetica
        };
        lines.push(centered(text, font, config.header_font_size, y));
        y += config.header_line_height;
    }

    y += config.greeting_line_height / 2.0;
    for text in wrap_text(
        StandardFont::Helvetica,
        &config.greeting,
        config.greeting_font_size,
        content_width,
    ) {
        lines.push(TextLine {
            text,
            font: StandardFont::Helvetica,
            size: config.greeting_font_size,
            x: config.margin_left,
            y,
        });
        y += config.greeting_line_height;
    }

    let link = link.filter(|l| !l.trim().is_empty()).map(|_| {
        let line = TextLine {
            text: config.link_text.clone(),
            font: StandardFont::Helvetica,
            size: config.greeting_font_size,
            x: config.margin_left,
            y,
        };
        y += config.greeting_line_height;
        line
    });

    y += config.header_line_height / 2.0;
    lines.push(TextLine {
        text: config.caption_for(level),
        font: StandardFont::HelveticaBold,
        size: config.caption_font_size,
        x: config.margin_left,
        y,
    });

    HeaderLayout {
        lines,
        link,
        content_top: y + config.header_gap,
    }
}

/// Distribute `entry_count` entries over as many pages as needed
///
/// Entries fill a two-column grid; the row advances every
/// [`SIGNATURES_PER_ROW`] entries. A row that would cross
/// `page.height - margin_bottom` moves to a fresh page, where the column and
/// offset restart at the top-left below the header. The first row of a page
/// is always placed so an oversized row cannot loop forever.
pub fn plan_level(
    entry_count: usize,
    page: PageSize,
    config: &LayoutConfig,
    content_top: f32,
) -> Vec<PagePlan> {
    let column_width = config.content_width(page) / SIGNATURES_PER_ROW as f32;
    let limit = page.height - config.margin_bottom;

    let mut pages = Vec::new();
    let mut current = PagePlan::default();
    let mut y = content_top;
    let mut row = 0;
    let mut rows_on_page = 0;

    for entry in 0..entry_count {
        let column = entry % SIGNATURES_PER_ROW;
        if column == 0 && entry > 0 {
            row += 1;
            y += config.row_height;
        }
        if column == 0 {
            if rows_on_page > 0 && y + config.row_height > limit {
                pages.push(std::mem::take(&mut current));
                y = content_top;
                rows_on_page = 0;
            }
            rows_on_page += 1;
        }

        current.placements.push(Placement {
            entry,
            column,
            row,
            x: config.margin_left + column as f32 * column_width,
            y,
        });
    }

    pages.push(current);
    pages
}
