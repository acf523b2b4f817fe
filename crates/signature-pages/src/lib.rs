//! Signature page stamping
//!
//! Appends one approval page per non-empty signature level to an existing
//! PDF, then protects the result with an owner password.
//!
//! - `layout`: pure page geometry (rows, columns, page breaks)
//! - `render`: lopdf content streams, logos and link annotations
//! - `encrypt`: AES-256 standard security handler

pub mod encrypt;
pub mod error;
pub mod layout;
pub mod metrics;
pub mod models;
mod render;

use image::RgbaImage;
use lopdf::Document;
use md5::{Digest, Md5};
use tracing::{debug, info};

pub use encrypt::{encrypt_with_owner_password, generate_owner_password};
pub use error::StampError;
pub use layout::{layout_header, plan_level, PagePlan, Placement, SIGNATURES_PER_ROW};
pub use models::{LayoutConfig, PageSize, RgbColor, SignatureEntry, SignatureLevels, LEVEL_COUNT};

/// Result of stamping a document
#[derive(Debug, Clone)]
pub struct StampedPdf {
    pub bytes: Vec<u8>,
    /// `None` when no level had entries and the document was left unencrypted
    pub owner_password: Option<String>,
    /// Lowercase hex MD5 of `bytes`
    pub md5_hex: String,
    pub pages_added: usize,
}

/// Lowercase hex MD5 digest
pub fn md5_hex(bytes: &[u8]) -> String {
    hex::encode(Md5::digest(bytes))
}

/// Append signature pages for every non-empty level and encrypt the result
///
/// Logos beyond the first two are ignored. `link`, when given, is rendered as
/// a clickable line under the header of every page.
pub fn stamp_signature_pages(
    pdf: &[u8],
    levels: &SignatureLevels,
    logos: &[RgbaImage],
    link: Option<&str>,
    config: &LayoutConfig,
) -> Result<StampedPdf, StampError> {
    let mut doc = Document::load_mem(pdf).map_err(|e| StampError::Parse(e.to_string()))?;
    if doc.is_encrypted() {
        return Err(StampError::Parse(
            "Password-protected documents are not supported".into(),
        ));
    }

    let original_pages = doc.get_pages().len();
    let pages_id = render::root_pages_id(&doc)?;
    let page = render::first_page_size(&doc);
    let link = link.map(str::trim).filter(|l| !l.is_empty());
    debug!(original_pages, ?page, "Loaded document");

    let mut pages_added = 0;
    if !levels.is_empty() {
        let resources = render::PageResources::register(&mut doc, logos)?;

        for (level, entries) in levels.non_empty() {
            let header = layout_header(config, page, level, link);
            let plans = plan_level(entries.len(), page, config, header.content_top);
            debug!(level, entries = entries.len(), pages = plans.len(), "Laying out level");

            for plan in &plans {
                render::append_page(
                    &mut doc,
                    pages_id,
                    page,
                    config,
                    &resources,
                    render::PageContents {
                        header: &header,
                        entries,
                        placements: &plan.placements,
                        link,
                    },
                )?;
                pages_added += 1;
            }
        }
    }

    let owner_password = if pages_added > 0 {
        let password = generate_owner_password();
        encrypt_with_owner_password(&mut doc, &password)?;
        Some(password)
    } else {
        None
    };

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| StampError::Processing(format!("Failed to save PDF: {}", e)))?;

    info!(
        original_pages,
        pages_added,
        signatures = levels.total_entries(),
        encrypted = owner_password.is_some(),
        "Stamped signature pages"
    );

    Ok(StampedPdf {
        md5_hex: md5_hex(&bytes),
        bytes,
        owner_password,
        pages_added,
    })
}
