//! lopdf emission of planned signature pages

use std::io::Write;

use flate2::{write::ZlibEncoder, Compression};
use image::RgbaImage;
use lopdf::{
    content::{Content, Operation},
    dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat,
};
use tracing::debug;

use crate::error::StampError;
use crate::layout::{HeaderLayout, Placement, TextLine};
use crate::metrics::{truncate_to_width, StandardFont};
use crate::models::{LayoutConfig, PageSize, RgbColor, SignatureEntry};

/// Resources shared by every appended page
pub(crate) struct PageResources {
    fonts: Dictionary,
    logos: Vec<EmbeddedLogo>,
}

struct EmbeddedLogo {
    name: String,
    id: ObjectId,
    width: u32,
    height: u32,
}

impl PageResources {
    /// Register the standard fonts and up to two logos on `doc`
    pub(crate) fn register(doc: &mut Document, logos: &[RgbaImage]) -> Result<Self, StampError> {
        let mut fonts = Dictionary::new();
        for font in StandardFont::ALL {
            let id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => font.base_font(),
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(font.resource_name(), Object::Reference(id));
        }

        let mut embedded = Vec::new();
        for (i, logo) in logos.iter().take(2).enumerate() {
            let id = add_image_xobject(doc, logo)?;
            embedded.push(EmbeddedLogo {
                name: format!("Logo{}", i + 1),
                id,
                width: logo.width(),
                height: logo.height(),
            });
        }

        Ok(Self {
            fonts,
            logos: embedded,
        })
    }

    fn to_dictionary(&self) -> Dictionary {
        let mut xobjects = Dictionary::new();
        for logo in &self.logos {
            xobjects.set(logo.name.as_str(), Object::Reference(logo.id));
        }
        let mut resources = dictionary! {
            "Font" => self.fonts.clone(),
        };
        if !self.logos.is_empty() {
            resources.set("XObject", xobjects);
        }
        resources
    }
}

/// Embed an RGBA bitmap as a Flate-compressed RGB image with an alpha soft mask
fn add_image_xobject(doc: &mut Document, image: &RgbaImage) -> Result<ObjectId, StampError> {
    let (width, height) = image.dimensions();
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    let mut alpha = Vec::with_capacity((width * height) as usize);
    for pixel in image.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
        alpha.push(pixel.0[3]);
    }

    let smask_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        },
        deflate(&alpha)?,
    ));

    Ok(doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
            "SMask" => Object::Reference(smask_id),
        },
        deflate(&rgb)?,
    )))
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, StampError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .and_then(|_| encoder.finish())
        .map_err(|e| StampError::Processing(format!("Failed to compress image: {}", e)))
}

/// Convert text to WinAnsi bytes; control characters and anything outside
/// printable Latin-1 become '?'
fn encode_text(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            code @ (0x20..=0x7E | 0xA0..=0xFF) => code as u8,
            _ => b'?',
        })
        .collect()
}

/// Builds the content stream of one page
struct PageCanvas<'a> {
    config: &'a LayoutConfig,
    page: PageSize,
    ops: Vec<Operation>,
}

impl<'a> PageCanvas<'a> {
    fn new(config: &'a LayoutConfig, page: PageSize) -> Self {
        Self {
            config,
            page,
            ops: Vec::new(),
        }
    }

    /// Flip a top-down offset into PDF user space
    fn pdf_y(&self, y: f32) -> f32 {
        self.page.height - y
    }

    fn fill_color(&mut self, color: RgbColor) {
        self.ops.push(Operation::new(
            "rg",
            vec![color.0.into(), color.1.into(), color.2.into()],
        ));
    }

    fn text(&mut self, text: &str, font: StandardFont, size: f32, x: f32, y: f32) {
        let baseline = self.pdf_y(y);
        self.ops.push(Operation::new("BT", vec![]));
        self.ops.push(Operation::new(
            "Tf",
            vec![font.resource_name().into(), size.into()],
        ));
        self.ops
            .push(Operation::new("Td", vec![x.into(), baseline.into()]));
        self.ops.push(Operation::new(
            "Tj",
            vec![Object::String(encode_text(text), StringFormat::Literal)],
        ));
        self.ops.push(Operation::new("ET", vec![]));
    }

    fn line(&mut self, text_line: &TextLine) {
        self.text(
            &text_line.text,
            text_line.font,
            text_line.size,
            text_line.x,
            text_line.y,
        );
    }

    fn rule(&mut self, x1: f32, x2: f32, y: f32) {
        let y = self.pdf_y(y);
        self.ops.push(Operation::new("w", vec![self.config.rule_width.into()]));
        self.ops.push(Operation::new("m", vec![x1.into(), y.into()]));
        self.ops.push(Operation::new("l", vec![x2.into(), y.into()]));
        self.ops.push(Operation::new("S", vec![]));
    }

    /// Draw the logos at the top corners, scaled into the logo box
    fn logos(&mut self, resources: &PageResources) {
        let config = self.config;
        for (i, logo) in resources.logos.iter().enumerate() {
            let scale = (config.logo_width / logo.width as f32)
                .min(config.logo_height / logo.height as f32);
            let w = logo.width as f32 * scale;
            let h = logo.height as f32 * scale;
            let x = if i == 0 {
                config.margin_left
            } else {
                self.page.width - config.margin_right - w
            };
            let y = self.pdf_y(config.margin_top + h);

            self.ops.push(Operation::new("q", vec![]));
            self.ops.push(Operation::new(
                "cm",
                vec![w.into(), 0.into(), 0.into(), h.into(), x.into(), y.into()],
            ));
            self.ops
                .push(Operation::new("Do", vec![Object::Name(logo.name.clone().into_bytes())]));
            self.ops.push(Operation::new("Q", vec![]));
        }
    }

    fn header(&mut self, header: &HeaderLayout) {
        self.fill_color(RgbColor(0.0, 0.0, 0.0));
        for line in &header.lines {
            self.line(line);
        }
        if let Some(link) = &header.link {
            self.fill_color(self.config.link_color);
            self.line(link);
            self.fill_color(RgbColor(0.0, 0.0, 0.0));
        }
    }

    /// Role (bold), name (italic, coloured), rule and timestamp
    fn entry(&mut self, entry: &SignatureEntry, placement: &Placement, column_width: f32) {
        let config = self.config;
        let width = column_width - config.column_gap;
        let x = placement.x;
        let top = placement.y;

        let role = truncate_to_width(StandardFont::HelveticaBold, &entry.role, config.role_font_size, width);
        self.fill_color(RgbColor(0.0, 0.0, 0.0));
        self.text(&role, StandardFont::HelveticaBold, config.role_font_size, x, top + config.role_font_size);

        let name = truncate_to_width(
            StandardFont::HelveticaOblique,
            &entry.display_name(),
            config.name_font_size,
            width,
        );
        let name_y = top + config.role_font_size + 6.0 + config.name_font_size;
        self.fill_color(config.name_color);
        self.text(&name, StandardFont::HelveticaOblique, config.name_font_size, x, name_y);

        let rule_y = name_y + 8.0;
        self.fill_color(RgbColor(0.0, 0.0, 0.0));
        self.ops.push(Operation::new("G", vec![0.into()]));
        self.rule(x, x + width, rule_y);

        let timestamp = truncate_to_width(
            StandardFont::Helvetica,
            &entry.timestamp,
            config.timestamp_font_size,
            width,
        );
        self.text(
            &timestamp,
            StandardFont::Helvetica,
            config.timestamp_font_size,
            x,
            rule_y + 4.0 + config.timestamp_font_size,
        );
    }

    fn finish(self) -> Result<Vec<u8>, StampError> {
        Content {
            operations: self.ops,
        }
        .encode()
        .map_err(|e| StampError::Processing(format!("Failed to encode content stream: {}", e)))
    }
}

/// Everything needed to draw one physical signature page
pub(crate) struct PageContents<'a> {
    pub header: &'a HeaderLayout,
    pub entries: &'a [SignatureEntry],
    pub placements: &'a [Placement],
    pub link: Option<&'a str>,
}

/// Append one signature page to the end of the document's page tree
pub(crate) fn append_page(
    doc: &mut Document,
    pages_id: ObjectId,
    page: PageSize,
    config: &LayoutConfig,
    resources: &PageResources,
    contents: PageContents<'_>,
) -> Result<ObjectId, StampError> {
    let column_width = config.content_width(page) / crate::layout::SIGNATURES_PER_ROW as f32;

    let mut canvas = PageCanvas::new(config, page);
    canvas.logos(resources);
    canvas.header(contents.header);
    for placement in contents.placements {
        if let Some(entry) = contents.entries.get(placement.entry) {
            canvas.entry(entry, placement, column_width);
        }
    }
    let content = canvas.finish()?;
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content));

    let mut page_dict = dictionary! {
        "Type" => "Page",
        "Parent" => Object::Reference(pages_id),
        "MediaBox" => vec![0.into(), 0.into(), page.width.into(), page.height.into()],
        "Resources" => resources.to_dictionary(),
        "Contents" => Object::Reference(content_id),
    };

    if let (Some(uri), Some(line)) = (contents.link, contents.header.link.as_ref()) {
        let annot_id = add_link_annotation(doc, page, line, uri);
        page_dict.set("Annots", Object::Array(vec![Object::Reference(annot_id)]));
    }

    let page_id = doc.add_object(page_dict);
    push_kid(doc, pages_id, page_id)?;
    debug!(?page_id, entries = contents.placements.len(), "Appended signature page");
    Ok(page_id)
}

fn add_link_annotation(doc: &mut Document, page: PageSize, line: &TextLine, uri: &str) -> ObjectId {
    let width = line.font.text_width(&line.text, line.size);
    let baseline = page.height - line.y;
    doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Link",
        "Rect" => vec![
            line.x.into(),
            (baseline - 2.0).into(),
            (line.x + width).into(),
            (baseline + line.size).into(),
        ],
        "Border" => vec![0.into(), 0.into(), 0.into()],
        "A" => dictionary! {
            "S" => "URI",
            "URI" => Object::String(uri.as_bytes().to_vec(), StringFormat::Literal),
        },
    })
}

fn push_kid(doc: &mut Document, pages_id: ObjectId, page_id: ObjectId) -> Result<(), StampError> {
    let pages = doc.get_object_mut(pages_id)?.as_dict_mut()?;
    pages
        .get_mut(b"Kids")?
        .as_array_mut()?
        .push(Object::Reference(page_id));
    let count = pages.get(b"Count").and_then(Object::as_i64).unwrap_or(0);
    pages.set("Count", count + 1);
    Ok(())
}

/// Root of the page tree
pub(crate) fn root_pages_id(doc: &Document) -> Result<ObjectId, StampError> {
    doc.catalog()
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(|e| StampError::Parse(format!("Document has no page tree: {}", e)))
}

fn as_f32(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(v) => Some(*v as f32),
        Object::Real(v) => Some(*v),
        _ => None,
    }
}

/// Size of the first page (MediaBox may be inherited), or A4
pub(crate) fn first_page_size(doc: &Document) -> PageSize {
    let Some(first) = doc.get_pages().values().next().copied() else {
        return PageSize::A4;
    };

    let mut current = Some(first);
    let mut depth = 0;
    while let Some(id) = current {
        let Ok(dict) = doc.get_dictionary(id) else {
            break;
        };
        if let Ok(Object::Array(mb)) = dict.get(b"MediaBox") {
            let values: Vec<f32> = mb.iter().filter_map(as_f32).collect();
            if let [x0, y0, x1, y1] = values[..] {
                let size = PageSize {
                    width: (x1 - x0).abs(),
                    height: (y1 - y0).abs(),
                };
                if size.width > 0.0 && size.height > 0.0 {
                    return size;
                }
            }
            break;
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
        if depth > 32 {
            break;
        }
    }
    PageSize::A4
}
