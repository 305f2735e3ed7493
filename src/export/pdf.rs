//! Paginated document synthesis.
//!
//! Layout is computed independently of the PDF encoder so pagination can be
//! reasoned about (and tested) without the `pdf` feature. Glyph widths are
//! estimated from an average Helvetica advance; good enough for wrapping
//! prose, not for typesetting.

use crate::document::{classify, strip_inline_markers, wrap_words, Align, DisplayBlock};
use crate::error::ExportError;

/// US Letter, in points.
pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;
pub const MARGIN: f32 = 72.0;
pub const FONT_SIZE: f32 = 11.0;
pub const LINE_HEIGHT: f32 = 15.0;
const INDENT: f32 = 18.0;
const AVG_GLYPH_WIDTH: f32 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Face {
    Regular,
    Bold,
    Italic,
}

impl Face {
    pub const ALL: [Face; 3] = [Face::Regular, Face::Bold, Face::Italic];

    pub fn resource_name(self) -> &'static str {
        match self {
            Face::Regular => "F1",
            Face::Bold => "F2",
            Face::Italic => "F3",
        }
    }

    pub fn base_font(self) -> &'static str {
        match self {
            Face::Regular => "Helvetica",
            Face::Bold => "Helvetica-Bold",
            Face::Italic => "Helvetica-Oblique",
        }
    }
}

/// One line of text positioned on a page (PDF coordinates, origin bottom-left).
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedLine {
    pub x: f32,
    pub y: f32,
    pub face: Face,
    pub text: String,
}

pub type Page = Vec<PlacedLine>;

/// Printable width between the left and right margins.
pub fn content_width() -> f32 {
    PAGE_WIDTH - 2.0 * MARGIN
}

fn estimated_width(text: &str) -> f32 {
    text.chars().count() as f32 * FONT_SIZE * AVG_GLYPH_WIDTH
}

/// Lay out document text into pages.
///
/// Blocks come from the classifier so titles, headers and clauses keep their
/// weight and alignment; `*`/`#` markup never reaches the page.
pub fn layout_document(text: &str) -> Vec<Page> {
    let mut pages: Vec<Page> = vec![Vec::new()];
    let top = PAGE_HEIGHT - MARGIN;
    let mut y = top;

    for block in classify(text) {
        let Some(line) = block.line() else {
            y -= LINE_HEIGHT;
            continue;
        };
        let intent = line.intent;
        let face = if intent.bold {
            Face::Bold
        } else if intent.italic {
            Face::Italic
        } else {
            Face::Regular
        };
        let indent = if intent.indented { INDENT } else { 0.0 };
        let avail = content_width() - indent;
        let max_chars = (avail / (FONT_SIZE * AVG_GLYPH_WIDTH)).floor() as usize;

        let cleaned: String = strip_inline_markers(&line.text)
            .chars()
            .filter(|c| !matches!(c, '*' | '#'))
            .collect();

        for wrapped in wrap_words(&cleaned, max_chars) {
            if y < MARGIN {
                pages.push(Vec::new());
                y = top;
            }
            let x = match intent.align {
                Align::Center => MARGIN + indent + ((avail - estimated_width(&wrapped)) / 2.0).max(0.0),
                Align::Left | Align::Justify => MARGIN + indent,
            };
            if let Some(page) = pages.last_mut() {
                page.push(PlacedLine {
                    x,
                    y,
                    face,
                    text: wrapped,
                });
            }
            y -= LINE_HEIGHT;
        }

        if matches!(block, DisplayBlock::Title(_)) {
            y -= LINE_HEIGHT / 2.0;
        }
    }
    pages
}

/// Render document text as PDF bytes.
#[cfg(feature = "pdf")]
pub fn render_document(text: &str) -> Result<Vec<u8>, ExportError> {
    encode_pdf(&layout_document(text))
}

#[cfg(not(feature = "pdf"))]
pub fn render_document(_text: &str) -> Result<Vec<u8>, ExportError> {
    Err(ExportError::SynthesisUnavailable)
}

#[cfg(feature = "pdf")]
fn encode_pdf(pages: &[Page]) -> Result<Vec<u8>, ExportError> {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Dictionary, Document, Object, Stream, StringFormat};

    let pt = |v: f32| Object::Integer(v.round() as i64);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut fonts = Dictionary::new();
    for face in Face::ALL {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => face.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(face.resource_name(), font_id);
    }
    let resources_id = doc.add_object(dictionary! {
        "Font" => fonts,
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let mut operations = Vec::with_capacity(page.len() * 5);
        for line in page {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new(
                "Tf",
                vec![line.face.resource_name().into(), pt(FONT_SIZE)],
            ));
            operations.push(Operation::new("Td", vec![pt(line.x), pt(line.y)]));
            operations.push(Operation::new(
                "Tj",
                vec![Object::String(win_ansi(&line.text), StringFormat::Literal)],
            ));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![pt(0.0), pt(0.0), pt(PAGE_WIDTH), pt(PAGE_HEIGHT)],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

/// Encode text for the standard Type1 fonts; unmappable characters become `?`.
#[cfg_attr(not(feature = "pdf"), allow(dead_code))]
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' => b'\'',
            '\u{201C}' | '\u{201D}' => b'"',
            '\u{2013}' | '\u{2014}' => b'-',
            c if (c as u32) < 256 => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}
