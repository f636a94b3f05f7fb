//! Local PDF backend abstraction.
//!
//! Isolates the concrete PDF library (lopdf) behind a trait exposing the
//! operations the engines need: page enumeration, page box sizes, Info
//! metadata, positioned text blocks, and image placements. All boxes are
//! reported in PDF user space, i.e. bottom-left origin; flipping is the
//! calling adapter's job.

use std::collections::HashSet;
use std::path::Path;

use lopdf::{Document as LopdfDocument, Object, ObjectId};

use crate::error::{Error, Result};
use crate::geom::Rect;
use crate::model::Metadata;

/// A run of text with an approximate bounding box in bottom-left-origin
/// point coordinates.
#[derive(Debug, Clone)]
pub struct TextBlock {
    pub text: String,
    pub bbox: Rect,
}

/// A straight path segment in bottom-left-origin point coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Segment {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn length(&self) -> f64 {
        ((self.x1 - self.x0).powi(2) + (self.y1 - self.y0).powi(2)).sqrt()
    }
}

/// Abstract interface for local PDF document access.
pub trait PdfBackend {
    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// Page box size (width, height) in points for a 1-based page number.
    fn page_size(&self, page_number: u32) -> Result<(f64, f64)>;

    /// Opaque Info-dictionary metadata.
    fn metadata(&self) -> Metadata;

    /// Positioned text blocks of a page, in content-stream order.
    fn text_blocks(&self, page_number: u32) -> Result<Vec<TextBlock>>;

    /// Placement rectangles of the image XObjects drawn on a page.
    fn image_boxes(&self, page_number: u32) -> Result<Vec<Rect>>;

    /// Straight path segments drawn on a page (table rules, borders).
    fn line_segments(&self, page_number: u32) -> Result<Vec<Segment>>;
}

/// Concrete [`PdfBackend`] backed by `lopdf::Document`.
pub struct LopdfBackend {
    doc: LopdfDocument,
}

impl LopdfBackend {
    /// Load from a file path.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        crate::detect::ensure_pdf(&path)?;
        let doc = LopdfDocument::load(path).map_err(|e| match e {
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::from(e),
        })?;
        Ok(Self { doc })
    }

    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        let doc = LopdfDocument::load_mem(data).map_err(|e| match e {
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::from(e),
        })?;
        Ok(Self { doc })
    }

    /// PDF version string from the document header.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    /// Whether the document is encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.doc.is_encrypted()
    }

    fn page_id(&self, page_number: u32) -> Result<ObjectId> {
        let pages = self.doc.get_pages();
        pages
            .get(&page_number)
            .copied()
            .ok_or(Error::PageOutOfRange(page_number, pages.len() as u32))
    }

    fn page_content_ops(&self, page_id: ObjectId) -> Result<Vec<lopdf::content::Operation>> {
        let data = self
            .doc
            .get_page_content(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;
        let content = lopdf::content::Content::decode(&data)
            .map_err(|e| Error::PdfParse(e.to_string()))?;
        Ok(content.operations)
    }

    /// Decode a text operand using the font's encoding, falling back to
    /// simple byte decoding when no encoding is resolvable.
    fn decode_text(&self, page_id: ObjectId, font_name: &[u8], bytes: &[u8]) -> String {
        if let Ok(fonts) = self.doc.get_page_fonts(page_id) {
            if let Some(font_dict) = fonts.get(font_name) {
                if let Ok(enc) = font_dict.get_font_encoding(&self.doc) {
                    if let Ok(text) = LopdfDocument::decode_text(&enc, bytes) {
                        return text;
                    }
                }
            }
        }
        decode_text_simple(bytes)
    }

    /// Names of the image XObjects reachable from a page's resources.
    fn image_xobject_names(&self, page_id: ObjectId) -> HashSet<Vec<u8>> {
        let mut names = HashSet::new();
        let Ok(page_dict) = self.doc.get_dictionary(page_id) else {
            return names;
        };
        let Ok(res) = page_dict.get(b"Resources") else {
            return names;
        };
        let res_dict = match res {
            Object::Reference(r) => self.doc.get_dictionary(*r).ok(),
            Object::Dictionary(d) => Some(d),
            _ => None,
        };
        let Some(res_dict) = res_dict else {
            return names;
        };
        let Ok(xobjects) = res_dict.get(b"XObject") else {
            return names;
        };
        let xobj_dict = match xobjects {
            Object::Reference(r) => self.doc.get_dictionary(*r).ok(),
            Object::Dictionary(d) => Some(d),
            _ => None,
        };
        let Some(xobj_dict) = xobj_dict else {
            return names;
        };
        for (name, obj) in xobj_dict.iter() {
            let is_image = obj
                .as_reference()
                .ok()
                .and_then(|r| self.doc.get_object(r).ok())
                .and_then(|o| match o {
                    Object::Stream(s) => s
                        .dict
                        .get(b"Subtype")
                        .ok()
                        .and_then(|st| st.as_name_str().ok().map(|n| n == "Image")),
                    _ => None,
                })
                .unwrap_or(false);
            if is_image {
                names.insert(name.clone());
            }
        }
        names
    }
}

impl PdfBackend for LopdfBackend {
    fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    fn page_size(&self, page_number: u32) -> Result<(f64, f64)> {
        let page_id = self.page_id(page_number)?;
        if let Ok(page_dict) = self.doc.get_dictionary(page_id) {
            if let Ok(media_box) = page_dict.get(b"MediaBox") {
                if let Ok(array) = media_box.as_array() {
                    if array.len() >= 4 {
                        let width = array[2].as_float().unwrap_or(612.0) as f64;
                        let height = array[3].as_float().unwrap_or(792.0) as f64;
                        return Ok((width, height));
                    }
                }
            }
        }
        // No MediaBox: fall back to Letter
        Ok((612.0, 792.0))
    }

    fn metadata(&self) -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert("pdf_version".to_string(), self.version());

        let info_dict = self
            .doc
            .trailer
            .get(b"Info")
            .ok()
            .and_then(|o| o.as_reference().ok())
            .and_then(|r| self.doc.get_dictionary(r).ok());

        if let Some(info) = info_dict {
            for key in [
                "Title", "Author", "Subject", "Keywords", "Creator", "Producer",
            ] {
                if let Some(value) = get_string_from_dict(info, key.as_bytes()) {
                    metadata.insert(key.to_lowercase(), value);
                }
            }
        }
        metadata
    }

    fn text_blocks(&self, page_number: u32) -> Result<Vec<TextBlock>> {
        let page_id = self.page_id(page_number)?;
        let ops = self.page_content_ops(page_id)?;

        let mut blocks = Vec::new();
        let mut builder: Option<BlockBuilder> = None;
        let mut font_name: Vec<u8> = Vec::new();
        let mut font_size: f64 = 12.0;

        for op in &ops {
            match op.operator.as_str() {
                "BT" => {
                    builder = Some(BlockBuilder::new());
                }
                "ET" => {
                    if let Some(b) = builder.take() {
                        if let Some(block) = b.finish() {
                            blocks.push(block);
                        }
                    }
                }
                "Tf" => {
                    if let Some(Object::Name(name)) = op.operands.first() {
                        font_name = name.clone();
                    }
                    if let Some(size) = op.operands.get(1).and_then(as_number) {
                        font_size = size;
                    }
                }
                "Td" | "TD" => {
                    let tx = op.operands.first().and_then(as_number).unwrap_or(0.0);
                    let ty = op.operands.get(1).and_then(as_number).unwrap_or(0.0);
                    if let Some(b) = builder.as_mut() {
                        b.translate(tx, ty);
                    }
                }
                "Tm" => {
                    let e = op.operands.get(4).and_then(as_number).unwrap_or(0.0);
                    let f = op.operands.get(5).and_then(as_number).unwrap_or(0.0);
                    if let Some(b) = builder.as_mut() {
                        b.set_position(e, f);
                    }
                }
                "T*" => {
                    if let Some(b) = builder.as_mut() {
                        b.translate(0.0, -font_size * 1.2);
                        b.push_newline();
                    }
                }
                "Tj" | "'" | "\"" => {
                    if let Some(Object::String(bytes, _)) = op
                        .operands
                        .iter()
                        .rev()
                        .find(|o| matches!(o, Object::String(_, _)))
                    {
                        let text = self.decode_text(page_id, &font_name, bytes);
                        if let Some(b) = builder.as_mut() {
                            b.push_text(&text, font_size);
                        }
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = op.operands.first() {
                        let mut text = String::new();
                        for item in items {
                            if let Object::String(bytes, _) = item {
                                text.push_str(&self.decode_text(page_id, &font_name, bytes));
                            }
                        }
                        if let Some(b) = builder.as_mut() {
                            b.push_text(&text, font_size);
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(blocks)
    }

    fn image_boxes(&self, page_number: u32) -> Result<Vec<Rect>> {
        let page_id = self.page_id(page_number)?;
        let image_names = self.image_xobject_names(page_id);
        if image_names.is_empty() {
            return Ok(Vec::new());
        }
        let ops = self.page_content_ops(page_id)?;

        // Track the current transformation matrix through q/Q/cm. Only
        // translation and scale are honored; rotated images get the
        // axis-aligned box of their transform anyway.
        let mut stack: Vec<[f64; 6]> = Vec::new();
        let mut ctm: [f64; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        let mut boxes = Vec::new();

        for op in &ops {
            match op.operator.as_str() {
                "q" => stack.push(ctm),
                "Q" => {
                    if let Some(prev) = stack.pop() {
                        ctm = prev;
                    }
                }
                "cm" => {
                    let vals: Vec<f64> = op.operands.iter().filter_map(as_number).collect();
                    if vals.len() == 6 {
                        ctm = multiply_matrix(
                            [vals[0], vals[1], vals[2], vals[3], vals[4], vals[5]],
                            ctm,
                        );
                    }
                }
                "Do" => {
                    if let Some(Object::Name(name)) = op.operands.first() {
                        if image_names.contains(name) {
                            // The image unit square maps through the CTM
                            let (x0, y0) = transform_point(ctm, 0.0, 0.0);
                            let (x1, y1) = transform_point(ctm, 1.0, 1.0);
                            boxes.push(Rect::new(
                                x0.min(x1),
                                y0.min(y1),
                                x0.max(x1),
                                y0.max(y1),
                            ));
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(boxes)
    }

    fn line_segments(&self, page_number: u32) -> Result<Vec<Segment>> {
        let page_id = self.page_id(page_number)?;
        let ops = self.page_content_ops(page_id)?;

        let mut stack: Vec<[f64; 6]> = Vec::new();
        let mut ctm: [f64; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        let mut current: Option<(f64, f64)> = None;
        let mut segments = Vec::new();

        for op in &ops {
            match op.operator.as_str() {
                "q" => stack.push(ctm),
                "Q" => {
                    if let Some(prev) = stack.pop() {
                        ctm = prev;
                    }
                }
                "cm" => {
                    let vals: Vec<f64> = op.operands.iter().filter_map(as_number).collect();
                    if vals.len() == 6 {
                        ctm = multiply_matrix(
                            [vals[0], vals[1], vals[2], vals[3], vals[4], vals[5]],
                            ctm,
                        );
                    }
                }
                "m" => {
                    let x = op.operands.first().and_then(as_number).unwrap_or(0.0);
                    let y = op.operands.get(1).and_then(as_number).unwrap_or(0.0);
                    current = Some(transform_point(ctm, x, y));
                }
                "l" => {
                    let x = op.operands.first().and_then(as_number).unwrap_or(0.0);
                    let y = op.operands.get(1).and_then(as_number).unwrap_or(0.0);
                    let p = transform_point(ctm, x, y);
                    if let Some(prev) = current {
                        segments.push(Segment::new(prev.0, prev.1, p.0, p.1));
                    }
                    current = Some(p);
                }
                "re" => {
                    let vals: Vec<f64> = op.operands.iter().filter_map(as_number).collect();
                    if vals.len() == 4 {
                        let (x0, y0) = transform_point(ctm, vals[0], vals[1]);
                        let (x1, y1) =
                            transform_point(ctm, vals[0] + vals[2], vals[1] + vals[3]);
                        segments.push(Segment::new(x0, y0, x1, y0));
                        segments.push(Segment::new(x0, y1, x1, y1));
                        segments.push(Segment::new(x0, y0, x0, y1));
                        segments.push(Segment::new(x1, y0, x1, y1));
                    }
                }
                _ => {}
            }
        }

        Ok(segments)
    }
}

/// Accumulates show-text operations between BT/ET into one block with an
/// approximate bounding box.
struct BlockBuilder {
    text: String,
    x: f64,
    y: f64,
    min_x: f64,
    max_x: f64,
    min_baseline: f64,
    max_baseline: f64,
    max_font_size: f64,
    has_text: bool,
}

impl BlockBuilder {
    fn new() -> Self {
        Self {
            text: String::new(),
            x: 0.0,
            y: 0.0,
            min_x: f64::MAX,
            max_x: f64::MIN,
            min_baseline: f64::MAX,
            max_baseline: f64::MIN,
            max_font_size: 0.0,
            has_text: false,
        }
    }

    fn translate(&mut self, tx: f64, ty: f64) {
        self.x += tx;
        self.y += ty;
    }

    fn set_position(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }

    fn push_newline(&mut self) {
        if self.has_text && !self.text.ends_with('\n') {
            self.text.push('\n');
        }
    }

    fn push_text(&mut self, text: &str, font_size: f64) {
        if text.is_empty() {
            return;
        }
        // Estimated advance; glyph metrics are out of scope here
        let advance = text.chars().count() as f64 * font_size * 0.5;

        self.min_x = self.min_x.min(self.x);
        self.max_x = self.max_x.max(self.x + advance);
        self.min_baseline = self.min_baseline.min(self.y);
        self.max_baseline = self.max_baseline.max(self.y);
        self.max_font_size = self.max_font_size.max(font_size);

        self.text.push_str(text);
        self.x += advance;
        self.has_text = true;
    }

    fn finish(self) -> Option<TextBlock> {
        if !self.has_text || self.text.trim().is_empty() {
            return None;
        }
        let fs = self.max_font_size.max(1.0);
        // Approximate descender/ascender from the dominant font size
        let bbox = Rect::new(
            self.min_x,
            self.min_baseline - fs * 0.2,
            self.max_x,
            self.max_baseline + fs * 0.8,
        );
        Some(TextBlock {
            text: self.text.trim().to_string(),
            bbox,
        })
    }
}

fn as_number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

fn multiply_matrix(a: [f64; 6], b: [f64; 6]) -> [f64; 6] {
    [
        a[0] * b[0] + a[1] * b[2],
        a[0] * b[1] + a[1] * b[3],
        a[2] * b[0] + a[3] * b[2],
        a[2] * b[1] + a[3] * b[3],
        a[4] * b[0] + a[5] * b[2] + b[4],
        a[4] * b[1] + a[5] * b[3] + b[5],
    ]
}

fn transform_point(m: [f64; 6], x: f64, y: f64) -> (f64, f64) {
    (m[0] * x + m[2] * y + m[4], m[1] * x + m[3] * y + m[5])
}

/// Simple text decoding fallback when no font encoding is available.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    // UTF-16BE with BOM
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks(2)
            .filter_map(|c| {
                if c.len() == 2 {
                    Some(u16::from_be_bytes([c[0], c[1]]))
                } else {
                    None
                }
            })
            .collect();
        return String::from_utf16(&utf16).unwrap_or_default();
    }
    if let Ok(s) = String::from_utf8(bytes.to_vec()) {
        return s;
    }
    // Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

/// Helper to get a string from a PDF dictionary, decoding UTF-16BE when
/// the BOM marker is present.
fn get_string_from_dict(dict: &lopdf::Dictionary, key: &[u8]) -> Option<String> {
    dict.get(key).ok().and_then(|obj| match obj {
        Object::String(bytes, _) => Some(decode_text_simple(bytes)),
        Object::Name(bytes) => String::from_utf8(bytes.clone()).ok(),
        _ => None,
    })
}
