//! Text extraction engine built on the local PDF backend.

use std::path::Path;
use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use crate::engine::backend::{LopdfBackend, PdfBackend};
use crate::engine::PdfEngine;
use crate::error::Result;
use crate::geom::{normalize, Origin};
use crate::model::{DocumentResult, Element, ElementIds, Page};

/// Inline formula segments delimited by single dollar signs.
fn formula_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$([^$]+)\$").unwrap())
}

/// Engine extracting positioned text, images, and inline formulas from
/// the PDF content streams directly.
#[derive(Debug, Default)]
pub struct TextEngine;

impl TextEngine {
    pub fn new() -> Self {
        Self
    }
}

impl PdfEngine for TextEngine {
    fn name(&self) -> &str {
        "text"
    }

    fn origin(&self) -> Origin {
        Origin::BottomLeft
    }

    fn parse(&self, path: &Path) -> Result<DocumentResult> {
        let backend = LopdfBackend::load_file(path)?;
        let file_name = file_name_of(path);

        let mut result = DocumentResult::new(file_name).with_engine(self.name());
        result.metadata = backend.metadata();

        let mut ids = ElementIds::new();
        let total = backend.page_count();
        debug!("text engine: {} pages in {}", total, path.display());

        for page_number in 1..=total {
            let (width, height) = backend.page_size(page_number)?;
            let mut page = Page::new(page_number, width, height);

            for block in backend.text_blocks(page_number)? {
                let top_left = block.bbox.to_top_left(self.origin(), height);
                let bbox = normalize(Some(top_left), width, height);

                // Split out inline formulas so they land as separate elements
                let formulas: Vec<String> = formula_pattern()
                    .captures_iter(&block.text)
                    .map(|c| c[1].to_string())
                    .collect();
                let stripped = formula_pattern().replace_all(&block.text, "").to_string();
                let stripped = stripped.trim();

                if !stripped.is_empty() {
                    page.add_element(
                        Element::text(page_number, stripped, bbox).with_id(ids.next_id()),
                    );
                }
                for formula in formulas {
                    page.add_element(
                        Element::formula(page_number, formula.trim(), bbox)
                            .with_id(ids.next_id()),
                    );
                }
            }

            for image_box in backend.image_boxes(page_number)? {
                let top_left = image_box.to_top_left(self.origin(), height);
                let bbox = normalize(Some(top_left), width, height);
                page.add_element(Element::image(page_number, bbox).with_id(ids.next_id()));
            }

            result.add_page(page);
        }

        Ok(result)
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formula_pattern_captures() {
        let caps: Vec<String> = formula_pattern()
            .captures_iter("before $e = mc^2$ middle $a+b$ after")
            .map(|c| c[1].to_string())
            .collect();
        assert_eq!(caps, vec!["e = mc^2", "a+b"]);
    }

    #[test]
    fn test_formula_pattern_ignores_plain_text() {
        assert!(formula_pattern().captures_iter("no math here").next().is_none());
        // An unmatched dollar does not form a formula
        assert!(formula_pattern().captures_iter("price $5").next().is_none());
    }

    #[test]
    fn test_engine_identity() {
        let engine = TextEngine::new();
        assert_eq!(engine.name(), "text");
        assert_eq!(engine.origin(), Origin::BottomLeft);
        assert!(engine.availability().is_available());
    }

    #[test]
    fn test_file_name_of() {
        assert_eq!(file_name_of(Path::new("/tmp/doc.pdf")), "doc.pdf");
        assert_eq!(file_name_of(Path::new("doc.pdf")), "doc.pdf");
    }
}
