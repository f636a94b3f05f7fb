//! Document-level types.

use super::Page;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Engine-dependent, opaque key-value metadata.
///
/// A BTreeMap keeps the serialized order stable across runs.
pub type Metadata = BTreeMap<String, String>;

/// The result of running one engine over one document.
///
/// This struct's serialized shape is the interchange format between all
/// adapters and any consumer; field names are fixed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResult {
    /// Name of the source file (no directory components)
    pub file_name: String,

    /// Engine-dependent metadata
    pub metadata: Metadata,

    /// Total number of pages in the source document
    pub total_pages: u32,

    /// Pages in document order
    pub pages: Vec<Page>,

    /// Name of the producing adapter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
}

impl DocumentResult {
    /// Create an empty result for the given file.
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            metadata: Metadata::new(),
            total_pages: 0,
            pages: Vec::new(),
            engine: None,
        }
    }

    /// Tag the result with the producing engine's name.
    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    /// Append a page and keep `total_pages` in sync.
    pub fn add_page(&mut self, page: Page) {
        self.pages.push(page);
        self.total_pages = self.pages.len() as u32;
    }

    /// Number of pages in the result.
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Get a page by number (1-indexed).
    pub fn get_page(&self, page_number: u32) -> Option<&Page> {
        if page_number == 0 {
            return None;
        }
        self.pages.get((page_number - 1) as usize)
    }

    /// Get a page by number (1-indexed), mutably.
    pub fn get_page_mut(&mut self, page_number: u32) -> Option<&mut Page> {
        if page_number == 0 {
            return None;
        }
        self.pages.get_mut((page_number - 1) as usize)
    }

    /// Check if the result has any pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Plain text of the whole document, page texts separated by blank lines.
    pub fn plain_text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.plain_text())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Total element count across all pages.
    pub fn element_count(&self) -> usize {
        self.pages.iter().map(|p| p.element_count()).sum()
    }
}
