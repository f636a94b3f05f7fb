//! Page-level types.

use super::Element;
use serde::{Deserialize, Serialize};

/// A single page of a parse result.
///
/// Element order is the source engine's emission order; there is no
/// canonical reading-order guarantee across engines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed)
    pub page_number: u32,

    /// Page width in points (1 point = 1/72 inch)
    pub width: f64,

    /// Page height in points
    pub height: f64,

    /// Elements on the page
    pub elements: Vec<Element>,
}

impl Page {
    /// Create a new page with the given dimensions.
    pub fn new(page_number: u32, width: f64, height: f64) -> Self {
        Self {
            page_number,
            width,
            height,
            elements: Vec::new(),
        }
    }

    /// Create a page with standard A4 size in points.
    pub fn a4(page_number: u32) -> Self {
        Self::new(page_number, 595.28, 841.89)
    }

    /// Add an element to the page.
    pub fn add_element(&mut self, element: Element) {
        self.elements.push(element);
    }

    /// Check if the page has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Number of elements on the page.
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Page dimensions as (width, height).
    pub fn dimensions(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// Concatenated text payload of the page's text-bearing elements.
    pub fn plain_text(&self) -> String {
        self.elements
            .iter()
            .filter(|e| !e.content.is_empty())
            .map(|e| e.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Element;

    #[test]
    fn test_page_new() {
        let page = Page::new(1, 595.28, 841.89);
        assert_eq!(page.page_number, 1);
        assert_eq!(page.dimensions(), (595.28, 841.89));
        assert!(page.is_empty());
    }

    #[test]
    fn test_page_elements() {
        let mut page = Page::a4(1);
        page.add_element(Element::text(1, "alpha", None));
        page.add_element(Element::text(1, "beta", None));
        assert_eq!(page.element_count(), 2);
        assert_eq!(page.plain_text(), "alpha\nbeta");
    }

    #[test]
    fn test_page_json_field_names() {
        let page = Page::new(3, 612.0, 792.0);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["page_number"], 3);
        assert_eq!(json["width"], 612.0);
        assert_eq!(json["height"], 792.0);
        assert!(json["elements"].as_array().unwrap().is_empty());
    }
}
