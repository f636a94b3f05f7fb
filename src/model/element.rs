//! Element-level types.

use crate::geom::NormalizedRect;
use serde::{Deserialize, Serialize};

/// The kind of visual unit an element represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    Text,
    Table,
    Image,
    Formula,
    Link,
    Heading,
    Code,
}

/// One visual unit on a page.
///
/// `bbox` is absent when the producing engine cannot report positions
/// (plain text extractors, page-level OCR). `id` is monotonically
/// increasing within one parse, in emission order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    /// Page number the element belongs to (1-based).
    pub page: u32,

    /// Element kind.
    #[serde(rename = "type")]
    pub kind: ElementType,

    /// Text payload, serialized table rows, or a placeholder for images.
    pub content: String,

    /// Normalized position, or `None` when unknown.
    pub bbox: Option<NormalizedRect>,
}

impl Element {
    /// Create an element of the given kind.
    pub fn new(
        kind: ElementType,
        page: u32,
        content: impl Into<String>,
        bbox: Option<NormalizedRect>,
    ) -> Self {
        Self {
            id: None,
            page,
            kind,
            content: content.into(),
            bbox,
        }
    }

    /// Create a text element.
    pub fn text(page: u32, content: impl Into<String>, bbox: Option<NormalizedRect>) -> Self {
        Self::new(ElementType::Text, page, content, bbox)
    }

    /// Create a table element; `content` holds the serialized rows.
    pub fn table(page: u32, content: impl Into<String>, bbox: Option<NormalizedRect>) -> Self {
        Self::new(ElementType::Table, page, content, bbox)
    }

    /// Create an image element with a placeholder payload.
    pub fn image(page: u32, bbox: Option<NormalizedRect>) -> Self {
        Self::new(ElementType::Image, page, "[image]", bbox)
    }

    /// Create a formula element.
    pub fn formula(page: u32, content: impl Into<String>, bbox: Option<NormalizedRect>) -> Self {
        Self::new(ElementType::Formula, page, content, bbox)
    }

    /// Attach an id.
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }
}

/// Monotonic element id source, scoped to a single parse.
#[derive(Debug, Default)]
pub struct ElementIds {
    counter: u64,
}

impl ElementIds {
    /// Create a fresh id source starting at 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the next id.
    pub fn next_id(&mut self) -> u64 {
        self.counter += 1;
        self.counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{normalize, Rect};

    #[test]
    fn test_element_ids_monotonic() {
        let mut ids = ElementIds::new();
        assert_eq!(ids.next_id(), 1);
        assert_eq!(ids.next_id(), 2);
        assert_eq!(ids.next_id(), 3);
    }

    #[test]
    fn test_element_type_serialization() {
        let json = serde_json::to_string(&ElementType::Formula).unwrap();
        assert_eq!(json, "\"formula\"");
        let json = serde_json::to_string(&ElementType::Heading).unwrap();
        assert_eq!(json, "\"heading\"");
    }

    #[test]
    fn test_element_json_field_names() {
        let bbox = normalize(Some(Rect::new(10.0, 10.0, 20.0, 20.0)), 100.0, 200.0);
        let el = Element::text(1, "hello", bbox).with_id(7);
        let json = serde_json::to_value(&el).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["page"], 1);
        assert_eq!(json["type"], "text");
        assert_eq!(json["content"], "hello");
        assert!(json["bbox"]["raw"].is_array());
    }

    #[test]
    fn test_element_without_position() {
        let el = Element::text(2, "no position", None);
        let json = serde_json::to_value(&el).unwrap();
        assert!(json["bbox"].is_null());
        assert!(json.get("id").is_none());
    }
}
