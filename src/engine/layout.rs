//! Layout analysis engine driven by an external converter tool.
//!
//! The tool converts a PDF into a hierarchical JSON file describing the
//! document structure (headings, paragraphs, tables, pictures) with
//! top-left-origin boxes. We run it against a temporary directory, read
//! back `<stem>.json`, and flatten the hierarchy into the common shape.

use std::path::Path;
use std::process::{Command, Stdio};

use log::debug;
use serde::Deserialize;

use crate::engine::{Availability, PdfEngine};
use crate::error::{Error, Result};
use crate::geom::{normalize, Origin, Rect};
use crate::model::{DocumentResult, Element, ElementIds, ElementType, Page};

const DEFAULT_COMMAND: &str = "opendataloader-pdf";

/// One node of the converter's hierarchical output.
#[derive(Debug, Clone, Deserialize)]
pub struct LayoutItem {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub bbox: Option<LayoutBox>,
    #[serde(default)]
    pub kids: Vec<LayoutItem>,
}

/// Top-left-origin box as the converter reports it.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LayoutBox {
    pub l: f64,
    pub t: f64,
    pub r: f64,
    pub b: f64,
}

impl From<LayoutBox> for Rect {
    fn from(b: LayoutBox) -> Self {
        Rect::new(b.l, b.t, b.r, b.b)
    }
}

#[derive(Debug, Deserialize)]
struct LayoutPageInfo {
    page_number: u32,
    width: f64,
    height: f64,
}

#[derive(Debug, Deserialize)]
struct LayoutDocument {
    #[serde(default)]
    pages: Vec<LayoutPageInfo>,
    #[serde(default)]
    kids: Vec<LayoutItem>,
}

/// Engine shelling out to the layout converter.
pub struct LayoutEngine {
    command: String,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutEngine {
    pub fn new() -> Self {
        Self {
            command: DEFAULT_COMMAND.to_string(),
        }
    }

    pub fn with_command(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl PdfEngine for LayoutEngine {
    fn name(&self) -> &str {
        "layout"
    }

    fn origin(&self) -> Origin {
        Origin::TopLeft
    }

    fn availability(&self) -> Availability {
        let probe = Command::new(&self.command)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        match probe {
            Ok(_) => Availability::Available,
            Err(e) => Availability::unavailable(format!("cannot run {}: {e}", self.command)),
        }
    }

    fn parse(&self, path: &Path) -> Result<DocumentResult> {
        crate::detect::ensure_pdf(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let out_dir = tempfile::tempdir()?;
        debug!(
            "layout engine: running {} on {}",
            self.command,
            path.display()
        );
        let output = Command::new(&self.command)
            .arg(path)
            .arg("--output-dir")
            .arg(out_dir.path())
            .arg("--format")
            .arg("json")
            .output()
            .map_err(|e| Error::LayoutModel(format!("cannot run {}: {e}", self.command)))?;
        if !output.status.success() {
            return Err(Error::LayoutModel(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        let json_path = out_dir.path().join(format!("{stem}.json"));
        let data = std::fs::read_to_string(&json_path).map_err(|_| {
            Error::LayoutModel(format!("converter produced no {stem}.json"))
        })?;
        let doc: LayoutDocument =
            serde_json::from_str(&data).map_err(|e| Error::LayoutModel(e.to_string()))?;

        let mut result = DocumentResult::new(file_name).with_engine(self.name());
        for info in &doc.pages {
            result.add_page(Page::new(info.page_number, info.width, info.height));
        }

        let mut ids = ElementIds::new();
        for item in flatten_items(&doc.kids) {
            let Some(info) = doc.pages.iter().find(|p| p.page_number == item.page) else {
                continue;
            };
            let Some(element) = item_to_element(item, info.width, info.height) else {
                continue;
            };
            let element = element.with_id(ids.next_id());
            if let Some(page) = result.get_page_mut(item.page) {
                page.add_element(element);
            }
        }

        Ok(result)
    }
}

/// Depth-first flattening of the item hierarchy, document order.
pub fn flatten_items(items: &[LayoutItem]) -> Vec<&LayoutItem> {
    let mut out = Vec::new();
    for item in items {
        out.push(item);
        out.extend(flatten_items(&item.kids));
    }
    out
}

fn item_to_element(item: &LayoutItem, width: f64, height: f64) -> Option<Element> {
    let kind = label_to_type(&item.label);
    let text = item.text.as_deref().unwrap_or("").trim().to_string();
    if text.is_empty() && kind != ElementType::Image {
        return None;
    }
    let content = match kind {
        ElementType::Image => "[image]".to_string(),
        ElementType::Heading => format!("# {text}"),
        _ => text,
    };
    let bbox = item
        .bbox
        .map(Rect::from)
        .and_then(|r| normalize(Some(r), width, height));
    Some(Element::new(kind, item.page, content, bbox))
}

fn label_to_type(label: &str) -> ElementType {
    match label.to_ascii_lowercase().as_str() {
        "table" => ElementType::Table,
        "picture" | "image" | "figure" => ElementType::Image,
        "formula" => ElementType::Formula,
        "title" | "section_header" | "heading" => ElementType::Heading,
        "code" => ElementType::Code,
        "link" => ElementType::Link,
        _ => ElementType::Text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(label: &str, page: u32, text: &str, kids: Vec<LayoutItem>) -> LayoutItem {
        LayoutItem {
            label: label.to_string(),
            page,
            text: if text.is_empty() {
                None
            } else {
                Some(text.to_string())
            },
            bbox: Some(LayoutBox {
                l: 10.0,
                t: 20.0,
                r: 110.0,
                b: 40.0,
            }),
            kids,
        }
    }

    #[test]
    fn test_flatten_depth_first() {
        let tree = vec![item(
            "section",
            1,
            "",
            vec![
                item("section_header", 1, "Intro", vec![]),
                item("paragraph", 1, "Body", vec![]),
            ],
        )];
        let flat = flatten_items(&tree);
        let labels: Vec<&str> = flat.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["section", "section_header", "paragraph"]);
    }

    #[test]
    fn test_label_mapping() {
        assert_eq!(label_to_type("section_header"), ElementType::Heading);
        assert_eq!(label_to_type("Picture"), ElementType::Image);
        assert_eq!(label_to_type("code"), ElementType::Code);
        assert_eq!(label_to_type("paragraph"), ElementType::Text);
    }

    #[test]
    fn test_heading_gets_prefix() {
        let el = item_to_element(&item("title", 1, "My Title", vec![]), 200.0, 400.0);
        let el = el.unwrap();
        assert_eq!(el.kind, ElementType::Heading);
        assert_eq!(el.content, "# My Title");
        let bbox = el.bbox.unwrap();
        assert!((bbox.x - 0.05).abs() < 1e-9);
        assert!((bbox.y - 0.05).abs() < 1e-9);
        assert!((bbox.w - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_textless_item_skipped() {
        assert!(item_to_element(&item("paragraph", 1, "", vec![]), 100.0, 100.0).is_none());
        // Pictures carry no text but still become elements
        assert!(item_to_element(&item("picture", 1, "", vec![]), 100.0, 100.0).is_some());
    }

    #[test]
    fn test_document_deserialization() {
        let json = r#"{
            "pages": [{"page_number": 1, "width": 612.0, "height": 792.0}],
            "kids": [
                {"label": "paragraph", "page": 1, "text": "Hello",
                 "bbox": {"l": 1.0, "t": 2.0, "r": 3.0, "b": 4.0}}
            ]
        }"#;
        let doc: LayoutDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.pages.len(), 1);
        assert_eq!(doc.kids[0].text.as_deref(), Some("Hello"));
    }
}
