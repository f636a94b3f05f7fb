//! # pdfprobe
//!
//! Multi-engine PDF parsing harness for Rust.
//!
//! This library drives several PDF-parsing engines (local text
//! extraction, table detection, remote OCR, external layout analysis)
//! and normalizes their output into one common JSON document shape, so
//! results from different engines can be compared element by element.
//! A second path extracts ground-truth bounding boxes from instrumented
//! LaTeX builds for evaluating those engines.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfprobe::{default_registry, output, JsonFormat};
//!
//! fn main() -> pdfprobe::Result<()> {
//!     let registry = default_registry();
//!     let result = registry.parse_with("text", "document.pdf".as_ref())?;
//!     println!("{}", output::to_json(&result, JsonFormat::Pretty)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **One output shape**: every engine produces the same pages/elements
//!   JSON regardless of how it parses
//! - **Normalized geometry**: bounding boxes as page-relative fractions,
//!   top-left origin, with the raw point box retained
//! - **Typed availability**: engines report missing credentials or tools
//!   up front instead of failing mid-parse
//! - **Ground truth**: annotation extraction from LaTeX position
//!   instrumentation for engine evaluation

pub mod detect;
pub mod engine;
pub mod error;
pub mod geom;
pub mod ground_truth;
pub mod model;
pub mod output;

// Re-export commonly used types
pub use engine::{
    Availability, EngineRegistry, LayoutEngine, OcrEngine, PdfEngine, PdftoppmRasterizer,
    TableEngine, TextEngine,
};
pub use error::{Error, Result};
pub use geom::{normalize, NormalizedRect, Origin, Rect};
pub use ground_truth::{Annotation, GroundTruthFile};
pub use model::{DocumentResult, Element, ElementType, Metadata, Page};
pub use output::JsonFormat;

use std::path::Path;
use std::sync::Arc;

/// Build a registry holding every built-in engine.
///
/// Engines with unmet requirements (no OCR credentials, missing external
/// tools) are still registered; they report themselves unavailable and
/// [`EngineRegistry::parse_with`] refuses to run them.
pub fn default_registry() -> EngineRegistry {
    let mut registry = EngineRegistry::new();
    registry.register(Arc::new(TextEngine::new()));
    registry.register(Arc::new(TableEngine::new()));
    registry.register(Arc::new(OcrEngine::new(Box::new(
        PdftoppmRasterizer::default(),
    ))));
    registry.register(Arc::new(LayoutEngine::new()));
    registry
}

/// Parse a PDF file with the default text engine.
///
/// # Example
///
/// ```no_run
/// use pdfprobe::parse_file;
///
/// let result = parse_file("document.pdf").unwrap();
/// println!("Pages: {}", result.page_count());
/// ```
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<DocumentResult> {
    TextEngine::new().parse(path.as_ref())
}

/// Parse a PDF file with a named engine from the default registry.
pub fn parse_file_with<P: AsRef<Path>>(path: P, engine: &str) -> Result<DocumentResult> {
    default_registry().parse_with(engine, path.as_ref())
}

/// Extract plain text from a PDF file.
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let result = parse_file(path)?;
    Ok(result.plain_text())
}
