//! Engine adapters and their registry.
//!
//! Each third-party parsing library or service is wrapped by one adapter
//! implementing [`PdfEngine`]. New engines are added by implementing the
//! trait, not by duplicating page/element assembly logic. Adapters
//! declare the origin convention of the boxes they produce and are
//! responsible for flipping bottom-left-origin boxes into top-left
//! orientation before normalization.

mod backend;
mod layout;
mod ocr;
mod table;
mod text;

pub use backend::{LopdfBackend, PdfBackend, Segment, TextBlock};
pub use layout::{LayoutEngine, LayoutItem};
pub use ocr::{OcrClient, OcrEngine, OcrResponse, PageRasterizer, PdftoppmRasterizer, Recognize};
pub use table::{DetectedTable, LatticeFinder, TableEngine, TableFinder};
pub use text::TextEngine;

use crate::error::{Error, Result};
use crate::geom::Origin;
use crate::model::DocumentResult;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Result of an engine's capability check, performed once at startup
/// rather than by catching import-style failures at call sites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    /// The engine's dependencies are present and it can parse.
    Available,
    /// The engine cannot run; `reason` is a human-readable explanation.
    Unavailable { reason: String },
}

impl Availability {
    /// Build the unavailable variant from any displayable reason.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Availability::Unavailable {
            reason: reason.into(),
        }
    }

    /// Check whether the engine can run.
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }
}

/// A wrapper around one third-party parsing library or service.
pub trait PdfEngine: Send + Sync {
    /// Short engine name used for registry lookup and the `engine` tag.
    fn name(&self) -> &str;

    /// Origin convention of the absolute boxes this engine's source
    /// library reports, before the adapter's own flip.
    fn origin(&self) -> Origin;

    /// Capability check. The default assumes no external runtime is
    /// needed beyond the crate's own dependencies.
    fn availability(&self) -> Availability {
        Availability::Available
    }

    /// Parse a document into the common shape.
    fn parse(&self, path: &Path) -> Result<DocumentResult>;
}

/// Registry mapping engine names to adapters.
pub struct EngineRegistry {
    engines: HashMap<String, Arc<dyn PdfEngine>>,
}

impl EngineRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            engines: HashMap::new(),
        }
    }

    /// Register an engine under its own name (case-insensitive lookup).
    pub fn register(&mut self, engine: Arc<dyn PdfEngine>) {
        self.engines.insert(engine.name().to_lowercase(), engine);
    }

    /// Get an engine by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn PdfEngine>> {
        self.engines.get(&name.to_lowercase()).cloned()
    }

    /// Check if an engine is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.engines.contains_key(&name.to_lowercase())
    }

    /// Registered engine names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.engines.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Parse with the named engine after checking its availability.
    pub fn parse_with(&self, name: &str, path: &Path) -> Result<DocumentResult> {
        let engine = self
            .get(name)
            .ok_or_else(|| Error::Other(format!("No engine named '{}'", name)))?;

        match engine.availability() {
            Availability::Available => engine.parse(path),
            Availability::Unavailable { reason } => Err(Error::EngineUnavailable {
                engine: engine.name().to_string(),
                reason,
            }),
        }
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::new()
    }
}
