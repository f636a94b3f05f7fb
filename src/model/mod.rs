//! Common document model shared by all engines.
//!
//! Every adapter, whatever library or service it wraps, produces a
//! [`DocumentResult`]: an ordered list of pages, each holding typed
//! elements with optional normalized bounding boxes. The serialized
//! field names are the interchange format consumed by viewers and
//! benchmark scripts and must not change.

mod document;
mod element;
mod page;

pub use document::{DocumentResult, Metadata};
pub use element::{Element, ElementIds, ElementType};
pub use page::Page;
