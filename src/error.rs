//! Error types for the pdfprobe library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pdfprobe operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while driving an engine or extracting
/// ground-truth annotations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An input file that must exist does not.
    #[error("Input file not found: {0}")]
    MissingInput(PathBuf),

    /// The file is not recognized as a PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// An engine's external dependency is not installed or not reachable.
    #[error("Engine '{engine}' is unavailable: {reason}")]
    EngineUnavailable { engine: String, reason: String },

    /// The remote OCR service returned a non-success status.
    /// Carries the status code and the response body verbatim.
    #[error("Remote OCR call failed with status {status}: {body}")]
    RemoteCall { status: u16, body: String },

    /// Transport-level failure reaching the remote OCR service.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The external layout model failed or produced unreadable output.
    #[error("Layout model error: {0}")]
    LayoutModel(String),

    /// Error serializing or deserializing JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error rendering a page image.
    #[error("Rendering error: {0}")]
    Render(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}
