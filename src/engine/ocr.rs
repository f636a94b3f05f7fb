//! Remote OCR engine.
//!
//! Pages are rendered to temporary PNG files, sent to a recognition
//! service as base64 data URIs, and the returned text and formulas are
//! emitted without positions (the service reports page-level results
//! only). Per-page confidence lands in the document metadata.

use std::path::Path;
use std::thread;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use log::{debug, warn};
use serde::Deserialize;

use crate::engine::backend::LopdfBackend;
use crate::engine::{Availability, PdfEngine};
use crate::error::{Error, Result};
use crate::geom::Origin;
use crate::model::{DocumentResult, Element, ElementIds, Page};

const DEFAULT_ENDPOINT: &str = "https://api.mathpix.com/v3/text";
const APP_ID_VAR: &str = "OCR_APP_ID";
const APP_KEY_VAR: &str = "OCR_APP_KEY";

/// Renders single pages of a PDF to image files.
pub trait PageRasterizer: Send + Sync {
    fn page_count(&self, path: &Path) -> Result<u32>;

    /// Page size (width, height) in points.
    fn page_size(&self, path: &Path, page_number: u32) -> Result<(f64, f64)>;

    /// Render one page as PNG into `out`.
    fn render_page(&self, path: &Path, page_number: u32, out: &Path) -> Result<()>;

    /// Whether rendering can work in this environment.
    fn availability(&self) -> Availability {
        Availability::Available
    }
}

/// Rasterizer shelling out to poppler's `pdftoppm`; page geometry comes
/// from the local backend.
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    /// Render resolution in dots per inch.
    pub dpi: u32,
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self { dpi: 200 }
    }
}

impl PageRasterizer for PdftoppmRasterizer {
    fn page_count(&self, path: &Path) -> Result<u32> {
        use crate::engine::backend::PdfBackend;
        Ok(LopdfBackend::load_file(path)?.page_count())
    }

    fn page_size(&self, path: &Path, page_number: u32) -> Result<(f64, f64)> {
        use crate::engine::backend::PdfBackend;
        LopdfBackend::load_file(path)?.page_size(page_number)
    }

    fn render_page(&self, path: &Path, page_number: u32, out: &Path) -> Result<()> {
        // pdftoppm appends .png itself, so hand it the bare stem
        let prefix = out.with_extension("");
        let status = std::process::Command::new("pdftoppm")
            .arg("-png")
            .arg("-singlefile")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-f")
            .arg(page_number.to_string())
            .arg("-l")
            .arg(page_number.to_string())
            .arg(path)
            .arg(&prefix)
            .status()
            .map_err(|e| Error::Render(format!("cannot run pdftoppm: {e}")))?;
        if !status.success() {
            return Err(Error::Render(format!(
                "pdftoppm failed for page {page_number} of {}",
                path.display()
            )));
        }
        let produced = prefix.with_extension("png");
        if produced != out {
            std::fs::rename(&produced, out)?;
        }
        Ok(())
    }

    fn availability(&self) -> Availability {
        let probe = std::process::Command::new("pdftoppm")
            .arg("-v")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status();
        match probe {
            Ok(_) => Availability::Available,
            Err(e) => Availability::unavailable(format!("cannot run pdftoppm: {e}")),
        }
    }
}

/// Recognition result for one page image.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OcrResponse {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default, rename = "latex_styled")]
    pub latex: Option<String>,
}

/// Turns a page image into recognized text.
pub trait Recognize: Send + Sync {
    fn recognize(&self, image: &Path) -> Result<OcrResponse>;
}

/// HTTP client for the recognition service.
pub struct OcrClient {
    endpoint: String,
    app_id: String,
    app_key: String,
    http: reqwest::blocking::Client,
}

impl OcrClient {
    pub fn new(
        endpoint: impl Into<String>,
        app_id: impl Into<String>,
        app_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            app_id: app_id.into(),
            app_key: app_key.into(),
            http: reqwest::blocking::Client::new(),
        }
    }

    /// Build a client from `OCR_APP_ID` / `OCR_APP_KEY`. Missing
    /// variables yield empty credentials, which the engine reports as
    /// unavailable rather than failing at request time.
    pub fn from_env() -> Self {
        Self::new(
            DEFAULT_ENDPOINT,
            std::env::var(APP_ID_VAR).unwrap_or_default(),
            std::env::var(APP_KEY_VAR).unwrap_or_default(),
        )
    }

    pub fn has_credentials(&self) -> bool {
        !self.app_id.is_empty() && !self.app_key.is_empty()
    }
}

impl Recognize for OcrClient {
    fn recognize(&self, image: &Path) -> Result<OcrResponse> {
        let data = std::fs::read(image)?;
        let src = format!("data:image/png;base64,{}", BASE64.encode(&data));

        let response = self
            .http
            .post(&self.endpoint)
            .header("app_id", &self.app_id)
            .header("app_key", &self.app_key)
            .json(&serde_json::json!({
                "src": src,
                "formats": ["text"],
                "include_latex": true,
            }))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::RemoteCall {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json()?)
    }
}

/// Engine sending rasterized pages to a remote OCR service.
pub struct OcrEngine {
    rasterizer: Box<dyn PageRasterizer>,
    recognizer: Box<dyn Recognize>,
    has_credentials: bool,
    /// Pause between consecutive page requests.
    request_delay: Duration,
}

impl OcrEngine {
    pub fn new(rasterizer: Box<dyn PageRasterizer>) -> Self {
        let client = OcrClient::from_env();
        let has_credentials = client.has_credentials();
        Self {
            rasterizer,
            recognizer: Box::new(client),
            has_credentials,
            request_delay: Duration::from_millis(500),
        }
    }

    pub fn with_recognizer(
        rasterizer: Box<dyn PageRasterizer>,
        recognizer: Box<dyn Recognize>,
    ) -> Self {
        Self {
            rasterizer,
            recognizer,
            has_credentials: true,
            request_delay: Duration::ZERO,
        }
    }
}

impl PdfEngine for OcrEngine {
    fn name(&self) -> &str {
        "ocr"
    }

    fn origin(&self) -> Origin {
        Origin::TopLeft
    }

    fn availability(&self) -> Availability {
        if !self.has_credentials {
            return Availability::unavailable(format!(
                "{APP_ID_VAR} and {APP_KEY_VAR} are not set"
            ));
        }
        self.rasterizer.availability()
    }

    fn parse(&self, path: &Path) -> Result<DocumentResult> {
        crate::detect::ensure_pdf(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let mut result = DocumentResult::new(file_name).with_engine(self.name());
        let mut ids = ElementIds::new();
        let total = self.rasterizer.page_count(path)?;

        for page_number in 1..=total {
            let (width, height) = self.rasterizer.page_size(path, page_number)?;
            let mut page = Page::new(page_number, width, height);

            // The rendered image only needs to outlive the request
            let image = tempfile::Builder::new()
                .prefix("ocr-page-")
                .suffix(".png")
                .tempfile()?;
            self.rasterizer
                .render_page(path, page_number, image.path())?;

            debug!("ocr engine: recognizing page {page_number}/{total}");
            let response = self.recognizer.recognize(image.path())?;

            if let Some(confidence) = response.confidence {
                result.metadata.insert(
                    format!("page_{page_number}_confidence"),
                    format!("{confidence:.4}"),
                );
            }
            if !response.text.trim().is_empty() {
                page.add_element(
                    Element::text(page_number, response.text.trim(), None)
                        .with_id(ids.next_id()),
                );
            } else {
                warn!("ocr engine: page {page_number} produced no text");
            }
            if let Some(latex) = response.latex {
                if !latex.trim().is_empty() {
                    page.add_element(
                        Element::formula(page_number, latex.trim(), None)
                            .with_id(ids.next_id()),
                    );
                }
            }

            result.add_page(page);

            if page_number < total && !self.request_delay.is_zero() {
                thread::sleep(self.request_delay);
            }
        }

        Ok(result)
    }
}
