//! Bounding-box geometry and coordinate normalization.
//!
//! Every engine reports axis-aligned rectangles in page point units, but
//! not in the same coordinate system: PDF user space puts the origin at
//! the bottom-left corner, while layout models and web viewers put it at
//! the top-left. Each adapter declares its [`Origin`] and flips its boxes
//! into top-left convention *before* normalization; [`normalize`] itself
//! only divides by the page dimensions. Keeping the flip out of the shared
//! step makes the convention explicit at every call site.

use serde::{Deserialize, Serialize};

/// Vertical origin convention of a producer's coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// y increases downward from the top of the page (web/image space).
    TopLeft,
    /// y increases upward from the bottom of the page (PDF user space).
    BottomLeft,
}

/// An absolute rectangle in page point units: `(x0, y0, x1, y1)`.
///
/// Serializes as a four-element array to match the interchange format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "[f64; 4]", from = "[f64; 4]")]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    /// Create a rectangle from its corner coordinates.
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Width in points.
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    /// Height in points.
    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// Mirror the vertical axis: a bottom-left-origin box becomes a
    /// top-left-origin box (and vice versa). `y0 <= y1` is preserved.
    pub fn flipped_y(&self, page_height: f64) -> Rect {
        Rect {
            x0: self.x0,
            y0: page_height - self.y1,
            x1: self.x1,
            y1: page_height - self.y0,
        }
    }

    /// Express this box in top-left convention, flipping only when the
    /// declared origin requires it.
    pub fn to_top_left(&self, origin: Origin, page_height: f64) -> Rect {
        match origin {
            Origin::TopLeft => *self,
            Origin::BottomLeft => self.flipped_y(page_height),
        }
    }
}

impl From<(f64, f64, f64, f64)> for Rect {
    fn from(t: (f64, f64, f64, f64)) -> Self {
        Rect::new(t.0, t.1, t.2, t.3)
    }
}

impl From<Rect> for [f64; 4] {
    fn from(r: Rect) -> Self {
        [r.x0, r.y0, r.x1, r.y1]
    }
}

impl From<[f64; 4]> for Rect {
    fn from(a: [f64; 4]) -> Self {
        Rect::new(a[0], a[1], a[2], a[3])
    }
}

/// A viewer-ready rectangle: position and size as fractions of the page
/// dimensions, top-left origin, with the original absolute box retained
/// in `raw` for consumers needing exact point coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub raw: Rect,
}

/// Convert an absolute top-left-origin box into page-relative fractions.
///
/// Returns `None` when `bbox` is `None` (the element has no known
/// position). Callers are responsible for flipping bottom-left-origin
/// boxes into top-left orientation first; see [`Rect::to_top_left`].
/// A zero-size page is a caller error and yields non-finite fractions.
pub fn normalize(bbox: Option<Rect>, page_width: f64, page_height: f64) -> Option<NormalizedRect> {
    let r = bbox?;
    Some(NormalizedRect {
        x: r.x0 / page_width,
        y: r.y0 / page_height,
        w: (r.x1 - r.x0) / page_width,
        h: (r.y1 - r.y0) / page_height,
        raw: r,
    })
}

/// Round to two decimal places, the precision used for persisted
/// ground-truth coordinates.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
