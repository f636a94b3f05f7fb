//! Table detection engine.
//!
//! Tables are recovered from the ruled lines drawn in the page content
//! (lattice detection): horizontal and vertical strokes are clustered
//! into a grid, and cell text is gathered from the blocks whose centers
//! fall inside each cell.

use std::path::Path;

use log::debug;

use crate::engine::backend::{LopdfBackend, PdfBackend, Segment, TextBlock};
use crate::engine::PdfEngine;
use crate::error::Result;
use crate::geom::{normalize, Origin, Rect};
use crate::model::{DocumentResult, Element, ElementIds, Page};

/// A detected table: its bounding box in bottom-left-origin points and
/// its cell text as rows, top row first.
#[derive(Debug, Clone)]
pub struct DetectedTable {
    pub bbox: Rect,
    pub cells: Vec<Vec<String>>,
}

impl DetectedTable {
    /// Serialize the cell grid as CSV, one line per row.
    pub fn to_csv(&self) -> String {
        self.cells
            .iter()
            .map(|row| {
                row.iter()
                    .map(|c| csv_field(c))
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Strategy for locating tables on a page given its drawn segments and
/// text blocks. Coordinates are bottom-left-origin points throughout.
pub trait TableFinder: Send + Sync {
    fn find_tables(&self, segments: &[Segment], blocks: &[TextBlock]) -> Vec<DetectedTable>;
}

/// Lattice detection over ruled lines.
#[derive(Debug, Clone)]
pub struct LatticeFinder {
    /// Coordinates closer than this are treated as the same grid line.
    pub snap_tolerance: f64,
    /// Segments shorter than this are ignored as decoration.
    pub min_line_length: f64,
}

impl Default for LatticeFinder {
    fn default() -> Self {
        Self {
            snap_tolerance: 2.0,
            min_line_length: 10.0,
        }
    }
}

impl LatticeFinder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TableFinder for LatticeFinder {
    fn find_tables(&self, segments: &[Segment], blocks: &[TextBlock]) -> Vec<DetectedTable> {
        let tol = self.snap_tolerance;

        let mut row_ys = Vec::new();
        let mut col_xs = Vec::new();
        for seg in segments {
            if seg.length() < self.min_line_length {
                continue;
            }
            if (seg.y0 - seg.y1).abs() <= tol {
                push_clustered(&mut row_ys, (seg.y0 + seg.y1) / 2.0, tol);
            } else if (seg.x0 - seg.x1).abs() <= tol {
                push_clustered(&mut col_xs, (seg.x0 + seg.x1) / 2.0, tol);
            }
        }

        // A grid needs at least 2x2 cells, i.e. 3 lines each way
        if row_ys.len() < 3 || col_xs.len() < 3 {
            return Vec::new();
        }

        row_ys.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        col_xs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let bbox = Rect::new(
            col_xs[0],
            row_ys[row_ys.len() - 1],
            col_xs[col_xs.len() - 1],
            row_ys[0],
        );

        // Rows run top to bottom (descending y in page space)
        let mut cells = Vec::with_capacity(row_ys.len() - 1);
        for row in row_ys.windows(2) {
            let (y_top, y_bottom) = (row[0], row[1]);
            let mut row_cells = Vec::with_capacity(col_xs.len() - 1);
            for col in col_xs.windows(2) {
                let (x_left, x_right) = (col[0], col[1]);
                let mut texts = Vec::new();
                for block in blocks {
                    let cx = (block.bbox.x0 + block.bbox.x1) / 2.0;
                    let cy = (block.bbox.y0 + block.bbox.y1) / 2.0;
                    if cx >= x_left && cx < x_right && cy >= y_bottom && cy < y_top {
                        texts.push(block.text.as_str());
                    }
                }
                row_cells.push(texts.join(" "));
            }
            cells.push(row_cells);
        }

        vec![DetectedTable { bbox, cells }]
    }
}

fn push_clustered(values: &mut Vec<f64>, value: f64, tolerance: f64) {
    if !values.iter().any(|v| (v - value).abs() <= tolerance) {
        values.push(value);
    }
}

/// Engine emitting one table element per detected grid. Pages without
/// tables are still present in the result, just empty.
pub struct TableEngine {
    finder: Box<dyn TableFinder>,
}

impl Default for TableEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TableEngine {
    pub fn new() -> Self {
        Self {
            finder: Box::new(LatticeFinder::new()),
        }
    }

    pub fn with_finder(finder: Box<dyn TableFinder>) -> Self {
        Self { finder }
    }
}

impl PdfEngine for TableEngine {
    fn name(&self) -> &str {
        "table"
    }

    fn origin(&self) -> Origin {
        Origin::BottomLeft
    }

    fn parse(&self, path: &Path) -> Result<DocumentResult> {
        let backend = LopdfBackend::load_file(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let mut result = DocumentResult::new(file_name).with_engine(self.name());
        result.metadata = backend.metadata();

        let mut ids = ElementIds::new();
        for page_number in 1..=backend.page_count() {
            let (width, height) = backend.page_size(page_number)?;
            let mut page = Page::new(page_number, width, height);

            let segments = backend.line_segments(page_number)?;
            let blocks = backend.text_blocks(page_number)?;
            let tables = self.finder.find_tables(&segments, &blocks);
            debug!(
                "table engine: page {} has {} table(s)",
                page_number,
                tables.len()
            );

            for table in tables {
                let top_left = table.bbox.to_top_left(self.origin(), height);
                let bbox = normalize(Some(top_left), width, height);
                page.add_element(
                    Element::table(page_number, table.to_csv(), bbox).with_id(ids.next_id()),
                );
            }

            result.add_page(page);
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_segments() -> Vec<Segment> {
        // A 2x2 grid: horizontals at y = 100, 140, 180; verticals at
        // x = 50, 150, 250
        let mut segs = Vec::new();
        for y in [100.0, 140.0, 180.0] {
            segs.push(Segment::new(50.0, y, 250.0, y));
        }
        for x in [50.0, 150.0, 250.0] {
            segs.push(Segment::new(x, 100.0, x, 180.0));
        }
        segs
    }

    fn block(text: &str, x: f64, y: f64) -> TextBlock {
        TextBlock {
            text: text.to_string(),
            bbox: Rect::new(x, y, x + 20.0, y + 10.0),
        }
    }

    #[test]
    fn test_lattice_finds_grid() {
        let finder = LatticeFinder::new();
        let blocks = vec![
            block("a", 60.0, 160.0),
            block("b", 160.0, 160.0),
            block("c", 60.0, 110.0),
            block("d", 160.0, 110.0),
        ];
        let tables = finder.find_tables(&grid_segments(), &blocks);
        assert_eq!(tables.len(), 1);
        let table = &tables[0];
        assert_eq!(table.bbox, Rect::new(50.0, 100.0, 250.0, 180.0));
        // Top row first
        assert_eq!(
            table.cells,
            vec![
                vec!["a".to_string(), "b".to_string()],
                vec!["c".to_string(), "d".to_string()],
            ]
        );
    }

    #[test]
    fn test_lattice_ignores_sparse_lines() {
        let finder = LatticeFinder::new();
        // Only two horizontals and two verticals: a box, not a grid
        let segs = vec![
            Segment::new(50.0, 100.0, 250.0, 100.0),
            Segment::new(50.0, 180.0, 250.0, 180.0),
            Segment::new(50.0, 100.0, 50.0, 180.0),
            Segment::new(250.0, 100.0, 250.0, 180.0),
        ];
        assert!(finder.find_tables(&segs, &[]).is_empty());
    }

    #[test]
    fn test_lattice_snaps_near_lines() {
        let finder = LatticeFinder::new();
        let mut segs = grid_segments();
        // A duplicate rule 1pt off must not create a phantom row
        segs.push(Segment::new(50.0, 141.0, 250.0, 141.0));
        let tables = finder.find_tables(&segs, &[]);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].cells.len(), 2);
    }

    #[test]
    fn test_csv_escaping() {
        let table = DetectedTable {
            bbox: Rect::new(0.0, 0.0, 1.0, 1.0),
            cells: vec![vec![
                "plain".to_string(),
                "has,comma".to_string(),
                "has \"quote\"".to_string(),
            ]],
        };
        assert_eq!(table.to_csv(), "plain,\"has,comma\",\"has \"\"quote\"\"\"");
    }

    #[test]
    fn test_engine_identity() {
        let engine = TableEngine::new();
        assert_eq!(engine.name(), "table");
        assert_eq!(engine.origin(), Origin::BottomLeft);
    }
}
