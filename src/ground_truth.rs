//! Ground-truth label extraction from LaTeX position instrumentation.
//!
//! Labeled PDFs are produced from LaTeX sources whose elements are
//! wrapped in position-saving macros. After compilation the `.aux` file
//! holds `\zref@newlabel` records: four corner records per element id
//! (`top:`/`bottom:`/`left:`/`right:` with a `\posx` or `\posy` value in
//! sp units, 65536 sp per point) and one `meta:` record carrying the
//! element's label and page. This module reassembles those records into
//! top-left-origin annotation boxes and writes the sidecar JSON file
//! consumed by evaluation tooling.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use log::{debug, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geom::round2;

/// A4 page size in points, the layout the labeled corpus is built with.
pub const A4_WIDTH_PT: f64 = 595.28;
pub const A4_HEIGHT_PT: f64 = 841.89;

const SP_PER_POINT: f64 = 65536.0;

/// One labeled element: `bbox` is `[x, y, w, h]` in points, top-left
/// origin, rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: u64,
    pub label: String,
    pub page: u32,
    pub bbox: [f64; 4],
}

/// The sidecar file written next to each labeled PDF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundTruthFile {
    pub doc_id: String,
    /// `[width, height]` in points.
    pub page_size: [f64; 2],
    pub annotations: Vec<Annotation>,
}

impl GroundTruthFile {
    pub fn new(doc_id: impl Into<String>, page_width: f64, page_height: f64) -> Self {
        Self {
            doc_id: doc_id.into(),
            page_size: [page_width, page_height],
            annotations: Vec::new(),
        }
    }
}

fn corner_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\\zref@newlabel\{(top|bottom|left|right):(\d+)\}.*?\\pos[xy]\{(\d+)\}")
            .unwrap()
    })
}

fn meta_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\\zref@newlabel\{meta:(\d+):([a-zA-Z_]+)\}.*?\\page\{(\d+)\}").unwrap()
    })
}

#[derive(Debug, Default, Clone, Copy)]
struct Corners {
    top: Option<f64>,
    bottom: Option<f64>,
    left: Option<f64>,
    right: Option<f64>,
}

/// Extract annotations from a compiled `.aux` file.
///
/// A missing file yields an empty list rather than an error: a failed
/// LaTeX compile simply produces no labels. Elements missing any of the
/// four corner records are skipped, as are boxes with width or height
/// of one point or less (collapsed instrumentation). Results are sorted
/// by element id.
pub fn extract<P: AsRef<Path>>(aux_path: P, page_height: f64) -> Result<Vec<Annotation>> {
    let aux_path = aux_path.as_ref();
    if !aux_path.exists() {
        warn!("aux file not found: {}", aux_path.display());
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(aux_path)?;
    Ok(extract_from_str(&content, page_height))
}

/// Parse annotation records out of aux-file text.
pub fn extract_from_str(content: &str, page_height: f64) -> Vec<Annotation> {
    let mut corners: HashMap<u64, Corners> = HashMap::new();

    for caps in corner_pattern().captures_iter(content) {
        let Ok(id) = caps[2].parse::<u64>() else {
            continue;
        };
        let Ok(sp) = caps[3].parse::<f64>() else {
            continue;
        };
        let points = sp / SP_PER_POINT;
        let entry = corners.entry(id).or_default();
        match &caps[1] {
            "top" => entry.top = Some(points),
            "bottom" => entry.bottom = Some(points),
            "left" => entry.left = Some(points),
            "right" => entry.right = Some(points),
            _ => unreachable!(),
        }
    }

    let mut annotations = Vec::new();
    for caps in meta_pattern().captures_iter(content) {
        let Ok(id) = caps[1].parse::<u64>() else {
            continue;
        };
        let label = caps[2].to_string();
        let Ok(page) = caps[3].parse::<u32>() else {
            continue;
        };
        let Some(c) = corners.get(&id) else {
            continue;
        };
        let (Some(top), Some(bottom), Some(left), Some(right)) =
            (c.top, c.bottom, c.left, c.right)
        else {
            debug!("element {id}: incomplete corner records, skipping");
            continue;
        };

        // TeX measures from the bottom-left; flip to top-left
        let y_top = page_height - top;
        let y_bottom = page_height - bottom;
        let width = (right - left).abs();
        let height = (y_bottom - y_top).abs();

        if width <= 1.0 || height <= 1.0 {
            continue;
        }

        annotations.push(Annotation {
            id,
            label,
            page,
            bbox: [round2(left), round2(y_top), round2(width), round2(height)],
        });
    }

    annotations.sort_by_key(|a| a.id);
    annotations
}

/// Write the sidecar JSON for one labeled document.
pub fn write_sidecar<P: AsRef<Path>>(path: P, file: &GroundTruthFile) -> Result<()> {
    let json = serde_json::to_string_pretty(file)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corner(kind: &str, id: u64, axis: char, sp: i64) -> String {
        format!("\\zref@newlabel{{{kind}:{id}}}{{\\default{{}}\\pos{axis}{{{sp}}}}}\n")
    }

    fn meta(id: u64, label: &str, page: u32) -> String {
        format!("\\zref@newlabel{{meta:{id}:{label}}}{{\\default{{1}}\\page{{{page}}}}}\n")
    }

    fn full_element(id: u64, label: &str, page: u32) -> String {
        // top=800pt, bottom=780pt, left=50pt, right=200pt
        let mut s = String::new();
        s.push_str(&corner("top", id, 'y', 800 * 65536));
        s.push_str(&corner("bottom", id, 'y', 780 * 65536));
        s.push_str(&corner("left", id, 'x', 50 * 65536));
        s.push_str(&corner("right", id, 'x', 200 * 65536));
        s.push_str(&meta(id, label, page));
        s
    }

    #[test]
    fn test_extract_single_element() {
        let content = full_element(1, "title", 1);
        let anns = extract_from_str(&content, A4_HEIGHT_PT);
        assert_eq!(anns.len(), 1);
        let a = &anns[0];
        assert_eq!(a.id, 1);
        assert_eq!(a.label, "title");
        assert_eq!(a.page, 1);
        // y = 841.89 - 800 = 41.89, w = 150, h = 20
        assert_eq!(a.bbox, [50.0, 41.89, 150.0, 20.0]);
    }

    #[test]
    fn test_fixed_point_division() {
        // 41943040 sp = 640 pt exactly
        let mut content = corner("top", 1, 'y', 41_943_040);
        content.push_str(&corner("bottom", 1, 'y', 40_000_000));
        content.push_str(&corner("left", 1, 'x', 3_276_800));
        content.push_str(&corner("right", 1, 'x', 9_830_400));
        content.push_str(&meta(1, "paragraph", 2));
        let anns = extract_from_str(&content, 841.89);
        assert_eq!(anns.len(), 1);
        assert_eq!(anns[0].bbox[0], 50.0);
        assert_eq!(anns[0].page, 2);
    }

    #[test]
    fn test_incomplete_corners_skipped() {
        let mut content = corner("top", 1, 'y', 800 * 65536);
        content.push_str(&corner("left", 1, 'x', 50 * 65536));
        content.push_str(&meta(1, "title", 1));
        content.push_str(&full_element(2, "paragraph", 1));
        let anns = extract_from_str(&content, A4_HEIGHT_PT);
        assert_eq!(anns.len(), 1);
        assert_eq!(anns[0].id, 2);
    }

    #[test]
    fn test_meta_without_corners_skipped() {
        let anns = extract_from_str(&meta(5, "footer", 1), A4_HEIGHT_PT);
        assert!(anns.is_empty());
    }

    #[test]
    fn test_degenerate_boxes_filtered() {
        // height exactly 1pt: dropped
        let mut content = corner("top", 1, 'y', 800 * 65536);
        content.push_str(&corner("bottom", 1, 'y', 799 * 65536));
        content.push_str(&corner("left", 1, 'x', 50 * 65536));
        content.push_str(&corner("right", 1, 'x', 200 * 65536));
        content.push_str(&meta(1, "rule", 1));
        assert!(extract_from_str(&content, A4_HEIGHT_PT).is_empty());

        // zero width: dropped
        let mut content = corner("top", 2, 'y', 800 * 65536);
        content.push_str(&corner("bottom", 2, 'y', 700 * 65536));
        content.push_str(&corner("left", 2, 'x', 50 * 65536));
        content.push_str(&corner("right", 2, 'x', 50 * 65536));
        content.push_str(&meta(2, "rule", 1));
        assert!(extract_from_str(&content, A4_HEIGHT_PT).is_empty());
    }

    #[test]
    fn test_sorted_by_id() {
        let mut content = full_element(3, "footer", 2);
        content.push_str(&full_element(1, "title", 1));
        content.push_str(&full_element(2, "paragraph", 1));
        let anns = extract_from_str(&content, A4_HEIGHT_PT);
        let ids: Vec<u64> = anns.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_unrelated_records_ignored() {
        let content = "\\zref@newlabel{eq:euler}{\\default{1}\\page{3}}\n\
                       \\relax\n\\newlabel{sec:intro}{{1}{1}}\n";
        assert!(extract_from_str(content, A4_HEIGHT_PT).is_empty());
    }

    #[test]
    fn test_missing_file_is_empty() {
        let anns = extract("/nonexistent/path/doc.aux", A4_HEIGHT_PT).unwrap();
        assert!(anns.is_empty());
    }

    #[test]
    fn test_extract_reads_file() {
        use std::io::Write;
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(full_element(1, "title", 1).as_bytes()).unwrap();
        let anns = extract(f.path(), A4_HEIGHT_PT).unwrap();
        assert_eq!(anns.len(), 1);
    }

    #[test]
    fn test_sidecar_shape() {
        let mut gt = GroundTruthFile::new("DOC_001", A4_WIDTH_PT, A4_HEIGHT_PT);
        gt.annotations = extract_from_str(&full_element(1, "title", 1), A4_HEIGHT_PT);
        let json = serde_json::to_value(&gt).unwrap();
        assert_eq!(json["doc_id"], "DOC_001");
        assert_eq!(json["page_size"][0], A4_WIDTH_PT);
        assert_eq!(json["annotations"][0]["bbox"][1], 41.89);
    }
}
