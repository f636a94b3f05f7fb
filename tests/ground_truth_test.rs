//! Integration tests for ground-truth extraction from aux files.

use std::io::Write;

use pdfprobe::ground_truth::{self, GroundTruthFile, A4_HEIGHT_PT, A4_WIDTH_PT};

const SP: i64 = 65536;

fn element(id: u64, label: &str, page: u32, top: i64, bottom: i64, left: i64, right: i64) -> String {
    format!(
        "\\zref@newlabel{{top:{id}}}{{\\default{{{page}}}\\posy{{{}}}}}\n\
         \\zref@newlabel{{bottom:{id}}}{{\\default{{{page}}}\\posy{{{}}}}}\n\
         \\zref@newlabel{{left:{id}}}{{\\default{{{page}}}\\posx{{{}}}}}\n\
         \\zref@newlabel{{right:{id}}}{{\\default{{{page}}}\\posx{{{}}}}}\n\
         \\zref@newlabel{{meta:{id}:{label}}}{{\\default{{{page}}}\\page{{{page}}}}}\n",
        top * SP,
        bottom * SP,
        left * SP,
        right * SP
    )
}

fn write_aux(content: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::Builder::new().suffix(".aux").tempfile().unwrap();
    f.write_all(b"\\relax\n").unwrap();
    f.write_all(content.as_bytes()).unwrap();
    f
}

#[test]
fn test_full_document_extraction() {
    let mut content = String::new();
    content.push_str(&element(1, "title", 1, 800, 780, 50, 200));
    content.push_str(&element(2, "paragraph", 1, 700, 600, 70, 520));
    content.push_str(&element(3, "footer", 2, 40, 30, 250, 350));
    let aux = write_aux(&content);

    let anns = ground_truth::extract(aux.path(), A4_HEIGHT_PT).unwrap();
    assert_eq!(anns.len(), 3);

    assert_eq!(anns[0].label, "title");
    assert_eq!(anns[0].page, 1);
    assert_eq!(anns[0].bbox, [50.0, 41.89, 150.0, 20.0]);

    assert_eq!(anns[1].bbox, [70.0, 141.89, 450.0, 100.0]);
    assert_eq!(anns[2].page, 2);
}

#[test]
fn test_extraction_is_idempotent() {
    let content = element(1, "table", 1, 500, 400, 100, 300);
    let aux = write_aux(&content);

    let first = ground_truth::extract(aux.path(), A4_HEIGHT_PT).unwrap();
    let second = ground_truth::extract(aux.path(), A4_HEIGHT_PT).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_incomplete_and_degenerate_elements_dropped() {
    let mut content = String::new();
    // No right: record
    content.push_str(
        "\\zref@newlabel{top:1}{\\default{1}\\posy{52428800}}\n\
         \\zref@newlabel{bottom:1}{\\default{1}\\posy{45875200}}\n\
         \\zref@newlabel{left:1}{\\default{1}\\posx{3276800}}\n\
         \\zref@newlabel{meta:1:paragraph}{\\default{1}\\page{1}}\n",
    );
    // Height under a point
    content.push_str(&element(2, "rule", 1, 500, 500, 100, 300));
    // Valid
    content.push_str(&element(3, "image", 1, 400, 200, 100, 400));
    let aux = write_aux(&content);

    let anns = ground_truth::extract(aux.path(), A4_HEIGHT_PT).unwrap();
    assert_eq!(anns.len(), 1);
    assert_eq!(anns[0].id, 3);
    assert_eq!(anns[0].label, "image");
}

#[test]
fn test_missing_aux_file_yields_empty() {
    let anns = ground_truth::extract("/no/such/file.aux", A4_HEIGHT_PT).unwrap();
    assert!(anns.is_empty());
}

#[test]
fn test_sidecar_round_trip() {
    let content = element(1, "section_header", 1, 750, 730, 70, 300);
    let aux = write_aux(&content);
    let anns = ground_truth::extract(aux.path(), A4_HEIGHT_PT).unwrap();

    let mut file = GroundTruthFile::new("DOC_007", A4_WIDTH_PT, A4_HEIGHT_PT);
    file.annotations = anns;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("DOC_007.json");
    ground_truth::write_sidecar(&path, &file).unwrap();

    let back: GroundTruthFile =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(back.doc_id, "DOC_007");
    assert_eq!(back.page_size, [A4_WIDTH_PT, A4_HEIGHT_PT]);
    assert_eq!(back.annotations, file.annotations);
}
