//! Integration tests for document extraction and grouping across formats.

use content_dedup::core::document::{extract_text, similarity, DocumentConfig, DocumentEngine};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

const MINUTES: &str = "Quarterly planning minutes: budget approved, hiring paused until March.";

fn write_docx(path: &Path, paragraphs: &[&str]) {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    );

    let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
    zip.start_file("word/document.xml", SimpleFileOptions::default()).unwrap();
    zip.write_all(xml.as_bytes()).unwrap();
    zip.finish().unwrap();
}

#[test]
fn docx_and_plain_text_with_same_content_group_together() {
    let temp_dir = TempDir::new().unwrap();
    write_docx(&temp_dir.path().join("minutes.docx"), &[MINUTES]);
    fs::write(temp_dir.path().join("minutes.txt"), MINUTES).unwrap();
    fs::write(
        temp_dir.path().join("recipe.md"),
        "Whisk eggs, fold in flour, bake 20 minutes at 180C.",
    )
    .unwrap();

    let engine = DocumentEngine::new(DocumentConfig::default());
    let groups = engine.scan_folder(temp_dir.path(), 75.0).unwrap();

    assert_eq!(groups.len(), 1);
    let names: Vec<_> = groups[0]
        .paths()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["minutes.docx", "minutes.txt"]);
    assert_eq!(groups[0].members[1].score, 100.0);
}

#[test]
fn unreadable_and_short_documents_are_left_out() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("a.txt"), MINUTES).unwrap();
    fs::write(temp_dir.path().join("b.txt"), MINUTES).unwrap();
    fs::write(temp_dir.path().join("broken.hwp"), b"\xD0\xCF\x11\xE0 truncated").unwrap();
    fs::write(temp_dir.path().join("broken.pdf"), b"%PDF-1.4 nothing here").unwrap();
    fs::write(temp_dir.path().join("tiny.txt"), "ok").unwrap();

    assert_eq!(extract_text(&temp_dir.path().join("broken.hwp"), 3000), "");
    assert_eq!(extract_text(&temp_dir.path().join("broken.pdf"), 3000), "");

    let engine = DocumentEngine::default();
    let groups = engine.scan_folder(temp_dir.path(), 75.0).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
}

#[test]
fn extraction_respects_max_chars() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("long.txt");
    fs::write(&path, "x".repeat(5000)).unwrap();

    assert_eq!(extract_text(&path, 3000).chars().count(), 3000);
    assert_eq!(extract_text(&path, 10), "x".repeat(10));
}

#[test]
fn text_similarity_is_symmetric_and_reflexive() {
    let a = "the cat sat on the mat";
    let b = "the cat sat on a hat";

    assert_eq!(similarity(a, a), 100.0);
    assert_eq!(similarity(a, b), similarity(b, a));
    assert!(similarity(a, b) > 50.0);
    assert_eq!(similarity("", a), 0.0);
}
