//! Integration tests for upload formats: DOCX extraction, PDF rejection,
//! unknown extensions, and the per-file size limit.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn docchat_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop();
    path.pop();
    path.push("docchat");
    path
}

/// Minimal docx (ZIP) with one `<w:p>` per paragraph in word/document.xml.
fn minimal_docx(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    );

    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buf
}

fn run_docchat(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(docchat_binary())
        .arg("--config")
        .arg(config_path)
        .args(args)
        .env_remove("DOCCHAT_LOG")
        .output()
        .unwrap();
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.success(),
    )
}

fn setup(config: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("docchat.toml");
    fs::write(&config_path, config).unwrap();
    (tmp, config_path)
}

#[test]
fn test_docx_ingest_and_search() {
    let (tmp, config_path) = setup("");
    let docx = tmp.path().join("handbook.docx");
    fs::write(
        &docx,
        minimal_docx(&["Office test phrase lives here.", "Vacation policy allows twenty days."]),
    )
    .unwrap();

    let (stdout, stderr, success) =
        run_docchat(&config_path, &["search", "vacation policy", "-f", docx.to_str().unwrap()]);
    assert!(success, "search failed: stderr={}", stderr);
    assert!(stdout.contains("handbook (chunk 0)"), "got: {}", stdout);
    assert!(stdout.contains("Vacation policy allows twenty days."));
}

#[test]
fn test_docx_chunks_keep_paragraph_breaks() {
    let (tmp, config_path) = setup("");
    let docx = tmp.path().join("notes.docx");
    fs::write(&docx, minimal_docx(&["First paragraph.", "Second paragraph."])).unwrap();

    let (stdout, stderr, success) = run_docchat(&config_path, &["chunks", docx.to_str().unwrap()]);
    assert!(success, "chunks failed: stderr={}", stderr);
    assert!(stdout.contains("First paragraph."));
    assert!(stdout.contains("Second paragraph."));
}

#[test]
fn test_pdf_rejected_as_unsupported() {
    let (tmp, config_path) = setup("");
    let pdf = tmp.path().join("paper.pdf");
    fs::write(&pdf, b"%PDF-1.4\n%%EOF\n").unwrap();

    let (_, stderr, success) = run_docchat(&config_path, &["chunks", pdf.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("unsupported format"), "got: {}", stderr);
}

#[test]
fn test_rejected_file_skipped_during_search() {
    let (tmp, config_path) = setup("");
    let pdf = tmp.path().join("paper.pdf");
    fs::write(&pdf, b"%PDF-1.4\n%%EOF\n").unwrap();
    let txt = tmp.path().join("notes.txt");
    fs::write(&txt, "Compilers translate source code.").unwrap();

    let (stdout, stderr, success) = run_docchat(
        &config_path,
        &["search", "compilers", "-f", pdf.to_str().unwrap(), "-f", txt.to_str().unwrap()],
    );
    assert!(success, "search failed: stderr={}", stderr);
    assert!(stderr.contains("Skipping"), "got: {}", stderr);
    assert!(stderr.contains("paper.pdf"));
    assert!(stdout.contains("notes (chunk 0)"));
}

#[test]
fn test_unknown_extension_skipped() {
    let (tmp, config_path) = setup("");
    let bin = tmp.path().join("image.png");
    fs::write(&bin, [0x89, b'P', b'N', b'G']).unwrap();

    let (_, stderr, success) = run_docchat(
        &config_path,
        &["status", "-f", bin.to_str().unwrap(), "--json"],
    );
    assert!(success);
    assert!(stderr.contains("Cannot tell the file type"), "got: {}", stderr);
}

#[test]
fn test_declared_mime_outside_allow_list() {
    let (tmp, config_path) = setup("");
    let txt = tmp.path().join("notes.txt");
    fs::write(&txt, "Plain words.").unwrap();

    let (_, stderr, success) = run_docchat(
        &config_path,
        &["chunks", txt.to_str().unwrap(), "--mime", "image/png"],
    );
    assert!(!success);
    assert!(stderr.contains("unsupported format"), "got: {}", stderr);
}

#[test]
fn test_file_over_size_limit_skipped() {
    let (tmp, config_path) = setup("[upload]\nmax_file_bytes = 16\n");
    let big = tmp.path().join("big.txt");
    fs::write(&big, "This sentence is definitely longer than sixteen bytes.").unwrap();

    let (stdout, stderr, success) = run_docchat(
        &config_path,
        &["status", "-f", big.to_str().unwrap(), "--json"],
    );
    assert!(success);
    assert!(stderr.contains("File too large"), "got: {}", stderr);
    let status: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(status["documents"], 0);
}
