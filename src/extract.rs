//! Plain-text extraction for uploaded documents.
//!
//! Callers supply bytes (or a path) plus the declared MIME type; this module
//! returns UTF-8 text or a typed [`ExtractError`]. Nothing is partially
//! extracted: any failure rejects the whole document.

use std::io::Read;
use std::path::Path;

use quick_xml::events::Event;

pub const MIME_TEXT: &str = "text/plain";
pub const MIME_MARKDOWN: &str = "text/markdown";
pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// MIME types accepted for upload. PDF is accepted here so it can be
/// rejected with a specific message instead of a generic one.
pub const ALLOWED_MIME_TYPES: &[&str] = &[MIME_TEXT, MIME_MARKDOWN, MIME_PDF, MIME_DOCX];

/// Maximum decompressed bytes read from the DOCX body (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("extraction failed: {0}")]
    ExtractionFailed(String),
}

/// Extract plain text from `bytes` declared as `mime_type`.
pub fn extract_text(bytes: &[u8], mime_type: &str) -> Result<String, ExtractError> {
    match mime_type {
        MIME_TEXT | MIME_MARKDOWN => Ok(String::from_utf8_lossy(bytes).into_owned()),
        MIME_DOCX => extract_docx(bytes),
        MIME_PDF => Err(ExtractError::UnsupportedFormat(
            "PDF processing is not supported; upload .txt, .md or .docx files".to_string(),
        )),
        other => Err(ExtractError::UnsupportedFormat(other.to_string())),
    }
}

/// Read `path` and extract its text.
///
/// The MIME type is checked before the file is read.
pub fn extract_file(path: &Path, mime_type: &str) -> Result<String, ExtractError> {
    if !ALLOWED_MIME_TYPES.contains(&mime_type) {
        return Err(ExtractError::UnsupportedFormat(mime_type.to_string()));
    }
    let bytes = std::fs::read(path).map_err(|e| {
        ExtractError::ExtractionFailed(format!("failed to read {}: {}", path.display(), e))
    })?;
    extract_text(&bytes, mime_type)
}

/// Guess a MIME type from the file extension.
pub fn mime_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "txt" | "text" => Some(MIME_TEXT),
        "md" | "markdown" => Some(MIME_MARKDOWN),
        "docx" => Some(MIME_DOCX),
        "pdf" => Some(MIME_PDF),
        _ => None,
    }
}

fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let failed = |e: &dyn std::fmt::Display| ExtractError::ExtractionFailed(e.to_string());

    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).map_err(|e| failed(&e))?;
    let entry = archive.by_name("word/document.xml").map_err(|_| {
        ExtractError::ExtractionFailed("word/document.xml not found".to_string())
    })?;

    let mut doc_xml = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut doc_xml)
        .map_err(|e| failed(&e))?;
    if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(ExtractError::ExtractionFailed(
            "word/document.xml exceeds size limit".to_string(),
        ));
    }

    extract_word_text(&doc_xml)
}

/// Collect `w:t` runs; paragraphs end with a blank line, `w:br` and `w:tab`
/// become `\n` and `\t`.
fn extract_word_text(xml: &[u8]) -> Result<String, ExtractError> {
    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text = true;
                }
            }
            Ok(Event::Text(te)) if in_text => {
                let text = te
                    .unescape()
                    .map_err(|e| ExtractError::ExtractionFailed(e.to_string()))?;
                out.push_str(&text);
            }
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"br" => out.push('\n'),
                b"tab" => out.push('\t'),
                _ => {}
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => out.push_str("\n\n"),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::ExtractionFailed(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(out.trim_end().to_string())
}
