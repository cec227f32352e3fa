//! Ingestion pipeline: file → extract → chunk → store → reindex.
//!
//! A document is only created after extraction and chunking both succeed,
//! so a rejected upload never reaches the store or the search index.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use docchat_core::chunk::chunk_text;
use docchat_core::store::DocumentStore;
use docchat_core::{Document, DocumentLibrary, NewDocument};

use crate::config::Config;
use crate::extract::{self, ALLOWED_MIME_TYPES};

/// Upload rejected before extraction.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Unsupported file type. Please upload .txt, .md, .pdf, or .docx files.")]
    UnsupportedType(String),

    #[error("File too large: {size} bytes (limit {limit} bytes)")]
    TooLarge { size: u64, limit: u64 },
}

fn check_upload(original_name: &str, mime_type: &str, size: u64, config: &Config) -> Result<(), UploadError> {
    if !ALLOWED_MIME_TYPES.contains(&mime_type) {
        warn!(file = %original_name, mime_type, "rejected upload: unsupported file type");
        return Err(UploadError::UnsupportedType(mime_type.to_string()));
    }
    if size > config.upload.max_file_bytes {
        warn!(file = %original_name, size, "rejected upload: file too large");
        return Err(UploadError::TooLarge {
            size,
            limit: config.upload.max_file_bytes,
        });
    }
    Ok(())
}

/// Ingest one file from disk.
///
/// `mime_type` is the declared type of the upload. The display name is the
/// file name with its last extension removed.
pub async fn ingest_file<S: DocumentStore>(
    library: &DocumentLibrary<S>,
    path: &Path,
    mime_type: &str,
    config: &Config,
) -> Result<Arc<Document>> {
    let original_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("Not a file path: {}", path.display()))?;

    let size = std::fs::metadata(path)
        .with_context(|| format!("Failed to stat {}", path.display()))?
        .len();
    check_upload(&original_name, mime_type, size, config)?;

    let content = extract::extract_file(path, mime_type)
        .with_context(|| format!("Failed to process document {}", original_name))?;

    ingest_content(library, &original_name, mime_type, size, content, config).await
}

/// Ingest an upload received in memory (the HTTP upload route).
pub async fn ingest_bytes<S: DocumentStore>(
    library: &DocumentLibrary<S>,
    original_name: &str,
    mime_type: &str,
    bytes: &[u8],
    config: &Config,
) -> Result<Arc<Document>> {
    let size = bytes.len() as u64;
    check_upload(original_name, mime_type, size, config)?;

    let content = extract::extract_text(bytes, mime_type)
        .with_context(|| format!("Failed to process document {}", original_name))?;

    ingest_content(library, original_name, mime_type, size, content, config).await
}

/// Ingest already-extracted text as if it had been uploaded under
/// `original_name`.
pub async fn ingest_text<S: DocumentStore>(
    library: &DocumentLibrary<S>,
    original_name: &str,
    content: &str,
    config: &Config,
) -> Result<Arc<Document>> {
    let mime_type = extract::mime_type_for_path(Path::new(original_name))
        .unwrap_or(extract::MIME_TEXT);
    ingest_content(
        library,
        original_name,
        mime_type,
        content.len() as u64,
        content.to_string(),
        config,
    )
    .await
}

async fn ingest_content<S: DocumentStore>(
    library: &DocumentLibrary<S>,
    original_name: &str,
    mime_type: &str,
    size: u64,
    content: String,
    config: &Config,
) -> Result<Arc<Document>> {
    let chunks = chunk_text(&content, config.chunking.max_chunk_chars);
    let new_doc = NewDocument {
        name: display_name(original_name),
        original_name: original_name.to_string(),
        mime_type: mime_type.to_string(),
        size,
        content,
        chunks,
    };

    let doc = library.add_document(new_doc).await?;
    info!(
        id = doc.id,
        name = %doc.name,
        chunks = doc.chunks.len(),
        "ingested document"
    );
    Ok(doc)
}

/// `"report.final.docx"` → `"report.final"`; names without an extension
/// are kept as-is.
pub fn display_name(original_name: &str) -> String {
    Path::new(original_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| original_name.to_string())
}
