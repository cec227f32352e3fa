//! Core data models shared by the store, the snapshot and the retriever.

use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Store-assigned document identity.
pub type DocumentId = u64;

/// A document as handed to the store at ingestion time, before it has an id.
///
/// `chunks` must already be computed from `content` (see
/// [`chunk_text`](crate::chunk::chunk_text)); chunking happens once per
/// ingestion, never per search.
#[derive(Debug, Clone)]
pub struct NewDocument {
    /// Display name (original file name without its extension).
    pub name: String,
    pub original_name: String,
    pub mime_type: String,
    /// Raw upload size in bytes.
    pub size: u64,
    /// Extracted plain text.
    pub content: String,
    pub chunks: Vec<String>,
}

/// A stored document with its derived chunk sequence.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: DocumentId,
    pub name: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: u64,
    pub content: String,
    /// Chunk texts; a chunk's index in this vector is its `chunk_index`.
    pub chunks: Vec<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl Document {
    pub fn from_new(id: DocumentId, new: NewDocument, uploaded_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name,
            original_name: new.original_name,
            mime_type: new.mime_type,
            size: new.size,
            content: new.content,
            chunks: new.chunks,
            uploaded_at,
        }
    }
}

/// One ranked chunk returned by a search.
///
/// Holds a shared reference to the document captured in the snapshot that
/// produced it; the chunk text is read through that reference.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub document: Arc<Document>,
    pub chunk_index: usize,
    /// Relevance score, always `> 0.01` for returned results.
    pub score: f64,
}

impl SearchResult {
    /// The text of the matched chunk.
    pub fn chunk(&self) -> &str {
        &self.document.chunks[self.chunk_index]
    }
}
