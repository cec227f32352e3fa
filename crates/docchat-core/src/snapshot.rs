//! Immutable corpus snapshots.
//!
//! A [`Snapshot`] is the complete searchable state at one point in time: the
//! documents plus one entry per chunk, in document-then-chunk-index order.
//! That order is the tie-break order for equal scores. Snapshots are never
//! mutated; the engine replaces them wholesale.

use std::sync::Arc;

use crate::models::Document;
use crate::score::TermCounts;
use crate::tokenize::tokenize;

/// One retrievable chunk inside a snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotEntry {
    pub document: Arc<Document>,
    pub chunk_index: usize,
    /// Term statistics of the chunk text, computed once at build time.
    pub terms: TermCounts,
}

impl SnapshotEntry {
    pub fn text(&self) -> &str {
        &self.document.chunks[self.chunk_index]
    }
}

#[derive(Debug, Default)]
pub struct Snapshot {
    generation: u64,
    documents: Vec<Arc<Document>>,
    entries: Vec<SnapshotEntry>,
}

impl Snapshot {
    /// The snapshot an engine starts with: no documents, generation 0.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from the given documents and their existing chunks.
    ///
    /// Chunks are taken as-is from each document; nothing is re-chunked.
    pub fn build<I>(generation: u64, documents: I) -> Self
    where
        I: IntoIterator<Item = Arc<Document>>,
    {
        let documents: Vec<Arc<Document>> = documents.into_iter().collect();
        let entries = documents
            .iter()
            .flat_map(|doc| {
                doc.chunks
                    .iter()
                    .enumerate()
                    .map(move |(chunk_index, text)| SnapshotEntry {
                        document: Arc::clone(doc),
                        chunk_index,
                        terms: TermCounts::from_terms(tokenize(text)),
                    })
            })
            .collect();

        Self {
            generation,
            documents,
            entries,
        }
    }

    /// Install counter of the engine that produced this snapshot.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn documents(&self) -> &[Arc<Document>] {
        &self.documents
    }

    /// All chunks in scan order.
    pub fn entries(&self) -> &[SnapshotEntry] {
        &self.entries
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn chunk_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::NewDocument;

    pub(crate) fn doc(id: u64, name: &str, chunks: &[&str]) -> Arc<Document> {
        let new = NewDocument {
            name: name.to_string(),
            original_name: format!("{name}.txt"),
            mime_type: "text/plain".to_string(),
            size: chunks.iter().map(|c| c.len() as u64).sum(),
            content: chunks.join(" "),
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
        };
        Arc::new(Document::from_new(id, new, chrono::Utc::now()))
    }

    #[test]
    fn test_empty() {
        let snap = Snapshot::empty();
        assert!(snap.is_empty());
        assert_eq!(snap.generation(), 0);
        assert_eq!(snap.document_count(), 0);
    }

    #[test]
    fn test_document_then_chunk_order() {
        let snap = Snapshot::build(
            3,
            vec![
                doc(1, "a", &["a0.", "a1."]),
                doc(2, "b", &[]),
                doc(3, "c", &["c0."]),
            ],
        );
        assert_eq!(snap.generation(), 3);
        assert_eq!(snap.document_count(), 3);
        assert_eq!(snap.chunk_count(), 3);
        let order: Vec<(u64, usize, &str)> = snap
            .entries()
            .iter()
            .map(|e| (e.document.id, e.chunk_index, e.text()))
            .collect();
        assert_eq!(order, vec![(1, 0, "a0."), (1, 1, "a1."), (3, 0, "c0.")]);
    }

    #[test]
    fn test_term_counts_precomputed() {
        let snap = Snapshot::build(1, vec![doc(1, "a", &["Cats chase cats."])]);
        let terms = &snap.entries()[0].terms;
        assert_eq!(terms.count("cats"), 2);
        assert_eq!(terms.total(), 3);
    }

    #[test]
    fn test_documents_without_chunks_make_empty_snapshot() {
        let snap = Snapshot::build(1, vec![doc(1, "blank", &[])]);
        assert_eq!(snap.document_count(), 1);
        assert!(snap.is_empty());
    }
}
