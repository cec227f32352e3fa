//! The retrieval engine: owner of the current snapshot.
//!
//! Readers call [`RetrievalEngine::snapshot`] (or [`RetrievalEngine::search`],
//! which does it for them) and keep the returned `Arc` for the whole
//! operation. [`RetrievalEngine::install`] builds a new snapshot and swaps
//! the `Arc`; searches already running keep scanning the snapshot they
//! captured.
//!
//! Installs are serialized by a writer gate. Snapshot construction happens
//! while holding only that gate, so readers wait at most for the pointer
//! swap itself.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::{debug, info};

use crate::models::{Document, SearchResult};
use crate::search;
use crate::snapshot::Snapshot;

#[derive(Debug)]
pub struct RetrievalEngine {
    current: RwLock<Arc<Snapshot>>,
    write_gate: Mutex<u64>,
}

impl RetrievalEngine {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(Snapshot::empty())),
            write_gate: Mutex::new(0),
        }
    }

    /// The snapshot currently installed.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Replace the searchable corpus with exactly `documents`.
    ///
    /// This is the only mutation. Callers pass the complete document set
    /// after every create or delete. Returns the installed snapshot.
    pub fn install<I>(&self, documents: I) -> Arc<Snapshot>
    where
        I: IntoIterator<Item = Arc<Document>>,
    {
        let mut generation = self
            .write_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *generation += 1;

        let snapshot = Arc::new(Snapshot::build(*generation, documents));
        for doc in snapshot.documents() {
            debug!(document = %doc.name, chunks = doc.chunks.len(), "indexed document");
        }

        {
            let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
            *current = Arc::clone(&snapshot);
        }

        info!(
            generation = snapshot.generation(),
            documents = snapshot.document_count(),
            chunks = snapshot.chunk_count(),
            "installed corpus snapshot"
        );
        snapshot
    }

    /// Search the current snapshot. See [`search::search`].
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchResult> {
        let snapshot = self.snapshot();
        let results = search::search(&snapshot, query, limit);
        debug!(
            query,
            generation = snapshot.generation(),
            matches = results.len(),
            "search complete"
        );
        for (i, r) in results.iter().enumerate() {
            debug!(
                rank = i + 1,
                document = %r.document.name,
                chunk = r.chunk_index,
                score = r.score,
                "search result"
            );
        }
        results
    }
}

impl Default for RetrievalEngine {
    fn default() -> Self {
        Self::new()
    }
}
