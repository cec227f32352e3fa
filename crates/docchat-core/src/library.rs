//! Keeps a [`DocumentStore`] and a [`RetrievalEngine`] in step.
//!
//! Every create or delete goes through [`DocumentLibrary`], which then
//! reinstalls the store's full document set into the engine. There is no
//! incremental update path.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::engine::RetrievalEngine;
use crate::models::{Document, DocumentId, NewDocument, SearchResult};
use crate::snapshot::Snapshot;
use crate::store::DocumentStore;

pub struct DocumentLibrary<S: DocumentStore> {
    store: S,
    engine: Arc<RetrievalEngine>,
}

impl<S: DocumentStore> DocumentLibrary<S> {
    /// Wrap `store` and index whatever it already holds.
    pub async fn open(store: S) -> Result<Self> {
        let library = Self {
            store,
            engine: Arc::new(RetrievalEngine::new()),
        };
        library.reindex().await?;
        Ok(library)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn engine(&self) -> &Arc<RetrievalEngine> {
        &self.engine
    }

    /// Install the store's current document set into the engine.
    pub async fn reindex(&self) -> Result<Arc<Snapshot>> {
        let documents = self
            .store
            .list_documents()
            .await
            .context("Failed to list documents for indexing")?;
        Ok(self.engine.install(documents))
    }

    pub async fn documents(&self) -> Result<Vec<Arc<Document>>> {
        self.store.list_documents().await
    }

    /// Persist `doc` and make it searchable.
    pub async fn add_document(&self, doc: NewDocument) -> Result<Arc<Document>> {
        let created = self
            .store
            .create_document(doc)
            .await
            .context("Failed to store document")?;
        self.reindex().await?;
        Ok(created)
    }

    /// Delete a document and drop its chunks from search.
    ///
    /// Returns `false` (and leaves the index untouched) if the id is unknown.
    pub async fn remove_document(&self, id: DocumentId) -> Result<bool> {
        let deleted = self
            .store
            .delete_document(id)
            .await
            .with_context(|| format!("Failed to delete document {}", id))?;
        if deleted {
            self.reindex().await?;
        }
        Ok(deleted)
    }

    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchResult> {
        self.engine.search(query, limit)
    }
}
