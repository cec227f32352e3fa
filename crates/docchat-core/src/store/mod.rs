//! Document storage abstraction.
//!
//! The [`DocumentStore`] trait is the authoritative list of documents. The
//! retrieval engine never reads it on its own; [`DocumentLibrary`] pushes the
//! store's document set into the engine after every change.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.
//!
//! [`DocumentLibrary`]: crate::library::DocumentLibrary

pub mod memory;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Document, DocumentId, NewDocument};

/// Abstract document storage.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`list_documents`](DocumentStore::list_documents) | All documents, newest upload first |
/// | [`get_document`](DocumentStore::get_document) | One document by id |
/// | [`create_document`](DocumentStore::create_document) | Assign an id and persist |
/// | [`delete_document`](DocumentStore::delete_document) | Remove by id |
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents, most recently uploaded first.
    async fn list_documents(&self) -> Result<Vec<Arc<Document>>>;

    async fn get_document(&self, id: DocumentId) -> Result<Option<Arc<Document>>>;

    /// Persist a new document. Its chunks must already be computed.
    async fn create_document(&self, doc: NewDocument) -> Result<Arc<Document>>;

    /// Delete a document. Returns `false` if no document had that id.
    async fn delete_document(&self, id: DocumentId) -> Result<bool>;
}
