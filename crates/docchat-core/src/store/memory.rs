//! In-memory [`DocumentStore`] implementation.
//!
//! Uses a `HashMap` behind `std::sync::RwLock`. Ids are assigned
//! sequentially starting at 1 and never reused.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;

use crate::models::{Document, DocumentId, NewDocument};

use super::DocumentStore;

struct Inner {
    docs: HashMap<DocumentId, Arc<Document>>,
    next_id: DocumentId,
}

pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                docs: HashMap::new(),
                next_id: 1,
            }),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn list_documents(&self) -> Result<Vec<Arc<Document>>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut docs: Vec<Arc<Document>> = inner.docs.values().cloned().collect();
        docs.sort_by(|a, b| {
            b.uploaded_at
                .cmp(&a.uploaded_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(docs)
    }

    async fn get_document(&self, id: DocumentId) -> Result<Option<Arc<Document>>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.docs.get(&id).cloned())
    }

    async fn create_document(&self, doc: NewDocument) -> Result<Arc<Document>> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let id = inner.next_id;
        inner.next_id += 1;
        let doc = Arc::new(Document::from_new(id, doc, Utc::now()));
        inner.docs.insert(id, Arc::clone(&doc));
        Ok(doc)
    }

    async fn delete_document(&self, id: DocumentId) -> Result<bool> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.docs.remove(&id).is_some())
    }
}
