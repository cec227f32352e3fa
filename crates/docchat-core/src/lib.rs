//! # docchat core
//!
//! The retrieval engine behind docchat: turns document text into chunks and
//! answers queries with the top-k most relevant chunks.
//!
//! This crate performs no file, network, or database I/O. Text extraction,
//! answer generation and the CLI live in the `docchat` app crate.
//!
//! ## Pipeline
//!
//! ```text
//! text ──▶ chunk ──▶ Document ──▶ Snapshot::build ──▶ RetrievalEngine::install
//!                                                          │
//! query ──▶ tokenize ──▶ score every chunk ──▶ sort ──▶ top-k SearchResults
//! ```

pub mod chunk;
pub mod engine;
pub mod library;
pub mod models;
pub mod score;
pub mod search;
pub mod snapshot;
pub mod store;
pub mod tokenize;

pub use engine::RetrievalEngine;
pub use library::DocumentLibrary;
pub use models::{Document, DocumentId, NewDocument, SearchResult};
pub use snapshot::Snapshot;
