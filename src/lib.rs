//! # docchat
//!
//! A document-grounded chat assistant. Documents are extracted to plain
//! text, split into sentence-aligned chunks, and kept in an in-memory
//! retrieval engine. Each question retrieves the most relevant chunks and
//! hands them to a language model as numbered sources.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────────────┐
//! │  extract    │──▶│   ingest     │──▶│ DocumentLibrary  │
//! │ txt/md/docx │   │ chunk+store  │   │ store + snapshot │
//! └─────────────┘   └──────────────┘   └────────┬─────────┘
//!                                               │ search
//!                                               ▼
//!                   ┌──────────────┐   ┌──────────────────┐
//!                   │   generate   │◀──│      chat        │
//!                   │  (OpenAI)    │   │ history+sources  │
//!                   └──────────────┘   └──────────────────┘
//! ```
//!
//! The retrieval engine itself (tokenizer, chunker, scorer, snapshots) lives
//! in the `docchat-core` crate.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`extract`] | Plain-text extraction for text, Markdown and DOCX uploads |
//! | [`ingest`] | Ingestion pipeline: extract → chunk → store → reindex |
//! | [`conversation`] | In-memory conversations and messages |
//! | [`generate`] | Context blocks, prompts, and the generation provider |
//! | [`chat`] | One question/answer exchange |
//! | [`status`] | Document, chunk and storage counts |
//! | [`server`] | HTTP API over a long-lived library (`docchat serve`) |

pub mod chat;
pub mod config;
pub mod conversation;
pub mod extract;
pub mod generate;
pub mod ingest;
pub mod server;
pub mod status;
