//! System status: what is indexed and how much of the storage budget it uses.

use anyhow::Result;
use serde::Serialize;

use docchat_core::store::DocumentStore;
use docchat_core::DocumentLibrary;

use crate::config::Config;
use crate::conversation::ConversationStore;

#[derive(Debug, Clone, Serialize)]
pub struct Status {
    pub documents: usize,
    pub chunks: usize,
    pub conversations: usize,
    pub snapshot_generation: u64,
    pub storage: Usage,
}

#[derive(Debug, Clone, Serialize)]
pub struct Usage {
    pub used: u64,
    pub limit: u64,
}

pub async fn collect_status<S: DocumentStore>(
    library: &DocumentLibrary<S>,
    conversations: &ConversationStore,
    config: &Config,
) -> Result<Status> {
    let documents = library.documents().await?;
    let snapshot = library.engine().snapshot();

    Ok(Status {
        documents: documents.len(),
        chunks: snapshot.chunk_count(),
        conversations: conversations.len(),
        snapshot_generation: snapshot.generation(),
        storage: Usage {
            used: documents.iter().map(|d| d.size).sum(),
            limit: config.upload.storage_limit_bytes,
        },
    })
}

pub fn print_status(status: &Status) {
    println!("docchat status");
    println!("==============");
    println!();
    println!("  Documents:      {}", status.documents);
    println!("  Chunks:         {}", status.chunks);
    println!("  Conversations:  {}", status.conversations);
    println!("  Snapshot:       generation {}", status.snapshot_generation);
    println!(
        "  Storage:        {} / {}",
        format_bytes(status.storage.used),
        format_bytes(status.storage.limit)
    );
}

pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
