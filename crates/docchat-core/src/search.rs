//! Top-k retrieval over a [`Snapshot`].
//!
//! # Algorithm
//!
//! 1. An empty snapshot returns no results without tokenizing anything.
//! 2. Tokenize the query once.
//! 3. Score every chunk in snapshot order; keep chunks scoring above
//!    [`MIN_SCORE`].
//! 4. Stable sort by score, descending. Equal scores keep snapshot order.
//! 5. Truncate to `limit`.
//!
//! Per-chunk scoring runs on a rayon parallel iterator. Collection preserves
//! snapshot order, so the output is identical to a sequential scan.

use rayon::prelude::*;

use crate::models::SearchResult;
use crate::score::score_counts;
use crate::snapshot::Snapshot;
use crate::tokenize::tokenize;

/// Chunks must score strictly above this to be returned.
pub const MIN_SCORE: f64 = 0.01;

/// Result count used when the caller does not specify one.
pub const DEFAULT_LIMIT: usize = 5;

/// Return up to `limit` chunks of `snapshot` ranked by relevance to `query`.
///
/// Never fails: no matching chunk is an empty vector.
pub fn search(snapshot: &Snapshot, query: &str, limit: usize) -> Vec<SearchResult> {
    if snapshot.is_empty() {
        return Vec::new();
    }

    let query_terms = tokenize(query);

    let mut candidates: Vec<SearchResult> = snapshot
        .entries()
        .par_iter()
        .filter_map(|entry| {
            let score = score_counts(&query_terms, &entry.terms);
            (score > MIN_SCORE).then(|| SearchResult {
                document: entry.document.clone(),
                chunk_index: entry.chunk_index,
                score,
            })
        })
        .collect();

    // `sort_by` is stable, which keeps snapshot order for ties.
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates.truncate(limit);
    candidates
}
