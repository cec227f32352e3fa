//! Lexical relevance scoring between a query and a single chunk.
//!
//! For every query term `t` (duplicates included) with `c` occurrences in
//! the chunk:
//!
//! ```text
//! contribution(t) = (c / |chunk terms|) × ln(1 + 1 / max(1, c))     if c > 0
//! score           = Σ contribution(t) / |query terms|
//! ```
//!
//! The logarithmic factor depends only on the count inside this chunk. It
//! damps repeated terms; it is not a corpus-wide inverse document frequency.
//! An empty query or an empty chunk scores exactly `0.0`.

use std::collections::HashMap;

/// Term frequencies of one tokenized chunk.
#[derive(Debug, Clone, Default)]
pub struct TermCounts {
    counts: HashMap<String, usize>,
    total: usize,
}

impl TermCounts {
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut total = 0;
        for term in terms {
            *counts.entry(term.into()).or_insert(0) += 1;
            total += 1;
        }
        Self { counts, total }
    }

    /// Occurrences of `term`, 0 if absent.
    pub fn count(&self, term: &str) -> usize {
        self.counts.get(term).copied().unwrap_or(0)
    }

    /// Number of terms in the chunk, duplicates included.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Score tokenized `query_terms` against tokenized `chunk_terms`.
pub fn score(query_terms: &[String], chunk_terms: &[String]) -> f64 {
    score_counts(query_terms, &TermCounts::from_terms(chunk_terms.iter().cloned()))
}

/// Score tokenized `query_terms` against precomputed chunk term counts.
pub fn score_counts(query_terms: &[String], chunk: &TermCounts) -> f64 {
    if query_terms.is_empty() || chunk.is_empty() {
        return 0.0;
    }

    let chunk_len = chunk.total() as f64;
    let mut sum = 0.0;
    for term in query_terms {
        let c = chunk.count(term);
        if c > 0 {
            let tf = c as f64 / chunk_len;
            let damping = (1.0 + 1.0 / c.max(1) as f64).ln();
            sum += tf * damping;
        }
    }

    sum / query_terms.len() as f64
}
