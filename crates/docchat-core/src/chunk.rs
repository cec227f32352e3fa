//! Sentence-boundary text chunker.
//!
//! Splits extracted document text into chunks that respect a
//! `max_chunk_chars` limit. Splitting only ever happens between sentences,
//! so a chunk is always a run of whole sentences.
//!
//! # Algorithm
//!
//! 1. Split the text on runs of `.`, `!` and `?`, dropping the terminators.
//! 2. Trim each fragment and discard empty ones.
//! 3. Accumulate sentences into a buffer joined with `". "`.
//! 4. Before appending, check the length the buffer would have
//!    (buffer + separator + sentence). If it does not exceed
//!    `max_chunk_chars`, append. Otherwise flush the buffer (with a trailing
//!    `.`) and start a new one holding only the candidate sentence.
//! 5. Flush the last buffer.
//!
//! The trailing `.` is added after the check, so an emitted chunk is at most
//! `max_chunk_chars + 1` characters long. A sentence that alone exceeds the
//! limit becomes its own oversized chunk; sentences are never cut. Chunks do not overlap: every sentence lands in
//! exactly one chunk.
//!
//! # Example
//!
//! ```rust
//! use docchat_core::chunk::{chunk_text, DEFAULT_MAX_CHUNK_CHARS};
//!
//! let chunks = chunk_text("Hello world! How are you?", DEFAULT_MAX_CHUNK_CHARS);
//! assert_eq!(chunks, vec!["Hello world. How are you."]);
//! ```

/// Default chunk size limit in characters.
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 1000;

const SENTENCE_SEPARATOR: &str = ". ";
const CHUNK_TERMINATOR: char = '.';

fn is_sentence_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Split text into trimmed, non-empty sentences.
pub fn split_sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split(is_sentence_terminator)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Split `text` into ordered chunks whose sentence text is at most
/// `max_chunk_chars` characters, not counting the trailing `.`.
///
/// Lengths are counted in `char`s. Empty or whitespace-only input, or
/// input made only of terminators, yields no chunks.
pub fn chunk_text(text: &str, max_chunk_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current_buf = String::new();
    let mut current_len = 0usize;

    for sentence in split_sentences(text) {
        let sentence_len = sentence.chars().count();
        let would_be = if current_buf.is_empty() {
            sentence_len
        } else {
            current_len + SENTENCE_SEPARATOR.len() + sentence_len
        };

        if would_be <= max_chunk_chars {
            if !current_buf.is_empty() {
                current_buf.push_str(SENTENCE_SEPARATOR);
            }
            current_buf.push_str(sentence);
            current_len = would_be;
            continue;
        }

        if !current_buf.is_empty() {
            chunks.push(finish_chunk(std::mem::take(&mut current_buf)));
        }
        current_buf.push_str(sentence);
        current_len = sentence_len;
    }

    if !current_buf.is_empty() {
        chunks.push(finish_chunk(current_buf));
    }

    chunks
}

fn finish_chunk(mut buf: String) -> String {
    buf.push(CHUNK_TERMINATOR);
    buf
}
