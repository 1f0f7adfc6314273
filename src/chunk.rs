//! Overlapping windowed text chunker.
//!
//! Splits extracted document pages into chunks that respect a configurable
//! byte budget, with consecutive chunks inside a page sharing roughly
//! `chunk_overlap` bytes so that retrieval never loses context at a split
//! point. Splitting prefers whitespace boundaries; when a window contains
//! none, a hard split happens at the nearest UTF-8 char boundary.
//!
//! # Algorithm
//!
//! 1. Validate parameters (`chunk_overlap` must be `< chunk_size`).
//! 2. Chunk each page independently — a chunk never spans a page boundary.
//! 3. Within a page, slide a `chunk_size`-byte window: snap the window end
//!    back to the last whitespace inside it, emit the window, then restart
//!    `chunk_overlap` bytes before the previous end.
//! 4. Guarantee at least one chunk per document (even for empty text).
//!
//! Identical input and parameters always produce an identical chunk
//! sequence.

use anyhow::{bail, Result};

/// Chunking parameters, taken from the configuration surface.
#[derive(Debug, Clone, Copy)]
pub struct ChunkParams {
    /// Maximum chunk length in bytes.
    pub chunk_size: usize,
    /// Approximate shared span between consecutive chunks, in bytes.
    pub chunk_overlap: usize,
}

impl ChunkParams {
    /// Reject parameter combinations that would loop or produce
    /// zero-length chunks.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            bail!("chunk_size must be > 0");
        }
        if self.chunk_overlap >= self.chunk_size {
            bail!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap,
                self.chunk_size
            );
        }
        Ok(())
    }
}

/// Split a document's pages into overlapping chunks.
///
/// Returns at least one chunk even when every page is empty, so that a
/// loaded document is always represented in the vector store.
pub fn chunk_pages(pages: &[String], params: &ChunkParams) -> Result<Vec<String>> {
    params.validate()?;

    let mut chunks = Vec::new();
    for page in pages {
        chunk_page(page.trim(), params, &mut chunks);
    }

    if chunks.is_empty() {
        chunks.push(String::new());
    }

    Ok(chunks)
}

fn chunk_page(text: &str, params: &ChunkParams, out: &mut Vec<String>) {
    if text.is_empty() {
        return;
    }
    if text.len() <= params.chunk_size {
        out.push(text.to_string());
        return;
    }

    let mut start = 0usize;
    loop {
        let mut end = floor_char_boundary(text, start + params.chunk_size);
        if end < text.len() {
            // Keep words whole when the window contains whitespace.
            if let Some((pos, ch)) = text[start..end]
                .char_indices()
                .filter(|(_, c)| c.is_whitespace())
                .last()
            {
                if pos > 0 {
                    end = start + pos + ch.len_utf8();
                }
            }
        }
        if end <= start {
            // A single char wider than the budget: emit it whole.
            end = ceil_char_boundary(text, start + 1);
        }

        out.push(text[start..end].to_string());
        if end >= text.len() {
            break;
        }

        let next = if params.chunk_overlap == 0 || end - start <= params.chunk_overlap {
            end
        } else {
            floor_char_boundary(text, end - params.chunk_overlap)
        };
        start = if next > start { next } else { end };
    }
}

/// Snap a byte index back to the nearest valid UTF-8 char boundary.
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Snap a byte index forward to the nearest valid UTF-8 char boundary.
fn ceil_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i < s.len() && !s.is_char_boundary(i) {
        i += 1;
    }
    i
}
