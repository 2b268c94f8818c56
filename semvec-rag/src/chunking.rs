//! Text chunking strategies.
//!
//! This module provides the [`Chunker`] trait and two implementations:
//!
//! - [`WindowChunker`]: fixed-stride sliding window with an exact overlap
//! - [`BoundaryChunker`]: the same window, but chunk ends are pulled back to
//!   paragraph, sentence or word boundaries when one is close enough
//!
//! Sizes and offsets are counted in characters (Unicode scalar values), never
//! bytes, so a chunk never splits a multi-byte character.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A contiguous segment of an input text.
///
/// Chunks are transient: they exist between chunking and embedding and are
/// never stored on their own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Position of the chunk in the output sequence, starting at zero.
    pub index: usize,
    /// The chunk text, equal to `text[start..end]` in characters.
    pub text: String,
    /// Character offset of the first character (inclusive).
    pub start: usize,
    /// Character offset one past the last character (exclusive).
    pub end: usize,
}

impl Chunk {
    /// Number of characters in the chunk.
    pub fn char_len(&self) -> usize {
        self.end - self.start
    }
}

/// A strategy for splitting text into ordered, overlapping chunks.
///
/// Implementations are pure: the same input always yields the same chunks.
pub trait Chunker: Send + Sync {
    /// Split `text` into chunks.
    ///
    /// Returns an empty `Vec` for empty text and a single chunk equal to the
    /// whole text when it fits in one chunk.
    fn chunk(&self, text: &str) -> Vec<Chunk>;
}

/// Selects the [`Chunker`] a pipeline builds from its configuration.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChunkingStrategy {
    /// [`WindowChunker`]: exact stride and overlap.
    #[default]
    Window,
    /// [`BoundaryChunker`]: prefers natural text boundaries.
    Boundary,
}

impl std::str::FromStr for ChunkingStrategy {
    type Err = crate::error::RagError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "window" => Ok(Self::Window),
            "boundary" => Ok(Self::Boundary),
            other => Err(crate::error::RagError::ConfigError(format!(
                "unknown chunking strategy '{other}'"
            ))),
        }
    }
}

impl ChunkingStrategy {
    /// Build the chunker for this strategy.
    pub fn build(self, chunk_size: usize, overlap_fraction: f32) -> Arc<dyn Chunker> {
        match self {
            Self::Window => Arc::new(WindowChunker::new(chunk_size, overlap_fraction)),
            Self::Boundary => Arc::new(BoundaryChunker::new(chunk_size, overlap_fraction)),
        }
    }
}

/// Number of characters shared by consecutive chunks.
fn overlap_chars(chunk_size: usize, overlap_fraction: f32) -> usize {
    (chunk_size as f32 * overlap_fraction.clamp(0.0, 1.0)).round() as usize
}

/// Byte offset of every character boundary, including the end of the text.
fn char_boundaries(text: &str) -> Vec<usize> {
    text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect()
}

fn make_chunk(text: &str, boundaries: &[usize], index: usize, start: usize, end: usize) -> Chunk {
    Chunk { index, text: text[boundaries[start]..boundaries[end]].to_string(), start, end }
}

/// Split `text` with a fixed-stride sliding window.
///
/// Chunk `i + 1` begins `chunk_size - round(chunk_size * overlap_fraction)`
/// characters after chunk `i` begins, so consecutive chunks share exactly
/// `round(chunk_size * overlap_fraction)` characters. The last chunk ends at
/// the end of the text and may be shorter than `chunk_size`.
///
/// # Example
///
/// ```rust
/// use semvec_rag::chunking::chunk;
///
/// let chunks = chunk("abcdefghij", 4, 0.5);
/// let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
/// assert_eq!(texts, ["abcd", "cdef", "efgh", "ghij"]);
/// ```
pub fn chunk(text: &str, chunk_size: usize, overlap_fraction: f32) -> Vec<Chunk> {
    if text.is_empty() || chunk_size == 0 {
        return Vec::new();
    }

    let boundaries = char_boundaries(text);
    let len = boundaries.len() - 1;
    let step = chunk_size.saturating_sub(overlap_chars(chunk_size, overlap_fraction)).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + chunk_size).min(len);
        chunks.push(make_chunk(text, &boundaries, chunks.len(), start, end));
        if end == len {
            break;
        }
        start += step;
    }

    chunks
}

/// Splits text into fixed-size windows with an exact character overlap.
///
/// # Example
///
/// ```rust
/// use semvec_rag::{Chunker, WindowChunker};
///
/// let chunker = WindowChunker::new(1000, 0.2);
/// assert_eq!(chunker.chunk("short text").len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct WindowChunker {
    chunk_size: usize,
    overlap_fraction: f32,
}

impl WindowChunker {
    /// Create a new `WindowChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `overlap_fraction`: share of each chunk repeated at the start of the next
    pub fn new(chunk_size: usize, overlap_fraction: f32) -> Self {
        Self { chunk_size, overlap_fraction }
    }
}

impl Chunker for WindowChunker {
    fn chunk(&self, text: &str) -> Vec<Chunk> {
        chunk(text, self.chunk_size, self.overlap_fraction)
    }
}

/// Splits text like [`WindowChunker`] but cuts at natural boundaries.
///
/// Each chunk end is moved back to the last paragraph break (`\n\n`), else the
/// last sentence end (`.`, `!` or `?` followed by whitespace, or a newline),
/// else the last whitespace, searching only the second half of the window. If
/// none is found the chunk is cut at `chunk_size` characters. The next chunk
/// starts the configured overlap before that end, moved forward to the start
/// of a word when possible.
///
/// Overlap is therefore at most `round(chunk_size * overlap_fraction)`; chunks
/// still never exceed `chunk_size` and always cover the text without gaps.
#[derive(Debug, Clone)]
pub struct BoundaryChunker {
    chunk_size: usize,
    overlap_fraction: f32,
}

impl BoundaryChunker {
    /// Create a new `BoundaryChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `overlap_fraction`: upper bound on the share of each chunk repeated in the next
    pub fn new(chunk_size: usize, overlap_fraction: f32) -> Self {
        Self { chunk_size, overlap_fraction }
    }
}

#[derive(Clone, Copy)]
enum Boundary {
    Paragraph,
    Sentence,
    Word,
}

impl Boundary {
    /// Whether a cut right before `chars[end]` falls on this kind of boundary.
    fn matches(self, chars: &[char], end: usize) -> bool {
        let last = chars[end - 1];
        let prev = if end >= 2 { Some(chars[end - 2]) } else { None };
        match self {
            Self::Paragraph => last == '\n' && prev == Some('\n'),
            Self::Sentence => {
                last == '\n'
                    || (last.is_whitespace() && matches!(prev, Some('.') | Some('!') | Some('?')))
            }
            Self::Word => last.is_whitespace(),
        }
    }
}

/// Pick the end of the chunk starting at `start`, at most `hard_end`.
fn find_break(
    chars: &[char],
    start: usize,
    hard_end: usize,
    chunk_size: usize,
    overlap: usize,
) -> usize {
    // The end must leave room for the next chunk to move forward.
    let lower = start + (chunk_size / 2).max(overlap + 1);
    if lower > hard_end {
        return hard_end;
    }

    for boundary in [Boundary::Paragraph, Boundary::Sentence, Boundary::Word] {
        if let Some(end) = (lower..=hard_end).rev().find(|&end| boundary.matches(chars, end)) {
            return end;
        }
    }
    hard_end
}

/// Move `from` forward to the first word start before `limit`, if any.
fn align_to_word_start(chars: &[char], from: usize, limit: usize) -> usize {
    if from == 0 || chars[from - 1].is_whitespace() {
        return from;
    }
    (from..limit).find(|&pos| chars[pos - 1].is_whitespace()).unwrap_or(from)
}

impl Chunker for BoundaryChunker {
    fn chunk(&self, text: &str) -> Vec<Chunk> {
        if text.is_empty() || self.chunk_size == 0 {
            return Vec::new();
        }

        let boundaries = char_boundaries(text);
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();
        let overlap = overlap_chars(self.chunk_size, self.overlap_fraction)
            .min(self.chunk_size.saturating_sub(1));

        let mut chunks = Vec::new();
        let mut start = 0;
        loop {
            let hard_end = (start + self.chunk_size).min(len);
            let end = if hard_end == len {
                len
            } else {
                find_break(&chars, start, hard_end, self.chunk_size, overlap)
            };
            chunks.push(make_chunk(text, &boundaries, chunks.len(), start, end));
            if end == len {
                break;
            }

            let next = end.saturating_sub(overlap).max(start + 1);
            start = align_to_word_start(&chars, next, end);
        }

        chunks
    }
}
