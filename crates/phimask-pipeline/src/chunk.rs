//! Splitting long transcripts into detector-sized chunks.
//!
//! Windows are measured in characters. When a window would end inside the
//! text, the cut moves back to just after the nearest whitespace within the
//! look-back distance so words stay whole; failing that, the cut lands
//! exactly on the window edge.

use phimask_core::models::chunk::Chunk;

use crate::config::DEFAULT_LOOKBACK_CHARS;
use crate::error::MaskError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    max_chars: usize,
    lookback_chars: usize,
}

impl Chunker {
    pub fn new(max_chars: usize, lookback_chars: usize) -> Result<Self, MaskError> {
        if max_chars == 0 {
            return Err(MaskError::InvalidInput(
                "max_chars must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            max_chars,
            lookback_chars,
        })
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Lazily chunk `text`. Each call starts a fresh walk.
    pub fn chunks<'a>(&self, text: &'a str) -> Chunks<'a> {
        Chunks {
            text,
            max_chars: self.max_chars,
            lookback_chars: self.lookback_chars,
            byte_pos: 0,
            char_pos: 0,
            next_index: 0,
        }
    }
}

/// Chunk `text` into windows of at most `max_chars` characters using the
/// default look-back distance.
pub fn chunk(text: &str, max_chars: usize) -> Result<Chunks<'_>, MaskError> {
    Ok(Chunker::new(max_chars, DEFAULT_LOOKBACK_CHARS)?.chunks(text))
}

#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    text: &'a str,
    max_chars: usize,
    lookback_chars: usize,
    byte_pos: usize,
    char_pos: usize,
    next_index: usize,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Chunk<'a>> {
        let rest = &self.text[self.byte_pos..];
        if rest.is_empty() {
            return None;
        }

        let (cut_bytes, cut_chars) = match rest.char_indices().nth(self.max_chars) {
            // The remainder fits in one window.
            None => (rest.len(), rest.chars().count()),
            Some((boundary, _)) => self.cut_point(&rest[..boundary]),
        };

        let chunk = Chunk {
            text: &rest[..cut_bytes],
            chunk_index: self.next_index,
            start_in_original: self.char_pos,
        };

        self.byte_pos += cut_bytes;
        self.char_pos += cut_chars;
        self.next_index += 1;

        Some(chunk)
    }
}

impl Chunks<'_> {
    /// Where to cut a full window of exactly `max_chars` characters.
    /// Returns `(bytes, chars)`; `chars` is always at least 1.
    fn cut_point(&self, window: &str) -> (usize, usize) {
        let whitespace = window
            .char_indices()
            .rev()
            .take(self.lookback_chars)
            .enumerate()
            .find(|(_, (_, c))| c.is_whitespace());

        match whitespace {
            // `back` characters follow the whitespace inside the window.
            Some((back, (at, c))) => (at + c.len_utf8(), self.max_chars - back),
            None => (window.len(), self.max_chars),
        }
    }
}
