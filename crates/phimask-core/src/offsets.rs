//! Character/byte offset translation.
//!
//! Entity offsets count Unicode scalar values, while Rust slices by byte.
//! `CharIndex` records the byte position of every character once so spans
//! can be sliced without rescanning the text.

pub struct CharIndex<'a> {
    text: &'a str,
    /// `boundaries[i]` is the byte offset of character `i`; the final entry
    /// is `text.len()`.
    boundaries: Vec<usize>,
}

impl<'a> CharIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        boundaries.push(text.len());
        Self { text, boundaries }
    }

    pub fn char_len(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Byte offset of character `char_offset`, or `None` past the end.
    pub fn byte_offset(&self, char_offset: usize) -> Option<usize> {
        self.boundaries.get(char_offset).copied()
    }

    /// The characters in `[begin, end)`, or `None` if the range is reversed
    /// or out of bounds.
    pub fn slice(&self, begin: usize, end: usize) -> Option<&'a str> {
        if begin > end {
            return None;
        }
        let start = self.byte_offset(begin)?;
        let stop = self.byte_offset(end)?;
        Some(&self.text[start..stop])
    }
}
