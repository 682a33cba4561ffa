/// A bounded-length window of a longer text.
///
/// Borrows from the original; concatenating every chunk's `text` in
/// `chunk_index` order reproduces the original exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub text: &'a str,
    pub chunk_index: usize,
    /// Character offset of `text` within the original.
    pub start_in_original: usize,
}

impl Chunk<'_> {
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}
