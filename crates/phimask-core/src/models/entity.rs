use serde::{Deserialize, Serialize};

/// A detected PHI span in the coordinate space of the original, un-chunked
/// text.
///
/// Offsets are half-open character positions:
/// `begin_offset < end_offset <= text.chars().count()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "type")]
    pub entity_type: String,
    /// The original characters covered by the span.
    pub text: String,
    pub begin_offset: usize,
    pub end_offset: usize,
    /// Detector confidence in `[0, 1]`.
    pub score: f64,
    /// Unique within one masking operation.
    pub id: u64,
}

impl Entity {
    pub fn char_len(&self) -> usize {
        self.end_offset - self.begin_offset
    }

    /// Whether the two spans share at least one character. Adjacent spans
    /// (one ends where the other begins) do not overlap.
    pub fn overlaps(&self, other: &Entity) -> bool {
        self.begin_offset < other.end_offset && other.begin_offset < self.end_offset
    }
}
