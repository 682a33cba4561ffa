use serde::{Deserialize, Serialize};

use super::entity::Entity;

/// Output of a masking operation.
///
/// `masked_entities` is exactly the side-table needed to unmask
/// `masked_text`. `skipped_entities` fell below `threshold` and are kept for
/// audit only; they were never substituted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskingResult {
    pub masked_text: String,
    pub masked_entities: Vec<Entity>,
    pub skipped_entities: Vec<Entity>,
    pub threshold: f64,
    pub chunk_count: usize,
}

/// Output of an unmasking operation. Always produced, even when some tokens
/// could not be restored; those are listed verbatim in the diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UnmaskingResult {
    pub unmasked_text: String,
    /// `{{...}}` literals whose interior is not `TYPE_ID`.
    pub invalid_tokens: Vec<String>,
    /// Well-formed tokens with no matching entity.
    pub unresolved_tokens: Vec<String>,
}

impl UnmaskingResult {
    /// True when every token in the input was restored.
    pub fn is_clean(&self) -> bool {
        self.invalid_tokens.is_empty() && self.unresolved_tokens.is_empty()
    }
}
