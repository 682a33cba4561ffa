//! Replacing PHI spans with `{{TYPE_ID}}` tokens.
//!
//! Entities are ordered by `begin_offset` descending (ties: larger
//! `end_offset` first), the order in which in-place splicing would keep
//! every unprocessed offset valid. The output is assembled into a new buffer
//! from untouched slices of the input, so the input is never modified.
//!
//! Text that already carries a literal `{{TYPE_ID}}` using one of the keys
//! being written is refused: unmasking could not tell it from a real token.

use std::collections::HashSet;

use phimask_core::models::entity::Entity;
use phimask_core::models::token::{split_interior, Token};
use phimask_core::offsets::CharIndex;

use crate::error::MaskError;
use crate::unmask::BRACKETED;

/// Sort key order used by [`mask`].
pub fn sort_descending(entities: &mut [&Entity]) {
    entities.sort_by(|a, b| {
        b.begin_offset
            .cmp(&a.begin_offset)
            .then(b.end_offset.cmp(&a.end_offset))
    });
}

/// Mask every span in `entities` within `original_text`.
///
/// Spans must be non-empty, inside the text, and pairwise non-overlapping
/// (adjacent is fine). Two entities that would produce the same token are
/// rejected since unmasking could not tell them apart, as is a pre-existing
/// token literal that would collide with a generated one.
pub fn mask(original_text: &str, entities: &[Entity]) -> Result<String, MaskError> {
    let index = CharIndex::new(original_text);
    let char_len = index.char_len();

    let mut ordered: Vec<&Entity> = entities.iter().collect();
    sort_descending(&mut ordered);

    let mut keys = HashSet::with_capacity(ordered.len());
    let mut previous: Option<&Entity> = None;
    for entity in &ordered {
        if entity.begin_offset >= entity.end_offset || entity.end_offset > char_len {
            return Err(MaskError::InvalidInput(format!(
                "entity {} span [{}, {}) is empty or outside text of {char_len} characters",
                entity.id, entity.begin_offset, entity.end_offset
            )));
        }
        if let Some(prev) = previous
            && entity.end_offset > prev.begin_offset
        {
            return Err(MaskError::OverlappingEntities {
                first: entity.id,
                second: prev.id,
            });
        }
        let token = Token::for_entity(entity);
        if !keys.insert(token.key()) {
            return Err(MaskError::InvalidInput(format!(
                "more than one entity maps to token {token}"
            )));
        }
        previous = Some(entity);
    }

    let mut out = String::with_capacity(original_text.len());
    let mut written = HashSet::with_capacity(ordered.len());
    let mut cursor = 0;
    for entity in ordered.iter().rev() {
        let (start, end) = byte_span(&index, entity)?;
        out.push_str(&original_text[cursor..start]);
        written.insert(out.len());
        out.push_str(&Token::for_entity(entity).to_string());
        cursor = end;
    }
    out.push_str(&original_text[cursor..]);

    reject_literal_collisions(&out, &keys, &written)?;
    Ok(out)
}

/// Every token in `masked` whose key is one of `keys` must be one the masker
/// wrote, i.e. start at a position in `written`.
fn reject_literal_collisions(
    masked: &str,
    keys: &HashSet<String>,
    written: &HashSet<usize>,
) -> Result<(), MaskError> {
    for caps in BRACKETED.captures_iter(masked) {
        let (Some(whole), Some(interior)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if written.contains(&whole.start()) || split_interior(interior.as_str()).is_none() {
            continue;
        }
        if keys.contains(interior.as_str()) {
            return Err(MaskError::InvalidInput(format!(
                "text already contains the token literal {} used for an entity",
                whole.as_str()
            )));
        }
    }
    Ok(())
}

fn byte_span(index: &CharIndex<'_>, entity: &Entity) -> Result<(usize, usize), MaskError> {
    let out_of_range = || {
        MaskError::InvalidInput(format!("entity {} span is outside the text", entity.id))
    };
    let start = index
        .byte_offset(entity.begin_offset)
        .ok_or_else(out_of_range)?;
    let end = index.byte_offset(entity.end_offset).ok_or_else(out_of_range)?;
    Ok((start, end))
}
