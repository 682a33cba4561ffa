//! Re-basing per-chunk detections onto the original text.
//!
//! Offsets move by the chunk's `start_in_original`; ids move into a
//! per-chunk namespace of `ID_NAMESPACE_STRIDE` so ids from different chunks
//! never collide.
//!
//! An entity whose true span crosses a chunk boundary is seen by neither
//! chunk's detector. The whitespace-preferring cut in [`crate::chunk`] makes
//! this unlikely, not impossible.

use std::collections::HashSet;

use tracing::warn;

use phimask_core::detector::DetectedEntity;
use phimask_core::models::chunk::Chunk;
use phimask_core::models::entity::Entity;
use phimask_core::offsets::CharIndex;

use crate::error::MaskError;

/// Must exceed the largest entity count a detector can report for one chunk.
pub const ID_NAMESPACE_STRIDE: u64 = 1000;

/// Merge per-chunk detections into one entity list in original-text
/// coordinates. `per_chunk_entities[i]` belongs to `chunks[i]`.
///
/// Output order is chunk order, then detector order.
pub fn merge(
    chunks: &[Chunk<'_>],
    per_chunk_entities: Vec<Vec<DetectedEntity>>,
) -> Result<Vec<Entity>, MaskError> {
    if chunks.len() != per_chunk_entities.len() {
        return Err(MaskError::InvalidInput(format!(
            "{} chunks but {} detection results",
            chunks.len(),
            per_chunk_entities.len()
        )));
    }

    let mut merged = Vec::new();
    for (chunk, detected) in chunks.iter().zip(per_chunk_entities) {
        merge_chunk(chunk, detected, &mut merged)?;
    }
    Ok(merged)
}

fn merge_chunk(
    chunk: &Chunk<'_>,
    detected: Vec<DetectedEntity>,
    out: &mut Vec<Entity>,
) -> Result<(), MaskError> {
    let invalid = |reason: String| MaskError::InvalidDetection {
        chunk_index: chunk.chunk_index,
        reason,
    };

    let index = CharIndex::new(chunk.text);
    let namespace = chunk.chunk_index as u64 * ID_NAMESPACE_STRIDE;

    // Entities without an id are numbered after the largest supplied one,
    // which is 1.. when the detector numbers nothing.
    let mut next_id = detected.iter().filter_map(|e| e.id).max().unwrap_or(0).saturating_add(1);
    let mut seen = HashSet::new();

    for entity in detected {
        let local_id = match entity.id {
            Some(id) => id,
            None => {
                let id = next_id;
                next_id = next_id.saturating_add(1);
                id
            }
        };
        if local_id >= ID_NAMESPACE_STRIDE {
            return Err(invalid(format!(
                "entity id {local_id} does not fit the id namespace stride {ID_NAMESPACE_STRIDE}"
            )));
        }
        if !seen.insert(local_id) {
            return Err(invalid(format!("duplicate entity id {local_id}")));
        }
        if !entity.score.is_finite() {
            return Err(invalid(format!("entity {local_id} has a non-finite score")));
        }

        let text = match index.slice(entity.begin_offset, entity.end_offset) {
            Some(text) if entity.begin_offset < entity.end_offset => text,
            _ => {
                return Err(invalid(format!(
                    "entity {local_id} span [{}, {}) is empty or outside the chunk of {} characters",
                    entity.begin_offset,
                    entity.end_offset,
                    index.char_len()
                )));
            }
        };

        // Unmasking restores `text`, so it must be exactly what the span
        // covers even when the detector normalised what it reported.
        if text != entity.text {
            warn!(
                chunk_index = chunk.chunk_index,
                entity_id = local_id,
                entity_type = %entity.entity_type,
                "detector text differs from span, using span"
            );
        }

        out.push(Entity {
            entity_type: entity.entity_type,
            text: text.to_string(),
            begin_offset: chunk.start_in_original + entity.begin_offset,
            end_offset: chunk.start_in_original + entity.end_offset,
            score: entity.score,
            id: namespace + local_id,
        });
    }

    Ok(())
}
