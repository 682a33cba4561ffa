//! The masking and unmasking entry points.
//!
//! `mask_phi` runs chunk → detect → merge → filter → mask. Chunk detections
//! run concurrently up to `max_concurrent_detections`, but results are taken
//! back in chunk order, so ids and output do not depend on which call
//! finished first. The first failed chunk aborts the whole operation and the
//! detections still in flight are dropped.

use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info};
use uuid::Uuid;

use phimask_core::detector::{DetectedEntity, PhiDetector};
use phimask_core::models::chunk::Chunk;
use phimask_core::models::entity::Entity;
use phimask_core::models::masking::{MaskingResult, UnmaskingResult};

use crate::audit::AuditEvent;
use crate::chunk::Chunker;
use crate::config::PipelineConfig;
use crate::error::MaskError;
use crate::mask::mask;
use crate::merge::merge;
use crate::threshold::{partition, resolve_threshold};
use crate::unmask::unmask;

pub struct PhiPipeline {
    detector: Arc<dyn PhiDetector>,
    config: PipelineConfig,
    chunker: Chunker,
}

impl PhiPipeline {
    /// Fails if `config` is invalid or its chunk size exceeds what the
    /// detector accepts.
    pub fn new(detector: Arc<dyn PhiDetector>, config: PipelineConfig) -> Result<Self, MaskError> {
        config
            .validate()
            .map_err(|e| MaskError::InvalidInput(e.to_string()))?;

        if let Some(limit) = detector.max_text_chars()
            && config.max_chunk_chars > limit
        {
            return Err(MaskError::InvalidInput(format!(
                "max_chunk_chars {} exceeds the {} detector limit of {limit}",
                config.max_chunk_chars,
                detector.name()
            )));
        }

        let chunker = Chunker::new(config.max_chunk_chars, config.lookback_chars)?;
        Ok(Self {
            detector,
            config,
            chunker,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Detect and mask PHI in `text`.
    ///
    /// `threshold` overrides the configured default for this call only.
    /// Returns a fully masked result or an error, never a partial mask.
    pub async fn mask_phi(
        &self,
        text: &str,
        threshold: Option<f64>,
    ) -> Result<MaskingResult, MaskError> {
        let threshold = resolve_threshold(threshold, self.config.mask_threshold)?;
        let operation_id = Uuid::new_v4();

        let chunks: Vec<Chunk<'_>> = self.chunker.chunks(text).collect();
        info!(
            operation_id = %operation_id,
            detector = self.detector.name(),
            text_bytes = text.len(),
            chunk_count = chunks.len(),
            threshold,
            "starting PHI masking"
        );

        let detections: Vec<Vec<DetectedEntity>> = stream::iter(chunks.iter())
            .map(|chunk| self.detect_chunk(chunk))
            .buffered(self.config.max_concurrent_detections)
            .try_collect()
            .await?;

        let entities = merge(&chunks, detections)?;
        let (mut masked_entities, mut skipped_entities) = partition(entities, threshold);
        sort_by_position(&mut masked_entities);
        sort_by_position(&mut skipped_entities);

        let masked_text = mask(text, &masked_entities)?;

        AuditEvent::new("phi.mask", "transcript")
            .with_operation_id(operation_id)
            .with_details(serde_json::json!({
                "chunk_count": chunks.len(),
                "threshold": threshold,
                "masked": masked_entities.len(),
                "skipped": skipped_entities.len(),
            }))
            .emit();

        info!(operation_id = %operation_id, "PHI masking complete");

        Ok(MaskingResult {
            masked_text,
            masked_entities,
            skipped_entities,
            threshold,
            chunk_count: chunks.len(),
        })
    }

    /// Restore the original text from `masked_text` and its entity table.
    pub fn unmask_phi(&self, masked_text: &str, masked_entities: &[Entity]) -> UnmaskingResult {
        unmask_phi(masked_text, masked_entities)
    }

    async fn detect_chunk(&self, chunk: &Chunk<'_>) -> Result<Vec<DetectedEntity>, MaskError> {
        debug!(
            chunk_index = chunk.chunk_index,
            start_in_original = chunk.start_in_original,
            chunk_bytes = chunk.text.len(),
            "detecting PHI in chunk"
        );

        let detected = self
            .detector
            .detect(chunk.text)
            .await
            .map_err(|source| MaskError::DetectionUnavailable {
                chunk_index: chunk.chunk_index,
                source,
            })?;

        debug!(
            chunk_index = chunk.chunk_index,
            entity_count = detected.len(),
            "chunk detection complete"
        );
        Ok(detected)
    }
}

/// Unmask without a pipeline; unmasking needs no detector.
pub fn unmask_phi(masked_text: &str, masked_entities: &[Entity]) -> UnmaskingResult {
    let result = unmask(masked_text, masked_entities);

    AuditEvent::new("phi.unmask", "transcript")
        .with_details(serde_json::json!({
            "entities": masked_entities.len(),
            "invalid_tokens": result.invalid_tokens.len(),
            "unresolved_tokens": result.unresolved_tokens.len(),
        }))
        .emit();

    result
}

fn sort_by_position(entities: &mut [Entity]) {
    entities.sort_by(|a, b| {
        a.begin_offset
            .cmp(&b.begin_offset)
            .then(a.end_offset.cmp(&b.end_offset))
            .then(a.id.cmp(&b.id))
    });
}
