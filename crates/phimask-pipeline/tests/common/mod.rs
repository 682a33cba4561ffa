//! Deterministic detectors for exercising the pipeline without a backend.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use phimask_core::detector::{DetectedEntity, PhiDetector};
use phimask_core::error::DetectionError;
use phimask_core::models::entity::Entity;

/// Reports every occurrence of each configured needle, numbering entities
/// 1.. per call in text order.
pub struct NeedleDetector {
    needles: Vec<(String, String, f64)>,
    number_entities: bool,
    pub calls: AtomicUsize,
}

impl NeedleDetector {
    pub fn new(needles: &[(&str, &str, f64)]) -> Self {
        Self {
            needles: needles
                .iter()
                .map(|(t, n, s)| (t.to_string(), n.to_string(), *s))
                .collect(),
            number_entities: true,
            calls: AtomicUsize::new(0),
        }
    }

    /// Leave `id` empty so the merger has to assign them.
    pub fn without_ids(mut self) -> Self {
        self.number_entities = false;
        self
    }

    pub fn find(&self, text: &str) -> Vec<DetectedEntity> {
        let mut found = Vec::new();
        for (entity_type, needle, score) in &self.needles {
            for (byte_start, _) in text.match_indices(needle.as_str()) {
                let begin = text[..byte_start].chars().count();
                found.push(DetectedEntity {
                    entity_type: entity_type.clone(),
                    text: needle.clone(),
                    begin_offset: begin,
                    end_offset: begin + needle.chars().count(),
                    score: *score,
                    id: None,
                });
            }
        }
        found.sort_by_key(|e| e.begin_offset);
        if self.number_entities {
            for (i, e) in found.iter_mut().enumerate() {
                e.id = Some(i as u64 + 1);
            }
        }
        found
    }
}

#[async_trait]
impl PhiDetector for NeedleDetector {
    fn name(&self) -> &str {
        "needle"
    }

    fn max_text_chars(&self) -> Option<usize> {
        Some(20_000)
    }

    async fn detect(&self, text: &str) -> Result<Vec<DetectedEntity>, DetectionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.find(text))
    }
}

/// Returns the same entities for every call.
pub struct FixedDetector(pub Vec<DetectedEntity>);

#[async_trait]
impl PhiDetector for FixedDetector {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn detect(&self, _text: &str) -> Result<Vec<DetectedEntity>, DetectionError> {
        Ok(self.0.clone())
    }
}

/// Fails any chunk containing `marker`; otherwise behaves like `inner`.
pub struct FailingDetector {
    pub inner: NeedleDetector,
    pub marker: String,
}

#[async_trait]
impl PhiDetector for FailingDetector {
    fn name(&self) -> &str {
        "failing"
    }

    async fn detect(&self, text: &str) -> Result<Vec<DetectedEntity>, DetectionError> {
        if text.contains(&self.marker) {
            return Err(DetectionError::Throttled("rate exceeded".to_string()));
        }
        self.inner.detect(text).await
    }
}

/// Delays earlier calls longer than later ones, so concurrent chunks finish
/// in reverse order.
pub struct ReverseOrderDetector {
    pub inner: NeedleDetector,
    started: AtomicUsize,
}

impl ReverseOrderDetector {
    pub fn new(inner: NeedleDetector) -> Self {
        Self {
            inner,
            started: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PhiDetector for ReverseOrderDetector {
    fn name(&self) -> &str {
        "reverse-order"
    }

    async fn detect(&self, text: &str) -> Result<Vec<DetectedEntity>, DetectionError> {
        let n = self.started.fetch_add(1, Ordering::SeqCst) as u64;
        tokio::time::sleep(Duration::from_millis(40u64.saturating_sub(n * 10))).await;
        self.inner.detect(text).await
    }
}

pub fn detected(
    entity_type: &str,
    text: &str,
    begin: usize,
    end: usize,
    score: f64,
    id: Option<u64>,
) -> DetectedEntity {
    DetectedEntity {
        entity_type: entity_type.to_string(),
        text: text.to_string(),
        begin_offset: begin,
        end_offset: end,
        score,
        id,
    }
}

pub fn entity(entity_type: &str, text: &str, begin: usize, end: usize, score: f64, id: u64) -> Entity {
    Entity {
        entity_type: entity_type.to_string(),
        text: text.to_string(),
        begin_offset: begin,
        end_offset: end,
        score,
        id,
    }
}

/// The two entities from the "John Doe visited on 2023-01-05." example.
pub fn john_doe_detections() -> Vec<DetectedEntity> {
    vec![
        detected("NAME", "John Doe", 0, 8, 0.9, Some(1)),
        detected("DATE", "2023-01-05", 20, 30, 0.8, Some(2)),
    ]
}

pub const JOHN_DOE: &str = "John Doe visited on 2023-01-05.";
