//! The PHI detection seam.
//!
//! A detector is any backend that, given a bounded-length text, returns the
//! PHI spans it found. Offsets are relative to the text it was handed, never
//! to a larger document; re-basing is the merger's job.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DetectionError;

/// One PHI span as reported by a detector, in chunk-local coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedEntity {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub text: String,
    /// Character offset, inclusive.
    pub begin_offset: usize,
    /// Character offset, exclusive.
    pub end_offset: usize,
    pub score: f64,
    /// Backends that do not number their entities leave this empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
}

#[async_trait]
pub trait PhiDetector: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Largest text, in characters, a single `detect` call accepts.
    fn max_text_chars(&self) -> Option<usize> {
        None
    }

    /// Detect PHI in `text`. Returns every span or an error, never a subset.
    async fn detect(&self, text: &str) -> Result<Vec<DetectedEntity>, DetectionError>;
}
