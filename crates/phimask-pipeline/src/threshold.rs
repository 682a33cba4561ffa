use phimask_core::models::entity::Entity;

use crate::error::MaskError;

/// Split entities into `(masked, skipped)`: `score >= threshold` is masked.
///
/// Every input lands in exactly one side. A NaN score never compares
/// greater-or-equal, so it is skipped.
pub fn partition(entities: Vec<Entity>, threshold: f64) -> (Vec<Entity>, Vec<Entity>) {
    entities.into_iter().partition(|e| e.score >= threshold)
}

/// Pick the per-call threshold if given, else `default`, and check it.
pub fn resolve_threshold(explicit: Option<f64>, default: f64) -> Result<f64, MaskError> {
    let threshold = explicit.unwrap_or(default);
    if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
        return Err(MaskError::InvalidInput(format!(
            "threshold must be within [0, 1], got {threshold}"
        )));
    }
    Ok(threshold)
}
