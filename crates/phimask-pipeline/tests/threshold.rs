mod common;

use common::entity;
use phimask_pipeline::config::DEFAULT_MASK_THRESHOLD;
use phimask_pipeline::threshold::{partition, resolve_threshold};

#[test]
fn score_equal_to_threshold_is_masked() {
    let (masked, skipped) = partition(vec![entity("NAME", "Ann", 0, 3, 0.15, 1)], 0.15);
    assert_eq!(masked.len(), 1);
    assert!(skipped.is_empty());
}

#[test]
fn partition_is_total_and_disjoint() {
    let input = vec![
        entity("NAME", "a", 0, 1, 0.9, 1),
        entity("NAME", "b", 2, 3, 0.1, 2),
        entity("DATE", "c", 4, 5, 0.5, 3),
        entity("AGE", "d", 6, 7, 0.0, 4),
        entity("ID", "e", 8, 9, f64::NAN, 5),
    ];
    let (masked, skipped) = partition(input.clone(), 0.5);

    assert_eq!(masked.len() + skipped.len(), input.len());
    for e in &input {
        let in_masked = masked.iter().any(|m| m.id == e.id);
        let in_skipped = skipped.iter().any(|s| s.id == e.id);
        assert!(in_masked ^ in_skipped, "entity {} must be on exactly one side", e.id);
    }
    let masked_ids: Vec<u64> = masked.iter().map(|e| e.id).collect();
    assert_eq!(masked_ids, vec![1, 3]);
}

#[test]
fn partition_preserves_fields() {
    let original = entity("DATE", "2023-01-05", 20, 30, 0.05, 2);
    let (_, skipped) = partition(vec![original.clone()], 0.15);
    assert_eq!(skipped, vec![original]);
}

#[test]
fn explicit_threshold_overrides_default() {
    assert_eq!(resolve_threshold(Some(0.7), DEFAULT_MASK_THRESHOLD).unwrap(), 0.7);
    assert_eq!(resolve_threshold(None, DEFAULT_MASK_THRESHOLD).unwrap(), 0.15);
}

#[test]
fn malformed_thresholds_are_rejected() {
    for bad in [-0.1, 1.5, f64::NAN, f64::INFINITY] {
        assert!(resolve_threshold(Some(bad), DEFAULT_MASK_THRESHOLD).is_err());
    }
}
