//! Property tests for the invariants the pipeline exists to protect.

mod common;

use proptest::prelude::*;

use phimask_core::models::entity::Entity;
use phimask_pipeline::chunk::Chunker;
use phimask_pipeline::error::MaskError;
use phimask_pipeline::mask::mask;
use phimask_pipeline::threshold::partition;
use phimask_pipeline::unmask::unmask;

/// Text with a mix of ASCII, whitespace, multibyte characters and braces.
fn clinical_text() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![
            Just('a'),
            Just('Z'),
            Just('7'),
            Just(' '),
            Just('\n'),
            Just('é'),
            Just('漢'),
            Just('{'),
            Just('}'),
            Just('_'),
        ],
        0..400,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

/// Like [`clinical_text`], but also splices in token literals, some of which
/// collide with keys the masker will generate.
fn text_with_literals() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![
            4 => clinical_text().prop_map(|t| t.chars().take(8).collect::<String>()),
            1 => Just("{{NAME_1}}".to_string()),
            1 => Just("{{DATE_2}}".to_string()),
            1 => Just("{{PHONEORFAX_3}}".to_string()),
            1 => Just("{{NAME_99}}".to_string()),
            1 => Just("{{NOT_VALID}}".to_string()),
        ],
        0..40,
    )
    .prop_map(|parts| parts.concat())
}

/// Non-overlapping spans over a text of `len` characters, built from sorted
/// cut points taken in pairs.
fn spans_for(text: &str, cuts: Vec<usize>, types: &[&str]) -> Vec<Entity> {
    let len = text.chars().count();
    if len == 0 {
        return Vec::new();
    }
    let mut cuts: Vec<usize> = cuts.into_iter().map(|c| c % (len + 1)).collect();
    cuts.sort_unstable();
    cuts.dedup();

    cuts.chunks_exact(2)
        .enumerate()
        .map(|(i, pair)| Entity {
            entity_type: types[i % types.len()].to_string(),
            text: text.chars().skip(pair[0]).take(pair[1] - pair[0]).collect(),
            begin_offset: pair[0],
            end_offset: pair[1],
            score: 0.9,
            id: i as u64 + 1,
        })
        .collect()
}

proptest! {
    #[test]
    fn chunks_concatenate_to_original(
        text in clinical_text(),
        max_chars in 1usize..60,
        lookback in 0usize..30,
    ) {
        let chunks: Vec<_> = Chunker::new(max_chars, lookback).unwrap().chunks(&text).collect();
        let joined: String = chunks.iter().map(|c| c.text).collect();
        prop_assert_eq!(&joined, &text);

        let mut start = 0;
        for c in &chunks {
            prop_assert_eq!(c.start_in_original, start);
            prop_assert!(c.char_len() >= 1 && c.char_len() <= max_chars);
            start += c.char_len();
        }
    }

    #[test]
    fn mask_then_unmask_restores_original(
        text in clinical_text(),
        cuts in proptest::collection::vec(0usize..500, 0..20),
    ) {
        let entities = spans_for(&text, cuts, &["NAME", "DATE", "PHONE_OR_FAX"]);
        let masked = mask(&text, &entities).unwrap();
        let result = unmask(&masked, &entities);
        prop_assert_eq!(&result.unmasked_text, &text);
    }

    #[test]
    fn mask_refuses_or_round_trips_with_token_literals(
        text in text_with_literals(),
        cuts in proptest::collection::vec(0usize..500, 0..20),
    ) {
        let entities = spans_for(&text, cuts, &["NAME", "DATE", "PHONE_OR_FAX"]);
        match mask(&text, &entities) {
            Ok(masked) => {
                let result = unmask(&masked, &entities);
                prop_assert_eq!(&result.unmasked_text, &text);
            }
            Err(e) => prop_assert!(matches!(e, MaskError::InvalidInput(_)), "unexpected {e:?}"),
        }
    }

    #[test]
    fn partition_is_total(scores in proptest::collection::vec(0.0f64..=1.0, 0..50), threshold in 0.0f64..=1.0) {
        let entities: Vec<Entity> = scores
            .iter()
            .enumerate()
            .map(|(i, s)| common::entity("NAME", "x", i, i + 1, *s, i as u64))
            .collect();
        let (masked, skipped) = partition(entities, threshold);
        prop_assert_eq!(masked.len() + skipped.len(), scores.len());
        prop_assert!(masked.iter().all(|e| e.score >= threshold));
        prop_assert!(skipped.iter().all(|e| e.score < threshold));
    }
}
