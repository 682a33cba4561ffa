use std::collections::HashMap;
use std::io::Write;

use phimask_pipeline::config::{PipelineConfig, DEFAULT_MAX_CHUNK_CHARS};
use phimask_pipeline::error::ConfigError;

fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

fn write_config(json: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file
}

#[test]
fn defaults_match_documented_values() {
    let config = PipelineConfig::default();
    assert_eq!(config.mask_threshold, 0.15);
    assert_eq!(config.max_chunk_chars, 19_000);
    assert_eq!(config.lookback_chars, 500);
    assert!(config.validate().is_ok());
}

#[test]
fn env_overrides_defaults() {
    let config = PipelineConfig::default()
        .with_vars(vars(&[
            ("PHIMASK_MASK_THRESHOLD", "0.4"),
            ("PHIMASK_MAX_CHUNK_CHARS", " 5000 "),
            ("PHIMASK_MAX_CONCURRENT_DETECTIONS", "2"),
        ]))
        .unwrap();
    assert_eq!(config.mask_threshold, 0.4);
    assert_eq!(config.max_chunk_chars, 5000);
    assert_eq!(config.lookback_chars, 500);
    assert_eq!(config.max_concurrent_detections, 2);
}

#[test]
fn unparseable_env_value_names_the_variable() {
    let err = PipelineConfig::default()
        .with_vars(vars(&[("PHIMASK_LOOKBACK_CHARS", "lots")]))
        .unwrap_err();
    match err {
        ConfigError::InvalidEnv { var, value } => {
            assert_eq!(var, "PHIMASK_LOOKBACK_CHARS");
            assert_eq!(value, "lots");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn out_of_range_env_threshold_fails_validation() {
    let result = PipelineConfig::default().with_vars(vars(&[("PHIMASK_MASK_THRESHOLD", "1.2")]));
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn lookback_must_be_smaller_than_chunk() {
    let config = PipelineConfig {
        max_chunk_chars: 100,
        lookback_chars: 100,
        ..Default::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn partial_file_keeps_defaults_for_missing_fields() {
    let file = write_config(r#"{ "config_version": 1, "mask_threshold": 0.3 }"#);
    let config = PipelineConfig::load(file.path()).unwrap();
    assert_eq!(config.mask_threshold, 0.3);
    assert_eq!(config.max_chunk_chars, DEFAULT_MAX_CHUNK_CHARS);
}

#[test]
fn unversioned_file_is_stamped_current() {
    let file = write_config(r#"{ "max_chunk_chars": 8000 }"#);
    let config = PipelineConfig::load(file.path()).unwrap();
    assert_eq!(config.config_version, 1);
    assert_eq!(config.max_chunk_chars, 8000);
}

#[test]
fn newer_file_version_is_refused() {
    let file = write_config(r#"{ "config_version": 9 }"#);
    assert!(matches!(
        PipelineConfig::load(file.path()),
        Err(ConfigError::UnsupportedVersion { found: 9, supported: 1 })
    ));
}

#[test]
fn missing_file_reports_path() {
    let err = PipelineConfig::load(std::path::Path::new("/nonexistent/phimask.json")).unwrap_err();
    assert!(err.to_string().contains("/nonexistent/phimask.json"));
}

#[test]
fn oversized_file_version_is_not_truncated() {
    // 2^32 + 1 would read as version 1 if narrowed.
    let file = write_config(r#"{ "config_version": 4294967297 }"#);
    assert!(matches!(
        PipelineConfig::load(file.path()),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn non_integer_file_version_is_refused() {
    for json in [r#"{ "config_version": -1 }"#, r#"{ "config_version": "1" }"#] {
        let file = write_config(json);
        assert!(PipelineConfig::load(file.path()).is_err(), "{json}");
    }
}
