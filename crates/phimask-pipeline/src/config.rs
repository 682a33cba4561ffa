use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Current config file version. Bump this when adding fields or changing
/// shape, and teach [`migrate`] the previous shape.
const CURRENT_VERSION: u32 = 1;

pub const DEFAULT_MASK_THRESHOLD: f64 = 0.15;

/// Leaves margin under the 20,000 character cap of Comprehend Medical.
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 19_000;

pub const DEFAULT_LOOKBACK_CHARS: usize = 500;

pub const DEFAULT_MAX_CONCURRENT_DETECTIONS: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Schema version of the file this was loaded from. Missing or 0 =
    /// pre-versioned config.
    pub config_version: u32,
    /// Entities scoring at or above this are masked.
    pub mask_threshold: f64,
    pub max_chunk_chars: usize,
    /// How far back from a chunk boundary to look for whitespace.
    pub lookback_chars: usize,
    /// Upper bound on detector calls in flight for one masking operation.
    pub max_concurrent_detections: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            config_version: CURRENT_VERSION,
            mask_threshold: DEFAULT_MASK_THRESHOLD,
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
            lookback_chars: DEFAULT_LOOKBACK_CHARS,
            max_concurrent_detections: DEFAULT_MAX_CONCURRENT_DETECTIONS,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.mask_threshold.is_finite() || !(0.0..=1.0).contains(&self.mask_threshold) {
            return Err(ConfigError::Invalid(format!(
                "mask_threshold must be within [0, 1], got {}",
                self.mask_threshold
            )));
        }
        if self.max_chunk_chars == 0 {
            return Err(ConfigError::Invalid(
                "max_chunk_chars must be greater than 0".to_string(),
            ));
        }
        if self.lookback_chars >= self.max_chunk_chars {
            return Err(ConfigError::Invalid(format!(
                "lookback_chars ({}) must be smaller than max_chunk_chars ({})",
                self.lookback_chars, self.max_chunk_chars
            )));
        }
        if self.max_concurrent_detections == 0 {
            return Err(ConfigError::Invalid(
                "max_concurrent_detections must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Load a JSON config file, running migrations before deserializing.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let json: serde_json::Value = serde_json::from_str(&contents)?;
        let on_disk_version = match json.get("config_version") {
            None => 0,
            Some(v) => v
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| {
                    ConfigError::Invalid(format!("config_version {v} is not a valid version"))
                })?,
        };

        let migrated = migrate(json, on_disk_version)?;
        let config: PipelineConfig = serde_json::from_value(migrated)?;
        config.validate()?;

        tracing::info!(path = %path.display(), "pipeline config loaded");
        Ok(config)
    }

    /// Overlay `PHIMASK_*` environment variables on top of `self`.
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_vars(|name| std::env::var(name).ok())
    }

    /// Overlay variables from an arbitrary lookup. Split out from
    /// [`with_env`](Self::with_env) so tests need not touch the process
    /// environment.
    pub fn with_vars<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_var(&lookup, "PHIMASK_MASK_THRESHOLD")? {
            self.mask_threshold = v;
        }
        if let Some(v) = parse_var(&lookup, "PHIMASK_MAX_CHUNK_CHARS")? {
            self.max_chunk_chars = v;
        }
        if let Some(v) = parse_var(&lookup, "PHIMASK_LOOKBACK_CHARS")? {
            self.lookback_chars = v;
        }
        if let Some(v) = parse_var(&lookup, "PHIMASK_MAX_CONCURRENT_DETECTIONS")? {
            self.max_concurrent_detections = v;
        }
        self.validate()?;
        Ok(self)
    }
}

fn parse_var<F, T>(lookup: &F, var: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv {
                var: var.to_string(),
                value: raw,
            }),
    }
}

/// Bring a raw config value up to [`CURRENT_VERSION`].
///
/// Pre-versioned files (v0) have the same shape as v1 and are only stamped.
fn migrate(mut json: serde_json::Value, from_version: u32) -> Result<serde_json::Value, ConfigError> {
    if from_version > CURRENT_VERSION {
        return Err(ConfigError::UnsupportedVersion {
            found: from_version,
            supported: CURRENT_VERSION,
        });
    }

    let obj = json
        .as_object_mut()
        .ok_or_else(|| ConfigError::Invalid("config is not a JSON object".to_string()))?;
    obj.insert(
        "config_version".to_string(),
        serde_json::Value::Number(CURRENT_VERSION.into()),
    );

    Ok(json)
}
