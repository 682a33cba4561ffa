use thiserror::Error;

use phimask_core::error::DetectionError;

#[derive(Debug, Error)]
pub enum MaskError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("PHI detection failed for chunk {chunk_index}: {source}")]
    DetectionUnavailable {
        chunk_index: usize,
        #[source]
        source: DetectionError,
    },

    #[error("detector returned an invalid entity in chunk {chunk_index}: {reason}")]
    InvalidDetection { chunk_index: usize, reason: String },

    #[error("entities {first} and {second} overlap")]
    OverlappingEntities { first: u64, second: u64 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config_version {found} is newer than this build supports ({supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("invalid value {value:?} for {var}")]
    InvalidEnv { var: String, value: String },

    #[error("invalid config: {0}")]
    Invalid(String),
}
