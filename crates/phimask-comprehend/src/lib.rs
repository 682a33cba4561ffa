//! phimask-comprehend
//!
//! PHI detection via Amazon Comprehend Medical `DetectPHI`.

pub mod error;

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_comprehendmedical::error::ProvideErrorMetadata;
use aws_sdk_comprehendmedical::types::Entity;
use tracing::info;

use phimask_core::detector::{DetectedEntity, PhiDetector};
use phimask_core::error::DetectionError;

use crate::error::ComprehendError;

/// `DetectPHI` rejects text longer than this many characters.
pub const MAX_TEXT_CHARS: usize = 20_000;

pub const DEFAULT_REGION: &str = "us-east-1";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Label for entities Comprehend returns without a subtype.
const UNTYPED: &str = "PHI";

/// Where and how to reach Comprehend Medical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectorSettings {
    pub region: String,
    /// Named profile from `~/.aws`; `None` uses the default chain.
    pub profile: Option<String>,
    /// Bounds each `DetectPHI` call, retries included.
    pub operation_timeout: Duration,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            profile: None,
            operation_timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl DetectorSettings {
    /// Read `AWS_REGION`, `AWS_PROFILE` and `PHIMASK_DETECT_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ComprehendError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    pub fn from_vars<F>(lookup: F) -> Result<Self, ComprehendError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        if let Some(region) = lookup("AWS_REGION").filter(|r| !r.trim().is_empty()) {
            settings.region = region.trim().to_string();
        }
        settings.profile = lookup("AWS_PROFILE").filter(|p| !p.trim().is_empty());
        if let Some(raw) = lookup("PHIMASK_DETECT_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                ComprehendError::Config(format!("invalid PHIMASK_DETECT_TIMEOUT_SECS: {raw:?}"))
            })?;
            if secs == 0 {
                return Err(ComprehendError::Config(
                    "PHIMASK_DETECT_TIMEOUT_SECS must be greater than 0".to_string(),
                ));
            }
            settings.operation_timeout = Duration::from_secs(secs);
        }
        Ok(settings)
    }
}

/// Build an `SdkConfig` for the given settings.
pub async fn build_aws_config(settings: &DetectorSettings) -> aws_config::SdkConfig {
    let timeouts = aws_config::timeout::TimeoutConfig::builder()
        .operation_timeout(settings.operation_timeout)
        .build();

    let mut builder = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(settings.region.clone()))
        .timeout_config(timeouts);

    if let Some(profile) = &settings.profile {
        builder = builder.profile_name(profile);
    }

    builder.load().await
}

pub struct ComprehendMedicalDetector {
    client: aws_sdk_comprehendmedical::Client,
}

impl ComprehendMedicalDetector {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_comprehendmedical::Client::new(config),
        }
    }

    pub async fn from_settings(settings: &DetectorSettings) -> Self {
        let config = build_aws_config(settings).await;
        info!(region = %settings.region, "Comprehend Medical detector configured");
        Self::new(&config)
    }
}

#[async_trait]
impl PhiDetector for ComprehendMedicalDetector {
    fn name(&self) -> &str {
        "comprehend-medical"
    }

    fn max_text_chars(&self) -> Option<usize> {
        Some(MAX_TEXT_CHARS)
    }

    async fn detect(&self, text: &str) -> Result<Vec<DetectedEntity>, DetectionError> {
        let chars = text.chars().count();
        if chars > MAX_TEXT_CHARS {
            return Err(DetectionError::InputTooLong {
                chars,
                limit: MAX_TEXT_CHARS,
            });
        }

        let response = self
            .client
            .detect_phi()
            .text(text)
            .send()
            .await
            .map_err(|e| {
                let err = e.into_service_error();
                let message = err.to_string();
                if err.is_too_many_requests_exception() {
                    DetectionError::Throttled(message)
                } else if err.is_text_size_limit_exceeded_exception() {
                    DetectionError::InputTooLong {
                        chars,
                        limit: MAX_TEXT_CHARS,
                    }
                } else if matches!(
                    err.code(),
                    Some("UnrecognizedClientException" | "AccessDeniedException" | "ExpiredTokenException")
                ) {
                    DetectionError::InvalidCredentials(message)
                } else {
                    DetectionError::Unavailable(message)
                }
            })?;

        let entities = response
            .entities()
            .iter()
            .map(detected_entity)
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            text_chars = chars,
            entity_count = entities.len(),
            "Comprehend Medical DetectPHI complete"
        );

        Ok(entities)
    }
}

/// Convert one Comprehend entity into chunk-local detector output.
///
/// Offsets and score are required; a response without them is treated as
/// malformed rather than skipped.
pub fn detected_entity(entity: &Entity) -> Result<DetectedEntity, DetectionError> {
    let offset = |value: Option<i32>, field: &str| -> Result<usize, DetectionError> {
        value
            .and_then(|v| usize::try_from(v).ok())
            .ok_or_else(|| {
                DetectionError::MalformedResponse(format!(
                    "entity {:?} has missing or negative {field}",
                    entity.id()
                ))
            })
    };

    // A defaulted score would fall below any threshold and leave the span
    // unmasked.
    let score = entity.score().ok_or_else(|| {
        DetectionError::MalformedResponse(format!("entity {:?} has no Score", entity.id()))
    })?;

    let begin_offset = offset(entity.begin_offset(), "BeginOffset")?;
    let end_offset = offset(entity.end_offset(), "EndOffset")?;

    let id = match entity.id() {
        Some(id) => Some(u64::try_from(id).map_err(|_| {
            DetectionError::MalformedResponse(format!("entity has negative Id {id}"))
        })?),
        None => None,
    };

    Ok(DetectedEntity {
        entity_type: entity
            .r#type()
            .map(|t| t.as_str().to_string())
            .unwrap_or_else(|| UNTYPED.to_string()),
        text: entity.text().unwrap_or_default().to_string(),
        begin_offset,
        end_offset,
        score: f64::from(score),
        id,
    })
}
