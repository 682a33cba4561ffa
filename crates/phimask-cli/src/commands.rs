use std::sync::Arc;

use eyre::{eyre, Result, WrapErr};
use tracing::{info, warn};

use phimask_cipher::{FieldCipher, MasterKey, SensitiveRecord};
use phimask_core::detector::PhiDetector;
use phimask_core::models::entity::Entity;
use phimask_core::models::masking::{MaskingResult, UnmaskingResult};
use phimask_pipeline::config::PipelineConfig;
use phimask_pipeline::pipeline::{self, PhiPipeline};

/// Record field holding the masked transcript.
pub const MASKED_TEXT_FIELD: &str = "masked_text";

/// Record field holding the entity table as JSON.
pub const ENTITIES_FIELD: &str = "masked_entities";

pub const MASTER_KEY_VAR: &str = "PHIMASK_MASTER_KEY";

/// Layer the config file (if any) and `PHIMASK_*` variables over defaults.
pub fn load_config(path: Option<&std::path::Path>) -> Result<PipelineConfig> {
    let base = match path {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    Ok(base.with_env()?)
}

pub fn master_key_from_env() -> Result<MasterKey> {
    let encoded = std::env::var(MASTER_KEY_VAR)
        .map_err(|_| eyre!("{MASTER_KEY_VAR} is not set; generate one with `phimask keygen`"))?;
    Ok(MasterKey::from_base64(&encoded)?)
}

pub async fn mask(
    detector: Arc<dyn PhiDetector>,
    config: PipelineConfig,
    text: &str,
    threshold: Option<f64>,
) -> Result<MaskingResult> {
    let pipeline = PhiPipeline::new(detector, config)?;
    Ok(pipeline.mask_phi(text, threshold).await?)
}

/// Parse an entities file: either a bare entity array or a masking result,
/// in which case its masked text comes along too.
pub fn parse_entities(json: &str) -> Result<(Vec<Entity>, Option<String>)> {
    let value: serde_json::Value =
        serde_json::from_str(json).wrap_err("entities file is not valid JSON")?;

    if value.is_array() {
        let entities = serde_json::from_value(value).wrap_err("invalid entity array")?;
        return Ok((entities, None));
    }

    let result: MaskingResult =
        serde_json::from_value(value).wrap_err("expected an entity array or a masking result")?;
    Ok((result.masked_entities, Some(result.masked_text)))
}

pub fn unmask(masked_text: &str, entities: &[Entity]) -> UnmaskingResult {
    let result = pipeline::unmask_phi(masked_text, entities);
    report_diagnostics(&result);
    result
}

/// Mask `text` and encrypt the masked text and its entity table into a new
/// record.
pub async fn seal(
    detector: Arc<dyn PhiDetector>,
    config: PipelineConfig,
    cipher: &FieldCipher,
    record_id: &str,
    text: &str,
    threshold: Option<f64>,
) -> Result<SensitiveRecord> {
    let result = mask(detector, config, text, threshold).await?;

    let mut record = SensitiveRecord::new(record_id, cipher)?;
    cipher.encrypt_field(&mut record, MASKED_TEXT_FIELD, &result.masked_text)?;
    let entities = serde_json::to_string(&result.masked_entities)?;
    cipher.encrypt_field(&mut record, ENTITIES_FIELD, &entities)?;

    info!(
        record_id,
        masked = result.masked_entities.len(),
        skipped = result.skipped_entities.len(),
        "transcript sealed"
    );
    Ok(record)
}

/// Decrypt both fields of a sealed record and unmask.
pub fn open(cipher: &FieldCipher, record: &SensitiveRecord) -> Result<UnmaskingResult> {
    let masked_text = cipher.decrypt_field(record, MASKED_TEXT_FIELD)?;
    let entities_json = cipher.decrypt_field(record, ENTITIES_FIELD)?;
    let entities: Vec<Entity> = serde_json::from_str(&entities_json)
        .wrap_err_with(|| format!("record {} has a corrupt entity table", record.id))?;

    info!(record_id = %record.id, entities = entities.len(), "record opened");
    Ok(unmask(&masked_text, &entities))
}

fn report_diagnostics(result: &UnmaskingResult) {
    if !result.invalid_tokens.is_empty() {
        warn!(count = result.invalid_tokens.len(), "masked text contains invalid tokens");
    }
    if !result.unresolved_tokens.is_empty() {
        warn!(
            count = result.unresolved_tokens.len(),
            "masked text contains tokens with no matching entity"
        );
    }
}
