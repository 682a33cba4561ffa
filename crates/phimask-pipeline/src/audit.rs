use serde::Serialize;
use tracing::info;
use uuid::Uuid;

/// A structured audit event for a masking or unmasking operation.
///
/// Emitted via `tracing` so it lands wherever the host ships logs. Events
/// carry counts, ids and thresholds only; PHI text never goes in `details`.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub action: String,
    pub resource_type: String,
    pub operation_id: Uuid,
    pub details: Option<serde_json::Value>,
}

impl AuditEvent {
    pub fn new(action: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            resource_type: resource_type.into(),
            operation_id: Uuid::new_v4(),
            details: None,
        }
    }

    pub fn with_operation_id(mut self, operation_id: Uuid) -> Self {
        self.operation_id = operation_id;
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn emit(&self) {
        let details = self
            .details
            .as_ref()
            .map(|d| d.to_string())
            .unwrap_or_default();
        info!(
            audit.action = %self.action,
            audit.resource_type = %self.resource_type,
            audit.operation_id = %self.operation_id,
            audit.details = %details,
            "audit event"
        );
    }
}
