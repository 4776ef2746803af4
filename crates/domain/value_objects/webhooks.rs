use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Result of comparing a tenant's configured webhook against the URL its
/// effective plan entitles it to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebhookCheck {
    pub tenant_id: Uuid,
    pub is_valid: bool,
    pub needs_fix: bool,
    pub configured_url: String,
    pub required_url: String,
    pub error: Option<String>,
}

impl WebhookCheck {
    pub fn compared(tenant_id: Uuid, configured_url: String, required_url: String) -> Self {
        let is_valid = configured_url == required_url;
        Self {
            tenant_id,
            is_valid,
            needs_fix: !is_valid,
            configured_url,
            required_url,
            error: None,
        }
    }

    pub fn failed(tenant_id: Uuid, error: String) -> Self {
        Self {
            tenant_id,
            is_valid: false,
            needs_fix: true,
            configured_url: String::new(),
            required_url: String::new(),
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookSweepFailure {
    pub tenant_id: Uuid,
    pub error: String,
}

/// Aggregate outcome of a validate-all / fix-all sweep. One tenant's failure
/// never aborts the sweep; it lands in `failures` instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookSweepSummary {
    pub checked: usize,
    pub valid: usize,
    pub fixed: usize,
    pub failed: usize,
    pub failures: Vec<WebhookSweepFailure>,
}
