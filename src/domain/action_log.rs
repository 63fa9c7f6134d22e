// ==========================================
// Class Generation Engine - Audit log domain model
// ==========================================
// Rule: every generation, manual edit and approval is recorded
// with its actor.
// ==========================================

use crate::domain::types::GenerationActionType;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// GenerationLog - one audit entry
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationLog {
    pub log_id: String,
    pub term_id: String,
    pub proposal_id: Option<String>,
    pub action_type: GenerationActionType,
    pub description: String,
    pub payload_json: Option<JsonValue>,
    pub performed_by: String,
    pub performed_at: NaiveDateTime,
}

impl GenerationLog {
    pub fn new(
        term_id: &str,
        proposal_id: Option<&str>,
        action_type: GenerationActionType,
        description: String,
        payload_json: Option<JsonValue>,
        performed_by: &str,
    ) -> Self {
        Self {
            log_id: uuid::Uuid::new_v4().to_string(),
            term_id: term_id.to_string(),
            proposal_id: proposal_id.map(str::to_string),
            action_type,
            description,
            payload_json,
            performed_by: performed_by.to_string(),
            performed_at: chrono::Local::now().naive_local(),
        }
    }
}
