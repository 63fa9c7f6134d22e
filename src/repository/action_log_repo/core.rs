use crate::domain::action_log::GenerationLog;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// GenerationLogRepository
// ==========================================
// Data mapping only.
pub struct GenerationLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl GenerationLogRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    pub(super) fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Returns the log_id.
    pub fn insert(&self, log: &GenerationLog) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO class_generation_log (
                log_id, term_id, proposal_id, action_type, description,
                payload_json, performed_by, performed_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                log.log_id,
                log.term_id,
                log.proposal_id,
                log.action_type.to_db_str(),
                log.description,
                log.payload_json.as_ref().map(|v| v.to_string()),
                log.performed_by,
                log.performed_at.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
            ],
        )?;

        Ok(log.log_id.clone())
    }
}
