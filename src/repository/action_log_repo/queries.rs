use super::GenerationLogRepository;
use crate::domain::action_log::GenerationLog;
use crate::domain::types::GenerationActionType;
use crate::repository::error::RepositoryResult;
use chrono::NaiveDateTime;
use rusqlite::params;

const SELECT_COLUMNS: &str = r#"
    SELECT log_id, term_id, proposal_id, action_type, description,
           payload_json, performed_by, performed_at
    FROM class_generation_log
"#;

impl GenerationLogRepository {
    /// Oldest first.
    pub fn find_by_proposal(&self, proposal_id: &str) -> RepositoryResult<Vec<GenerationLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE proposal_id = ? ORDER BY performed_at ASC, rowid ASC",
            SELECT_COLUMNS
        ))?;

        let logs = stmt
            .query_map(params![proposal_id], map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }

    /// Newest first.
    pub fn find_by_term(&self, term_id: &str, limit: i32) -> RepositoryResult<Vec<GenerationLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE term_id = ? ORDER BY performed_at DESC, rowid DESC LIMIT ?",
            SELECT_COLUMNS
        ))?;

        let logs = stmt
            .query_map(params![term_id, limit], map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }

    pub fn count_by_action_type(
        &self,
        proposal_id: &str,
        action_type: GenerationActionType,
    ) -> RepositoryResult<i32> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM class_generation_log WHERE proposal_id = ? AND action_type = ?",
            params![proposal_id, action_type.to_db_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn map_row(row: &rusqlite::Row) -> rusqlite::Result<GenerationLog> {
    let action_type: String = row.get(3)?;
    let payload: Option<String> = row.get(5)?;
    let performed_at: String = row.get(7)?;

    Ok(GenerationLog {
        log_id: row.get(0)?,
        term_id: row.get(1)?,
        proposal_id: row.get(2)?,
        action_type: GenerationActionType::from_str(&action_type),
        description: row.get(4)?,
        payload_json: payload.and_then(|s| serde_json::from_str(&s).ok()),
        performed_by: row.get(6)?,
        performed_at: NaiveDateTime::parse_from_str(&performed_at, "%Y-%m-%d %H:%M:%S%.f")
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
            })?,
    })
}
