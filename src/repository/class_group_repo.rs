// ==========================================
// Class Generation Engine - Class group / enrollment repository
// ==========================================
// Tables: class_group, enrollment
// Written once per approved proposal, inside the approval transaction.
// ==========================================

use crate::domain::proposal::GenerationProposal;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Transaction};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterializationSummary {
    pub class_group_ids: Vec<String>,
    pub enrollments_created: usize,
}

// ==========================================
// ClassMaterializer - downstream writer for approved classes
// ==========================================
// Runs inside the approval transaction: an Err rolls back the status
// change as well. Implementations must write through `tx` only.
pub trait ClassMaterializer: Send + Sync {
    fn materialize(
        &self,
        tx: &Transaction<'_>,
        proposal: &GenerationProposal,
        approved_by: &str,
        approved_at: NaiveDateTime,
    ) -> RepositoryResult<MaterializationSummary>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassGroupRecord {
    pub class_group_id: String,
    pub term_id: String,
    pub proposal_id: String,
    pub source_class_id: String,
    pub class_name: String,
    pub level_id: String,
    pub teacher_id: String,
    pub session_name: Option<String>,
    pub min_students: usize,
    pub max_students: usize,
    pub enrolled: usize,
}

// ==========================================
// ClassGroupRepository
// ==========================================
pub struct ClassGroupRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ClassGroupRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn find_by_proposal(&self, proposal_id: &str) -> RepositoryResult<Vec<ClassGroupRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT g.class_group_id, g.term_id, g.proposal_id, g.source_class_id,
                      g.class_name, g.level_id, g.teacher_id, g.session_name,
                      g.min_students, g.max_students,
                      (SELECT COUNT(*) FROM enrollment e WHERE e.class_group_id = g.class_group_id)
               FROM class_group g
               WHERE g.proposal_id = ?
               ORDER BY g.class_name"#,
        )?;

        let groups = stmt
            .query_map(params![proposal_id], |row| {
                Ok(ClassGroupRecord {
                    class_group_id: row.get(0)?,
                    term_id: row.get(1)?,
                    proposal_id: row.get(2)?,
                    source_class_id: row.get(3)?,
                    class_name: row.get(4)?,
                    level_id: row.get(5)?,
                    teacher_id: row.get(6)?,
                    session_name: row.get(7)?,
                    min_students: row.get::<_, i64>(8)? as usize,
                    max_students: row.get::<_, i64>(9)? as usize,
                    enrolled: row.get::<_, i64>(10)? as usize,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(groups)
    }

    pub fn count_by_term(&self, term_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM class_group WHERE term_id = ?",
            params![term_id],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }

    pub fn count_enrollments_by_term(&self, term_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM enrollment WHERE term_id = ?",
            params![term_id],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }
}

impl ClassMaterializer for ClassGroupRepository {
    fn materialize(
        &self,
        tx: &Transaction<'_>,
        proposal: &GenerationProposal,
        approved_by: &str,
        approved_at: NaiveDateTime,
    ) -> RepositoryResult<MaterializationSummary> {
        let created_at = approved_at.format(DATETIME_FORMAT).to_string();
        let mut summary = MaterializationSummary::default();

        for class in &proposal.classes {
            let class_group_id = uuid::Uuid::new_v4().to_string();
            let slot = class.time_slot.as_ref();

            tx.execute(
                r#"INSERT INTO class_group (
                    class_group_id, term_id, proposal_id, source_class_id, class_name,
                    level_id, teacher_id, day_of_week, session_id, session_name,
                    min_students, max_students, created_by, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
                params![
                    &class_group_id,
                    &proposal.term_id,
                    &proposal.proposal_id,
                    &class.class_id,
                    &class.class_name,
                    &class.level_id,
                    &class.teacher_id,
                    slot.map(|s| s.day_of_week.to_db_str()),
                    slot.map(|s| s.session_id.as_str()),
                    slot.map(|s| s.session_name.as_str()),
                    class.min_size as i64,
                    class.max_size as i64,
                    approved_by,
                    &created_at,
                ],
            )?;

            for student in &class.students {
                tx.execute(
                    r#"INSERT INTO enrollment (
                        enrollment_id, class_group_id, student_id, term_id, enrolled_at
                    ) VALUES (?, ?, ?, ?, ?)"#,
                    params![
                        uuid::Uuid::new_v4().to_string(),
                        &class_group_id,
                        &student.student_id,
                        &proposal.term_id,
                        &created_at,
                    ],
                )?;
                summary.enrollments_created += 1;
            }

            summary.class_group_ids.push(class_group_id);
        }

        Ok(summary)
    }
}
