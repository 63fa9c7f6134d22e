// ==========================================
// Class Generation Engine - Assessment / level repository
// ==========================================
// Tables: student_assessment, level
// Written by the placement workflow; the engine only reads.
// Insert methods exist for that workflow and for fixtures.
// ==========================================

use crate::domain::assessment::{AssessmentRecord, Level};
use crate::domain::types::StudentCategory;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// AssessmentRepository
// ==========================================
pub struct AssessmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AssessmentRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, a: &AssessmentRecord) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO student_assessment (
                assessment_id, student_id, student_name, term_id, category,
                determined_level_id, score, grade, is_validated, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &a.assessment_id,
                &a.student_id,
                &a.student_name,
                &a.term_id,
                a.category.to_db_str(),
                &a.determined_level_id,
                &a.score,
                &a.grade,
                a.validated,
                a.created_at.format(DATETIME_FORMAT).to_string(),
            ],
        )?;

        Ok(())
    }

    /// Every assessment of the term, validated or not, in creation order.
    pub fn find_by_term(&self, term_id: &str) -> RepositoryResult<Vec<AssessmentRecord>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT assessment_id, student_id, student_name, term_id, category,
                      determined_level_id, score, grade, is_validated, created_at
               FROM student_assessment
               WHERE term_id = ?
               ORDER BY created_at ASC, assessment_id ASC"#,
        )?;

        let records = stmt
            .query_map(params![term_id], |row| self.map_row(row))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// (total, validated) for the term.
    pub fn count_by_term(&self, term_id: &str) -> RepositoryResult<(usize, usize)> {
        let conn = self.get_conn()?;

        let (total, validated): (i64, i64) = conn.query_row(
            r#"SELECT COUNT(*), COALESCE(SUM(CASE WHEN is_validated = 1 THEN 1 ELSE 0 END), 0)
               FROM student_assessment
               WHERE term_id = ?"#,
            params![term_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok((total as usize, validated as usize))
    }

    fn map_row(&self, row: &rusqlite::Row) -> rusqlite::Result<AssessmentRecord> {
        let category: String = row.get(4)?;
        let created_at: String = row.get(9)?;
        Ok(AssessmentRecord {
            assessment_id: row.get(0)?,
            student_id: row.get(1)?,
            student_name: row.get(2)?,
            term_id: row.get(3)?,
            category: StudentCategory::from_str(&category),
            determined_level_id: row.get(5)?,
            score: row.get(6)?,
            grade: row.get(7)?,
            validated: row.get(8)?,
            created_at: NaiveDateTime::parse_from_str(&created_at, DATETIME_FORMAT).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Text, Box::new(e))
            })?,
        })
    }
}

// ==========================================
// LevelRepository
// ==========================================
pub struct LevelRepository {
    conn: Arc<Mutex<Connection>>,
}

impl LevelRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, level: &Level) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO level (level_id, name, sort_order) VALUES (?, ?, ?)",
            params![&level.level_id, &level.name, level.sort_order],
        )?;
        Ok(())
    }

    pub fn find_all(&self) -> RepositoryResult<Vec<Level>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT level_id, name, sort_order FROM level ORDER BY sort_order, level_id")?;

        let levels = stmt
            .query_map([], |row| {
                Ok(Level {
                    level_id: row.get(0)?,
                    name: row.get(1)?,
                    sort_order: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(levels)
    }
}
