// ==========================================
// Class Generation Engine - Teacher repository
// ==========================================
// Tables: teacher, teacher_level_assignment, teacher_availability
// Read-only during generation; inserts serve the collection
// workflow and fixtures.
// ==========================================

use crate::domain::teacher::{AvailabilitySlot, Teacher, TeacherLevelQualification};
use crate::domain::types::{CompetencyTier, DayOfWeek};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

pub struct TeacherRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TeacherRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // Writes
    // ==========================================

    pub fn insert_teacher(&self, teacher: &Teacher) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO teacher (teacher_id, full_name, is_active) VALUES (?, ?, ?)",
            params![&teacher.teacher_id, &teacher.full_name, teacher.is_active],
        )?;
        Ok(())
    }

    pub fn insert_qualification(&self, q: &TeacherLevelQualification) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO teacher_level_assignment (
                teacher_id, level_id, term_id, competency_tier, max_classes_for_level
            ) VALUES (?, ?, ?, ?, ?)"#,
            params![
                &q.teacher_id,
                &q.level_id,
                &q.term_id,
                q.competency_tier.to_db_str(),
                &q.max_classes_for_level,
            ],
        )?;
        Ok(())
    }

    /// Replaces a teacher's submitted grid for the term.
    pub fn replace_availability(
        &self,
        teacher_id: &str,
        term_id: &str,
        cells: &[AvailabilitySlot],
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM teacher_availability WHERE teacher_id = ? AND term_id = ?",
            params![teacher_id, term_id],
        )?;

        let mut count = 0;
        for cell in cells {
            tx.execute(
                r#"INSERT INTO teacher_availability (
                    teacher_id, term_id, day_of_week, session_id, session_name, is_available
                ) VALUES (?, ?, ?, ?, ?, ?)"#,
                params![
                    teacher_id,
                    term_id,
                    cell.day_of_week.to_db_str(),
                    &cell.session_id,
                    &cell.session_name,
                    cell.is_available,
                ],
            )?;
            count += 1;
        }

        tx.commit()?;
        Ok(count)
    }

    // ==========================================
    // Reads
    // ==========================================

    pub fn find_all(&self) -> RepositoryResult<Vec<Teacher>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT teacher_id, full_name, is_active FROM teacher ORDER BY teacher_id")?;

        let teachers = stmt
            .query_map([], |row| {
                Ok(Teacher {
                    teacher_id: row.get(0)?,
                    full_name: row.get(1)?,
                    is_active: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(teachers)
    }

    pub fn find_qualifications_by_term(
        &self,
        term_id: &str,
    ) -> RepositoryResult<Vec<TeacherLevelQualification>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT teacher_id, level_id, term_id, competency_tier, max_classes_for_level
               FROM teacher_level_assignment
               WHERE term_id = ?
               ORDER BY teacher_id, level_id"#,
        )?;

        let rows = stmt
            .query_map(params![term_id], |row| {
                let tier: String = row.get(3)?;
                Ok(TeacherLevelQualification {
                    teacher_id: row.get(0)?,
                    level_id: row.get(1)?,
                    term_id: row.get(2)?,
                    competency_tier: CompetencyTier::from_str(&tier),
                    max_classes_for_level: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Cells with an unknown day_of_week are skipped.
    pub fn find_availability_by_term(&self, term_id: &str) -> RepositoryResult<Vec<AvailabilitySlot>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT teacher_id, term_id, day_of_week, session_id, session_name, is_available
               FROM teacher_availability
               WHERE term_id = ?
               ORDER BY teacher_id, day_of_week, session_id"#,
        )?;

        let rows = stmt
            .query_map(params![term_id], |row| {
                let day: String = row.get(2)?;
                Ok((
                    DayOfWeek::from_str(&day),
                    AvailabilityRow {
                        teacher_id: row.get(0)?,
                        term_id: row.get(1)?,
                        session_id: row.get(3)?,
                        session_name: row.get(4)?,
                        is_available: row.get(5)?,
                    },
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut cells = Vec::with_capacity(rows.len());
        for (day, row) in rows {
            match day {
                Some(day_of_week) => cells.push(AvailabilitySlot {
                    teacher_id: row.teacher_id,
                    term_id: row.term_id,
                    day_of_week,
                    session_id: row.session_id,
                    session_name: row.session_name,
                    is_available: row.is_available,
                }),
                None => tracing::warn!(
                    teacher_id = %row.teacher_id,
                    session_id = %row.session_id,
                    "availability cell with unknown day_of_week skipped"
                ),
            }
        }
        Ok(cells)
    }

    pub fn count_active(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM teacher WHERE is_active = 1", [], |row| {
            row.get(0)
        })?;
        Ok(n as usize)
    }

    /// Active teachers with at least one availability row for the term.
    pub fn count_submitted_availability(&self, term_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let n: i64 = conn.query_row(
            r#"SELECT COUNT(DISTINCT a.teacher_id)
               FROM teacher_availability a
               JOIN teacher t ON t.teacher_id = a.teacher_id
               WHERE a.term_id = ? AND t.is_active = 1"#,
            params![term_id],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }

    /// Submitted teachers that also hold a level assignment for the term.
    pub fn count_submitted_with_assignment(&self, term_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let n: i64 = conn.query_row(
            r#"SELECT COUNT(DISTINCT a.teacher_id)
               FROM teacher_availability a
               JOIN teacher t ON t.teacher_id = a.teacher_id
               JOIN teacher_level_assignment q
                 ON q.teacher_id = a.teacher_id AND q.term_id = a.term_id
               WHERE a.term_id = ? AND t.is_active = 1"#,
            params![term_id],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }
}

struct AvailabilityRow {
    teacher_id: String,
    term_id: String,
    session_id: String,
    session_name: String,
    is_available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::assessment::Level;
    use crate::repository::assessment_repo::LevelRepository;

    fn setup() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        Arc::new(Mutex::new(conn))
    }

    fn cell(day: DayOfWeek, session: &str, available: bool) -> AvailabilitySlot {
        AvailabilitySlot {
            teacher_id: String::new(),
            term_id: String::new(),
            day_of_week: day,
            session_id: session.to_string(),
            session_name: session.to_string(),
            is_available: available,
        }
    }

    #[test]
    fn test_counts_for_readiness() {
        let conn = setup();
        let repo = TeacherRepository::new(conn.clone());
        LevelRepository::new(conn)
            .insert(&Level {
                level_id: "L1".to_string(),
                name: "Tahsin 1".to_string(),
                sort_order: 1,
            })
            .unwrap();

        for (id, active) in [("T1", true), ("T2", true), ("T3", true), ("T4", false)] {
            repo.insert_teacher(&Teacher {
                teacher_id: id.to_string(),
                full_name: format!("Ustadz {}", id),
                is_active: active,
            })
            .unwrap();
        }
        repo.insert_qualification(&TeacherLevelQualification {
            teacher_id: "T1".to_string(),
            level_id: "L1".to_string(),
            term_id: "T2026".to_string(),
            competency_tier: CompetencyTier::Expert,
            max_classes_for_level: Some(3),
        })
        .unwrap();

        repo.replace_availability("T1", "T2026", &[cell(DayOfWeek::Monday, "Pagi", true)])
            .unwrap();
        // submitted, nothing available: still counts as submitted
        repo.replace_availability("T2", "T2026", &[cell(DayOfWeek::Monday, "Pagi", false)])
            .unwrap();
        repo.replace_availability("T4", "T2026", &[cell(DayOfWeek::Monday, "Pagi", true)])
            .unwrap();

        assert_eq!(repo.count_active().unwrap(), 3);
        assert_eq!(repo.count_submitted_availability("T2026").unwrap(), 2);
        assert_eq!(repo.count_submitted_with_assignment("T2026").unwrap(), 1);

        let cells = repo.find_availability_by_term("T2026").unwrap();
        assert_eq!(cells.len(), 3);
        assert_eq!(cells[0].teacher_id, "T1");

        let quals = repo.find_qualifications_by_term("T2026").unwrap();
        assert_eq!(quals[0].competency_tier, CompetencyTier::Expert);
        assert_eq!(quals[0].max_classes_for_level, Some(3));
    }

    #[test]
    fn test_replace_availability_overwrites() {
        let repo = TeacherRepository::new(setup());
        repo.insert_teacher(&Teacher {
            teacher_id: "T1".to_string(),
            full_name: "Ustadz T1".to_string(),
            is_active: true,
        })
        .unwrap();

        repo.replace_availability(
            "T1",
            "T2026",
            &[
                cell(DayOfWeek::Monday, "Pagi", true),
                cell(DayOfWeek::Tuesday, "Pagi", true),
            ],
        )
        .unwrap();
        repo.replace_availability("T1", "T2026", &[cell(DayOfWeek::Friday, "Sore", true)])
            .unwrap();

        let cells = repo.find_availability_by_term("T2026").unwrap();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].day_of_week, DayOfWeek::Friday);
    }
}
