// ==========================================
// Test helpers
// ==========================================
// Temp-file databases and seed data for the integration tests.
// ==========================================

#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use class_generation::app::AppState;
use class_generation::db::{ensure_schema, open_sqlite_connection};
use class_generation::domain::{
    AssessmentRecord, AvailabilitySlot, CompetencyTier, DayOfWeek, Level, StudentCategory,
    Teacher, TeacherLevelQualification,
};
use std::error::Error;
use tempfile::NamedTempFile;

pub const TERM: &str = "T2026";

/// Creates a temp database with the full schema.
///
/// Keep the NamedTempFile alive for as long as the path is used.
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("temp path is not utf-8")?
        .to_string();

    let conn = open_sqlite_connection(&db_path)?;
    ensure_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// Fresh database plus an AppState over it.
pub fn setup_state() -> (NamedTempFile, AppState) {
    let (file, db_path) = create_test_db().unwrap();
    let state = AppState::new(db_path).unwrap();
    (file, state)
}

fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 1, 5)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap()
}

pub fn seed_level(state: &AppState, level_id: &str, name: &str, sort_order: i32) {
    state
        .level_repo
        .insert(&Level {
            level_id: level_id.to_string(),
            name: name.to_string(),
            sort_order,
        })
        .unwrap();
}

/// Active teacher qualified for `levels` in TERM.
///
/// `slots` are (day, session) cells marked available. An empty list still
/// submits a grid (one unavailable cell), so the teacher counts as
/// submitted but has nowhere to teach.
pub fn seed_teacher(state: &AppState, teacher_id: &str, levels: &[&str], slots: &[(DayOfWeek, &str)]) {
    seed_teacher_without_grid(state, teacher_id, levels);

    let cells: Vec<AvailabilitySlot> = if slots.is_empty() {
        vec![cell(teacher_id, DayOfWeek::Monday, "Pagi", false)]
    } else {
        slots
            .iter()
            .map(|(day, session)| cell(teacher_id, *day, session, true))
            .collect()
    };
    state
        .teacher_repo
        .replace_availability(teacher_id, TERM, &cells)
        .unwrap();
}

/// Active teacher who has not submitted availability.
pub fn seed_teacher_without_grid(state: &AppState, teacher_id: &str, levels: &[&str]) {
    state
        .teacher_repo
        .insert_teacher(&Teacher {
            teacher_id: teacher_id.to_string(),
            full_name: format!("Ustadz {}", teacher_id),
            is_active: true,
        })
        .unwrap();
    for level_id in levels {
        state
            .teacher_repo
            .insert_qualification(&TeacherLevelQualification {
                teacher_id: teacher_id.to_string(),
                level_id: level_id.to_string(),
                term_id: TERM.to_string(),
                competency_tier: CompetencyTier::Senior,
                max_classes_for_level: None,
            })
            .unwrap();
    }
}

fn cell(teacher_id: &str, day: DayOfWeek, session: &str, is_available: bool) -> AvailabilitySlot {
    AvailabilitySlot {
        teacher_id: teacher_id.to_string(),
        term_id: TERM.to_string(),
        day_of_week: day,
        session_id: session.to_uppercase(),
        session_name: session.to_string(),
        is_available,
    }
}

/// Inserts `count` validated assessments for the level, ids
/// `{prefix}-001`.. in creation order. Returns the student ids.
pub fn seed_students(
    state: &AppState,
    prefix: &str,
    level_id: Option<&str>,
    count: usize,
    category: StudentCategory,
) -> Vec<String> {
    seed_assessments(state, prefix, level_id, count, category, true)
}

pub fn seed_assessments(
    state: &AppState,
    prefix: &str,
    level_id: Option<&str>,
    count: usize,
    category: StudentCategory,
    validated: bool,
) -> Vec<String> {
    (1..=count)
        .map(|i| {
            let student_id = format!("{}-{:03}", prefix, i);
            state
                .assessment_repo
                .insert(&AssessmentRecord {
                    assessment_id: format!("a-{}", student_id),
                    student_id: student_id.clone(),
                    student_name: format!("Santri {}", student_id),
                    term_id: TERM.to_string(),
                    category,
                    determined_level_id: if validated {
                        level_id.map(str::to_string)
                    } else {
                        None
                    },
                    score: Some(70.0 + (i % 30) as f64),
                    grade: Some("B".to_string()),
                    validated,
                    created_at: base_time() + Duration::minutes(i as i64),
                })
                .unwrap();
            student_id
        })
        .collect()
}

/// Tahsin 1 with `students` EXISTING students, teachers T1 (Monday and
/// Wednesday mornings) and T2 (Tuesday afternoon).
pub fn seed_standard_term(state: &AppState, students: usize) -> Vec<String> {
    seed_level(state, "L1", "Tahsin 1", 1);
    seed_teacher(
        state,
        "T1",
        &["L1"],
        &[(DayOfWeek::Monday, "Pagi"), (DayOfWeek::Wednesday, "Pagi")],
    );
    seed_teacher(state, "T2", &["L1"], &[(DayOfWeek::Tuesday, "Sore")]);
    seed_students(state, "s", Some("L1"), students, StudentCategory::Existing)
}
