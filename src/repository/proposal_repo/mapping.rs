// Row <-> aggregate mapping shared by the store's read and write paths.
// Functions take &Connection so they run on a plain connection or
// inside a Transaction (which derefs to Connection).

use crate::domain::parameters::GenerationParameters;
use crate::domain::proposal::{AssignedStudent, GeneratedClass, GenerationProposal, ProposalReport};
use crate::domain::teacher::TimeSlot;
use crate::domain::types::{ClassType, DayOfWeek, ProposalStatus, StudentCategory};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;

pub(super) const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

const HEADER_COLUMNS: &str = r#"
    SELECT proposal_id, term_id, run_number, status, optimization_score,
           transfer_count, revision, generated_by, generated_at,
           approved_by, approved_at, parameters_json, report_json
    FROM generated_class_proposal
"#;

pub(super) fn format_ts(ts: &NaiveDateTime) -> String {
    ts.format(DATETIME_FORMAT).to_string()
}

fn parse_ts(raw: &str, column: &str) -> RepositoryResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT).map_err(|e| RepositoryError::FieldValueError {
        field: column.to_string(),
        message: format!("{} ({})", e, raw),
    })
}

struct HeaderRow {
    proposal_id: String,
    term_id: String,
    run_number: i32,
    status: String,
    optimization_score: f64,
    transfer_count: i64,
    revision: i32,
    generated_by: String,
    generated_at: String,
    approved_by: Option<String>,
    approved_at: Option<String>,
    parameters_json: String,
    report_json: String,
}

fn map_header(row: &rusqlite::Row) -> rusqlite::Result<HeaderRow> {
    Ok(HeaderRow {
        proposal_id: row.get(0)?,
        term_id: row.get(1)?,
        run_number: row.get(2)?,
        status: row.get(3)?,
        optimization_score: row.get(4)?,
        transfer_count: row.get(5)?,
        revision: row.get(6)?,
        generated_by: row.get(7)?,
        generated_at: row.get(8)?,
        approved_by: row.get(9)?,
        approved_at: row.get(10)?,
        parameters_json: row.get(11)?,
        report_json: row.get(12)?,
    })
}

pub(super) fn load_proposal(
    conn: &Connection,
    proposal_id: &str,
) -> RepositoryResult<Option<GenerationProposal>> {
    let header = conn
        .query_row(
            &format!("{} WHERE proposal_id = ?", HEADER_COLUMNS),
            params![proposal_id],
            map_header,
        )
        .optional()?;

    match header {
        Some(h) => Ok(Some(assemble(conn, h)?)),
        None => Ok(None),
    }
}

/// Newest run first.
pub(super) fn load_by_term(conn: &Connection, term_id: &str) -> RepositoryResult<Vec<GenerationProposal>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE term_id = ? ORDER BY run_number DESC",
        HEADER_COLUMNS
    ))?;
    let headers = stmt
        .query_map(params![term_id], map_header)?
        .collect::<Result<Vec<_>, _>>()?;

    headers.into_iter().map(|h| assemble(conn, h)).collect()
}

fn assemble(conn: &Connection, h: HeaderRow) -> RepositoryResult<GenerationProposal> {
    let parameters: GenerationParameters = serde_json::from_str(&h.parameters_json)?;
    let report: ProposalReport = serde_json::from_str(&h.report_json)?;
    let classes = load_classes(conn, &h.proposal_id)?;

    let mut proposal = GenerationProposal {
        proposal_id: h.proposal_id,
        term_id: h.term_id,
        run_number: h.run_number,
        classes,
        conflicts: Vec::new(),
        size_violations: Vec::new(),
        unassigned_students: Vec::new(),
        warnings: Vec::new(),
        metrics: Default::default(),
        optimization_score: h.optimization_score,
        parameters,
        status: ProposalStatus::from_str(&h.status),
        generated_by: h.generated_by,
        generated_at: parse_ts(&h.generated_at, "generated_at")?,
        approved_by: h.approved_by,
        approved_at: h
            .approved_at
            .as_deref()
            .map(|raw| parse_ts(raw, "approved_at"))
            .transpose()?,
        transfer_count: u32::try_from(h.transfer_count).unwrap_or(0),
        revision: h.revision,
    };
    proposal.apply_report(report);
    Ok(proposal)
}

fn load_classes(conn: &Connection, proposal_id: &str) -> RepositoryResult<Vec<GeneratedClass>> {
    let mut members: HashMap<String, Vec<AssignedStudent>> = HashMap::new();
    {
        let mut stmt = conn.prepare(
            r#"SELECT class_id, student_id, student_name, category, assessment_score, assessment_grade
               FROM generated_class_student
               WHERE proposal_id = ?
               ORDER BY class_id, seq"#,
        )?;
        let rows = stmt.query_map(params![proposal_id], |row| {
            let category: String = row.get(3)?;
            Ok((
                row.get::<_, String>(0)?,
                AssignedStudent {
                    student_id: row.get(1)?,
                    student_name: row.get(2)?,
                    category: StudentCategory::from_str(&category),
                    assessment_score: row.get(4)?,
                    assessment_grade: row.get(5)?,
                },
            ))
        })?;
        for row in rows {
            let (class_id, student) = row?;
            members.entry(class_id).or_default().push(student);
        }
    }

    let mut stmt = conn.prepare(
        r#"SELECT class_id, class_name, level_id, level_name, teacher_id, teacher_name,
                  day_of_week, session_id, session_name, min_size, max_size
           FROM generated_class
           WHERE proposal_id = ?
           ORDER BY seq"#,
    )?;
    let rows = stmt
        .query_map(params![proposal_id], |row| {
            let day: Option<String> = row.get(6)?;
            let session_id: Option<String> = row.get(7)?;
            let session_name: Option<String> = row.get(8)?;
            let time_slot = match (day.as_deref().and_then(DayOfWeek::from_str), session_id) {
                (Some(day_of_week), Some(session_id)) => Some(TimeSlot {
                    day_of_week,
                    session_name: session_name.unwrap_or_else(|| session_id.clone()),
                    session_id,
                }),
                _ => None,
            };
            Ok(GeneratedClass {
                class_id: row.get(0)?,
                class_name: row.get(1)?,
                level_id: row.get(2)?,
                level_name: row.get(3)?,
                teacher_id: row.get(4)?,
                teacher_name: row.get(5)?,
                time_slot,
                students: Vec::new(),
                min_size: row.get::<_, i64>(9)? as usize,
                max_size: row.get::<_, i64>(10)? as usize,
                current_size: 0,
                class_type: ClassType::ExistingOnly,
                new_student_percentage: 0.0,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    // size, type and percentage are derived from members, never trusted from the row
    Ok(rows
        .into_iter()
        .map(|mut class| {
            class.students = members.remove(&class.class_id).unwrap_or_default();
            class.refresh_stats();
            class
        })
        .collect())
}

pub(super) fn insert_header(
    conn: &Connection,
    p: &GenerationProposal,
    config_snapshot_json: Option<&str>,
) -> RepositoryResult<()> {
    conn.execute(
        r#"INSERT INTO generated_class_proposal (
            proposal_id, term_id, run_number, status, optimization_score,
            conflict_count, transfer_count, revision, generated_by, generated_at,
            approved_by, approved_at, parameters_json, report_json, config_snapshot_json
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        params![
            &p.proposal_id,
            &p.term_id,
            p.run_number,
            p.status.to_db_str(),
            p.optimization_score,
            p.conflicts.len() as i64,
            p.transfer_count as i64,
            p.revision,
            &p.generated_by,
            format_ts(&p.generated_at),
            &p.approved_by,
            p.approved_at.as_ref().map(format_ts),
            serde_json::to_string(&p.parameters)?,
            serde_json::to_string(&p.report())?,
            config_snapshot_json,
        ],
    )?;
    Ok(())
}

/// Writes every class and member row. The caller clears old rows first.
pub(super) fn insert_classes(conn: &Connection, p: &GenerationProposal) -> RepositoryResult<()> {
    let mut class_stmt = conn.prepare(
        r#"INSERT INTO generated_class (
            class_id, proposal_id, seq, class_name, level_id, level_name,
            teacher_id, teacher_name, day_of_week, session_id, session_name,
            min_size, max_size, current_size, class_type, new_student_percentage
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )?;
    let mut student_stmt = conn.prepare(
        r#"INSERT INTO generated_class_student (
            proposal_id, student_id, class_id, seq, student_name,
            category, assessment_score, assessment_grade
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
    )?;

    for (seq, class) in p.classes.iter().enumerate() {
        let slot = class.time_slot.as_ref();
        class_stmt.execute(params![
            &class.class_id,
            &p.proposal_id,
            seq as i64,
            &class.class_name,
            &class.level_id,
            &class.level_name,
            &class.teacher_id,
            &class.teacher_name,
            slot.map(|s| s.day_of_week.to_db_str()),
            slot.map(|s| s.session_id.as_str()),
            slot.map(|s| s.session_name.as_str()),
            class.min_size as i64,
            class.max_size as i64,
            class.current_size as i64,
            class.class_type.to_db_str(),
            class.new_student_percentage,
        ])?;

        for (member_seq, student) in class.students.iter().enumerate() {
            student_stmt.execute(params![
                &p.proposal_id,
                &student.student_id,
                &class.class_id,
                member_seq as i64,
                &student.student_name,
                student.category.to_db_str(),
                student.assessment_score,
                &student.assessment_grade,
            ])?;
        }
    }
    Ok(())
}

/// Current (status, revision), `None` when the proposal does not exist.
pub(super) fn current_state(
    conn: &Connection,
    proposal_id: &str,
) -> RepositoryResult<Option<(ProposalStatus, i32)>> {
    let row = conn
        .query_row(
            "SELECT status, revision FROM generated_class_proposal WHERE proposal_id = ?",
            params![proposal_id],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, i32>(1)?)),
        )
        .optional()?;
    Ok(row.map(|(status, revision)| (ProposalStatus::from_str(&status), revision)))
}
