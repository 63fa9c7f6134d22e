// ==========================================
// Class Generation Engine - SQLite setup
// ==========================================
// - every Connection::open goes through here so foreign_keys and
//   busy_timeout are set on each connection
// - ensure_schema is idempotent (CREATE ... IF NOT EXISTS)
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Schema version written by `ensure_schema`.
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// foreign_keys and busy_timeout are per connection.
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// `None` when the schema_version table does not exist yet.
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// Creates every table the engine reads or writes.
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    if read_schema_version(conn)?.unwrap_or(0) < CURRENT_SCHEMA_VERSION {
        conn.execute(
            "INSERT INTO schema_version (version, applied_at) VALUES (?1, datetime('now'))",
            [CURRENT_SCHEMA_VERSION],
        )?;
    }
    Ok(())
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version     INTEGER NOT NULL,
    applied_at  TEXT NOT NULL
);

-- ===== upstream inputs (read-only to the engine) =====

CREATE TABLE IF NOT EXISTS level (
    level_id    TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    sort_order  INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS teacher (
    teacher_id  TEXT PRIMARY KEY,
    full_name   TEXT NOT NULL,
    is_active   INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS student_assessment (
    assessment_id        TEXT PRIMARY KEY,
    student_id           TEXT NOT NULL,
    student_name         TEXT NOT NULL,
    term_id              TEXT NOT NULL,
    category             TEXT NOT NULL,
    determined_level_id  TEXT,
    score                REAL,
    grade                TEXT,
    is_validated         INTEGER NOT NULL DEFAULT 0,
    created_at           TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_assessment_term ON student_assessment(term_id);

CREATE TABLE IF NOT EXISTS teacher_level_assignment (
    teacher_id             TEXT NOT NULL REFERENCES teacher(teacher_id),
    level_id               TEXT NOT NULL REFERENCES level(level_id),
    term_id                TEXT NOT NULL,
    competency_tier        TEXT NOT NULL DEFAULT 'JUNIOR',
    max_classes_for_level  INTEGER,
    PRIMARY KEY (teacher_id, level_id, term_id)
);

CREATE TABLE IF NOT EXISTS teacher_availability (
    teacher_id    TEXT NOT NULL REFERENCES teacher(teacher_id),
    term_id       TEXT NOT NULL,
    day_of_week   TEXT NOT NULL,
    session_id    TEXT NOT NULL,
    session_name  TEXT NOT NULL,
    is_available  INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (teacher_id, term_id, day_of_week, session_id)
);

-- ===== configuration =====

CREATE TABLE IF NOT EXISTS class_size_configuration (
    config_key    TEXT PRIMARY KEY,
    level_id      TEXT,
    config_value  INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id    TEXT NOT NULL,
    key         TEXT NOT NULL,
    value       TEXT NOT NULL,
    updated_at  TEXT,
    PRIMARY KEY (scope_id, key)
);

-- ===== proposals =====

CREATE TABLE IF NOT EXISTS generated_class_proposal (
    proposal_id           TEXT PRIMARY KEY,
    term_id               TEXT NOT NULL,
    run_number            INTEGER NOT NULL,
    status                TEXT NOT NULL DEFAULT 'DRAFT',
    optimization_score    REAL NOT NULL DEFAULT 0,
    conflict_count        INTEGER NOT NULL DEFAULT 0,
    transfer_count        INTEGER NOT NULL DEFAULT 0,
    revision              INTEGER NOT NULL DEFAULT 1,
    generated_by          TEXT NOT NULL,
    generated_at          TEXT NOT NULL,
    approved_by           TEXT,
    approved_at           TEXT,
    parameters_json       TEXT NOT NULL,
    report_json           TEXT NOT NULL,
    config_snapshot_json  TEXT,
    UNIQUE (term_id, run_number)
);

CREATE TABLE IF NOT EXISTS generated_class (
    class_id                TEXT PRIMARY KEY,
    proposal_id             TEXT NOT NULL REFERENCES generated_class_proposal(proposal_id) ON DELETE CASCADE,
    seq                     INTEGER NOT NULL,
    class_name              TEXT NOT NULL,
    level_id                TEXT NOT NULL,
    level_name              TEXT NOT NULL,
    teacher_id              TEXT NOT NULL,
    teacher_name            TEXT NOT NULL,
    day_of_week             TEXT,
    session_id              TEXT,
    session_name            TEXT,
    min_size                INTEGER NOT NULL,
    max_size                INTEGER NOT NULL,
    current_size            INTEGER NOT NULL,
    class_type              TEXT NOT NULL,
    new_student_percentage  REAL NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_generated_class_proposal ON generated_class(proposal_id);

CREATE TABLE IF NOT EXISTS generated_class_student (
    proposal_id       TEXT NOT NULL REFERENCES generated_class_proposal(proposal_id) ON DELETE CASCADE,
    student_id        TEXT NOT NULL,
    class_id          TEXT NOT NULL REFERENCES generated_class(class_id) ON DELETE CASCADE,
    seq               INTEGER NOT NULL,
    student_name      TEXT NOT NULL,
    category          TEXT NOT NULL,
    assessment_score  REAL,
    assessment_grade  TEXT,
    PRIMARY KEY (proposal_id, student_id)
);

-- ===== materialized classes (written on approval) =====

CREATE TABLE IF NOT EXISTS class_group (
    class_group_id   TEXT PRIMARY KEY,
    term_id          TEXT NOT NULL,
    proposal_id      TEXT NOT NULL REFERENCES generated_class_proposal(proposal_id),
    source_class_id  TEXT NOT NULL,
    class_name       TEXT NOT NULL,
    level_id         TEXT NOT NULL,
    teacher_id       TEXT NOT NULL,
    day_of_week      TEXT,
    session_id       TEXT,
    session_name     TEXT,
    min_students     INTEGER NOT NULL,
    max_students     INTEGER NOT NULL,
    created_by       TEXT NOT NULL,
    created_at       TEXT NOT NULL,
    UNIQUE (proposal_id, source_class_id)
);

CREATE TABLE IF NOT EXISTS enrollment (
    enrollment_id   TEXT PRIMARY KEY,
    class_group_id  TEXT NOT NULL REFERENCES class_group(class_group_id),
    student_id      TEXT NOT NULL,
    term_id         TEXT NOT NULL,
    enrolled_at     TEXT NOT NULL,
    UNIQUE (term_id, student_id)
);

-- ===== audit =====

CREATE TABLE IF NOT EXISTS class_generation_log (
    log_id        TEXT PRIMARY KEY,
    term_id       TEXT NOT NULL,
    proposal_id   TEXT,
    action_type   TEXT NOT NULL,
    description   TEXT NOT NULL,
    payload_json  TEXT,
    performed_by  TEXT NOT NULL,
    performed_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_generation_log_term ON class_generation_log(term_id, performed_at);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);

        ensure_schema(&conn).unwrap();
        ensure_schema(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }
}
