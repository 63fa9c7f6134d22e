// ==========================================
// Class Generation Engine - Repository errors
// ==========================================
// thiserror-derived; rusqlite and serde_json errors convert via From.
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== concurrency =====
    #[error("optimistic lock failure: proposal_id={proposal_id}, expected_revision={expected}, actual_revision={actual}")]
    OptimisticLockFailure {
        proposal_id: String,
        expected: i32,
        actual: i32,
    },

    // ===== database =====
    #[error("record not found: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("database connection failed: {0}")]
    DatabaseConnectionError(String),

    #[error("database lock acquisition failed: {0}")]
    LockError(String),

    #[error("database transaction failed: {0}")]
    DatabaseTransactionError(String),

    #[error("database query failed: {0}")]
    DatabaseQueryError(String),

    #[error("unique constraint violated: {0}")]
    UniqueConstraintViolation(String),

    #[error("foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    // ===== state =====
    #[error("invalid state transition: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("term {term_id} already has an approved proposal: {proposal_id}")]
    TermAlreadyApproved { term_id: String, proposal_id: String },

    // ===== data =====
    #[error("serialization failed: {0}")]
    SerializationError(String),

    #[error("invalid value (field={field}): {message}")]
    FieldValueError { field: String, message: String },

    // ===== other =====
    #[error("internal error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) => {
                if msg.contains("UNIQUE") {
                    RepositoryError::UniqueConstraintViolation(msg)
                } else if msg.contains("FOREIGN KEY") {
                    RepositoryError::ForeignKeyViolation(msg)
                } else {
                    RepositoryError::DatabaseQueryError(msg)
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Unknown".to_string(),
                id: "Unknown".to_string(),
            },
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::SerializationError(err.to_string())
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;
