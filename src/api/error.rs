// ==========================================
// Class Generation Engine - API errors
// ==========================================
// Turns repository and engine failures into caller-facing errors.
// Every variant carries an explicit reason.
// ==========================================

use crate::engine::refinement::TransferRejection;
use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // Business rules
    // ==========================================
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Refinement rejected by the engine; nothing was saved.
    #[error("edit rejected [{}]: {rejection}", rejection.code())]
    TransferRejected { rejection: TransferRejection },

    /// MEDIUM/HIGH conflicts are still open.
    #[error("approval blocked by {} conflict(s): {}", blocking_conflicts.len(), blocking_conflicts.join("; "))]
    ApprovalBlocked { blocking_conflicts: Vec<String> },

    #[error("proposal already approved: {proposal_id}")]
    AlreadyApproved { proposal_id: String },

    #[error("term {term_id} already has an approved proposal: {proposal_id}")]
    TermAlreadyApproved { term_id: String, proposal_id: String },

    #[error("proposal is not a draft: {0}")]
    ProposalNotDraft(String),

    // ==========================================
    // Concurrency
    // ==========================================
    #[error("optimistic lock failure: {0}")]
    OptimisticLockFailure(String),

    // ==========================================
    // Data access
    // ==========================================
    #[error("database error: {0}")]
    DatabaseError(String),

    #[error("database connection failed: {0}")]
    DatabaseConnectionError(String),

    #[error("database transaction failed: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // Other
    // ==========================================
    #[error("internal error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// Stable code for callers that branch on the failure kind.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::TransferRejected { rejection } => rejection.code(),
            ApiError::ApprovalBlocked { .. } => "APPROVAL_BLOCKED",
            ApiError::AlreadyApproved { .. } => "ALREADY_APPROVED",
            ApiError::TermAlreadyApproved { .. } => "TERM_ALREADY_APPROVED",
            ApiError::ProposalNotDraft(_) => "PROPOSAL_NOT_DRAFT",
            ApiError::OptimisticLockFailure(_) => "OPTIMISTIC_LOCK_FAILURE",
            ApiError::DatabaseError(_)
            | ApiError::DatabaseConnectionError(_)
            | ApiError::DatabaseTransactionError(_) => "DATABASE_ERROR",
            ApiError::InternalError(_) | ApiError::Other(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::OptimisticLockFailure {
                proposal_id,
                expected,
                actual,
            } => ApiError::OptimisticLockFailure(format!(
                "proposal {} was modified by another user (expected revision={}, actual revision={})",
                proposal_id, expected, actual
            )),

            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("lock acquisition failed: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::DatabaseError(format!("unique constraint violated: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::DatabaseError(format!("foreign key violated: {}", msg))
            }

            RepositoryError::InvalidStateTransition { from, to } => {
                ApiError::ProposalNotDraft(format!("cannot move from {} to {}", from, to))
            }
            RepositoryError::TermAlreadyApproved {
                term_id,
                proposal_id,
            } => ApiError::TermAlreadyApproved {
                term_id,
                proposal_id,
            },

            RepositoryError::SerializationError(msg) => ApiError::InternalError(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InternalError(format!("bad stored value in {}: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

impl From<TransferRejection> for ApiError {
    fn from(rejection: TransferRejection) -> Self {
        match rejection {
            TransferRejection::ProposalNotDraft { .. } => {
                ApiError::ProposalNotDraft(rejection.to_string())
            }
            rejection => ApiError::TransferRejected { rejection },
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
