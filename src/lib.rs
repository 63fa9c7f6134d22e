// ==========================================
// Class Generation Engine - Library root
// ==========================================
// Groups validated students into classes per level, assigns teachers
// and time slots, scores the result, and carries each run from DRAFT
// through bounded manual refinement to a one-time approval.
// ==========================================

// Domain - entities and enums
pub mod domain;

// Repositories - SQLite access
pub mod repository;

// Engines - business rules
pub mod engine;

// Configuration
pub mod config;

// Connection setup and schema
pub mod db;

pub mod logging;

// API - request-scoped entry points
pub mod api;

// App - wiring
pub mod app;

// ==========================================
// Re-exports
// ==========================================

pub use domain::types::{
    ClassType, ConflictSeverity, ConflictType, DayOfWeek, ProposalStatus, StudentCategory,
};

pub use domain::{
    AssessmentRecord, GeneratedClass, GenerationParameters, GenerationProposal, Level,
    RefinementConstraints, Teacher, TimeSlot,
};

pub use engine::{
    ConstraintChecker, GenerationOrchestrator, ReadinessGate, RefinementEngine, ScoreEngine,
    TransferRejection,
};

pub use api::{ApiError, ApiResult, ApprovalResult, ClassGenerationApi};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const APP_NAME: &str = "Class Generation Engine";
