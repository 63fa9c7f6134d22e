// ==========================================
// Class Generation Engine - Domain layer
// ==========================================
// Entities, value types and enums.
// Rule: no data access, no engine logic.
// ==========================================

pub mod action_log;
pub mod assessment;
pub mod parameters;
pub mod proposal;
pub mod teacher;
pub mod types;

pub use action_log::GenerationLog;
pub use assessment::{AssessmentRecord, Level};
pub use parameters::{ClassSizeOverride, GenerationParameters, RefinementConstraints};
pub use proposal::{
    AssignedStudent, Conflict, GeneratedClass, GenerationMetrics, GenerationProposal,
    ProposalReport, SizeViolation, UnassignedStudent,
};
pub use teacher::{AvailabilitySlot, Teacher, TeacherLevelQualification, TimeSlot};
pub use types::{
    ClassType, CompetencyTier, ConflictSeverity, ConflictType, DayOfWeek, GenerationActionType,
    PriorityStrategy, ProposalStatus, StudentCategory, UnassignedReason, ViolationKind,
};
