// ==========================================
// Class Generation Engine - Repository layer
// ==========================================
// Rule: no business logic in repositories
// Every query is parameterized; repositories share one
// Arc<Mutex<Connection>> per process.
// ==========================================

pub mod action_log_repo;
pub mod assessment_repo;
pub mod class_group_repo;
pub mod error;
pub mod proposal_repo;
pub mod teacher_repo;

pub use action_log_repo::GenerationLogRepository;
pub use assessment_repo::{AssessmentRepository, LevelRepository};
pub use class_group_repo::{
    ClassGroupRecord, ClassGroupRepository, ClassMaterializer, MaterializationSummary,
};
pub use error::{RepositoryError, RepositoryResult};
pub use proposal_repo::ProposalRepository;
pub use teacher_repo::TeacherRepository;
