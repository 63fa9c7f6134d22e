// ==========================================
// Class Generation Engine - API layer
// ==========================================
// Entry points for callers (binary, services). Input validation,
// engine calls, persistence and audit logging meet here.
// ==========================================

pub mod class_generation_api;
pub mod error;

pub use class_generation_api::{
    ApprovalResult, AvailableTeacher, ClassGenerationApi, RefinementData,
};
pub use error::{ApiError, ApiResult};
