// ==========================================
// Class Generation Engine - Class generation API
// ==========================================
// Request-scoped surface:
//   readiness / generate / refinement_data / transfer_student /
//   reassign_teacher / approve / list_proposals / get_proposal
// Loads the term snapshot, runs the engines, persists through the
// repositories and writes the audit log (best-effort, after commit).
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::action_log::GenerationLog;
use crate::domain::parameters::RefinementConstraints;
use crate::domain::proposal::{GeneratedClass, GenerationProposal, UnassignedStudent};
use crate::domain::teacher::TimeSlot;
use crate::domain::types::GenerationActionType;
use crate::engine::{AssignmentStrategy, ReadinessGate, RoundRobinAssignment, TeacherRoster};
use crate::repository::{
    AssessmentRepository, ClassMaterializer, GenerationLogRepository, LevelRepository,
    ProposalRepository, TeacherRepository,
};

mod approval;
mod generation;
mod refinement;

// ==========================================
// Response types
// ==========================================

/// A teacher who can take over a class in the proposal's term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableTeacher {
    pub teacher_id: String,
    pub full_name: String,
    pub level_ids: Vec<String>,
    pub available_slots: Vec<TimeSlot>,
    pub assigned_classes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinementData {
    pub proposal_id: String,
    pub revision: i32,
    pub transfer_count: u32,
    pub remaining_moves: u32,
    pub classes: Vec<GeneratedClass>,
    pub unassigned_students: Vec<UnassignedStudent>,
    pub available_teachers: Vec<AvailableTeacher>,
    pub available_slots: Vec<TimeSlot>,
    /// Rules the editor works under, including the default size bounds.
    pub constraints: RefinementConstraints,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalResult {
    pub proposal_id: String,
    pub run_number: i32,
    pub approved_by: String,
    pub approved_at: chrono::NaiveDateTime,
    pub class_group_ids: Vec<String>,
    pub enrollments_created: usize,
}

// ==========================================
// ClassGenerationApi
// ==========================================
pub struct ClassGenerationApi {
    assessment_repo: Arc<AssessmentRepository>,
    level_repo: Arc<LevelRepository>,
    teacher_repo: Arc<TeacherRepository>,
    proposal_repo: Arc<ProposalRepository>,
    log_repo: Arc<GenerationLogRepository>,
    config_manager: Arc<ConfigManager>,
    materializer: Arc<dyn ClassMaterializer>,
    strategy: Arc<dyn AssignmentStrategy>,
    readiness_gate: ReadinessGate,
}

impl ClassGenerationApi {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        assessment_repo: Arc<AssessmentRepository>,
        level_repo: Arc<LevelRepository>,
        teacher_repo: Arc<TeacherRepository>,
        proposal_repo: Arc<ProposalRepository>,
        log_repo: Arc<GenerationLogRepository>,
        config_manager: Arc<ConfigManager>,
        materializer: Arc<dyn ClassMaterializer>,
    ) -> Self {
        Self {
            assessment_repo,
            level_repo,
            teacher_repo,
            proposal_repo,
            log_repo,
            config_manager,
            materializer,
            strategy: Arc::new(RoundRobinAssignment::new()),
            readiness_gate: ReadinessGate::new(),
        }
    }

    /// Swaps the teacher/slot assignment heuristic.
    pub fn with_strategy(mut self, strategy: Arc<dyn AssignmentStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    // ==========================================
    // Queries
    // ==========================================

    /// Runs of a term, newest first.
    pub fn list_proposals(&self, term_id: &str) -> ApiResult<Vec<GenerationProposal>> {
        require_non_empty("term_id", term_id)?;
        Ok(self.proposal_repo.list_by_term(term_id)?)
    }

    pub fn get_proposal(&self, proposal_id: &str) -> ApiResult<GenerationProposal> {
        require_non_empty("proposal_id", proposal_id)?;
        self.load_proposal(proposal_id)
    }

    /// Audit entries for a proposal, oldest first.
    pub fn proposal_history(&self, proposal_id: &str) -> ApiResult<Vec<GenerationLog>> {
        Ok(self.log_repo.find_by_proposal(proposal_id)?)
    }

    // ==========================================
    // Shared helpers
    // ==========================================

    fn load_proposal(&self, proposal_id: &str) -> ApiResult<GenerationProposal> {
        self.proposal_repo
            .find_by_id(proposal_id)?
            .ok_or_else(|| ApiError::NotFound(format!("GenerationProposal(id={})", proposal_id)))
    }

    fn load_roster(&self, term_id: &str) -> ApiResult<TeacherRoster> {
        Ok(TeacherRoster::new(
            self.teacher_repo.find_all()?,
            self.teacher_repo.find_qualifications_by_term(term_id)?,
            self.teacher_repo.find_availability_by_term(term_id)?,
        ))
    }

    /// Audit failures never undo a committed change.
    fn record(
        &self,
        proposal: &GenerationProposal,
        action_type: GenerationActionType,
        description: String,
        payload: Value,
        actor: &str,
    ) {
        let log = GenerationLog::new(
            &proposal.term_id,
            Some(&proposal.proposal_id),
            action_type,
            description,
            Some(payload),
            actor,
        );
        if let Err(e) = self.log_repo.insert(&log) {
            tracing::warn!(
                proposal_id = %proposal.proposal_id,
                action = action_type.to_db_str(),
                "audit log write failed: {}",
                e
            );
        }
    }
}

fn require_non_empty(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(())
}

fn config_error(e: Box<dyn std::error::Error>) -> ApiError {
    ApiError::InternalError(format!("configuration read failed: {}", e))
}
