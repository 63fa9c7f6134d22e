use super::*;
use crate::domain::parameters::GenerationParameters;
use crate::engine::{GenerationInput, GenerationOrchestrator, GenerationReadiness, ReadinessInput};
use serde_json::json;
use tracing::{info, instrument};

impl ClassGenerationApi {
    // ==========================================
    // Readiness
    // ==========================================

    /// Whether the term has enough upstream data to generate classes.
    ///
    /// Never fails on business grounds: missing data shows up in
    /// `blocking_issues` / `warnings`.
    #[instrument(skip(self))]
    pub fn readiness(&self, term_id: &str) -> ApiResult<GenerationReadiness> {
        require_non_empty("term_id", term_id)?;

        let (total_assessments, validated_assessments) =
            self.assessment_repo.count_by_term(term_id)?;
        let input = ReadinessInput {
            total_assessments,
            validated_assessments,
            total_teachers: self.teacher_repo.count_active()?,
            teachers_submitted_availability: self
                .teacher_repo
                .count_submitted_availability(term_id)?,
            teachers_with_level_assignment: self
                .teacher_repo
                .count_submitted_with_assignment(term_id)?,
        };
        let recommended = self
            .config_manager
            .recommended_parameters()
            .map_err(config_error)?;

        Ok(self.readiness_gate.evaluate(term_id, &input, recommended))
    }

    // ==========================================
    // Generation
    // ==========================================

    /// Builds and stores a new run for the term.
    ///
    /// `params = None` uses the configured recommendation. Prior runs are
    /// never touched; the new one gets the next run number and status DRAFT.
    #[instrument(skip(self, params))]
    pub fn generate(
        &self,
        term_id: &str,
        params: Option<GenerationParameters>,
        generated_by: &str,
    ) -> ApiResult<GenerationProposal> {
        require_non_empty("term_id", term_id)?;
        require_non_empty("generated_by", generated_by)?;

        let params = match params {
            Some(p) => p,
            None => self
                .config_manager
                .recommended_parameters()
                .map_err(config_error)?,
        };
        let problems = params.validate();
        if !problems.is_empty() {
            return Err(ApiError::InvalidInput(problems.join("; ")));
        }

        let input = GenerationInput {
            term_id: term_id.to_string(),
            assessments: self.assessment_repo.find_by_term(term_id)?,
            levels: self.level_repo.find_all()?,
            teachers: self.teacher_repo.find_all()?,
            qualifications: self.teacher_repo.find_qualifications_by_term(term_id)?,
            availability: self.teacher_repo.find_availability_by_term(term_id)?,
        };

        let orchestrator = GenerationOrchestrator::new(self.strategy.clone());
        let mut proposal = orchestrator.generate(input, &params, generated_by);

        let snapshot = self
            .config_manager
            .get_config_snapshot()
            .map_err(config_error)?;
        let run_number = self
            .proposal_repo
            .create_with_next_run_number(&mut proposal, Some(&snapshot))?;

        info!(
            proposal_id = %proposal.proposal_id,
            run_number,
            classes = proposal.classes.len(),
            score = proposal.optimization_score,
            "run stored"
        );

        self.record(
            &proposal,
            GenerationActionType::Generation,
            format!("Run {} generated", run_number),
            json!({
                "run_number": run_number,
                "total_classes": proposal.metrics.total_classes,
                "unassigned_students": proposal.metrics.unassigned_students,
                "conflicts": proposal.conflicts.len(),
                "optimization_score": proposal.optimization_score,
            }),
            generated_by,
        );

        Ok(proposal)
    }
}
