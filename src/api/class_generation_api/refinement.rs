use super::*;
use crate::engine::RefinementEngine;
use serde_json::json;
use tracing::{info, instrument};

impl ClassGenerationApi {
    /// Everything an editor needs to refine a draft.
    #[instrument(skip(self))]
    pub fn refinement_data(&self, proposal_id: &str) -> ApiResult<RefinementData> {
        require_non_empty("proposal_id", proposal_id)?;
        let proposal = self.load_proposal(proposal_id)?;
        let roster = self.load_roster(&proposal.term_id)?;
        let constraints = self
            .config_manager
            .refinement_constraints()
            .map_err(config_error)?;

        let mut available_teachers: Vec<AvailableTeacher> = roster
            .active_teachers()
            .filter_map(|t| {
                let level_ids = roster.levels_of(&t.teacher_id);
                if level_ids.is_empty() {
                    return None;
                }
                Some(AvailableTeacher {
                    teacher_id: t.teacher_id.clone(),
                    full_name: t.full_name.clone(),
                    level_ids,
                    available_slots: roster.available_slots(&t.teacher_id).to_vec(),
                    assigned_classes: proposal
                        .classes
                        .iter()
                        .filter(|c| c.teacher_id == t.teacher_id)
                        .count(),
                })
            })
            .collect();
        available_teachers.sort_by(|a, b| a.teacher_id.cmp(&b.teacher_id));

        Ok(RefinementData {
            proposal_id: proposal.proposal_id.clone(),
            revision: proposal.revision,
            transfer_count: proposal.transfer_count,
            remaining_moves: constraints
                .max_student_moves_per_run
                .saturating_sub(proposal.transfer_count),
            available_slots: roster.all_slots(),
            classes: proposal.classes,
            unassigned_students: proposal.unassigned_students,
            available_teachers,
            constraints,
        })
    }

    /// Moves one student between two classes of a DRAFT.
    ///
    /// # Errors
    /// - `TransferRejected`: a refinement rule refused the move
    /// - `OptimisticLockFailure`: the draft changed since it was read; retry
    /// - `ProposalNotDraft`: the proposal has been approved
    #[instrument(skip(self))]
    pub fn transfer_student(
        &self,
        proposal_id: &str,
        student_id: &str,
        from_class_id: &str,
        to_class_id: &str,
        actor: &str,
    ) -> ApiResult<GenerationProposal> {
        require_non_empty("proposal_id", proposal_id)?;
        require_non_empty("student_id", student_id)?;
        require_non_empty("actor", actor)?;

        let proposal = self.load_proposal(proposal_id)?;
        let roster = self.load_roster(&proposal.term_id)?;
        let engine = self.refinement_engine()?;

        let mut edited = engine.transfer_student(
            &proposal,
            student_id,
            from_class_id,
            to_class_id,
            &roster.limits(),
        )?;
        edited.revision = self.proposal_repo.replace_draft(&edited)?;

        info!(
            transfer_count = edited.transfer_count,
            revision = edited.revision,
            "student transferred"
        );
        self.record(
            &edited,
            GenerationActionType::ManualEdit,
            format!(
                "Student {} moved from {} to {}",
                student_id, from_class_id, to_class_id
            ),
            json!({
                "action": "TRANSFER_STUDENT",
                "student_id": student_id,
                "from_class_id": from_class_id,
                "to_class_id": to_class_id,
                "transfer_count": edited.transfer_count,
                "optimization_score": edited.optimization_score,
            }),
            actor,
        );

        Ok(edited)
    }

    /// Hands a class of a DRAFT to another qualified teacher.
    #[instrument(skip(self))]
    pub fn reassign_teacher(
        &self,
        proposal_id: &str,
        class_id: &str,
        teacher_id: &str,
        actor: &str,
    ) -> ApiResult<GenerationProposal> {
        require_non_empty("proposal_id", proposal_id)?;
        require_non_empty("teacher_id", teacher_id)?;
        require_non_empty("actor", actor)?;

        let proposal = self.load_proposal(proposal_id)?;
        let previous_teacher = proposal
            .find_class(class_id)
            .map(|c| c.teacher_id.clone())
            .unwrap_or_default();
        let roster = self.load_roster(&proposal.term_id)?;
        let engine = self.refinement_engine()?;

        let mut edited = engine.reassign_teacher(&proposal, class_id, teacher_id, &roster)?;
        edited.revision = self.proposal_repo.replace_draft(&edited)?;

        let session = edited
            .find_class(class_id)
            .map(GeneratedClass::session_display)
            .unwrap_or_default();
        self.record(
            &edited,
            GenerationActionType::ManualEdit,
            format!("Class {} reassigned to teacher {}", class_id, teacher_id),
            json!({
                "action": "REASSIGN_TEACHER",
                "class_id": class_id,
                "from_teacher_id": previous_teacher,
                "to_teacher_id": teacher_id,
                "session": session,
            }),
            actor,
        );

        Ok(edited)
    }

    fn refinement_engine(&self) -> ApiResult<RefinementEngine> {
        let constraints = self
            .config_manager
            .refinement_constraints()
            .map_err(config_error)?;
        Ok(RefinementEngine::new(constraints, self.strategy.clone()))
    }
}
