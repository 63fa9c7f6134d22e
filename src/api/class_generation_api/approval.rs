use super::*;
use crate::repository::RepositoryError;
use serde_json::json;
use tracing::{info, instrument, warn};

impl ClassGenerationApi {
    /// Approves a DRAFT and materializes its classes.
    ///
    /// Preconditions: DRAFT, no MEDIUM/HIGH conflict, and no other approved
    /// run in the term. Status change and materialization commit together;
    /// on any error the proposal stays DRAFT and nothing is written.
    #[instrument(skip(self))]
    pub fn approve(&self, proposal_id: &str, approved_by: &str) -> ApiResult<ApprovalResult> {
        require_non_empty("proposal_id", proposal_id)?;
        require_non_empty("approved_by", approved_by)?;

        let proposal = self.load_proposal(proposal_id)?;
        if proposal.is_approved() {
            return Err(ApiError::AlreadyApproved {
                proposal_id: proposal.proposal_id,
            });
        }

        let blocking: Vec<String> = proposal
            .blocking_conflicts()
            .iter()
            .map(|c| format!("[{}] {}", c.severity, c.description))
            .collect();
        if !blocking.is_empty() {
            warn!(count = blocking.len(), "approval blocked by open conflicts");
            return Err(ApiError::ApprovalBlocked {
                blocking_conflicts: blocking,
            });
        }

        let approved_at = chrono::Local::now().naive_local();
        let (approved, summary) = self
            .proposal_repo
            .approve_and_materialize(
                proposal_id,
                proposal.revision,
                approved_by,
                approved_at,
                self.materializer.as_ref(),
            )
            .map_err(|e| match e {
                // lost a race with another approver
                RepositoryError::InvalidStateTransition { .. } => ApiError::AlreadyApproved {
                    proposal_id: proposal_id.to_string(),
                },
                other => ApiError::from(other),
            })?;

        info!(
            run_number = approved.run_number,
            class_groups = summary.class_group_ids.len(),
            enrollments = summary.enrollments_created,
            "run approved"
        );
        self.record(
            &approved,
            GenerationActionType::Approval,
            format!("Run {} approved", approved.run_number),
            json!({
                "run_number": approved.run_number,
                "class_group_ids": summary.class_group_ids,
                "enrollments_created": summary.enrollments_created,
            }),
            approved_by,
        );

        Ok(ApprovalResult {
            proposal_id: approved.proposal_id,
            run_number: approved.run_number,
            approved_by: approved_by.to_string(),
            approved_at,
            class_group_ids: summary.class_group_ids,
            enrollments_created: summary.enrollments_created,
        })
    }
}
