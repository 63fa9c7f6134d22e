use super::core::{rejection, ProposalRepository};
use super::mapping::{format_ts, load_proposal};
use crate::domain::proposal::GenerationProposal;
use crate::domain::types::ProposalStatus;
use crate::repository::class_group_repo::{ClassMaterializer, MaterializationSummary};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tracing::{info, instrument};

/// Another APPROVED proposal in the term, ignoring `except`.
pub(super) fn approved_in_term(
    conn: &Connection,
    term_id: &str,
    except: Option<&str>,
) -> RepositoryResult<Option<String>> {
    let id = conn
        .query_row(
            r#"SELECT proposal_id FROM generated_class_proposal
               WHERE term_id = ?1 AND status = 'APPROVED'
                 AND (?2 IS NULL OR proposal_id <> ?2)
               LIMIT 1"#,
            params![term_id, except],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(id)
}

impl ProposalRepository {
    /// DRAFT -> APPROVED at `expected_revision`, then materialization,
    /// all in one IMMEDIATE transaction.
    ///
    /// Exactly one of several racing callers wins; the rest see
    /// `InvalidStateTransition` (or `OptimisticLockFailure` if the draft
    /// was edited since they read it). Nothing is written on error.
    #[instrument(skip(self, materializer), fields(proposal_id = %proposal_id))]
    pub fn approve_and_materialize(
        &self,
        proposal_id: &str,
        expected_revision: i32,
        approved_by: &str,
        approved_at: NaiveDateTime,
        materializer: &dyn ClassMaterializer,
    ) -> RepositoryResult<(GenerationProposal, MaterializationSummary)> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let term_id: Option<String> = tx
            .query_row(
                "SELECT term_id FROM generated_class_proposal WHERE proposal_id = ?",
                params![proposal_id],
                |row| row.get(0),
            )
            .optional()?;
        let term_id = term_id.ok_or_else(|| RepositoryError::NotFound {
            entity: "GenerationProposal".to_string(),
            id: proposal_id.to_string(),
        })?;

        if let Some(other) = approved_in_term(&tx, &term_id, Some(proposal_id))? {
            return Err(RepositoryError::TermAlreadyApproved {
                term_id,
                proposal_id: other,
            });
        }

        let rows_affected = tx.execute(
            r#"UPDATE generated_class_proposal
               SET status = 'APPROVED', approved_by = ?, approved_at = ?, revision = revision + 1
               WHERE proposal_id = ? AND revision = ? AND status = 'DRAFT'"#,
            params![
                approved_by,
                format_ts(&approved_at),
                proposal_id,
                expected_revision
            ],
        )?;
        if rows_affected == 0 {
            return Err(rejection(
                &tx,
                proposal_id,
                expected_revision,
                ProposalStatus::Approved,
            )?);
        }

        let proposal = load_proposal(&tx, proposal_id)?.ok_or_else(|| RepositoryError::NotFound {
            entity: "GenerationProposal".to_string(),
            id: proposal_id.to_string(),
        })?;

        let summary = materializer.materialize(&tx, &proposal, approved_by, approved_at)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        info!(
            class_groups = summary.class_group_ids.len(),
            enrollments = summary.enrollments_created,
            "proposal approved and materialized"
        );
        Ok((proposal, summary))
    }
}
