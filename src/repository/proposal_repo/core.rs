use super::mapping::{current_state, insert_classes, insert_header, load_by_term, load_proposal};
use crate::domain::proposal::GenerationProposal;
use crate::domain::types::ProposalStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, TransactionBehavior};
use std::sync::{Arc, Mutex};

// ==========================================
// ProposalRepository
// ==========================================
// Data mapping and concurrency guards only; approval preconditions
// beyond the status/revision check live in the api layer.
pub struct ProposalRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProposalRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    pub(super) fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Stores a new run, allocating `run_number` = MAX + 1 for the term.
    ///
    /// The read and the insert share one IMMEDIATE transaction so
    /// concurrent writers queue on the database write lock; the
    /// UNIQUE(term_id, run_number) constraint backs it up. Overwrites
    /// `proposal.run_number`.
    pub fn create_with_next_run_number(
        &self,
        proposal: &mut GenerationProposal,
        config_snapshot_json: Option<&str>,
    ) -> RepositoryResult<i32> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let max_run: Option<i32> = tx.query_row(
            "SELECT MAX(run_number) FROM generated_class_proposal WHERE term_id = ?",
            params![&proposal.term_id],
            |row| row.get(0),
        )?;
        proposal.run_number = max_run.unwrap_or(0) + 1;

        insert_header(&tx, proposal, config_snapshot_json)?;
        insert_classes(&tx, proposal)?;

        tx.commit()?;
        Ok(proposal.run_number)
    }

    pub fn find_by_id(&self, proposal_id: &str) -> RepositoryResult<Option<GenerationProposal>> {
        let conn = self.get_conn()?;
        load_proposal(&conn, proposal_id)
    }

    /// Runs of a term, newest first.
    pub fn list_by_term(&self, term_id: &str) -> RepositoryResult<Vec<GenerationProposal>> {
        let conn = self.get_conn()?;
        load_by_term(&conn, term_id)
    }

    pub fn find_max_run_number(&self, term_id: &str) -> RepositoryResult<i32> {
        let conn = self.get_conn()?;
        let max_run: Option<i32> = conn.query_row(
            "SELECT MAX(run_number) FROM generated_class_proposal WHERE term_id = ?",
            params![term_id],
            |row| row.get(0),
        )?;
        Ok(max_run.unwrap_or(0))
    }

    /// Id of the term's APPROVED proposal, if any.
    pub fn find_approved_id(&self, term_id: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        super::approval::approved_in_term(&conn, term_id, None)
    }

    /// Replaces a DRAFT with an edited copy.
    ///
    /// Succeeds only if the stored row is still DRAFT at
    /// `proposal.revision`; returns the new revision.
    ///
    /// # Errors
    /// - `OptimisticLockFailure`: someone saved in between
    /// - `InvalidStateTransition`: the proposal is no longer DRAFT
    /// - `NotFound`: unknown proposal_id
    pub fn replace_draft(&self, proposal: &GenerationProposal) -> RepositoryResult<i32> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let rows_affected = tx.execute(
            r#"UPDATE generated_class_proposal
               SET optimization_score = ?, conflict_count = ?, transfer_count = ?,
                   report_json = ?, revision = revision + 1
               WHERE proposal_id = ? AND revision = ? AND status = 'DRAFT'"#,
            params![
                proposal.optimization_score,
                proposal.conflicts.len() as i64,
                proposal.transfer_count as i64,
                serde_json::to_string(&proposal.report())?,
                &proposal.proposal_id,
                proposal.revision,
            ],
        )?;

        if rows_affected == 0 {
            return Err(rejection(
                &tx,
                &proposal.proposal_id,
                proposal.revision,
                ProposalStatus::Draft,
            )?);
        }

        tx.execute(
            "DELETE FROM generated_class_student WHERE proposal_id = ?",
            params![&proposal.proposal_id],
        )?;
        tx.execute(
            "DELETE FROM generated_class WHERE proposal_id = ?",
            params![&proposal.proposal_id],
        )?;
        insert_classes(&tx, proposal)?;

        tx.commit()?;
        Ok(proposal.revision + 1)
    }
}

/// Explains why a guarded UPDATE touched no row.
pub(super) fn rejection(
    conn: &Connection,
    proposal_id: &str,
    expected_revision: i32,
    target: ProposalStatus,
) -> RepositoryResult<RepositoryError> {
    Ok(match current_state(conn, proposal_id)? {
        None => RepositoryError::NotFound {
            entity: "GenerationProposal".to_string(),
            id: proposal_id.to_string(),
        },
        Some((ProposalStatus::Approved, _)) => RepositoryError::InvalidStateTransition {
            from: ProposalStatus::Approved.to_db_str().to_string(),
            to: target.to_db_str().to_string(),
        },
        Some((_, actual)) => RepositoryError::OptimisticLockFailure {
            proposal_id: proposal_id.to_string(),
            expected: expected_revision,
            actual,
        },
    })
}
