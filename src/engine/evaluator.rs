// ==========================================
// Class Generation Engine - Proposal evaluator
// ==========================================
// Runs ConstraintChecker + ScoreEngine over a class set. Used after the
// initial build and again after every refinement, so findings and score
// always describe the current classes.
// ==========================================

use crate::domain::parameters::GenerationParameters;
use crate::domain::proposal::{
    GeneratedClass, GenerationProposal, ProposalReport, UnassignedStudent,
};
use crate::engine::constraint::ConstraintChecker;
use crate::engine::roster::TeacherLimits;
use crate::engine::scoring::ScoreEngine;

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub report: ProposalReport,
    pub optimization_score: f64,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ProposalEvaluator {
    checker: ConstraintChecker,
    scorer: ScoreEngine,
}

impl ProposalEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn evaluate(
        &self,
        classes: &[GeneratedClass],
        unassigned: Vec<UnassignedStudent>,
        warnings: Vec<String>,
        params: &GenerationParameters,
        limits: &TeacherLimits,
        total_teacher_slots: usize,
    ) -> Evaluation {
        let found = self.checker.check(classes, params, limits);
        let optimization_score =
            self.scorer
                .score(classes, &found.conflicts, &found.size_violations);
        let metrics = self
            .scorer
            .metrics(classes, unassigned.len(), total_teacher_slots);

        Evaluation {
            report: ProposalReport {
                conflicts: found.conflicts,
                size_violations: found.size_violations,
                unassigned_students: unassigned,
                warnings,
                metrics,
            },
            optimization_score,
        }
    }

    /// Re-evaluates a proposal in place after its classes changed.
    ///
    /// Unassigned students, warnings and the slot total carry over.
    pub fn reevaluate(&self, proposal: &mut GenerationProposal, limits: &TeacherLimits) {
        let evaluation = self.evaluate(
            &proposal.classes,
            std::mem::take(&mut proposal.unassigned_students),
            std::mem::take(&mut proposal.warnings),
            &proposal.parameters,
            limits,
            proposal.metrics.total_teacher_slots,
        );
        proposal.apply_report(evaluation.report);
        proposal.optimization_score = evaluation.optimization_score;
    }
}
