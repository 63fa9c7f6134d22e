// ==========================================
// Class Generation Engine - Generation orchestrator
// ==========================================
// LevelPartitioner -> ClassBuilder -> ConstraintChecker + ScoreEngine
// Pure: the caller loads the term snapshot and persists the result.
// The returned proposal has run_number 0; ProposalStore assigns it.
// ==========================================

use crate::domain::assessment::{AssessmentRecord, Level};
use crate::domain::parameters::GenerationParameters;
use crate::domain::proposal::GenerationProposal;
use crate::domain::teacher::{AvailabilitySlot, Teacher, TeacherLevelQualification};
use crate::domain::types::ProposalStatus;
use crate::engine::assignment::{AssignmentStrategy, RoundRobinAssignment};
use crate::engine::class_builder::ClassBuilder;
use crate::engine::evaluator::ProposalEvaluator;
use crate::engine::partitioner::LevelPartitioner;
use crate::engine::roster::TeacherRoster;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

/// Everything generation reads for one term.
#[derive(Debug, Clone, Default)]
pub struct GenerationInput {
    pub term_id: String,
    pub assessments: Vec<AssessmentRecord>,
    pub levels: Vec<Level>,
    pub teachers: Vec<Teacher>,
    pub qualifications: Vec<TeacherLevelQualification>,
    pub availability: Vec<AvailabilitySlot>,
}

pub struct GenerationOrchestrator {
    partitioner: LevelPartitioner,
    builder: ClassBuilder,
    evaluator: ProposalEvaluator,
}

impl Default for GenerationOrchestrator {
    fn default() -> Self {
        Self::new(Arc::new(RoundRobinAssignment::new()))
    }
}

impl GenerationOrchestrator {
    pub fn new(strategy: Arc<dyn AssignmentStrategy>) -> Self {
        Self {
            partitioner: LevelPartitioner::new(),
            builder: ClassBuilder::new(strategy),
            evaluator: ProposalEvaluator::new(),
        }
    }

    #[instrument(skip_all, fields(term_id = %input.term_id))]
    pub fn generate(
        &self,
        input: GenerationInput,
        params: &GenerationParameters,
        generated_by: &str,
    ) -> GenerationProposal {
        let partition = self.partitioner.partition(&input.assessments);
        let roster = TeacherRoster::new(input.teachers, input.qualifications, input.availability);
        let levels: HashMap<String, Level> = input
            .levels
            .into_iter()
            .map(|l| (l.level_id.clone(), l))
            .collect();

        let mut built = self.builder.build(&partition, &roster, &levels, params);
        for old in &partition.superseded {
            built.warnings.push(format!(
                "Assessment {} for student {} was superseded by a later assessment",
                old.assessment_id, old.student_id
            ));
        }
        let evaluation = self.evaluator.evaluate(
            &built.classes,
            built.unassigned,
            built.warnings,
            params,
            &roster.limits(),
            roster.total_available_slots(),
        );

        info!(
            validated = partition.total_validated(),
            classes = built.classes.len(),
            unassigned = evaluation.report.unassigned_students.len(),
            conflicts = evaluation.report.conflicts.len(),
            score = evaluation.optimization_score,
            "proposal built"
        );

        let mut proposal = GenerationProposal {
            proposal_id: uuid::Uuid::new_v4().to_string(),
            term_id: input.term_id,
            run_number: 0,
            classes: built.classes,
            conflicts: Vec::new(),
            size_violations: Vec::new(),
            unassigned_students: Vec::new(),
            warnings: Vec::new(),
            metrics: Default::default(),
            optimization_score: evaluation.optimization_score,
            parameters: params.clone(),
            status: ProposalStatus::Draft,
            generated_by: generated_by.to_string(),
            generated_at: chrono::Local::now().naive_local(),
            approved_by: None,
            approved_at: None,
            transfer_count: 0,
            revision: 1,
        };
        proposal.apply_report(evaluation.report);
        proposal
    }
}
