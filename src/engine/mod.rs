// ==========================================
// Class Generation Engine - Engine layer
// ==========================================
// Business rules only: no SQL, no I/O.
// Every rejection or finding carries a reason.
// ==========================================

pub mod assignment;
pub mod class_builder;
pub mod constraint;
pub mod evaluator;
pub mod orchestrator;
pub mod partitioner;
pub mod readiness;
pub mod refinement;
pub mod roster;
pub mod scoring;

pub use assignment::{AssignmentStrategy, QualifiedTeacher, RoundRobinAssignment, SlotBookings};
pub use class_builder::{partition_sizes, BuildResult, ClassBuilder};
pub use constraint::{ConstraintChecker, ConstraintReport};
pub use evaluator::{Evaluation, ProposalEvaluator};
pub use orchestrator::{GenerationInput, GenerationOrchestrator};
pub use partitioner::{LevelPartition, LevelPartitioner};
pub use readiness::{GenerationReadiness, ReadinessGate, ReadinessInput};
pub use refinement::{RefinementEngine, RefinementResult, TransferRejection};
pub use roster::{TeacherLimits, TeacherRoster};
pub use scoring::ScoreEngine;
