// ==========================================
// Class Generation Engine - Refinement engine
// ==========================================
// Copy-on-write edits of a DRAFT proposal:
//   transfer_student: move one student between two classes
//   reassign_teacher: hand a class to another qualified teacher
// Every precondition is checked before anything is touched; a rejection
// leaves the input proposal exactly as it was. Persisting the edited
// copy (with the revision check) is the caller's job.
// ==========================================

use crate::domain::parameters::RefinementConstraints;
use crate::domain::proposal::{GeneratedClass, GenerationProposal};
use crate::domain::types::StudentCategory;
use crate::engine::assignment::{AssignmentStrategy, SlotBookings};
use crate::engine::evaluator::ProposalEvaluator;
use crate::engine::roster::{TeacherLimits, TeacherRoster};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};

// ==========================================
// TransferRejection - why an edit was refused
// ==========================================
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransferRejection {
    #[error("proposal {proposal_id} is not a draft")]
    ProposalNotDraft { proposal_id: String },

    #[error("move limit reached: {applied} of {limit} transfers already applied")]
    MoveLimitReached { applied: u32, limit: u32 },

    #[error("source and destination are the same class: {class_id}")]
    SameClass { class_id: String },

    #[error("class not found: {class_id}")]
    ClassNotFound { class_id: String },

    #[error("student {student_id} is not in class {class_id}")]
    StudentNotInClass { student_id: String, class_id: String },

    #[error("classes belong to different levels: {from_level} -> {to_level}")]
    LevelMismatch { from_level: String, to_level: String },

    #[error("destination class {class_id} is full ({current}/{max})")]
    DestinationFull {
        class_id: String,
        current: usize,
        max: usize,
    },

    #[error("new student ratio of {class_id} would reach {ratio:.2} (max {max:.2})")]
    CategoryBalanceExceeded {
        class_id: String,
        ratio: f64,
        max: f64,
    },

    #[error("teacher reassignment is disabled")]
    TeacherReassignmentDisabled,

    #[error("class {class_id} is already taught by {teacher_id}")]
    SameTeacher { class_id: String, teacher_id: String },

    #[error("teacher {teacher_id} is not qualified for level {level_id}")]
    TeacherNotQualified { teacher_id: String, level_id: String },

    #[error("teacher {teacher_id} is not free at the class's slot and time slot changes are disabled")]
    TimeSlotChangeNotAllowed { teacher_id: String },
}

impl TransferRejection {
    /// Stable reason code for callers.
    pub fn code(&self) -> &'static str {
        match self {
            TransferRejection::ProposalNotDraft { .. } => "PROPOSAL_NOT_DRAFT",
            TransferRejection::MoveLimitReached { .. } => "MOVE_LIMIT_REACHED",
            TransferRejection::SameClass { .. } => "SAME_CLASS",
            TransferRejection::ClassNotFound { .. } => "CLASS_NOT_FOUND",
            TransferRejection::StudentNotInClass { .. } => "STUDENT_NOT_IN_CLASS",
            TransferRejection::LevelMismatch { .. } => "LEVEL_MISMATCH",
            TransferRejection::DestinationFull { .. } => "DESTINATION_FULL",
            TransferRejection::CategoryBalanceExceeded { .. } => "CATEGORY_BALANCE_EXCEEDED",
            TransferRejection::TeacherReassignmentDisabled => "TEACHER_REASSIGNMENT_DISABLED",
            TransferRejection::SameTeacher { .. } => "SAME_TEACHER",
            TransferRejection::TeacherNotQualified { .. } => "TEACHER_NOT_QUALIFIED",
            TransferRejection::TimeSlotChangeNotAllowed { .. } => "TIME_SLOT_CHANGE_NOT_ALLOWED",
        }
    }
}

pub type RefinementResult = Result<GenerationProposal, TransferRejection>;

// ==========================================
// RefinementEngine
// ==========================================
pub struct RefinementEngine {
    constraints: RefinementConstraints,
    evaluator: ProposalEvaluator,
    strategy: Arc<dyn AssignmentStrategy>,
}

impl RefinementEngine {
    pub fn new(constraints: RefinementConstraints, strategy: Arc<dyn AssignmentStrategy>) -> Self {
        Self {
            constraints,
            evaluator: ProposalEvaluator::new(),
            strategy,
        }
    }

    pub fn constraints(&self) -> &RefinementConstraints {
        &self.constraints
    }

    /// Moves `student_id` from `from_class_id` to `to_class_id`.
    ///
    /// Returns the edited copy with `transfer_count` bumped and findings,
    /// metrics and score recomputed.
    #[instrument(skip(self, proposal, limits), fields(proposal_id = %proposal.proposal_id))]
    pub fn transfer_student(
        &self,
        proposal: &GenerationProposal,
        student_id: &str,
        from_class_id: &str,
        to_class_id: &str,
        limits: &TeacherLimits,
    ) -> RefinementResult {
        ensure_draft(proposal)?;

        let limit = self.constraints.max_student_moves_per_run;
        if proposal.transfer_count >= limit {
            return Err(TransferRejection::MoveLimitReached {
                applied: proposal.transfer_count,
                limit,
            });
        }
        if from_class_id == to_class_id {
            return Err(TransferRejection::SameClass {
                class_id: from_class_id.to_string(),
            });
        }

        let from_idx = class_index(proposal, from_class_id)?;
        let to_idx = class_index(proposal, to_class_id)?;
        let from = &proposal.classes[from_idx];
        let to = &proposal.classes[to_idx];

        let student = from
            .students
            .iter()
            .find(|s| s.student_id == student_id)
            .ok_or_else(|| TransferRejection::StudentNotInClass {
                student_id: student_id.to_string(),
                class_id: from_class_id.to_string(),
            })?;

        if from.level_id != to.level_id {
            return Err(TransferRejection::LevelMismatch {
                from_level: from.level_id.clone(),
                to_level: to.level_id.clone(),
            });
        }

        if to.current_size + 1 > to.max_size {
            return Err(TransferRejection::DestinationFull {
                class_id: to.class_id.clone(),
                current: to.current_size,
                max: to.max_size,
            });
        }

        if self.constraints.maintain_student_category_balance {
            let moving_new = student.category == StudentCategory::New;
            let max = self.constraints.max_new_student_ratio;
            self.check_balance(from, -1, if moving_new { -1 } else { 0 }, max)?;
            self.check_balance(to, 1, if moving_new { 1 } else { 0 }, max)?;
        }

        let mut edited = proposal.clone();
        let moved = {
            let source = &mut edited.classes[from_idx];
            let pos = source
                .students
                .iter()
                .position(|s| s.student_id == student_id)
                .ok_or_else(|| TransferRejection::StudentNotInClass {
                    student_id: student_id.to_string(),
                    class_id: from_class_id.to_string(),
                })?;
            let moved = source.students.remove(pos);
            source.refresh_stats();
            moved
        };
        let destination = &mut edited.classes[to_idx];
        destination.students.push(moved);
        destination.refresh_stats();

        edited.transfer_count += 1;
        self.evaluator.reevaluate(&mut edited, limits);

        debug!(
            student_id,
            from_class_id,
            to_class_id,
            transfers = edited.transfer_count,
            "student transferred"
        );
        Ok(edited)
    }

    /// Rejects when the class's new-student ratio would go above `max`
    /// and also rise compared to now.
    fn check_balance(
        &self,
        class: &GeneratedClass,
        size_delta: isize,
        new_delta: isize,
        max: f64,
    ) -> Result<(), TransferRejection> {
        let size_after = class.current_size as isize + size_delta;
        if size_after <= 0 {
            return Ok(());
        }
        let new_after = class.new_student_count() as isize + new_delta;
        let ratio_after = new_after as f64 / size_after as f64;
        if ratio_after > max && ratio_after > class.new_student_ratio() {
            return Err(TransferRejection::CategoryBalanceExceeded {
                class_id: class.class_id.clone(),
                ratio: ratio_after,
                max,
            });
        }
        Ok(())
    }

    /// Hands `class_id` to `teacher_id`.
    ///
    /// The class keeps its slot when the new teacher is free in it;
    /// otherwise a slot is re-chosen, which requires
    /// `allow_time_slot_changes`.
    #[instrument(skip(self, proposal, roster), fields(proposal_id = %proposal.proposal_id))]
    pub fn reassign_teacher(
        &self,
        proposal: &GenerationProposal,
        class_id: &str,
        teacher_id: &str,
        roster: &TeacherRoster,
    ) -> RefinementResult {
        ensure_draft(proposal)?;
        if !self.constraints.allow_teacher_reassignment {
            return Err(TransferRejection::TeacherReassignmentDisabled);
        }

        let idx = class_index(proposal, class_id)?;
        let class = &proposal.classes[idx];
        if class.teacher_id == teacher_id {
            return Err(TransferRejection::SameTeacher {
                class_id: class_id.to_string(),
                teacher_id: teacher_id.to_string(),
            });
        }

        let candidate = roster.find_qualified(teacher_id, &class.level_id).ok_or_else(|| {
            TransferRejection::TeacherNotQualified {
                teacher_id: teacher_id.to_string(),
                level_id: class.level_id.clone(),
            }
        })?;

        let mut bookings = SlotBookings::new();
        for other in proposal.classes.iter().filter(|c| c.class_id != class_id) {
            if let Some(slot) = &other.time_slot {
                bookings
                    .entry(other.teacher_id.clone())
                    .or_default()
                    .insert(slot.clone());
            }
        }

        let keeps_slot = class.time_slot.as_ref().is_some_and(|slot| {
            candidate.available_slots.contains(slot)
                && !bookings
                    .get(teacher_id)
                    .is_some_and(|taken| taken.contains(slot))
        });

        let time_slot = if keeps_slot {
            class.time_slot.clone()
        } else if self.constraints.allow_time_slot_changes {
            self.strategy.choose_slot(&candidate, &bookings)
        } else {
            return Err(TransferRejection::TimeSlotChangeNotAllowed {
                teacher_id: teacher_id.to_string(),
            });
        };

        let mut edited = proposal.clone();
        let target = &mut edited.classes[idx];
        target.teacher_id = candidate.teacher_id.clone();
        target.teacher_name = candidate.teacher_name.clone();
        target.time_slot = time_slot;

        self.evaluator.reevaluate(&mut edited, &roster.limits());
        debug!(class_id, teacher_id, "teacher reassigned");
        Ok(edited)
    }
}

fn ensure_draft(proposal: &GenerationProposal) -> Result<(), TransferRejection> {
    if proposal.is_draft() {
        Ok(())
    } else {
        Err(TransferRejection::ProposalNotDraft {
            proposal_id: proposal.proposal_id.clone(),
        })
    }
}

fn class_index(proposal: &GenerationProposal, class_id: &str) -> Result<usize, TransferRejection> {
    proposal
        .class_index(class_id)
        .ok_or_else(|| TransferRejection::ClassNotFound {
            class_id: class_id.to_string(),
        })
}
