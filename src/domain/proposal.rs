// ==========================================
// Class Generation Engine - Proposal aggregate
// ==========================================
// A proposal (run) is one versioned attempt at a full class set for a term.
// Rule: once APPROVED nothing in the aggregate changes.
// ==========================================

use crate::domain::assessment::AssessmentRecord;
use crate::domain::parameters::GenerationParameters;
use crate::domain::teacher::TimeSlot;
use crate::domain::types::{
    ClassType, ConflictSeverity, ConflictType, ProposalStatus, StudentCategory, UnassignedReason,
    ViolationKind,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Shown in place of a time slot when none could be assigned.
pub const SLOT_TBD: &str = "TBD";

// ==========================================
// AssignedStudent - class member snapshot
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignedStudent {
    pub student_id: String,
    pub student_name: String,
    pub category: StudentCategory,
    pub assessment_score: Option<f64>,
    pub assessment_grade: Option<String>,
}

impl From<&AssessmentRecord> for AssignedStudent {
    fn from(a: &AssessmentRecord) -> Self {
        Self {
            student_id: a.student_id.clone(),
            student_name: a.student_name.clone(),
            category: a.category,
            assessment_score: a.score,
            assessment_grade: a.grade.clone(),
        }
    }
}

// ==========================================
// GeneratedClass
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedClass {
    pub class_id: String,
    pub class_name: String,
    pub level_id: String,
    pub level_name: String,
    pub teacher_id: String,
    pub teacher_name: String,
    pub time_slot: Option<TimeSlot>, // None = TBD
    pub students: Vec<AssignedStudent>,
    pub min_size: usize,
    pub max_size: usize,

    // ===== derived from `students`, see refresh_stats =====
    pub current_size: usize,
    pub class_type: ClassType,
    pub new_student_percentage: f64,
}

impl GeneratedClass {
    /// Recomputes size, class type and new-student percentage from members.
    pub fn refresh_stats(&mut self) {
        self.current_size = self.students.len();
        self.class_type = classify(&self.students);
        self.new_student_percentage = new_student_percentage(&self.students);
    }

    pub fn student_ids(&self) -> Vec<String> {
        self.students.iter().map(|s| s.student_id.clone()).collect()
    }

    pub fn contains_student(&self, student_id: &str) -> bool {
        self.students.iter().any(|s| s.student_id == student_id)
    }

    pub fn new_student_count(&self) -> usize {
        self.students
            .iter()
            .filter(|s| s.category == StudentCategory::New)
            .count()
    }

    /// Share of NEW students in [0, 1]; 0 for an empty class.
    pub fn new_student_ratio(&self) -> f64 {
        if self.students.is_empty() {
            0.0
        } else {
            self.new_student_count() as f64 / self.students.len() as f64
        }
    }

    pub fn session_display(&self) -> String {
        self.time_slot
            .as_ref()
            .map(TimeSlot::display)
            .unwrap_or_else(|| SLOT_TBD.to_string())
    }
}

/// NEW_ONLY / EXISTING_ONLY / MIXED. An empty class counts as EXISTING_ONLY.
pub fn classify(students: &[AssignedStudent]) -> ClassType {
    let new_count = students
        .iter()
        .filter(|s| s.category == StudentCategory::New)
        .count();

    if new_count == 0 {
        ClassType::ExistingOnly
    } else if new_count == students.len() {
        ClassType::NewOnly
    } else {
        ClassType::Mixed
    }
}

/// Percentage of NEW students, one decimal.
pub fn new_student_percentage(students: &[AssignedStudent]) -> f64 {
    if students.is_empty() {
        return 0.0;
    }
    let new_count = students
        .iter()
        .filter(|s| s.category == StudentCategory::New)
        .count();
    round_one_decimal(new_count as f64 * 100.0 / students.len() as f64)
}

/// Half-up rounding to one decimal place.
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// ==========================================
// Findings
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeViolation {
    pub class_id: String,
    pub class_name: String,
    pub kind: ViolationKind,
    pub current_size: usize,
    pub target_min: usize,
    pub target_max: usize,
    pub requires_approval: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub conflict_type: ConflictType,
    pub severity: ConflictSeverity,
    pub description: String,
    pub affected_class_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnassignedStudent {
    pub student_id: String,
    pub student_name: String,
    pub category: StudentCategory,
    pub determined_level_id: Option<String>,
    pub assessment_score: Option<f64>,
    pub reason: UnassignedReason,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GenerationMetrics {
    pub total_classes: usize,
    pub total_students_assigned: usize,
    pub unassigned_students: usize,
    pub average_class_size: f64,
    pub teachers_utilized: usize,
    pub total_teacher_slots: usize,
    pub teacher_utilization_rate: f64,
    pub rooms_required: usize,
    /// NEW_ONLY / EXISTING_ONLY / MIXED -> class count
    pub class_type_distribution: BTreeMap<String, usize>,
    /// Std-dev of classes per utilized teacher.
    pub workload_balance: f64,
}

/// Everything derived from the class list; regenerated after every edit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProposalReport {
    pub conflicts: Vec<Conflict>,
    pub size_violations: Vec<SizeViolation>,
    pub unassigned_students: Vec<UnassignedStudent>,
    pub warnings: Vec<String>,
    pub metrics: GenerationMetrics,
}

// ==========================================
// GenerationProposal
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationProposal {
    pub proposal_id: String,
    pub term_id: String,
    pub run_number: i32, // assigned by the store, 1-based per term
    pub classes: Vec<GeneratedClass>,
    pub conflicts: Vec<Conflict>,
    pub size_violations: Vec<SizeViolation>,
    pub unassigned_students: Vec<UnassignedStudent>,
    pub warnings: Vec<String>,
    pub metrics: GenerationMetrics,
    pub optimization_score: f64,
    pub parameters: GenerationParameters,
    pub status: ProposalStatus,
    pub generated_by: String,
    pub generated_at: NaiveDateTime,
    pub approved_by: Option<String>,
    pub approved_at: Option<NaiveDateTime>,
    pub transfer_count: u32,
    pub revision: i32, // optimistic lock
}

impl GenerationProposal {
    pub fn is_draft(&self) -> bool {
        self.status == ProposalStatus::Draft
    }

    pub fn is_approved(&self) -> bool {
        self.status == ProposalStatus::Approved
    }

    /// Conflicts of MEDIUM or HIGH severity.
    pub fn blocking_conflicts(&self) -> Vec<&Conflict> {
        self.conflicts
            .iter()
            .filter(|c| c.severity.blocks_approval())
            .collect()
    }

    /// DRAFT and only LOW conflicts (or none).
    pub fn can_approve(&self) -> bool {
        self.is_draft() && self.blocking_conflicts().is_empty()
    }

    pub fn find_class(&self, class_id: &str) -> Option<&GeneratedClass> {
        self.classes.iter().find(|c| c.class_id == class_id)
    }

    pub fn class_index(&self, class_id: &str) -> Option<usize> {
        self.classes.iter().position(|c| c.class_id == class_id)
    }

    pub fn total_enrolled(&self) -> usize {
        self.classes.iter().map(|c| c.current_size).sum()
    }

    pub fn report(&self) -> ProposalReport {
        ProposalReport {
            conflicts: self.conflicts.clone(),
            size_violations: self.size_violations.clone(),
            unassigned_students: self.unassigned_students.clone(),
            warnings: self.warnings.clone(),
            metrics: self.metrics.clone(),
        }
    }

    pub fn apply_report(&mut self, report: ProposalReport) {
        self.conflicts = report.conflicts;
        self.size_violations = report.size_violations;
        self.unassigned_students = report.unassigned_students;
        self.warnings = report.warnings;
        self.metrics = report.metrics;
    }
}
