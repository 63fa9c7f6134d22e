// ==========================================
// Class Generation Engine - Readiness gate
// ==========================================
// student data completeness      = validated / total assessments   (< 80  -> blocking)
// teacher availability           = submitted / active teachers     (< 100 -> blocking)
// level assignment coverage      = assigned  / submitted teachers  (< 70  -> warning)
// A zero denominator yields 0%. Never mutates, never errors.
// Thresholds compare the exact ratio; reported values are truncated to
// one decimal so 1999/2000 reads 99.9, not 100.0.
// ==========================================

use crate::domain::parameters::GenerationParameters;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

pub const MIN_STUDENT_DATA_COMPLETENESS: f64 = 80.0;
pub const MIN_TEACHER_AVAILABILITY_COMPLETENESS: f64 = 100.0;
pub const RECOMMENDED_LEVEL_ASSIGNMENT_COMPLETENESS: f64 = 70.0;

/// Counts gathered from the upstream stores for one term.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadinessInput {
    pub total_assessments: usize,
    pub validated_assessments: usize,
    pub total_teachers: usize,
    pub teachers_submitted_availability: usize,
    /// Teachers who submitted availability and hold at least one level qualification.
    pub teachers_with_level_assignment: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationReadiness {
    pub term_id: String,
    pub can_generate: bool,
    pub student_data_completeness: f64,
    pub teacher_availability_completeness: f64,
    pub level_assignment_completeness: f64,
    pub blocking_issues: Vec<String>,
    pub warnings: Vec<String>,
    pub recommended_parameters: GenerationParameters,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ReadinessGate;

impl ReadinessGate {
    pub fn new() -> Self {
        Self
    }

    #[instrument(skip(self, input, recommended), fields(term_id = %term_id))]
    pub fn evaluate(
        &self,
        term_id: &str,
        input: &ReadinessInput,
        recommended: GenerationParameters,
    ) -> GenerationReadiness {
        let mut blocking_issues = Vec::new();
        let mut warnings = Vec::new();

        let student = Completeness::of(input.validated_assessments, input.total_assessments);
        if student.below(MIN_STUDENT_DATA_COMPLETENESS) {
            blocking_issues.push(format!(
                "Student assessment data is only {:.1}% complete (minimum {}% required)",
                student.reported(), MIN_STUDENT_DATA_COMPLETENESS
            ));
        }

        let availability =
            Completeness::of(input.teachers_submitted_availability, input.total_teachers);
        if availability.below(MIN_TEACHER_AVAILABILITY_COMPLETENESS) {
            blocking_issues.push(format!(
                "Teacher availability is only {:.1}% complete ({}% required)",
                availability.reported(), MIN_TEACHER_AVAILABILITY_COMPLETENESS
            ));
        }

        let coverage = Completeness::of(
            input.teachers_with_level_assignment,
            input.teachers_submitted_availability,
        );
        if coverage.below(RECOMMENDED_LEVEL_ASSIGNMENT_COMPLETENESS) {
            warnings.push(format!(
                "Level assignments are only {:.1}% complete (recommended {}%+)",
                coverage.reported(), RECOMMENDED_LEVEL_ASSIGNMENT_COMPLETENESS
            ));
        }

        let can_generate = blocking_issues.is_empty();
        let (student, availability, coverage) =
            (student.reported(), availability.reported(), coverage.reported());
        info!(
            can_generate,
            student, availability, coverage, "readiness evaluated"
        );

        GenerationReadiness {
            term_id: term_id.to_string(),
            can_generate,
            student_data_completeness: student,
            teacher_availability_completeness: availability,
            level_assignment_completeness: coverage,
            blocking_issues,
            warnings,
            recommended_parameters: recommended,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Completeness {
    part: u64,
    whole: u64,
}

impl Completeness {
    fn of(part: usize, whole: usize) -> Self {
        Self {
            part: part as u64,
            whole: whole as u64,
        }
    }

    fn below(&self, threshold_pct: f64) -> bool {
        if self.whole == 0 {
            return 0.0 < threshold_pct;
        }
        ((self.part * 100) as f64) < threshold_pct * self.whole as f64
    }

    /// Percentage truncated to one decimal.
    fn reported(&self) -> f64 {
        if self.whole == 0 {
            return 0.0;
        }
        (self.part * 1000 / self.whole) as f64 / 10.0
    }
}
