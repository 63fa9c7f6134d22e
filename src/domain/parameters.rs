// ==========================================
// Class Generation Engine - Generation / refinement parameters
// ==========================================

use crate::domain::types::PriorityStrategy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_MIN_CLASS_SIZE: usize = 7;
pub const DEFAULT_MAX_CLASS_SIZE: usize = 10;
pub const DEFAULT_NEW_EXISTING_RATIO: f64 = 0.4;
pub const DEFAULT_MAX_CLASSES_PER_TEACHER: usize = 6;
pub const DEFAULT_MAX_STUDENT_MOVES_PER_RUN: u32 = 5;
pub const DEFAULT_MAX_NEW_STUDENT_RATIO: f64 = 0.6;

// ==========================================
// ClassSizeOverride - per-level min/max
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSizeOverride {
    pub min_students: usize,
    pub max_students: usize,
}

// ==========================================
// GenerationParameters
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParameters {
    pub default_min_class_size: usize,
    pub default_max_class_size: usize,
    /// Target share of NEW students in a class (0.4 = 40% new / 60% existing).
    pub new_existing_student_ratio: f64,
    pub max_classes_per_teacher: usize,
    pub allow_undersized_classes: bool,
    pub optimize_for_teacher_workload: bool,
    pub priority_strategy: PriorityStrategy,
    /// level_id -> size override
    #[serde(default)]
    pub level_specific_sizes: BTreeMap<String, ClassSizeOverride>,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self {
            default_min_class_size: DEFAULT_MIN_CLASS_SIZE,
            default_max_class_size: DEFAULT_MAX_CLASS_SIZE,
            new_existing_student_ratio: DEFAULT_NEW_EXISTING_RATIO,
            max_classes_per_teacher: DEFAULT_MAX_CLASSES_PER_TEACHER,
            allow_undersized_classes: false,
            optimize_for_teacher_workload: true,
            priority_strategy: PriorityStrategy::Balance,
            level_specific_sizes: BTreeMap::new(),
        }
    }
}

impl GenerationParameters {
    /// (min, max) for a level, honoring level overrides.
    pub fn size_bounds(&self, level_id: &str) -> (usize, usize) {
        match self.level_specific_sizes.get(level_id) {
            Some(o) => (o.min_students, o.max_students),
            None => (self.default_min_class_size, self.default_max_class_size),
        }
    }

    /// Returns every problem found; empty means the parameters are usable.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        check_bounds(
            "default",
            self.default_min_class_size,
            self.default_max_class_size,
            &mut problems,
        );
        for (level_id, o) in &self.level_specific_sizes {
            check_bounds(level_id, o.min_students, o.max_students, &mut problems);
        }

        if !(0.0..=1.0).contains(&self.new_existing_student_ratio) {
            problems.push(format!(
                "new_existing_student_ratio must be within [0, 1], got {}",
                self.new_existing_student_ratio
            ));
        }
        if self.max_classes_per_teacher == 0 {
            problems.push("max_classes_per_teacher must be at least 1".to_string());
        }

        problems
    }
}

fn check_bounds(scope: &str, min: usize, max: usize, problems: &mut Vec<String>) {
    if min < 1 {
        problems.push(format!("{}: min class size must be at least 1", scope));
    }
    if max < min {
        problems.push(format!(
            "{}: max class size {} is below min class size {}",
            scope, max, min
        ));
    }
}

// ==========================================
// RefinementConstraints - limits on manual edits of a draft
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinementConstraints {
    pub min_class_size: usize,
    pub max_class_size: usize,
    pub max_student_moves_per_run: u32,
    pub allow_teacher_reassignment: bool,
    pub allow_time_slot_changes: bool,
    pub maintain_student_category_balance: bool,
    pub max_new_student_ratio: f64,
}

impl Default for RefinementConstraints {
    fn default() -> Self {
        Self {
            min_class_size: DEFAULT_MIN_CLASS_SIZE,
            max_class_size: DEFAULT_MAX_CLASS_SIZE,
            max_student_moves_per_run: DEFAULT_MAX_STUDENT_MOVES_PER_RUN,
            allow_teacher_reassignment: true,
            allow_time_slot_changes: false,
            maintain_student_category_balance: true,
            max_new_student_ratio: DEFAULT_MAX_NEW_STUDENT_RATIO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_bounds_prefers_level_override() {
        let mut params = GenerationParameters::default();
        params.level_specific_sizes.insert(
            "L2".to_string(),
            ClassSizeOverride {
                min_students: 4,
                max_students: 6,
            },
        );

        assert_eq!(params.size_bounds("L1"), (7, 10));
        assert_eq!(params.size_bounds("L2"), (4, 6));
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let mut params = GenerationParameters {
            default_min_class_size: 0,
            new_existing_student_ratio: 1.5,
            ..GenerationParameters::default()
        };
        params.level_specific_sizes.insert(
            "L9".to_string(),
            ClassSizeOverride {
                min_students: 8,
                max_students: 5,
            },
        );

        let problems = params.validate();
        assert_eq!(problems.len(), 3, "{:?}", problems);
        assert!(GenerationParameters::default().validate().is_empty());
    }
}
