// ==========================================
// Class Generation Engine - Score engine
// ==========================================
// score = 100 - 10 * conflicts - 5 * size_violations
//         + 10 if classes exist and mean class size is within [7, 10]
// clamped to >= 0, one decimal (half-up)
// ==========================================

use crate::domain::proposal::{
    round_one_decimal, Conflict, GeneratedClass, GenerationMetrics, SizeViolation,
};
use std::collections::BTreeMap;

pub const BASE_SCORE: f64 = 100.0;
pub const CONFLICT_PENALTY: f64 = 10.0;
pub const VIOLATION_PENALTY: f64 = 5.0;
pub const SIZE_BONUS: f64 = 10.0;
pub const BONUS_MIN_AVERAGE: f64 = 7.0;
pub const BONUS_MAX_AVERAGE: f64 = 10.0;

#[derive(Debug, Default, Clone, Copy)]
pub struct ScoreEngine;

impl ScoreEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn score(
        &self,
        classes: &[GeneratedClass],
        conflicts: &[Conflict],
        size_violations: &[SizeViolation],
    ) -> f64 {
        let mut score = BASE_SCORE
            - CONFLICT_PENALTY * conflicts.len() as f64
            - VIOLATION_PENALTY * size_violations.len() as f64;

        if let Some(avg) = average_size(classes) {
            if (BONUS_MIN_AVERAGE..=BONUS_MAX_AVERAGE).contains(&avg) {
                score += SIZE_BONUS;
            }
        }

        round_one_decimal(score.max(0.0))
    }

    /// `total_teacher_slots` is the number of available cells across all
    /// teachers for the term; utilization is classes over that.
    pub fn metrics(
        &self,
        classes: &[GeneratedClass],
        unassigned: usize,
        total_teacher_slots: usize,
    ) -> GenerationMetrics {
        let total_students_assigned: usize = classes.iter().map(|c| c.current_size).sum();

        let mut per_teacher: BTreeMap<&str, usize> = BTreeMap::new();
        let mut distribution: BTreeMap<String, usize> = BTreeMap::new();
        for class in classes {
            *per_teacher.entry(class.teacher_id.as_str()).or_insert(0) += 1;
            *distribution
                .entry(class.class_type.to_db_str().to_string())
                .or_insert(0) += 1;
        }

        let teacher_utilization_rate = if total_teacher_slots == 0 {
            0.0
        } else {
            round_one_decimal(classes.len() as f64 * 100.0 / total_teacher_slots as f64)
        };

        GenerationMetrics {
            total_classes: classes.len(),
            total_students_assigned,
            unassigned_students: unassigned,
            average_class_size: average_size(classes).map(round_one_decimal).unwrap_or(0.0),
            teachers_utilized: per_teacher.len(),
            total_teacher_slots,
            teacher_utilization_rate,
            rooms_required: classes.len(),
            class_type_distribution: distribution,
            workload_balance: workload_std_dev(per_teacher.values().copied()),
        }
    }
}

fn average_size(classes: &[GeneratedClass]) -> Option<f64> {
    if classes.is_empty() {
        return None;
    }
    let total: usize = classes.iter().map(|c| c.current_size).sum();
    Some(total as f64 / classes.len() as f64)
}

/// Population std-dev of classes per utilized teacher, one decimal.
fn workload_std_dev(counts: impl Iterator<Item = usize>) -> f64 {
    let counts: Vec<f64> = counts.map(|c| c as f64).collect();
    if counts.is_empty() {
        return 0.0;
    }
    let mean = counts.iter().sum::<f64>() / counts.len() as f64;
    let variance = counts.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / counts.len() as f64;
    round_one_decimal(variance.sqrt())
}
