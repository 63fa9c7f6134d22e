// ==========================================
// Class Generation Engine - Level partitioner
// ==========================================
// Input:  the term's assessments
// Output: validated assessments grouped by determined level
// Rule:   stable order (created_at, assessment_id) so identical input
//         always yields identical class membership
// Rule:   one assessment per student; the latest validated one wins
// ==========================================

use crate::domain::assessment::AssessmentRecord;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default)]
pub struct LevelPartition {
    /// level_id -> validated assessments, stable order
    pub by_level: BTreeMap<String, Vec<AssessmentRecord>>,
    /// Validated but carrying no determined level.
    pub without_level: Vec<AssessmentRecord>,
    /// Older validated assessments of students who were assessed again.
    pub superseded: Vec<AssessmentRecord>,
}

impl LevelPartition {
    pub fn total_validated(&self) -> usize {
        self.by_level.values().map(Vec::len).sum::<usize>() + self.without_level.len()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LevelPartitioner;

impl LevelPartitioner {
    pub fn new() -> Self {
        Self
    }

    /// Unvalidated assessments are ignored.
    pub fn partition(&self, assessments: &[AssessmentRecord]) -> LevelPartition {
        let mut validated: Vec<&AssessmentRecord> =
            assessments.iter().filter(|a| a.validated).collect();
        validated.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.assessment_id.cmp(&b.assessment_id))
        });

        // sorted ascending, so the last index seen per student is the latest
        let latest: HashMap<&str, usize> = validated
            .iter()
            .enumerate()
            .map(|(idx, a)| (a.student_id.as_str(), idx))
            .collect();

        let mut partition = LevelPartition::default();
        for (idx, assessment) in validated.into_iter().enumerate() {
            if latest.get(assessment.student_id.as_str()) != Some(&idx) {
                partition.superseded.push(assessment.clone());
                continue;
            }
            match &assessment.determined_level_id {
                Some(level_id) => partition
                    .by_level
                    .entry(level_id.clone())
                    .or_default()
                    .push(assessment.clone()),
                None => partition.without_level.push(assessment.clone()),
            }
        }

        partition
    }
}
