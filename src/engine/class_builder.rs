// ==========================================
// Class Generation Engine - Class builder
// ==========================================
// Per level:
//   1) classes_needed = ceil(n / max_size)
//   2) split students into contiguous groups; the first n % k groups
//      take one extra student so nobody is dropped
//   3) teacher and slot come from the AssignmentStrategy
// Levels without a qualified teacher are skipped; their students are
// reported as unassigned and generation carries on.
// ==========================================

use crate::domain::assessment::Level;
use crate::domain::parameters::GenerationParameters;
use crate::domain::proposal::{AssignedStudent, GeneratedClass, UnassignedStudent};
use crate::domain::types::{ClassType, UnassignedReason};
use crate::engine::assignment::{AssignmentStrategy, SlotBookings};
use crate::engine::partitioner::LevelPartition;
use crate::engine::roster::TeacherRoster;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, Default)]
pub struct BuildResult {
    pub classes: Vec<GeneratedClass>,
    pub unassigned: Vec<UnassignedStudent>,
    pub warnings: Vec<String>,
}

pub struct ClassBuilder {
    strategy: Arc<dyn AssignmentStrategy>,
}

impl ClassBuilder {
    pub fn new(strategy: Arc<dyn AssignmentStrategy>) -> Self {
        Self { strategy }
    }

    #[instrument(skip_all, fields(levels = partition.by_level.len()))]
    pub fn build(
        &self,
        partition: &LevelPartition,
        roster: &TeacherRoster,
        levels: &HashMap<String, Level>,
        params: &GenerationParameters,
    ) -> BuildResult {
        let mut result = BuildResult::default();
        let mut bookings = SlotBookings::new();
        let mut workload: HashMap<String, usize> = HashMap::new();

        let mut level_ids: Vec<&String> = partition.by_level.keys().collect();
        let order_of = |id: &str| levels.get(id).map(|l| l.sort_order).unwrap_or(i32::MAX);
        level_ids.sort_by(|a, b| order_of(a).cmp(&order_of(b)).then_with(|| a.cmp(b)));

        for level_id in level_ids {
            let students = &partition.by_level[level_id];
            let level_name = levels
                .get(level_id)
                .map(|l| l.name.clone())
                .unwrap_or_else(|| level_id.clone());

            let mut candidates = roster.qualified_for(level_id);
            if candidates.is_empty() {
                warn!(level_id = %level_id, students = students.len(), "no qualified teacher, level skipped");
                result.warnings.push(format!(
                    "No qualified teacher available for level {}: {} student(s) left unassigned",
                    level_name,
                    students.len()
                ));
                result.unassigned.extend(students.iter().map(|a| UnassignedStudent {
                    student_id: a.student_id.clone(),
                    student_name: a.student_name.clone(),
                    category: a.category,
                    determined_level_id: a.determined_level_id.clone(),
                    assessment_score: a.score,
                    reason: UnassignedReason::NoQualifiedTeacher,
                }));
                continue;
            }

            self.strategy.order_teachers(&mut candidates, &workload, params);

            let (min_size, max_size) = params.size_bounds(level_id);
            let sizes = partition_sizes(students.len(), max_size);
            debug!(level_id = %level_id, students = students.len(), classes = sizes.len(), "partitioned level");

            let mut offset = 0;
            for (index, size) in sizes.into_iter().enumerate() {
                let members = &students[offset..offset + size];
                offset += size;

                let teacher = match self.strategy.choose_teacher(index, &candidates) {
                    Some(t) => t,
                    None => {
                        result.unassigned.extend(members.iter().map(|a| UnassignedStudent {
                            student_id: a.student_id.clone(),
                            student_name: a.student_name.clone(),
                            category: a.category,
                            determined_level_id: a.determined_level_id.clone(),
                            assessment_score: a.score,
                            reason: UnassignedReason::NoQualifiedTeacher,
                        }));
                        continue;
                    }
                };

                let time_slot = self.strategy.choose_slot(teacher, &bookings);
                if let Some(slot) = &time_slot {
                    bookings
                        .entry(teacher.teacher_id.clone())
                        .or_default()
                        .insert(slot.clone());
                }
                *workload.entry(teacher.teacher_id.clone()).or_insert(0) += 1;

                let mut class = GeneratedClass {
                    class_id: uuid::Uuid::new_v4().to_string(),
                    class_name: format!("{} - Class {}", level_name, index + 1),
                    level_id: level_id.clone(),
                    level_name: level_name.clone(),
                    teacher_id: teacher.teacher_id.clone(),
                    teacher_name: teacher.teacher_name.clone(),
                    time_slot,
                    students: members.iter().map(AssignedStudent::from).collect(),
                    min_size,
                    max_size,
                    current_size: 0,
                    class_type: ClassType::ExistingOnly,
                    new_student_percentage: 0.0,
                };
                class.refresh_stats();
                result.classes.push(class);
            }
        }

        if !partition.without_level.is_empty() {
            result.warnings.push(format!(
                "{} validated student(s) have no determined level",
                partition.without_level.len()
            ));
            result
                .unassigned
                .extend(partition.without_level.iter().map(|a| UnassignedStudent {
                    student_id: a.student_id.clone(),
                    student_name: a.student_name.clone(),
                    category: a.category,
                    determined_level_id: None,
                    assessment_score: a.score,
                    reason: UnassignedReason::NoDeterminedLevel,
                }));
        }

        result
    }
}

/// Group sizes for `n` students with at most `max_size` per group.
///
/// `ceil(n / max_size)` groups; the first `n % k` groups get one extra
/// student. Sizes always sum to `n`.
pub fn partition_sizes(n: usize, max_size: usize) -> Vec<usize> {
    if n == 0 {
        return Vec::new();
    }
    let max_size = max_size.max(1);
    let k = n.div_ceil(max_size);
    let base = n / k;
    let remainder = n % k;
    (0..k).map(|i| base + usize::from(i < remainder)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_sizes_even_split() {
        assert_eq!(partition_sizes(18, 10), vec![9, 9]);
        assert_eq!(partition_sizes(20, 10), vec![10, 10]);
    }

    #[test]
    fn test_partition_sizes_distributes_remainder() {
        assert_eq!(partition_sizes(23, 10), vec![8, 8, 7]);
        assert_eq!(partition_sizes(11, 10), vec![6, 5]);
        assert_eq!(partition_sizes(3, 10), vec![3]);
    }

    #[test]
    fn test_partition_sizes_never_drops_students() {
        for n in 0..120 {
            for max in 1..15 {
                let sizes = partition_sizes(n, max);
                assert_eq!(sizes.iter().sum::<usize>(), n, "n={} max={}", n, max);
                assert!(sizes.iter().all(|s| *s <= max && *s > 0));
            }
        }
    }
}
