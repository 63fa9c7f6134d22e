// ==========================================
// Class Generation Engine - Teacher / time-slot assignment strategy
// ==========================================
// ClassBuilder only orchestrates; which teacher and which slot a class
// gets is decided here so a solver-backed strategy can replace the
// round-robin heuristic without touching the builder.
// ==========================================

use crate::domain::parameters::GenerationParameters;
use crate::domain::teacher::TimeSlot;
use crate::domain::types::{CompetencyTier, PriorityStrategy};
use std::collections::{HashMap, HashSet};

// ==========================================
// QualifiedTeacher - a teacher usable for one level
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct QualifiedTeacher {
    pub teacher_id: String,
    pub teacher_name: String,
    pub competency_tier: CompetencyTier,
    pub max_classes_for_level: Option<u32>,
    /// Slots marked available for the term, in grid order.
    pub available_slots: Vec<TimeSlot>,
}

/// Slots already handed out during the current build, per teacher.
pub type SlotBookings = HashMap<String, HashSet<TimeSlot>>;

// ==========================================
// AssignmentStrategy
// ==========================================
pub trait AssignmentStrategy: Send + Sync {
    /// Orders the level's candidates before classes are dealt out.
    ///
    /// `workload` is the number of classes each teacher already holds in this build.
    fn order_teachers(
        &self,
        candidates: &mut Vec<QualifiedTeacher>,
        workload: &HashMap<String, usize>,
        params: &GenerationParameters,
    );

    /// Teacher for the `class_index`-th class of a level.
    fn choose_teacher<'a>(
        &self,
        class_index: usize,
        candidates: &'a [QualifiedTeacher],
    ) -> Option<&'a QualifiedTeacher>;

    /// Slot for a class taught by `teacher`; `None` means TBD.
    fn choose_slot(&self, teacher: &QualifiedTeacher, booked: &SlotBookings) -> Option<TimeSlot>;
}

// ==========================================
// RoundRobinAssignment - default heuristic
// ==========================================
// teacher = candidates[i % n]
// slot    = teacher's first available slot not yet booked in this build;
//           if every slot is booked the first one is reused and the
//           ConstraintChecker reports the double booking.
#[derive(Debug, Default, Clone, Copy)]
pub struct RoundRobinAssignment;

impl RoundRobinAssignment {
    pub fn new() -> Self {
        Self
    }
}

impl AssignmentStrategy for RoundRobinAssignment {
    fn order_teachers(
        &self,
        candidates: &mut Vec<QualifiedTeacher>,
        workload: &HashMap<String, usize>,
        params: &GenerationParameters,
    ) {
        // sort_by_key is stable: ties keep repository order
        match params.priority_strategy {
            PriorityStrategy::Balance => {
                if params.optimize_for_teacher_workload {
                    candidates.sort_by_key(|t| workload.get(&t.teacher_id).copied().unwrap_or(0));
                }
            }
            PriorityStrategy::MinimizeConflicts => {
                candidates.sort_by_key(|t| std::cmp::Reverse(t.available_slots.len()));
            }
            PriorityStrategy::MaximizeUtilization => {
                candidates.sort_by_key(|t| std::cmp::Reverse(t.competency_tier));
            }
        }
    }

    fn choose_teacher<'a>(
        &self,
        class_index: usize,
        candidates: &'a [QualifiedTeacher],
    ) -> Option<&'a QualifiedTeacher> {
        if candidates.is_empty() {
            return None;
        }
        candidates.get(class_index % candidates.len())
    }

    fn choose_slot(&self, teacher: &QualifiedTeacher, booked: &SlotBookings) -> Option<TimeSlot> {
        let taken = booked.get(&teacher.teacher_id);
        teacher
            .available_slots
            .iter()
            .find(|slot| taken.map_or(true, |t| !t.contains(*slot)))
            .or_else(|| teacher.available_slots.first())
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::DayOfWeek;

    fn slot(day: DayOfWeek, session: &str) -> TimeSlot {
        TimeSlot {
            day_of_week: day,
            session_id: session.to_string(),
            session_name: session.to_string(),
        }
    }

    fn teacher(id: &str, tier: CompetencyTier, slots: Vec<TimeSlot>) -> QualifiedTeacher {
        QualifiedTeacher {
            teacher_id: id.to_string(),
            teacher_name: format!("Ustadz {}", id),
            competency_tier: tier,
            max_classes_for_level: None,
            available_slots: slots,
        }
    }

    #[test]
    fn test_choose_teacher_round_robin() {
        let strategy = RoundRobinAssignment::new();
        let candidates = vec![
            teacher("T1", CompetencyTier::Junior, vec![]),
            teacher("T2", CompetencyTier::Junior, vec![]),
        ];

        let picked: Vec<&str> = (0..5)
            .filter_map(|i| strategy.choose_teacher(i, &candidates))
            .map(|t| t.teacher_id.as_str())
            .collect();
        assert_eq!(picked, vec!["T1", "T2", "T1", "T2", "T1"]);
        assert!(strategy.choose_teacher(0, &[]).is_none());
    }

    #[test]
    fn test_choose_slot_skips_booked_then_falls_back() {
        let strategy = RoundRobinAssignment::new();
        let pagi = slot(DayOfWeek::Monday, "Pagi");
        let siang = slot(DayOfWeek::Monday, "Siang");
        let t = teacher("T1", CompetencyTier::Senior, vec![pagi.clone(), siang.clone()]);

        let mut booked = SlotBookings::new();
        assert_eq!(strategy.choose_slot(&t, &booked), Some(pagi.clone()));

        booked.entry("T1".to_string()).or_default().insert(pagi.clone());
        assert_eq!(strategy.choose_slot(&t, &booked), Some(siang.clone()));

        booked.entry("T1".to_string()).or_default().insert(siang);
        assert_eq!(strategy.choose_slot(&t, &booked), Some(pagi));

        let no_slots = teacher("T2", CompetencyTier::Senior, vec![]);
        assert_eq!(strategy.choose_slot(&no_slots, &booked), None);
    }

    #[test]
    fn test_order_teachers_by_workload() {
        let strategy = RoundRobinAssignment::new();
        let mut candidates = vec![
            teacher("T1", CompetencyTier::Junior, vec![]),
            teacher("T2", CompetencyTier::Expert, vec![]),
        ];
        let workload = HashMap::from([("T1".to_string(), 2usize)]);

        strategy.order_teachers(&mut candidates, &workload, &GenerationParameters::default());
        assert_eq!(candidates[0].teacher_id, "T2");
    }
}
