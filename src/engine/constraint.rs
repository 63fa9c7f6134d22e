// ==========================================
// Class Generation Engine - Constraint checker
// ==========================================
// Size:       current < min -> UNDERSIZED, current > max -> OVERSIZED
// Scheduling: same teacher + same slot     -> TEACHER_DOUBLE_BOOKING (HIGH)
//             no slot                      -> MISSING_TIME_SLOT (MEDIUM)
//             over max classes per teacher
//             or per (teacher, level)      -> TEACHER_OVERLOAD (LOW)
// ==========================================

use crate::domain::parameters::GenerationParameters;
use crate::domain::proposal::{Conflict, GeneratedClass, SizeViolation};
use crate::domain::teacher::TimeSlot;
use crate::domain::types::{ConflictType, ViolationKind};
use crate::engine::roster::TeacherLimits;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintReport {
    pub size_violations: Vec<SizeViolation>,
    pub conflicts: Vec<Conflict>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ConstraintChecker;

impl ConstraintChecker {
    pub fn new() -> Self {
        Self
    }

    pub fn check(
        &self,
        classes: &[GeneratedClass],
        params: &GenerationParameters,
        limits: &TeacherLimits,
    ) -> ConstraintReport {
        let mut report = ConstraintReport {
            size_violations: self.check_sizes(classes, params),
            conflicts: Vec::new(),
        };
        self.check_double_booking(classes, &mut report.conflicts);
        self.check_missing_slots(classes, &mut report.conflicts);
        self.check_workload(classes, params, limits, &mut report.conflicts);
        report
    }

    pub fn check_sizes(
        &self,
        classes: &[GeneratedClass],
        params: &GenerationParameters,
    ) -> Vec<SizeViolation> {
        classes
            .iter()
            .filter_map(|class| {
                let kind = if class.current_size < class.min_size {
                    ViolationKind::Undersized
                } else if class.current_size > class.max_size {
                    ViolationKind::Oversized
                } else {
                    return None;
                };
                Some(SizeViolation {
                    class_id: class.class_id.clone(),
                    class_name: class.class_name.clone(),
                    kind,
                    current_size: class.current_size,
                    target_min: class.min_size,
                    target_max: class.max_size,
                    requires_approval: !params.allow_undersized_classes,
                })
            })
            .collect()
    }

    fn check_double_booking(&self, classes: &[GeneratedClass], conflicts: &mut Vec<Conflict>) {
        let mut by_teacher_slot: BTreeMap<(&str, &TimeSlot), Vec<&GeneratedClass>> = BTreeMap::new();
        for class in classes {
            if let Some(slot) = &class.time_slot {
                by_teacher_slot
                    .entry((class.teacher_id.as_str(), slot))
                    .or_default()
                    .push(class);
            }
        }

        for ((_, slot), group) in by_teacher_slot {
            if group.len() < 2 {
                continue;
            }
            let names: Vec<&str> = group.iter().map(|c| c.class_name.as_str()).collect();
            conflicts.push(conflict(
                ConflictType::TeacherDoubleBooking,
                format!(
                    "{} is booked for {} classes at {}: {}",
                    group[0].teacher_name,
                    group.len(),
                    slot.display(),
                    names.join(", ")
                ),
                group.iter().map(|c| c.class_id.clone()).collect(),
            ));
        }
    }

    fn check_missing_slots(&self, classes: &[GeneratedClass], conflicts: &mut Vec<Conflict>) {
        for class in classes.iter().filter(|c| c.time_slot.is_none()) {
            conflicts.push(conflict(
                ConflictType::MissingTimeSlot,
                format!(
                    "{} has no time slot: {} has no free availability",
                    class.class_name, class.teacher_name
                ),
                vec![class.class_id.clone()],
            ));
        }
    }

    fn check_workload(
        &self,
        classes: &[GeneratedClass],
        params: &GenerationParameters,
        limits: &TeacherLimits,
        conflicts: &mut Vec<Conflict>,
    ) {
        let mut per_teacher: BTreeMap<&str, Vec<&GeneratedClass>> = BTreeMap::new();
        let mut per_teacher_level: BTreeMap<(&str, &str), Vec<&GeneratedClass>> = BTreeMap::new();
        for class in classes {
            per_teacher.entry(class.teacher_id.as_str()).or_default().push(class);
            per_teacher_level
                .entry((class.teacher_id.as_str(), class.level_id.as_str()))
                .or_default()
                .push(class);
        }

        for (_, group) in per_teacher {
            if group.len() > params.max_classes_per_teacher {
                conflicts.push(conflict(
                    ConflictType::TeacherOverload,
                    format!(
                        "{} teaches {} classes (max {})",
                        group[0].teacher_name,
                        group.len(),
                        params.max_classes_per_teacher
                    ),
                    group.iter().map(|c| c.class_id.clone()).collect(),
                ));
            }
        }

        for ((teacher_id, level_id), group) in per_teacher_level {
            let Some(max) = limits.max_for(teacher_id, level_id) else {
                continue;
            };
            if group.len() > max as usize {
                conflicts.push(conflict(
                    ConflictType::TeacherOverload,
                    format!(
                        "{} teaches {} classes of {} (max {} for this level)",
                        group[0].teacher_name,
                        group.len(),
                        group[0].level_name,
                        max
                    ),
                    group.iter().map(|c| c.class_id.clone()).collect(),
                ));
            }
        }
    }
}

fn conflict(conflict_type: ConflictType, description: String, affected: Vec<String>) -> Conflict {
    Conflict {
        conflict_type,
        severity: conflict_type.severity(),
        description,
        affected_class_ids: affected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{ClassType, ConflictSeverity, DayOfWeek};

    fn class(id: &str, teacher: &str, size: usize, slot: Option<&str>) -> GeneratedClass {
        GeneratedClass {
            class_id: id.to_string(),
            class_name: format!("Class {}", id),
            level_id: "L1".to_string(),
            level_name: "Tahsin 1".to_string(),
            teacher_id: teacher.to_string(),
            teacher_name: format!("Ustadz {}", teacher),
            time_slot: slot.map(|s| TimeSlot {
                day_of_week: DayOfWeek::Monday,
                session_id: s.to_string(),
                session_name: s.to_string(),
            }),
            students: Vec::new(),
            min_size: 7,
            max_size: 10,
            current_size: size,
            class_type: ClassType::Mixed,
            new_student_percentage: 0.0,
        }
    }

    #[test]
    fn test_size_violations() {
        let params = GenerationParameters::default();
        let classes = vec![
            class("c1", "T1", 5, Some("S1")),
            class("c2", "T2", 12, Some("S1")),
            class("c3", "T3", 8, Some("S1")),
        ];

        let report = ConstraintChecker::new().check(&classes, &params, &TeacherLimits::default());
        assert_eq!(report.size_violations.len(), 2);
        assert_eq!(report.size_violations[0].kind, ViolationKind::Undersized);
        assert_eq!(report.size_violations[1].kind, ViolationKind::Oversized);
        assert!(report.size_violations.iter().all(|v| v.requires_approval));
        assert!(report.conflicts.is_empty());

        let lenient = GenerationParameters {
            allow_undersized_classes: true,
            ..GenerationParameters::default()
        };
        let report = ConstraintChecker::new().check(&classes, &lenient, &TeacherLimits::default());
        assert!(report.size_violations.iter().all(|v| !v.requires_approval));
    }

    #[test]
    fn test_double_booking_and_missing_slot() {
        let classes = vec![
            class("c1", "T1", 8, Some("S1")),
            class("c2", "T1", 8, Some("S1")),
            class("c3", "T1", 8, Some("S2")),
            class("c4", "T2", 8, None),
        ];

        let report = ConstraintChecker::new().check(
            &classes,
            &GenerationParameters::default(),
            &TeacherLimits::default(),
        );

        assert_eq!(report.conflicts.len(), 2);
        let booking = &report.conflicts[0];
        assert_eq!(booking.conflict_type, ConflictType::TeacherDoubleBooking);
        assert_eq!(booking.severity, ConflictSeverity::High);
        assert_eq!(booking.affected_class_ids, vec!["c1", "c2"]);

        let missing = &report.conflicts[1];
        assert_eq!(missing.conflict_type, ConflictType::MissingTimeSlot);
        assert_eq!(missing.severity, ConflictSeverity::Medium);
    }

    #[test]
    fn test_workload_overload_is_low() {
        let params = GenerationParameters {
            max_classes_per_teacher: 1,
            ..GenerationParameters::default()
        };
        let classes = vec![class("c1", "T1", 8, Some("S1")), class("c2", "T1", 8, Some("S2"))];
        let mut limits = TeacherLimits::default();
        limits
            .per_level
            .insert(("T1".to_string(), "L1".to_string()), 1);

        let report = ConstraintChecker::new().check(&classes, &params, &limits);
        assert_eq!(report.conflicts.len(), 2);
        assert!(report
            .conflicts
            .iter()
            .all(|c| c.conflict_type == ConflictType::TeacherOverload
                && c.severity == ConflictSeverity::Low));
    }
}
