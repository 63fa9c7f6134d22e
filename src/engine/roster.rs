// ==========================================
// Class Generation Engine - Teacher roster
// ==========================================
// Read-only view over teachers, level qualifications and availability
// for one term. Built once per request; later edits to the upstream
// tables do not affect a roster already in use.
// ==========================================

use crate::domain::teacher::{AvailabilitySlot, Teacher, TeacherLevelQualification, TimeSlot};
use crate::engine::assignment::QualifiedTeacher;
use std::collections::{BTreeSet, HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct TeacherRoster {
    teachers: HashMap<String, Teacher>,
    qualifications: Vec<TeacherLevelQualification>,
    /// teacher_id -> available slots, grid order
    slots: HashMap<String, Vec<TimeSlot>>,
    submitted: HashSet<String>,
}

impl TeacherRoster {
    pub fn new(
        teachers: Vec<Teacher>,
        qualifications: Vec<TeacherLevelQualification>,
        availability: Vec<AvailabilitySlot>,
    ) -> Self {
        let mut submitted = HashSet::new();
        let mut grid: HashMap<String, BTreeSet<TimeSlot>> = HashMap::new();
        for cell in &availability {
            submitted.insert(cell.teacher_id.clone());
            if cell.is_available {
                grid.entry(cell.teacher_id.clone())
                    .or_default()
                    .insert(cell.time_slot());
            }
        }

        Self {
            teachers: teachers
                .into_iter()
                .map(|t| (t.teacher_id.clone(), t))
                .collect(),
            qualifications,
            slots: grid
                .into_iter()
                .map(|(id, set)| (id, set.into_iter().collect()))
                .collect(),
            submitted,
        }
    }

    /// Active teachers qualified for the level who submitted availability,
    /// ordered by teacher_id.
    pub fn qualified_for(&self, level_id: &str) -> Vec<QualifiedTeacher> {
        let mut out: Vec<QualifiedTeacher> = self
            .qualifications
            .iter()
            .filter(|q| q.level_id == level_id)
            .filter_map(|q| self.to_qualified(q))
            .collect();
        out.sort_by(|a, b| a.teacher_id.cmp(&b.teacher_id));
        out.dedup_by(|a, b| a.teacher_id == b.teacher_id);
        out
    }

    /// One teacher as a candidate for `level_id`, if qualified and available.
    pub fn find_qualified(&self, teacher_id: &str, level_id: &str) -> Option<QualifiedTeacher> {
        self.qualifications
            .iter()
            .find(|q| q.teacher_id == teacher_id && q.level_id == level_id)
            .and_then(|q| self.to_qualified(q))
    }

    fn to_qualified(&self, q: &TeacherLevelQualification) -> Option<QualifiedTeacher> {
        let teacher = self.teachers.get(&q.teacher_id).filter(|t| t.is_active)?;
        if !self.submitted.contains(&q.teacher_id) {
            return None;
        }
        Some(QualifiedTeacher {
            teacher_id: teacher.teacher_id.clone(),
            teacher_name: teacher.full_name.clone(),
            competency_tier: q.competency_tier,
            max_classes_for_level: q.max_classes_for_level,
            available_slots: self.slots.get(&q.teacher_id).cloned().unwrap_or_default(),
        })
    }

    pub fn teacher_name(&self, teacher_id: &str) -> Option<&str> {
        self.teachers.get(teacher_id).map(|t| t.full_name.as_str())
    }

    pub fn active_teachers(&self) -> impl Iterator<Item = &Teacher> {
        self.teachers.values().filter(|t| t.is_active)
    }

    pub fn available_slots(&self, teacher_id: &str) -> &[TimeSlot] {
        self.slots.get(teacher_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Level ids a teacher is qualified for.
    pub fn levels_of(&self, teacher_id: &str) -> Vec<String> {
        self.qualifications
            .iter()
            .filter(|q| q.teacher_id == teacher_id)
            .map(|q| q.level_id.clone())
            .collect()
    }

    /// Every distinct slot any teacher marked available, grid order.
    pub fn all_slots(&self) -> Vec<TimeSlot> {
        let set: BTreeSet<TimeSlot> = self.slots.values().flatten().cloned().collect();
        set.into_iter().collect()
    }

    /// Sum of available cells over all teachers.
    pub fn total_available_slots(&self) -> usize {
        self.slots.values().map(Vec::len).sum()
    }

    pub fn limits(&self) -> TeacherLimits {
        TeacherLimits {
            per_level: self
                .qualifications
                .iter()
                .filter_map(|q| {
                    q.max_classes_for_level
                        .map(|m| ((q.teacher_id.clone(), q.level_id.clone()), m))
                })
                .collect(),
        }
    }
}

// ==========================================
// TeacherLimits - per (teacher, level) class caps
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeacherLimits {
    pub per_level: HashMap<(String, String), u32>,
}

impl TeacherLimits {
    pub fn max_for(&self, teacher_id: &str, level_id: &str) -> Option<u32> {
        self.per_level
            .get(&(teacher_id.to_string(), level_id.to_string()))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{CompetencyTier, DayOfWeek};

    fn teacher(id: &str, active: bool) -> Teacher {
        Teacher {
            teacher_id: id.to_string(),
            full_name: format!("Ustadz {}", id),
            is_active: active,
        }
    }

    fn qualification(teacher_id: &str, level_id: &str) -> TeacherLevelQualification {
        TeacherLevelQualification {
            teacher_id: teacher_id.to_string(),
            level_id: level_id.to_string(),
            term_id: "T2026".to_string(),
            competency_tier: CompetencyTier::Senior,
            max_classes_for_level: Some(2),
        }
    }

    fn cell(teacher_id: &str, day: DayOfWeek, session: &str, available: bool) -> AvailabilitySlot {
        AvailabilitySlot {
            teacher_id: teacher_id.to_string(),
            term_id: "T2026".to_string(),
            day_of_week: day,
            session_id: session.to_string(),
            session_name: session.to_string(),
            is_available: available,
        }
    }

    #[test]
    fn test_qualified_requires_active_and_submitted() {
        let roster = TeacherRoster::new(
            vec![teacher("T1", true), teacher("T2", false), teacher("T3", true)],
            vec![
                qualification("T1", "L1"),
                qualification("T2", "L1"),
                qualification("T3", "L1"),
            ],
            vec![
                cell("T1", DayOfWeek::Tuesday, "S1", true),
                cell("T1", DayOfWeek::Monday, "S2", true),
                cell("T1", DayOfWeek::Monday, "S1", false),
                cell("T2", DayOfWeek::Monday, "S1", true),
            ],
        );

        let qualified = roster.qualified_for("L1");
        assert_eq!(qualified.len(), 1);
        assert_eq!(qualified[0].teacher_id, "T1");
        // Monday sorts before Tuesday; the unavailable cell is dropped
        assert_eq!(qualified[0].available_slots.len(), 2);
        assert_eq!(qualified[0].available_slots[0].day_of_week, DayOfWeek::Monday);

        assert_eq!(roster.total_available_slots(), 3);
        assert_eq!(roster.limits().max_for("T1", "L1"), Some(2));
    }
}
