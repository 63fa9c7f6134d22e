// ==========================================
// Class Generation Engine - Teacher domain model
// ==========================================
// Qualifications and availability are collected upstream
// and are read-only during a generation run.
// ==========================================

use crate::domain::types::{CompetencyTier, DayOfWeek};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teacher {
    pub teacher_id: String,
    pub full_name: String,
    pub is_active: bool,
}

// ==========================================
// TeacherLevelQualification
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherLevelQualification {
    pub teacher_id: String,
    pub level_id: String,
    pub term_id: String,
    pub competency_tier: CompetencyTier,
    pub max_classes_for_level: Option<u32>,
}

// ==========================================
// TimeSlot - (day, session) pair a class meets in
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeSlot {
    pub day_of_week: DayOfWeek,
    pub session_id: String,
    pub session_name: String,
}

impl TimeSlot {
    /// e.g. "Senin Pagi"
    pub fn display(&self) -> String {
        format!("{} {}", self.day_of_week.display_name(), self.session_name)
    }

    /// Identity of the slot, ignoring the display name.
    pub fn key(&self) -> (DayOfWeek, &str) {
        (self.day_of_week, self.session_id.as_str())
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

// ==========================================
// AvailabilitySlot - one cell of a teacher's submitted grid
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub teacher_id: String,
    pub term_id: String,
    pub day_of_week: DayOfWeek,
    pub session_id: String,
    pub session_name: String,
    pub is_available: bool,
}

impl AvailabilitySlot {
    pub fn time_slot(&self) -> TimeSlot {
        TimeSlot {
            day_of_week: self.day_of_week,
            session_id: self.session_id.clone(),
            session_name: self.session_name.clone(),
        }
    }
}
