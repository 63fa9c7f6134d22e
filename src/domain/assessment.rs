// ==========================================
// Class Generation Engine - Assessment domain model
// ==========================================
// Produced by the placement-test / term-exam workflow.
// Read-only to the engine.
// ==========================================

use crate::domain::types::StudentCategory;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Level - competency level students are placed into
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub level_id: String,
    pub name: String,     // e.g. "Tahsin 1"
    pub sort_order: i32,
}

// ==========================================
// AssessmentRecord - one student's placement result for a term
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRecord {
    pub assessment_id: String,
    pub student_id: String,
    pub student_name: String,
    pub term_id: String,
    pub category: StudentCategory,
    pub determined_level_id: Option<String>, // NULL until validated
    pub score: Option<f64>,
    pub grade: Option<String>,
    pub validated: bool,
    pub created_at: NaiveDateTime,
}

impl AssessmentRecord {
    pub fn is_new_student(&self) -> bool {
        self.category == StudentCategory::New
    }
}
