// ==========================================
// Class Generation Engine - Domain enums
// ==========================================
// Every enum round-trips through a SCREAMING_SNAKE db string
// (`to_db_str` / `from_str`) and serde uses the same spelling.
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Student category
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StudentCategory {
    New,      // placement test this term
    Existing, // promoted via term exam
}

impl fmt::Display for StudentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl StudentCategory {
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "NEW" => StudentCategory::New,
            _ => StudentCategory::Existing,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            StudentCategory::New => "NEW",
            StudentCategory::Existing => "EXISTING",
        }
    }
}

// ==========================================
// Day of week (teacher availability grid)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl DayOfWeek {
    /// Parses a db value; unknown strings yield `None`.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "MONDAY" => Some(DayOfWeek::Monday),
            "TUESDAY" => Some(DayOfWeek::Tuesday),
            "WEDNESDAY" => Some(DayOfWeek::Wednesday),
            "THURSDAY" => Some(DayOfWeek::Thursday),
            "FRIDAY" => Some(DayOfWeek::Friday),
            "SATURDAY" => Some(DayOfWeek::Saturday),
            "SUNDAY" => Some(DayOfWeek::Sunday),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "MONDAY",
            DayOfWeek::Tuesday => "TUESDAY",
            DayOfWeek::Wednesday => "WEDNESDAY",
            DayOfWeek::Thursday => "THURSDAY",
            DayOfWeek::Friday => "FRIDAY",
            DayOfWeek::Saturday => "SATURDAY",
            DayOfWeek::Sunday => "SUNDAY",
        }
    }

    /// Day name as shown on printed schedules.
    pub fn display_name(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Senin",
            DayOfWeek::Tuesday => "Selasa",
            DayOfWeek::Wednesday => "Rabu",
            DayOfWeek::Thursday => "Kamis",
            DayOfWeek::Friday => "Jumat",
            DayOfWeek::Saturday => "Sabtu",
            DayOfWeek::Sunday => "Minggu",
        }
    }
}

// ==========================================
// Teacher competency tier for a level
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompetencyTier {
    Junior,
    Senior,
    Expert,
}

impl fmt::Display for CompetencyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl CompetencyTier {
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "EXPERT" => CompetencyTier::Expert,
            "SENIOR" => CompetencyTier::Senior,
            _ => CompetencyTier::Junior,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            CompetencyTier::Junior => "JUNIOR",
            CompetencyTier::Senior => "SENIOR",
            CompetencyTier::Expert => "EXPERT",
        }
    }
}

// ==========================================
// Proposal status
// ==========================================
// DRAFT --transfer--> DRAFT
// DRAFT --approve--> APPROVED (terminal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposalStatus {
    Draft,
    Approved,
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl ProposalStatus {
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "APPROVED" => ProposalStatus::Approved,
            _ => ProposalStatus::Draft,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ProposalStatus::Draft => "DRAFT",
            ProposalStatus::Approved => "APPROVED",
        }
    }
}

// ==========================================
// Class composition
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClassType {
    NewOnly,
    ExistingOnly,
    Mixed,
}

impl fmt::Display for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl ClassType {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ClassType::NewOnly => "NEW_ONLY",
            ClassType::ExistingOnly => "EXISTING_ONLY",
            ClassType::Mixed => "MIXED",
        }
    }
}

// ==========================================
// Size violation kind
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationKind {
    Undersized,
    Oversized,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::Undersized => write!(f, "UNDERSIZED"),
            ViolationKind::Oversized => write!(f, "OVERSIZED"),
        }
    }
}

// ==========================================
// Conflict severity / type
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictSeverity {
    Low,
    Medium,
    High,
}

impl fmt::Display for ConflictSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictSeverity::Low => write!(f, "LOW"),
            ConflictSeverity::Medium => write!(f, "MEDIUM"),
            ConflictSeverity::High => write!(f, "HIGH"),
        }
    }
}

impl ConflictSeverity {
    /// MEDIUM and HIGH conflicts block approval.
    pub fn blocks_approval(&self) -> bool {
        *self >= ConflictSeverity::Medium
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictType {
    TeacherDoubleBooking,
    MissingTimeSlot,
    TeacherOverload,
}

impl ConflictType {
    pub fn severity(&self) -> ConflictSeverity {
        match self {
            ConflictType::TeacherDoubleBooking => ConflictSeverity::High,
            ConflictType::MissingTimeSlot => ConflictSeverity::Medium,
            ConflictType::TeacherOverload => ConflictSeverity::Low,
        }
    }
}

// ==========================================
// Priority strategy (generation parameter)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriorityStrategy {
    #[default]
    Balance,
    MinimizeConflicts,
    MaximizeUtilization,
}

impl std::str::FromStr for PriorityStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "BALANCE" => Ok(PriorityStrategy::Balance),
            "MINIMIZE_CONFLICTS" => Ok(PriorityStrategy::MinimizeConflicts),
            "MAXIMIZE_UTILIZATION" => Ok(PriorityStrategy::MaximizeUtilization),
            other => Err(format!("unknown priority strategy: {}", other)),
        }
    }
}

// ==========================================
// Why a validated student did not land in a class
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnassignedReason {
    NoQualifiedTeacher,
    NoDeterminedLevel,
}

// ==========================================
// Audit action type
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenerationActionType {
    Generation,
    ManualEdit,
    Approval,
}

impl GenerationActionType {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            GenerationActionType::Generation => "GENERATION",
            GenerationActionType::ManualEdit => "MANUAL_EDIT",
            GenerationActionType::Approval => "APPROVAL",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "APPROVAL" => GenerationActionType::Approval,
            "MANUAL_EDIT" => GenerationActionType::ManualEdit,
            _ => GenerationActionType::Generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_blocks_approval() {
        assert!(!ConflictSeverity::Low.blocks_approval());
        assert!(ConflictSeverity::Medium.blocks_approval());
        assert!(ConflictSeverity::High.blocks_approval());
    }

    #[test]
    fn test_priority_strategy_parse() {
        assert_eq!(
            "minimize-conflicts".parse::<PriorityStrategy>(),
            Ok(PriorityStrategy::MinimizeConflicts)
        );
        assert!("FASTEST".parse::<PriorityStrategy>().is_err());
    }

    #[test]
    fn test_day_of_week_db_roundtrip() {
        assert_eq!(DayOfWeek::from_str("friday"), Some(DayOfWeek::Friday));
        assert_eq!(DayOfWeek::from_str("someday"), None);
        assert_eq!(DayOfWeek::Monday.display_name(), "Senin");
    }
}
