// ==========================================
// Readiness gate over a real database
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

use class_generation::domain::{DayOfWeek, StudentCategory};
use test_helpers::*;

#[test]
fn test_complete_term_can_generate() {
    let (_file, state) = setup_state();
    seed_standard_term(&state, 18);

    let readiness = state.class_generation_api.readiness(TERM).unwrap();

    assert!(readiness.can_generate);
    assert_eq!(readiness.student_data_completeness, 100.0);
    assert_eq!(readiness.teacher_availability_completeness, 100.0);
    assert_eq!(readiness.level_assignment_completeness, 100.0);
    assert!(readiness.blocking_issues.is_empty());
    assert!(readiness.warnings.is_empty());
    assert_eq!(readiness.recommended_parameters.default_min_class_size, 7);
    assert_eq!(readiness.recommended_parameters.default_max_class_size, 10);
}

#[test]
fn test_missing_availability_blocks() {
    let (_file, state) = setup_state();
    seed_level(&state, "L1", "Tahsin 1", 1);
    for id in ["T1", "T2", "T3", "T4", "T5"] {
        seed_teacher(&state, id, &["L1"], &[(DayOfWeek::Monday, "Pagi")]);
    }
    seed_teacher_without_grid(&state, "T6", &["L1"]);
    seed_students(&state, "s", Some("L1"), 10, StudentCategory::New);

    let readiness = state.class_generation_api.readiness(TERM).unwrap();

    assert_eq!(readiness.teacher_availability_completeness, 83.3);
    assert!(!readiness.can_generate);
    assert_eq!(readiness.blocking_issues.len(), 1);
    assert!(readiness.blocking_issues[0].contains("83.3%"));
}

#[test]
fn test_unvalidated_assessments_block() {
    let (_file, state) = setup_state();
    seed_standard_term(&state, 6);
    seed_assessments(&state, "u", None, 4, StudentCategory::New, false);

    let readiness = state.class_generation_api.readiness(TERM).unwrap();

    // 6 of 10 validated
    assert_eq!(readiness.student_data_completeness, 60.0);
    assert!(!readiness.can_generate);
}

#[test]
fn test_low_level_coverage_only_warns() {
    let (_file, state) = setup_state();
    seed_level(&state, "L1", "Tahsin 1", 1);
    seed_teacher(&state, "T1", &["L1"], &[(DayOfWeek::Monday, "Pagi")]);
    seed_teacher(&state, "T2", &[], &[(DayOfWeek::Monday, "Sore")]);
    seed_students(&state, "s", Some("L1"), 8, StudentCategory::Existing);

    let readiness = state.class_generation_api.readiness(TERM).unwrap();

    assert_eq!(readiness.level_assignment_completeness, 50.0);
    assert!(readiness.can_generate);
    assert_eq!(readiness.warnings.len(), 1);
}

#[test]
fn test_empty_term_reports_zero_and_blocks() {
    let (_file, state) = setup_state();

    let readiness = state.class_generation_api.readiness(TERM).unwrap();

    assert_eq!(readiness.student_data_completeness, 0.0);
    assert_eq!(readiness.teacher_availability_completeness, 0.0);
    assert!(!readiness.can_generate);
}

#[test]
fn test_empty_term_id_is_invalid_input() {
    let (_file, state) = setup_state();
    let err = state.class_generation_api.readiness("  ").unwrap_err();
    assert_eq!(err.code(), "INVALID_INPUT");
}
