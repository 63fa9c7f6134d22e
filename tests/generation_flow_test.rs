// ==========================================
// Generation: readiness -> generate -> stored runs
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

use class_generation::config::{class_size_keys, config_keys};
use class_generation::domain::{
    ConflictType, DayOfWeek, GenerationActionType, GenerationParameters, ProposalStatus,
    StudentCategory, UnassignedReason,
};
use test_helpers::*;

#[test]
fn test_eighteen_students_split_nine_nine() {
    let (_file, state) = setup_state();
    seed_standard_term(&state, 18);
    let api = &state.class_generation_api;

    let proposal = api.generate(TERM, None, "admin").unwrap();

    assert_eq!(proposal.run_number, 1);
    assert_eq!(proposal.status, ProposalStatus::Draft);
    assert_eq!(proposal.classes.len(), 2);
    for class in &proposal.classes {
        assert_eq!(class.current_size, 9);
        assert_eq!(class.students.len(), 9);
    }
    assert!(proposal.size_violations.is_empty());
    assert!(proposal.conflicts.is_empty());
    assert_eq!(proposal.optimization_score, 110.0);
    assert_eq!(proposal.classes[0].session_display(), "Senin Pagi");
    assert_eq!(proposal.classes[1].session_display(), "Selasa Sore");
    assert_eq!(proposal.metrics.total_students_assigned, 18);
    assert_eq!(proposal.metrics.teachers_utilized, 2);

    let stored = api.get_proposal(&proposal.proposal_id).unwrap();
    assert_eq!(stored.classes, proposal.classes);
    assert_eq!(stored.optimization_score, proposal.optimization_score);
}

#[test]
fn test_run_numbers_are_sequential_and_history_is_kept() {
    let (_file, state) = setup_state();
    seed_standard_term(&state, 18);
    let api = &state.class_generation_api;

    let first = api.generate(TERM, None, "admin").unwrap();
    let second = api.generate(TERM, None, "admin").unwrap();
    let third = api.generate(TERM, None, "admin").unwrap();

    assert_eq!(
        (first.run_number, second.run_number, third.run_number),
        (1, 2, 3)
    );

    let runs = api.list_proposals(TERM).unwrap();
    assert_eq!(
        runs.iter().map(|p| p.run_number).collect::<Vec<_>>(),
        vec![3, 2, 1]
    );
    // earlier runs are untouched snapshots
    assert_eq!(runs[2].proposal_id, first.proposal_id);
    assert_eq!(runs[2].classes, first.classes);
}

#[test]
fn test_level_without_teacher_is_unassigned_with_warning() {
    let (_file, state) = setup_state();
    seed_standard_term(&state, 18);
    seed_level(&state, "L2", "Tahsin 2", 2);
    seed_students(&state, "t", Some("L2"), 5, StudentCategory::New);

    let proposal = state
        .class_generation_api
        .generate(TERM, None, "admin")
        .unwrap();

    assert!(proposal.classes.iter().all(|c| c.level_id == "L1"));
    assert_eq!(proposal.unassigned_students.len(), 5);
    assert!(proposal
        .unassigned_students
        .iter()
        .all(|u| u.reason == UnassignedReason::NoQualifiedTeacher));
    assert_eq!(proposal.warnings.len(), 1);
    assert!(proposal.warnings[0].contains("Tahsin 2"));
    assert_eq!(proposal.metrics.unassigned_students, 5);
    assert_eq!(proposal.total_enrolled() + proposal.unassigned_students.len(), 23);
}

#[test]
fn test_every_student_is_placed_or_reported() {
    for n in [1, 9, 11, 21, 29] {
        let (_file, state) = setup_state();
        seed_standard_term(&state, n);
        seed_students(&state, "x", None, 2, StudentCategory::New);

        let proposal = state
            .class_generation_api
            .generate(TERM, None, "admin")
            .unwrap();

        assert_eq!(
            proposal.total_enrolled() + proposal.unassigned_students.len(),
            n + 2,
            "n={}",
            n
        );
        let no_level = proposal
            .unassigned_students
            .iter()
            .filter(|u| u.reason == UnassignedReason::NoDeterminedLevel)
            .count();
        assert_eq!(no_level, 2);
    }
}

#[test]
fn test_teacher_without_slot_raises_missing_time_slot() {
    let (_file, state) = setup_state();
    seed_level(&state, "L1", "Tahsin 1", 1);
    seed_teacher(&state, "T1", &["L1"], &[]);
    seed_students(&state, "s", Some("L1"), 8, StudentCategory::Existing);

    let proposal = state
        .class_generation_api
        .generate(TERM, None, "admin")
        .unwrap();

    assert_eq!(proposal.classes.len(), 1);
    assert_eq!(proposal.classes[0].time_slot, None);
    assert_eq!(proposal.classes[0].session_display(), "TBD");
    assert_eq!(proposal.conflicts.len(), 1);
    assert_eq!(proposal.conflicts[0].conflict_type, ConflictType::MissingTimeSlot);
    assert!(!proposal.can_approve());
}

#[test]
fn test_configured_level_sizes_are_used() {
    let (_file, state) = setup_state();
    seed_standard_term(&state, 18);
    {
        let conn = rusqlite::Connection::open(&state.db_path).unwrap();
        conn.execute(
            "INSERT INTO class_size_configuration (config_key, level_id, config_value) VALUES (?1, 'L1', 4)",
            [format!("L1{}", class_size_keys::MIN_SUFFIX)],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO class_size_configuration (config_key, level_id, config_value) VALUES (?1, 'L1', 6)",
            [format!("L1{}", class_size_keys::MAX_SUFFIX)],
        )
        .unwrap();
    }
    state
        .config_manager
        .set_global_config_value(config_keys::MAX_CLASSES_PER_TEACHER, "3")
        .unwrap();

    let proposal = state
        .class_generation_api
        .generate(TERM, None, "admin")
        .unwrap();

    assert_eq!(proposal.classes.len(), 3);
    assert!(proposal.classes.iter().all(|c| c.current_size == 6));
    assert_eq!(proposal.parameters.max_classes_per_teacher, 3);
}

#[test]
fn test_invalid_parameters_are_rejected_without_a_run() {
    let (_file, state) = setup_state();
    seed_standard_term(&state, 18);
    let api = &state.class_generation_api;

    let params = GenerationParameters {
        default_min_class_size: 12,
        default_max_class_size: 10,
        ..GenerationParameters::default()
    };
    let err = api.generate(TERM, Some(params), "admin").unwrap_err();

    assert_eq!(err.code(), "INVALID_INPUT");
    assert!(api.list_proposals(TERM).unwrap().is_empty());
}

#[test]
fn test_generation_is_audited() {
    let (_file, state) = setup_state();
    seed_standard_term(&state, 18);

    let proposal = state
        .class_generation_api
        .generate(TERM, None, "admin")
        .unwrap();

    let history = state
        .class_generation_api
        .proposal_history(&proposal.proposal_id)
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].action_type, GenerationActionType::Generation);
    assert_eq!(history[0].performed_by, "admin");
    let payload = history[0].payload_json.as_ref().unwrap();
    assert_eq!(payload["run_number"], 1);
}

#[test]
fn test_identical_input_identical_membership() {
    let (_file, state) = setup_state();
    seed_standard_term(&state, 23);
    seed_teacher(&state, "T3", &["L1"], &[(DayOfWeek::Thursday, "Pagi")]);
    let api = &state.class_generation_api;

    let a = api.generate(TERM, None, "admin").unwrap();
    let b = api.generate(TERM, None, "admin").unwrap();

    let members = |p: &class_generation::GenerationProposal| -> Vec<Vec<String>> {
        p.classes.iter().map(|c| c.student_ids()).collect()
    };
    assert_eq!(members(&a), members(&b));
}

#[test]
fn test_reassessed_student_is_placed_once() {
    let (_file, state) = setup_state();
    seed_standard_term(&state, 9);
    let retake_at = chrono::NaiveDate::from_ymd_opt(2026, 1, 20)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    state
        .assessment_repo
        .insert(&class_generation::domain::AssessmentRecord {
            assessment_id: "a-s-001-retake".to_string(),
            student_id: "s-001".to_string(),
            student_name: "Santri s-001".to_string(),
            term_id: TERM.to_string(),
            category: StudentCategory::Existing,
            determined_level_id: Some("L1".to_string()),
            score: Some(88.0),
            grade: Some("A".to_string()),
            validated: true,
            created_at: retake_at,
        })
        .unwrap();

    let proposal = state
        .class_generation_api
        .generate(TERM, None, "admin")
        .unwrap();

    let placements: Vec<_> = proposal
        .classes
        .iter()
        .flat_map(|c| c.students.iter())
        .filter(|s| s.student_id == "s-001")
        .collect();
    assert_eq!(placements.len(), 1);
    assert_eq!(placements[0].assessment_score, Some(88.0));
    assert_eq!(proposal.total_enrolled(), 9);
    assert!(proposal
        .warnings
        .iter()
        .any(|w| w.contains("a-s-001") && w.contains("superseded")));
}
