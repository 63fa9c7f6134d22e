use super::GenerationLogRepository;
use crate::domain::action_log::GenerationLog;
use crate::domain::types::GenerationActionType;
use rusqlite::Connection;
use serde_json::json;
use std::sync::{Arc, Mutex};

fn setup_test_db() -> Arc<Mutex<Connection>> {
    let conn = Connection::open_in_memory().unwrap();
    crate::db::configure_sqlite_connection(&conn).unwrap();
    crate::db::ensure_schema(&conn).unwrap();
    Arc::new(Mutex::new(conn))
}

fn make_log(proposal_id: &str, action_type: GenerationActionType) -> GenerationLog {
    GenerationLog::new(
        "T2026",
        Some(proposal_id),
        action_type,
        format!("{:?} on {}", action_type, proposal_id),
        Some(json!({ "run_number": 1 })),
        "admin",
    )
}

#[test]
fn test_insert_and_find_by_proposal() {
    let repo = GenerationLogRepository::new(setup_test_db());

    let first = make_log("P1", GenerationActionType::Generation);
    let second = make_log("P1", GenerationActionType::ManualEdit);
    repo.insert(&first).unwrap();
    repo.insert(&second).unwrap();
    repo.insert(&make_log("P2", GenerationActionType::Generation))
        .unwrap();

    let logs = repo.find_by_proposal("P1").unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].log_id, first.log_id);
    assert_eq!(logs[0].action_type, GenerationActionType::Generation);
    assert_eq!(logs[0].payload_json, Some(json!({ "run_number": 1 })));
    assert_eq!(logs[1].action_type, GenerationActionType::ManualEdit);
}

#[test]
fn test_find_by_term_and_count() {
    let repo = GenerationLogRepository::new(setup_test_db());
    for _ in 0..3 {
        repo.insert(&make_log("P1", GenerationActionType::ManualEdit))
            .unwrap();
    }
    repo.insert(&make_log("P1", GenerationActionType::Approval))
        .unwrap();

    assert_eq!(repo.find_by_term("T2026", 10).unwrap().len(), 4);
    assert_eq!(repo.find_by_term("T2026", 2).unwrap().len(), 2);
    assert_eq!(
        repo.count_by_action_type("P1", GenerationActionType::ManualEdit)
            .unwrap(),
        3
    );
    assert!(repo.find_by_term("OTHER", 10).unwrap().is_empty());
}
