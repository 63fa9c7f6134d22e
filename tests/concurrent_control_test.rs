// ==========================================
// Concurrency: several processes-worth of connections on one file
// ==========================================
// Each thread builds its own AppState (own Connection) so SQLite's
// locking, not the in-process mutex, is what gets exercised.
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

use class_generation::api::ApiError;
use class_generation::app::AppState;
use class_generation::domain::ProposalStatus;
use std::collections::BTreeSet;
use std::sync::{Arc, Barrier};
use std::thread;
use test_helpers::*;

const WORKERS: usize = 6;

fn spawn_workers<T, F>(db_path: &str, work: F) -> Vec<T>
where
    T: Send + 'static,
    F: Fn(&AppState) -> T + Send + Sync + 'static,
{
    let barrier = Arc::new(Barrier::new(WORKERS));
    let work = Arc::new(work);

    let handles: Vec<_> = (0..WORKERS)
        .map(|_| {
            let barrier = barrier.clone();
            let work = work.clone();
            let db_path = db_path.to_string();
            thread::spawn(move || {
                let state = AppState::new(db_path).unwrap();
                barrier.wait();
                work(&state)
            })
        })
        .collect();

    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

#[test]
fn test_concurrent_generation_gets_unique_run_numbers() {
    let (_file, state) = setup_state();
    seed_standard_term(&state, 18);

    let runs = spawn_workers(&state.db_path, |s| {
        s.class_generation_api
            .generate(TERM, None, "admin")
            .unwrap()
            .run_number
    });

    let unique: BTreeSet<i32> = runs.iter().copied().collect();
    assert_eq!(unique.len(), WORKERS);
    assert_eq!(unique, (1..=WORKERS as i32).collect());
    assert_eq!(
        state.class_generation_api.list_proposals(TERM).unwrap().len(),
        WORKERS
    );
}

#[test]
fn test_concurrent_approval_succeeds_once() {
    let (_file, state) = setup_state();
    seed_standard_term(&state, 18);
    let proposal = state
        .class_generation_api
        .generate(TERM, None, "admin")
        .unwrap();
    let proposal_id = proposal.proposal_id.clone();

    let results = spawn_workers(&state.db_path, move |s| {
        s.class_generation_api.approve(&proposal_id, "kepala")
    });

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    for err in results.into_iter().filter_map(Result::err) {
        assert!(
            matches!(err, ApiError::AlreadyApproved { .. }),
            "unexpected {:?}",
            err
        );
    }

    assert_eq!(state.class_group_repo.count_by_term(TERM).unwrap(), 2);
    assert_eq!(state.class_group_repo.count_enrollments_by_term(TERM).unwrap(), 18);
    let stored = state
        .class_generation_api
        .get_proposal(&proposal.proposal_id)
        .unwrap();
    assert_eq!(stored.status, ProposalStatus::Approved);
}

#[test]
fn test_concurrent_transfers_never_overfill() {
    let (_file, state) = setup_state();
    // 19 students: classes of 10 and 9, so the second class has one free seat
    let students = seed_standard_term(&state, 19);
    let proposal = state
        .class_generation_api
        .generate(TERM, None, "admin")
        .unwrap();
    assert_eq!(proposal.classes[1].current_size, 9);

    let proposal_id = proposal.proposal_id.clone();
    let from = proposal.classes[0].class_id.clone();
    let to = proposal.classes[1].class_id.clone();
    let movers: Vec<String> = students.into_iter().take(WORKERS).collect();
    let movers = Arc::new(movers);
    let next = Arc::new(std::sync::atomic::AtomicUsize::new(0));

    let results = spawn_workers(&state.db_path, move |s| {
        let i = next.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        s.class_generation_api
            .transfer_student(&proposal_id, &movers[i], &from, &to, "staff")
    });

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    for err in results.into_iter().filter_map(Result::err) {
        let expected = match &err {
            ApiError::OptimisticLockFailure(_) => true,
            ApiError::TransferRejected { rejection } => rejection.code() == "DESTINATION_FULL",
            _ => false,
        };
        assert!(expected, "unexpected {:?}", err);
    }

    let stored = state
        .class_generation_api
        .get_proposal(&proposal.proposal_id)
        .unwrap();
    assert_eq!(stored.classes[1].current_size, 10);
    assert_eq!(stored.total_enrolled(), 19);
    assert_eq!(stored.transfer_count, 1);
}
