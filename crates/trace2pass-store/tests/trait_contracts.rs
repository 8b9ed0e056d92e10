//! Contract tests for `BugStore`: run against both the in-memory fake and
//! the SurrealDB backend. Any conforming implementation must pass these.

use chrono::Utc;
use trace2pass_domain::event::{BuildInfo, CheckKind, CompilerIdentity, Location, SystemInfo};
use trace2pass_domain::{AnomalyEvent, BugStatus, Config};
use trace2pass_store::fakes::MemoryBugStore;
use trace2pass_store::{BugStore, StoreError, SurrealBugStore};

fn event_at(line: u32) -> AnomalyEvent {
    AnomalyEvent {
        report_id: "r1".to_string(),
        timestamp: Utc::now(),
        check_type: CheckKind::PureInconsistency,
        location: Location {
            file: "c.c".to_string(),
            line,
            function: "k".to_string(),
        },
        pc: None,
        stacktrace: vec![],
        compiler: CompilerIdentity {
            name: "clang".to_string(),
            version: "16".to_string(),
            target: "x86_64".to_string(),
        },
        build_info: BuildInfo {
            optimization_level: "-O2".to_string(),
            flags: vec![],
            source_hash: "hh".to_string(),
            binary_checksum: "cc".to_string(),
        },
        check_details: serde_json::json!({}),
        system_info: SystemInfo::default(),
    }
}

async fn run_contract(store: &dyn BugStore) {
    let event = event_at(42);

    // submit creates on first observation.
    let first = store.submit(event.clone()).await.unwrap();
    assert_eq!(first.occurrence_count, 1);
    assert_eq!(first.status, BugStatus::New);

    // submit again folds into the same record (I1).
    let second = store.submit(event.clone()).await.unwrap();
    assert_eq!(second.fingerprint, first.fingerprint);
    assert_eq!(second.occurrence_count, 2);

    // get round-trips.
    let fetched = store.get(&first.fingerprint).await.unwrap().unwrap();
    assert_eq!(fetched.occurrence_count, 2);

    // get on unknown fingerprint is None, not an error.
    let other = event_at(999);
    let other_fp = other.fingerprint();
    assert!(store.get(&other_fp).await.unwrap().is_none());

    // queue surfaces only New/Triaged, ordered by descending priority.
    let queued = store.queue().await.unwrap();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].record.fingerprint, first.fingerprint);

    // illegal transition is rejected without mutating stored state (I2).
    let err = store
        .update_status(&first.fingerprint, BugStatus::Diagnosed, None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidTransition { .. }));
    let unchanged = store.get(&first.fingerprint).await.unwrap().unwrap();
    assert_eq!(unchanged.status, BugStatus::New);

    // legal transition advances status and drops out of the queue.
    store
        .update_status(&first.fingerprint, BugStatus::Triaged, None)
        .await
        .unwrap();
    store
        .update_status(&first.fingerprint, BugStatus::Diagnosing, None)
        .await
        .unwrap();
    let queued_after = store.queue().await.unwrap();
    assert!(queued_after.is_empty());

    // update_status on unknown fingerprint is NotFound.
    let missing_err = store
        .update_status(&other_fp, BugStatus::Triaged, None)
        .await
        .unwrap_err();
    assert!(matches!(missing_err, StoreError::NotFound { .. }));

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total_records, 1);
}

#[tokio::test]
async fn memory_bug_store_satisfies_contract() {
    let store = MemoryBugStore::new(Config::default());
    run_contract(&store).await;
}

#[tokio::test]
async fn surreal_bug_store_satisfies_contract() {
    let store = SurrealBugStore::setup_db(Config::default()).await.unwrap();
    run_contract(&store).await;
}
