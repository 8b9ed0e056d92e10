use chrono::Utc;
use trace2pass_domain::event::{BuildInfo, CheckKind, CompilerIdentity, Location, SystemInfo};
use trace2pass_domain::{AnomalyEvent, Config};
use trace2pass_store::{BugStore, SurrealBugStore};

fn sample_event() -> AnomalyEvent {
    AnomalyEvent {
        report_id: "r1".to_string(),
        timestamp: Utc::now(),
        check_type: CheckKind::DivisionByZero,
        location: Location {
            file: "d.c".to_string(),
            line: 7,
            function: "h".to_string(),
        },
        pc: None,
        stacktrace: vec![],
        compiler: CompilerIdentity {
            name: "clang".to_string(),
            version: "18".to_string(),
            target: "x86_64".to_string(),
        },
        build_info: BuildInfo {
            optimization_level: "-O3".to_string(),
            flags: vec![],
            source_hash: "h3".to_string(),
            binary_checksum: "c3".to_string(),
        },
        check_details: serde_json::json!({}),
        system_info: SystemInfo::default(),
    }
}

#[tokio::test]
async fn resubmitting_same_fingerprint_folds_not_duplicates() {
    let store = SurrealBugStore::setup_db(Config::default()).await.unwrap();
    let event = sample_event();

    let first = store.submit(event.clone()).await.unwrap();
    assert_eq!(first.occurrence_count, 1);

    let second = store.submit(event).await.unwrap();
    assert_eq!(second.occurrence_count, 2);
    assert_eq!(second.fingerprint, first.fingerprint);

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total_records, 1, "dedup must not create a second row");
}
