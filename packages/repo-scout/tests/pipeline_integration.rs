//! End-to-end scouting runs with scripted engines and canned actions.

use std::sync::Arc;

use repo_scout::testing::{sample_record, LoopingEngine, ScriptedEngine, StaticAction};
use repo_scout::{
    render_records, Actions, EngineReply, ExtractionFailure, InsertOutcome, MemoryStore,
    Orchestrator, ReasoningEngine, RecordStore, Scout, ScoutError, SqliteStore, StoreError, Task,
};

fn actions() -> Actions {
    Actions::new(
        StaticAction::new("1. Awesome list\n   URL: https://github.com/topics/databases"),
        StaticAction::new("sled: an embedded database. 8k stars. Rust."),
    )
}

fn entry(identifier: &str, popularity: &str) -> String {
    format!(
        r#"{{"identifier": "{id}", "url": "https://github.com/{id}", "summary": "About {id}.", "popularity": {pop}, "primary_language": "Rust", "rationale": "Relevant."}}"#,
        id = identifier,
        pop = popularity
    )
}

fn batch(entries: &[String]) -> String {
    format!(r#"{{"repositories": [{}]}}"#, entries.join(", "))
}

fn scout<E: ReasoningEngine, S: RecordStore>(engine: E, store: S) -> Scout<E, S> {
    Scout::new(Orchestrator::new(engine, actions()), store)
}

#[tokio::test]
async fn test_successful_run_persists_ranked_records() {
    let payload = batch(&[
        entry("a/ten", "10"),
        entry("a/first", "500"),
        entry("a/second", "\"500\""),
        entry("a/one", "1"),
    ]);
    let engine = ScriptedEngine::new(vec![
        EngineReply::action("web_search", "embedded databases"),
        EngineReply::action("fetch_page", "https://github.com/spacejam/sled"),
        EngineReply::final_payload(payload),
    ]);
    let scout = scout(engine, SqliteStore::in_memory().await.unwrap());

    let report = scout.discover(&Task::from_topic("Databases")).await.unwrap();
    assert_eq!(report.inserted.len(), 4);

    let popularity: Vec<u64> = scout
        .ranked()
        .await
        .unwrap()
        .iter()
        .map(|r| r.popularity)
        .collect();
    assert_eq!(popularity, [500, 500, 10, 1]);

    let identifiers: Vec<String> = scout
        .ranked()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.identifier)
        .collect();
    assert_eq!(identifiers, ["a/first", "a/second", "a/ten", "a/one"]);
}

#[tokio::test]
async fn test_one_invalid_entry_persists_nothing() {
    let payload = batch(&[
        entry("a/one", "1"),
        entry("a/two", "\"not-a-number\""),
        entry("a/three", "3"),
    ]);
    let engine = ScriptedEngine::new(vec![EngineReply::final_payload(payload.clone())]);
    let scout = scout(engine, SqliteStore::in_memory().await.unwrap());

    let err = scout.discover(&Task::from_topic("Anything")).await.unwrap_err();

    let ScoutError::Extraction(failure) = err else {
        panic!("expected an extraction failure, got {:?}", err);
    };
    assert!(matches!(failure, ExtractionFailure::InvalidEntries { .. }));
    assert_eq!(failure.payload(), payload);
    assert!(scout.ranked().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rejected_fields_are_named() {
    let payload = r#"{"repositories": [
        {"identifier": "", "url": "https://github.com/a/b", "summary": "S.", "popularity": 1},
        {"identifier": "a/c", "url": "not a url", "summary": "S.", "popularity": 1}
    ]}"#;
    let engine = ScriptedEngine::new(vec![EngineReply::final_payload(payload)]);
    let scout = scout(engine, MemoryStore::new());

    let err = scout.discover(&Task::from_topic("Anything")).await.unwrap_err();

    let ScoutError::Extraction(ExtractionFailure::InvalidEntries { entries, .. }) = err else {
        panic!("expected invalid entries, got {:?}", err);
    };
    assert_eq!(entries.len(), 2);
    assert!(entries[0].names("identifier"));
    assert!(entries[1].names("url"));
    assert!(scout.store().is_empty());
}

#[tokio::test]
async fn test_repeat_run_reports_existing_records() {
    let first = batch(&[entry("tokio-rs/tokio", "27000")]);
    let second = batch(&[entry("tokio-rs/tokio", "27001"), entry("smol-rs/smol", "4000")]);
    let engine = ScriptedEngine::new(vec![
        EngineReply::final_payload(first),
        EngineReply::final_payload(second),
    ]);
    let scout = scout(engine, SqliteStore::in_memory().await.unwrap());
    let task = Task::from_topic("Async Runtimes");

    let report = scout.discover(&task).await.unwrap();
    assert_eq!(report.inserted, ["tokio-rs/tokio"]);

    let report = scout.discover(&task).await.unwrap();
    assert_eq!(report.inserted, ["smol-rs/smol"]);
    assert_eq!(report.already_existing, ["tokio-rs/tokio"]);

    let stored = scout.ranked().await.unwrap();
    assert_eq!(stored.len(), 2);
    // The first write wins
    assert_eq!(stored[0].popularity, 27000);
}

#[tokio::test]
async fn test_exhausted_loop_persists_nothing() {
    let engine = LoopingEngine::new("web_search", "one more search");
    let calls = engine.calls();
    let scout = Scout::new(
        Orchestrator::new(engine, actions()).with_max_iterations(5),
        MemoryStore::new(),
    );

    let err = scout.discover(&Task::from_topic("Anything")).await.unwrap_err();

    let ScoutError::LoopExhausted {
        iterations,
        transcript,
    } = err
    else {
        panic!("expected loop exhaustion, got {:?}", err);
    };
    assert_eq!(iterations, 5);
    assert_eq!(transcript.len(), 5);
    assert_eq!(*calls.lock().unwrap(), 5);
    assert!(scout.store().is_empty());
}

#[tokio::test]
async fn test_store_error_keeps_earlier_inserts() {
    let scout = scout(
        ScriptedEngine::new(vec![]),
        SqliteStore::in_memory().await.unwrap(),
    );

    let err = scout
        .persist(&[
            sample_record("a/kept", 1),
            sample_record("a/huge", u64::MAX),
            sample_record("a/never", 2),
        ])
        .await
        .unwrap_err();

    assert!(matches!(err, ScoutError::Store(StoreError::OutOfRange { .. })));
    let stored: Vec<String> = scout
        .ranked()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.identifier)
        .collect();
    assert_eq!(stored, ["a/kept"]);
}

#[tokio::test]
async fn test_display_is_idempotent() {
    let store = SqliteStore::in_memory().await.unwrap();
    for (identifier, popularity) in [("a/one", 1), ("a/two", 20), ("a/three", 300)] {
        store
            .insert(&sample_record(identifier, popularity))
            .await
            .unwrap();
    }

    let first = store.read_all().await.unwrap();
    let second = store.read_all().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(render_records(&first), render_records(&second));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_inserts_across_handles_insert_once() {
    let path = std::env::temp_dir().join(format!("repo-scout-{}.db", uuid::Uuid::new_v4()));
    let url = format!("sqlite://{}", path.display());

    let first = Arc::new(SqliteStore::new(&url).await.unwrap());
    let second = Arc::new(SqliteStore::new(&url).await.unwrap());

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = if i % 2 == 0 {
            first.clone()
        } else {
            second.clone()
        };
        handles.push(tokio::spawn(async move {
            store
                .insert(&sample_record("rust-lang/rust", 100000))
                .await
                .unwrap()
        }));
    }

    let mut inserted = 0;
    for handle in handles {
        if handle.await.unwrap() == InsertOutcome::Inserted {
            inserted += 1;
        }
    }

    assert_eq!(inserted, 1);
    assert_eq!(first.read_all().await.unwrap().len(), 1);
    assert_eq!(second.read_all().await.unwrap().len(), 1);

    first.close().await;
    second.close().await;
    let _ = std::fs::remove_file(&path);
    let _ = std::fs::remove_file(path.with_extension("db-wal"));
    let _ = std::fs::remove_file(path.with_extension("db-shm"));
}
