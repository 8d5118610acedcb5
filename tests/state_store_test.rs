//! Integration tests for persisted task state across backends

use content_studio::state::keys::LEADGEN_INPUTS;
use content_studio::state::{
    DiagnosticKind, DurableStore, FileStore, SqliteStore, StateKey, StateStore,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tempfile::TempDir;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct DraftInputs {
    keyword: String,
    markets: Vec<String>,
}

const TASK_A_INPUT: StateKey<DraftInputs> = StateKey::new("taskA_input");
const TASK_B_INPUT: StateKey<DraftInputs> = StateKey::new("taskB_input");

fn draft(keyword: &str) -> DraftInputs {
    DraftInputs {
        keyword: keyword.to_string(),
        markets: vec!["EU".to_string(), "US".to_string()],
    }
}

async fn backends(dir: &TempDir) -> Vec<(&'static str, Arc<dyn DurableStore>)> {
    let file = FileStore::new(dir.path().join("files")).unwrap();
    let db_path = dir.path().join("state.db");
    let sqlite = SqliteStore::new(&db_path.to_string_lossy()).await.unwrap();
    vec![("file", Arc::new(file)), ("sqlite", Arc::new(sqlite))]
}

#[tokio::test]
async fn test_values_survive_reopen() {
    let dir = TempDir::new().unwrap();

    let store = StateStore::new(Arc::new(FileStore::new(dir.path()).unwrap()));
    store.store(&TASK_A_INPUT, &draft("bearing")).await.unwrap();
    drop(store);

    let reopened = StateStore::new(Arc::new(FileStore::new(dir.path()).unwrap()));
    assert_eq!(
        reopened.load(&TASK_A_INPUT, DraftInputs::default()).await,
        draft("bearing")
    );
}

#[tokio::test]
async fn test_sqlite_values_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("state.db");

    let store = StateStore::new(Arc::new(
        SqliteStore::new(&db_path.to_string_lossy()).await.unwrap(),
    ));
    store.store(&TASK_A_INPUT, &draft("hub")).await.unwrap();
    drop(store);

    let reopened = StateStore::new(Arc::new(
        SqliteStore::new(&db_path.to_string_lossy()).await.unwrap(),
    ));
    assert_eq!(
        reopened.load(&TASK_A_INPUT, DraftInputs::default()).await,
        draft("hub")
    );
}

#[tokio::test]
async fn test_keys_are_isolated() {
    let dir = TempDir::new().unwrap();
    for (name, backend) in backends(&dir).await {
        let store = StateStore::new(backend);

        store.store(&TASK_A_INPUT, &draft("a")).await.unwrap();
        assert_eq!(
            store.load(&TASK_B_INPUT, DraftInputs::default()).await,
            DraftInputs::default(),
            "{} backend leaked between keys",
            name
        );

        store.store(&TASK_B_INPUT, &draft("b")).await.unwrap();
        store
            .reset(&TASK_B_INPUT, DraftInputs::default())
            .await
            .unwrap();
        assert_eq!(
            store.load(&TASK_A_INPUT, DraftInputs::default()).await,
            draft("a"),
            "{} backend reset the wrong key",
            name
        );
    }
}

#[tokio::test]
async fn test_reset_returns_default_and_clears_record() {
    let dir = TempDir::new().unwrap();
    for (name, backend) in backends(&dir).await {
        let store = StateStore::new(Arc::clone(&backend));
        store.store(&TASK_A_INPUT, &draft("x")).await.unwrap();

        let value = store
            .reset(&TASK_A_INPUT, DraftInputs::default())
            .await
            .unwrap();

        assert_eq!(value, DraftInputs::default(), "{} backend", name);
        assert!(backend.read("taskA_input").await.unwrap().is_none());
        // Resetting again is harmless.
        store
            .reset(&TASK_A_INPUT, DraftInputs::default())
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_corrupt_record_falls_back_to_default_and_reports() {
    let dir = TempDir::new().unwrap();
    for (name, backend) in backends(&dir).await {
        backend.write("taskA_input", "{not json").await.unwrap();
        let store = StateStore::new(backend);
        let mut diagnostics = store.subscribe_diagnostics();

        let value = store.load(&TASK_A_INPUT, draft("fallback")).await;

        assert_eq!(value, draft("fallback"), "{} backend", name);
        let diagnostic = diagnostics.try_recv().unwrap();
        assert_eq!(diagnostic.key, "taskA_input");
        assert_eq!(diagnostic.kind, DiagnosticKind::CorruptRecord);
    }
}

#[tokio::test]
async fn test_record_of_wrong_shape_is_treated_as_corrupt() {
    let store = StateStore::in_memory();
    let legacy: StateKey<serde_json::Value> = StateKey::new(LEADGEN_INPUTS.name());
    store
        .store(&legacy, &serde_json::json!(["not", "an", "object"]))
        .await
        .unwrap();

    let inputs = store.load(&LEADGEN_INPUTS, Default::default()).await;

    assert_eq!(inputs, Default::default());
}
