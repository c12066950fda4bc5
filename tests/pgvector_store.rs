//! pgvector store against a live database.
//!
//! Runs only when `VECTOR_MEMORY_TEST_DATABASE_URL` points at a PostgreSQL
//! instance with the `vector` extension available; otherwise each test returns early.

use serde_json::json;
use vector_memory::error::{Error, StoreError};
use vector_memory::vector::{
    Document, Metadata, PgVectorConfig, PgVectorStore, Query, VectorStore,
};

const DATABASE_URL_ENV: &str = "VECTOR_MEMORY_TEST_DATABASE_URL";

async fn store(table: &str, metric: &str) -> Option<PgVectorStore> {
    let Ok(dsn) = std::env::var(DATABASE_URL_ENV) else {
        eprintln!("{DATABASE_URL_ENV} not set, skipping");
        return None;
    };

    let mut config = PgVectorConfig::new(dsn, 2);
    config.table = table.to_string();
    config.metric = metric.to_string();

    let store = PgVectorStore::connect(&config).await.unwrap();
    // Concurrent CREATE EXTENSION calls can race; the second attempt sees it installed.
    if store.ensure_schema().await.is_err() {
        store.ensure_schema().await.unwrap();
    }
    reset_table(&store).await;
    Some(store)
}

/// Start every test from an empty table by deleting everything it may have left behind.
async fn reset_table(store: &PgVectorStore) {
    let ids: Vec<String> = ["exact", "near", "orthogonal", "a", "b", "ok", "bad", "zero"]
        .iter()
        .map(|id| id.to_string())
        .collect();
    store.delete(&ids).await.unwrap();
}

fn metadata(value: serde_json::Value) -> Metadata {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Metadata::new(),
    }
}

#[tokio::test]
async fn cosine_ranking_scenario() {
    let Some(store) = store("vm_test_cosine", "cosine").await else {
        return;
    };

    store
        .upsert(vec![
            Document::new("exact", vec![1.0, 0.0]).with_metadata(metadata(json!({"k": "exact"}))),
            Document::new("orthogonal", vec![0.0, 1.0]),
            Document::new("near", vec![0.9, 0.1]),
        ])
        .await
        .unwrap();

    let hits = store
        .query(&Query::new(vec![1.0, 0.0]).with_top_k(2))
        .await
        .unwrap();
    let ids: Vec<&str> = hits.iter().map(|hit| hit.id.as_str()).collect();
    assert_eq!(ids, vec!["exact", "near"]);
    assert!((hits[0].score - 1.0).abs() < 1e-6);
    assert_eq!(hits[0].metadata, metadata(json!({"k": "exact"})));

    store.close().await.unwrap();
}

#[tokio::test]
async fn l2_scores_are_negated_distances() {
    let Some(store) = store("vm_test_l2", "l2").await else {
        return;
    };

    store
        .upsert(vec![Document::new("a", vec![3.0, 4.0])])
        .await
        .unwrap();
    let hits = store.query(&Query::new(vec![0.0, 0.0])).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert!((hits[0].score + 5.0).abs() < 1e-6);

    store.close().await.unwrap();
}

#[tokio::test]
async fn zero_vectors_score_zero() {
    let Some(store) = store("vm_test_zero", "cosine").await else {
        return;
    };

    store
        .upsert(vec![
            Document::new("a", vec![1.0, 0.0]),
            Document::new("b", vec![-1.0, 0.0]),
            Document::new("zero", vec![0.0, 0.0]),
        ])
        .await
        .unwrap();

    let hits = store.query(&Query::new(vec![1.0, 0.0])).await.unwrap();
    let ids: Vec<&str> = hits.iter().map(|hit| hit.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "zero", "b"]);
    assert_eq!(hits[1].score, 0.0);

    let hits = store.query(&Query::new(vec![0.0, 0.0])).await.unwrap();
    assert_eq!(hits.len(), 3);
    assert!(hits.iter().all(|hit| hit.score == 0.0));

    store.close().await.unwrap();
}

#[tokio::test]
async fn namespaces_filters_and_deletes() {
    let Some(store) = store("vm_test_namespaces", "cosine").await else {
        return;
    };

    store
        .upsert(vec![
            Document::new("a", vec![1.0, 0.0])
                .with_namespace("users/alice")
                .with_metadata(metadata(json!({"topic": "rust"}))),
            Document::new("b", vec![1.0, 0.0]).with_metadata(metadata(json!({"topic": "go"}))),
        ])
        .await
        .unwrap();

    let other = store
        .query(&Query::new(vec![1.0, 0.0]).with_namespace("users/bob"))
        .await
        .unwrap();
    assert!(other.is_empty());

    let default = store
        .query(&Query::new(vec![1.0, 0.0]).with_filter(metadata(json!({"topic": "go"}))))
        .await
        .unwrap();
    assert_eq!(default.len(), 1);
    assert_eq!(default[0].id, "b");

    // Moving "a" into the default namespace replaces its row.
    store
        .upsert(vec![Document::new("a", vec![0.0, 1.0])])
        .await
        .unwrap();
    let alice = store
        .query(&Query::new(vec![1.0, 0.0]).with_namespace("users/alice"))
        .await
        .unwrap();
    assert!(alice.is_empty());

    let ids = vec!["a".to_string(), "missing".to_string()];
    store.delete(&ids).await.unwrap();
    store.delete(&ids).await.unwrap();

    store.close().await.unwrap();
}

#[tokio::test]
async fn mismatched_batch_persists_nothing() {
    let Some(store) = store("vm_test_batch", "cosine").await else {
        return;
    };

    let result = store
        .upsert(vec![
            Document::new("ok", vec![1.0, 0.0]),
            Document::new("bad", vec![1.0, 0.0, 0.0]),
        ])
        .await;
    assert!(matches!(
        result,
        Err(Error::Store(StoreError::DimensionMismatch { .. }))
    ));

    let hits = store.query(&Query::new(vec![1.0, 0.0])).await.unwrap();
    assert!(hits.is_empty());

    store.close().await.unwrap();
}
