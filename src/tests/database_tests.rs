// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use chrono::Utc;
use serde_json::json;

use super::{lcg_vectors, meta};
use crate::config::IvfConfig;
use crate::database::{DatabaseMetadataPatch, NewRecord, VectorDatabase};
use crate::error::EngineError;
use crate::filter::FilterPredicate;
use crate::types::{Metadata, SearchOptions};

fn database(dim: usize) -> VectorDatabase {
    VectorDatabase::new("test-db", dim, "tester", Utc::now(), IvfConfig::default())
}

fn filter(value: serde_json::Value) -> FilterPredicate {
    FilterPredicate::from_json(&value).unwrap()
}

#[test]
fn test_basic_cosine_ranking() {
    let mut db = database(3);
    db.insert("v1", vec![1.0, 0.0, 0.0], meta(json!({ "category": "a" }))).unwrap();
    db.insert("v2", vec![0.0, 1.0, 0.0], meta(json!({ "category": "b" }))).unwrap();
    db.insert("v3", vec![0.9, 0.1, 0.0], meta(json!({ "category": "a" }))).unwrap();

    let results = db.search(&[1.0, 0.0, 0.0], 2, &SearchOptions::default()).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id, "v1");
    assert_eq!(results[1].id, "v3");
    assert!((results[0].score - 1.0).abs() < 1e-6);
    assert!(results[1].score > 0.99 && results[1].score < 1.0);
    assert!(results[0].vector.is_none());
    assert!(results[0].source_database_name.is_none());
}

#[test]
fn test_filtered_search() {
    let mut db = database(3);
    db.insert("v1", vec![1.0, 0.0, 0.0], meta(json!({ "category": "a" }))).unwrap();
    db.insert("v2", vec![0.0, 1.0, 0.0], meta(json!({ "category": "b" }))).unwrap();
    db.insert("v3", vec![0.9, 0.1, 0.0], meta(json!({ "category": "a" }))).unwrap();

    let options = SearchOptions::default().with_filter(filter(json!({ "category": "b" })));
    let results = db.search(&[1.0, 0.0, 0.0], 10, &options).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "v2");
    assert!((results[0].score - 0.5).abs() < 1e-6);
}

#[test]
fn test_threshold_is_inclusive_lower_bound() {
    let mut db = database(2);
    db.insert("same", vec![1.0, 0.0], Metadata::new()).unwrap();
    db.insert("orth", vec![0.0, 1.0], Metadata::new()).unwrap();
    db.insert("opp", vec![-1.0, 0.0], Metadata::new()).unwrap();

    let options = SearchOptions::default().with_threshold(0.5);
    let ids: Vec<String> = db
        .search(&[1.0, 0.0], 10, &options)
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec!["same", "orth"]);

    let none = db
        .search(&[1.0, 0.0], 10, &SearchOptions::default().with_threshold(1.01))
        .unwrap();
    assert!(none.is_empty());
}

#[test]
fn test_search_edge_cases() {
    let mut db = database(3);
    let empty = db.search(&[1.0, 0.0, 0.0], 5, &SearchOptions::default()).unwrap();
    assert!(empty.is_empty());

    db.insert("v1", vec![1.0, 0.0, 0.0], Metadata::new()).unwrap();
    assert!(db.search(&[1.0, 0.0, 0.0], 0, &SearchOptions::default()).unwrap().is_empty());

    let err = db.search(&[1.0, 0.0], 5, &SearchOptions::default()).unwrap_err();
    assert_eq!(err, EngineError::DimensionMismatch { expected: 3, found: 2 });
}

#[test]
fn test_include_vectors() {
    let mut db = database(2);
    db.insert("v", vec![0.3, 0.4], Metadata::new()).unwrap();
    let results = db
        .search(&[0.3, 0.4], 1, &SearchOptions::default().include_vectors(true))
        .unwrap();
    assert_eq!(results[0].vector.as_deref(), Some(&[0.3, 0.4][..]));
}

#[test]
fn test_equal_scores_keep_insertion_order() {
    let mut db = database(2);
    for id in ["first", "second", "third", "fourth"] {
        db.insert(id, vec![0.0, 2.0], Metadata::new()).unwrap();
    }
    let ids: Vec<String> = db
        .search(&[0.0, 1.0], 3, &SearchOptions::default())
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec!["first", "second", "third"]);
}

#[test]
fn test_insert_rejects_wrong_dimensions() {
    let mut db = database(3);
    let err = db.insert("bad", vec![1.0, 2.0], Metadata::new()).unwrap_err();
    assert!(matches!(err, EngineError::DimensionMismatch { expected: 3, found: 2 }));
    assert_eq!(db.metadata().vector_count, 0);
}

#[test]
fn test_insert_batch_is_all_or_nothing() {
    let mut db = database(2);
    let batch = vec![
        NewRecord::new("a", vec![1.0, 0.0], Metadata::new()),
        NewRecord::new("b", vec![1.0, 0.0, 0.0], Metadata::new()),
    ];
    assert!(db.insert_batch(batch).is_err());
    assert_eq!(db.store().len(), 0);

    let batch: Vec<NewRecord> = lcg_vectors(1, 50, 2)
        .into_iter()
        .enumerate()
        .map(|(i, v)| NewRecord::new(format!("r{i}"), v, Metadata::new()))
        .collect();
    assert_eq!(db.insert_batch(batch).unwrap(), 50);
    assert_eq!(db.metadata().vector_count, 50);
    assert!(db.index().is_trained());
}

#[test]
fn test_upsert_replaces_vector_and_metadata() {
    let mut db = database(2);
    db.insert("x", vec![1.0, 0.0], meta(json!({ "v": 1 }))).unwrap();
    db.insert("y", vec![0.0, 1.0], Metadata::new()).unwrap();
    db.insert("z", vec![-1.0, 0.0], Metadata::new()).unwrap();
    db.insert("x", vec![0.0, 1.0], meta(json!({ "v": 2 }))).unwrap();

    assert_eq!(db.metadata().vector_count, 3);
    let top = db.search(&[0.0, 1.0], 3, &SearchOptions::default()).unwrap();
    // Both x and y now point along +y; x keeps its original (earlier) slot
    assert_eq!(top[0].id, "x");
    assert_eq!(top[1].id, "y");
    assert_eq!(top[0].metadata, meta(json!({ "v": 2 })));
}

#[test]
fn test_soft_delete_by_filter() {
    let mut db = database(2);
    for i in 0..5 {
        let doc = if i < 3 { "doc1" } else { "doc2" };
        db.insert(format!("chunk-{i}"), vec![1.0, i as f32], meta(json!({ "documentId": doc })))
            .unwrap();
    }

    let result = db.soft_delete(&filter(json!({ "documentId": "doc1" })));
    assert_eq!(result.deleted_count, 3);
    assert_eq!(result.deleted_ids, vec!["chunk-0", "chunk-1", "chunk-2"]);

    let remaining = db.search(&[1.0, 0.0], 10, &SearchOptions::default()).unwrap();
    assert_eq!(remaining.len(), 2);
    assert!(remaining.iter().all(|r| r.metadata["documentId"] == json!("doc2")));

    // Already deleted records are not counted again
    let again = db.soft_delete(&filter(json!({ "documentId": "doc1" })));
    assert_eq!(again.deleted_count, 0);

    let stats = db.stats(1);
    assert_eq!(stats.vector_count, 2);
    assert_eq!(stats.deleted_count, 3);
    assert_eq!(stats.total_records, 5);
}

#[test]
fn test_soft_delete_matching_nothing() {
    let mut db = database(2);
    db.insert("a", vec![1.0, 0.0], meta(json!({ "k": 1 }))).unwrap();
    let result = db.soft_delete(&filter(json!({ "k": 2 })));
    assert_eq!(result.deleted_count, 0);
    assert!(result.deleted_ids.is_empty());
    assert_eq!(db.metadata().vector_count, 1);
}

#[test]
fn test_delete_by_ids() {
    let mut db = database(2);
    for i in 0..4 {
        db.insert(format!("msg-{i}"), vec![1.0, i as f32], Metadata::new()).unwrap();
    }
    let result = db.delete_by_ids(&["msg-1", "msg-3", "msg-3", "missing"]);
    assert_eq!(result.deleted_count, 2);
    assert_eq!(result.deleted_ids, vec!["msg-1", "msg-3"]);
    assert!(db.get("msg-1").is_none());
    assert!(db.get("msg-0").is_some());
}

#[test]
fn test_reinsert_after_delete() {
    let mut db = database(2);
    db.insert("a", vec![1.0, 0.0], Metadata::new()).unwrap();
    db.delete_by_ids(&["a"]);
    assert!(db.search(&[1.0, 0.0], 5, &SearchOptions::default()).unwrap().is_empty());

    db.insert("a", vec![0.0, 1.0], Metadata::new()).unwrap();
    let results = db.search(&[0.0, 1.0], 5, &SearchOptions::default()).unwrap();
    assert_eq!(results.len(), 1);
    assert!((results[0].score - 1.0).abs() < 1e-6);
}

#[test]
fn test_update_metadata() {
    let mut db = database(2);
    db.insert("a", vec![1.0, 0.0], meta(json!({ "status": "draft", "n": 1 }))).unwrap();
    db.update_metadata("a", meta(json!({ "status": "final" }))).unwrap();
    assert_eq!(
        db.get("a").unwrap().metadata,
        meta(json!({ "status": "final", "n": 1 }))
    );

    let hits = db
        .search(
            &[1.0, 0.0],
            5,
            &SearchOptions::default().with_filter(filter(json!({ "status": "final" }))),
        )
        .unwrap();
    assert_eq!(hits.len(), 1);

    assert!(matches!(
        db.update_metadata("nope", Metadata::new()),
        Err(EngineError::NotFound(_))
    ));
}

#[test]
fn test_database_metadata_and_patch() {
    let mut db = database(4);
    let before = db.metadata();
    assert_eq!(before.name, "test-db");
    assert_eq!(before.dimensions, 4);
    assert_eq!(before.owner, "tester");
    assert!(before.last_accessed_at >= before.created_at);

    db.apply_metadata_patch(DatabaseMetadataPatch {
        description: Some("notes".into()),
        custom: meta(json!({ "team": "search" })),
        ..DatabaseMetadataPatch::default()
    });
    let after = db.metadata();
    assert_eq!(after.owner, "tester");
    assert_eq!(after.description.as_deref(), Some("notes"));
    assert_eq!(after.custom, meta(json!({ "team": "search" })));
    assert!(after.last_accessed_at >= before.last_accessed_at);
    assert_eq!(after.created_at, before.created_at);
}

#[test]
fn test_storage_size_tracks_inserts() {
    let mut db = database(8);
    assert_eq!(db.metadata().storage_size_bytes, 0);
    db.insert("a", vec![0.5; 8], Metadata::new()).unwrap();
    let one = db.metadata().storage_size_bytes;
    assert!(one >= 32);
    db.insert("b", vec![0.5; 8], Metadata::new()).unwrap();
    assert!(db.metadata().storage_size_bytes > one);
}

#[test]
fn test_search_touches_access_clock() {
    let mut db = database(2);
    db.insert("a", vec![1.0, 0.0], Metadata::new()).unwrap();
    let before = db.peek_metadata().last_accessed_at;
    std::thread::sleep(std::time::Duration::from_millis(2));
    db.search(&[1.0, 0.0], 1, &SearchOptions::default()).unwrap();
    assert!(db.peek_metadata().last_accessed_at > before);
}

#[test]
fn test_self_match_for_large_magnitudes() {
    let mut db = database(2);
    db.insert("big", vec![3e38, 3e38], Metadata::new()).unwrap();
    db.insert("small", vec![1e-30, -1e-30], Metadata::new()).unwrap();
    db.insert("plain", vec![0.2, 0.9], Metadata::new()).unwrap();

    for (id, query) in [("big", [3e38f32, 3e38]), ("small", [1e-30, -1e-30])] {
        let hits = db.search(&query, 1, &SearchOptions::default()).unwrap();
        assert_eq!(hits[0].id, id);
        assert!(hits[0].score >= 0.999);
    }
}

#[test]
fn test_error_classification() {
    let mut db = database(2);
    let mismatch = db.insert("a", vec![1.0], Metadata::new()).unwrap_err();
    assert!(mismatch.is_validation());

    let bad_filter = FilterPredicate::from_json(&json!({ "a": { "$near": 1 } })).unwrap_err();
    assert!(bad_filter.is_validation());

    let missing = db.update_metadata("ghost", Metadata::new()).unwrap_err();
    assert!(!missing.is_validation());
    assert!(!EngineError::Internal("boom".into()).is_validation());
}
