// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use serde_json::json;

use super::{lcg_vectors, meta};
use crate::database::DatabaseMetadataPatch;
use crate::error::EngineError;
use crate::registry::{CreateSessionOptions, DatabaseRegistry};
use crate::snapshot::{decode_snapshot, encode_payload, DatabaseSnapshot, SnapshotRecord, HEADER_SIZE, MAGIC};
use crate::types::SearchOptions;

fn seeded_registry() -> DatabaseRegistry {
    let reg = DatabaseRegistry::default();
    reg.create_session(
        "notes",
        CreateSessionOptions {
            dimensions: Some(6),
            owner: Some("bob".into()),
            description: Some("meeting notes".into()),
        },
    )
    .unwrap();
    let db = reg.database("notes").unwrap();
    let mut db = db.write();
    for (i, v) in lcg_vectors(21, 40, 6).into_iter().enumerate() {
        db.insert(format!("n{i}"), v, meta(json!({ "n": i, "tags": ["a", "b"] })))
            .unwrap();
    }
    db.delete_by_ids(&["n3", "n7"]);
    db.apply_metadata_patch(DatabaseMetadataPatch {
        custom: meta(json!({ "source": "import" })),
        ..DatabaseMetadataPatch::default()
    });
    drop(db);
    reg
}

#[test]
fn test_snapshot_header() {
    let reg = seeded_registry();
    let bytes = reg.database("notes").unwrap().read().snapshot().unwrap();
    assert!(bytes.len() > HEADER_SIZE);
    assert_eq!(bytes[0..4], MAGIC);

    let decoded = decode_snapshot(&bytes).unwrap();
    assert_eq!(decoded.name, "notes");
    assert_eq!(decoded.dimensions, 6);
    assert_eq!(decoded.records.len(), 40);
    assert_eq!(decoded.records.iter().filter(|r| r.deleted).count(), 2);
}

#[test]
fn test_restore_reproduces_search_results() {
    let source = seeded_registry();
    let bytes = source.database("notes").unwrap().read().snapshot().unwrap();
    let query = lcg_vectors(77, 1, 6).remove(0);
    let expected = source
        .database("notes")
        .unwrap()
        .read()
        .search(&query, 10, &SearchOptions::default())
        .unwrap();

    let target = DatabaseRegistry::default();
    let session = target.restore_snapshot(&bytes).unwrap();
    assert_eq!(target.get_session(&session).unwrap().database_name, "notes");

    let restored = target.database("notes").unwrap();
    let got = restored.read().search(&query, 10, &SearchOptions::default()).unwrap();
    assert_eq!(got, expected);

    let meta = target.get_database_metadata("notes").unwrap();
    assert_eq!(meta.owner, "bob");
    assert_eq!(meta.description.as_deref(), Some("meeting notes"));
    assert_eq!(meta.vector_count, 38);
    assert_eq!(meta.custom["source"], json!("import"));

    let stats = target.get_database_stats("notes").unwrap();
    assert_eq!(stats.deleted_count, 2);
    assert!(restored.read().get("n3").is_none());
}

#[test]
fn test_restore_into_existing_name_fails() {
    let reg = seeded_registry();
    let bytes = reg.database("notes").unwrap().read().snapshot().unwrap();
    assert_eq!(
        reg.restore_snapshot(&bytes),
        Err(EngineError::AlreadyExists("notes".into()))
    );
}

#[test]
fn test_corrupted_snapshots_rejected() {
    let reg = seeded_registry();
    let bytes = reg.database("notes").unwrap().read().snapshot().unwrap();

    let mut flipped = bytes.clone();
    let last = flipped.len() - 1;
    flipped[last] ^= 0xff;
    assert!(matches!(decode_snapshot(&flipped), Err(EngineError::Snapshot(_))));

    let mut bad_magic = bytes.clone();
    bad_magic[0] = b'X';
    assert!(matches!(decode_snapshot(&bad_magic), Err(EngineError::Snapshot(_))));

    let mut bad_version = bytes.clone();
    bad_version[4] = 9;
    assert!(matches!(decode_snapshot(&bad_version), Err(EngineError::Snapshot(_))));

    assert!(matches!(
        decode_snapshot(&bytes[..10]),
        Err(EngineError::Snapshot(_))
    ));

    let fresh = DatabaseRegistry::default();
    assert!(fresh.restore_snapshot(&flipped).is_err());
    assert!(fresh.list_databases().is_empty());
}

fn handmade(dimensions: usize, records: Vec<(&str, Vec<f32>)>) -> Vec<u8> {
    let snapshot = DatabaseSnapshot {
        name: "restored".into(),
        dimensions,
        owner: "carol".into(),
        description: None,
        custom_json: "{}".into(),
        records: records
            .into_iter()
            .map(|(id, values)| SnapshotRecord {
                id: id.into(),
                values,
                metadata_json: "{}".into(),
                deleted: false,
            })
            .collect(),
    };
    encode_payload(&snapshot).unwrap()
}

#[test]
fn test_failed_restore_leaves_registry_untouched() {
    let reg = DatabaseRegistry::default();

    // Checksum is valid, but the second record has the wrong length
    let bytes = handmade(2, vec![("ok", vec![1.0, 0.0]), ("bad", vec![1.0, 0.0, 0.0])]);
    assert!(decode_snapshot(&bytes).is_ok());
    assert_eq!(
        reg.restore_snapshot(&bytes),
        Err(EngineError::DimensionMismatch { expected: 2, found: 3 })
    );
    assert!(reg.database_names().is_empty());
    assert_eq!(reg.session_count(), 0);

    let zero_dims = handmade(0, vec![]);
    assert_eq!(reg.restore_snapshot(&zero_dims), Err(EngineError::InvalidDimensions(0)));
    assert!(reg.database_names().is_empty());

    // The name is still free for a well-formed snapshot
    let good = handmade(2, vec![("ok", vec![1.0, 0.0])]);
    reg.restore_snapshot(&good).unwrap();
    assert_eq!(reg.database_names(), vec!["restored"]);
    assert_eq!(reg.get_database_stats("restored").unwrap().vector_count, 1);
}
