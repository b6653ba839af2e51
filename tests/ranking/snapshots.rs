// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

use polyrank::error::SnapshotError;
use polyrank::index::{IndexSnapshot, InvariantError};

use crate::common::{linked_news_snapshot, news_snapshot, rank_keys, ranker, toy_snapshot};

#[test]
fn test_file_round_trip_ranks_identically() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("news.json");
    let original = linked_news_snapshot();
    original.to_file(&path).unwrap();
    let loaded = IndexSnapshot::from_file(&path).unwrap();

    assert_eq!(loaded.fingerprint(), original.fingerprint());
    assert!(loaded.has_priors());
    let (a, b) = (ranker(original), ranker(loaded));
    for model in ["bm25", "pagerank-bm25", "gvsm", "belief"] {
        assert_eq!(
            rank_keys(&a, model, "central bank inflation"),
            rank_keys(&b, model, "central bank inflation"),
            "{}",
            model
        );
    }
}

#[test]
fn test_fingerprint_depends_on_content() {
    assert_ne!(news_snapshot().fingerprint(), linked_news_snapshot().fingerprint());
    assert_eq!(news_snapshot().fingerprint(), news_snapshot().fingerprint());
}

#[test]
fn test_truncated_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("toy.json");
    let json = toy_snapshot().to_json().unwrap();
    std::fs::write(&path, &json[..json.len() / 2]).unwrap();
    assert!(matches!(
        IndexSnapshot::from_file(&path),
        Err(SnapshotError::Json(_))
    ));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        IndexSnapshot::from_file(dir.path().join("absent.json")),
        Err(SnapshotError::Io { .. })
    ));
}

#[test]
fn test_unsorted_postings_are_rejected() {
    let mut value: serde_json::Value = serde_json::from_str(&toy_snapshot().to_json().unwrap()).unwrap();
    value.as_object_mut().unwrap().remove("fingerprint");
    let dog = value["postings"]["dog"].as_array_mut().unwrap();
    dog.reverse();
    let err = IndexSnapshot::from_json(&value.to_string()).unwrap_err();
    assert!(matches!(err, SnapshotError::Invariant(_)), "{:?}", err);
}

#[test]
fn test_length_mismatch_is_rejected() {
    let mut value: serde_json::Value = serde_json::from_str(&toy_snapshot().to_json().unwrap()).unwrap();
    value.as_object_mut().unwrap().remove("fingerprint");
    value["documents"][0]["length"] = serde_json::json!(0);
    let err = IndexSnapshot::from_json(&value.to_string()).unwrap_err();
    assert!(matches!(err, SnapshotError::Invariant(_)), "{:?}", err);
}

#[test]
fn test_tampered_content_fails_the_fingerprint() {
    let mut value: serde_json::Value = serde_json::from_str(&toy_snapshot().to_json().unwrap()).unwrap();
    // doc3 gains a cat with its length adjusted, so only the checksum notices
    value["postings"]["cat"][1][1] = serde_json::json!(2);
    value["documents"][2]["length"] = serde_json::json!(4);
    let err = IndexSnapshot::from_json(&value.to_string()).unwrap_err();
    assert!(
        matches!(err, SnapshotError::Invariant(InvariantError::FingerprintMismatch { .. })),
        "{:?}",
        err
    );
}
