// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

use polyrank::rank::{CancellationToken, RankingRequest, RankingResponse};
use serde_json::Value;

use crate::common::{news_snapshot, ranker};

fn execute_json(json: &str) -> RankingResponse {
    let request: RankingRequest = serde_json::from_str(json).unwrap();
    ranker(news_snapshot())
        .execute(&request, &CancellationToken::new())
        .unwrap()
}

#[test]
fn test_single_request_from_json() {
    let response = execute_json(
        r#"{"model": {"name": "bm25", "params": {"k1": 1.5, "b": 0.5}}, "query": "football club", "top_k": 2}"#,
    );
    assert_eq!(response.result.keys(), vec!["n7", "n3"]);
    assert_eq!(response.total_candidates, 3);

    let json: Value = serde_json::to_value(&response).unwrap();
    assert_eq!(json["status"], "ranked");
    assert_eq!(json["result"]["models"][0]["name"], "bm25");
    assert_eq!(json["result"]["models"][0]["params"]["k1"], 1.5);
    assert_eq!(json["result"]["models"][0]["params"]["b"], 0.5);
    assert!(json["result"].get("combination").is_none());
    assert_eq!(json["result"]["documents"].as_array().unwrap().len(), 2);
    assert_eq!(json["result"]["documents"][0]["key"], "n7");
    assert!(json["result"]["documents"][0].get("explanation").is_none());

    let fingerprint = json["snapshot_fingerprint"].as_str().unwrap();
    assert_eq!(fingerprint.len(), 8);
    assert!(fingerprint.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn test_ensemble_request_from_json() {
    let response = execute_json(
        r#"{
            "runs": [
                {"model": {"name": "bm25"}},
                {"model": {"name": "pl2"}, "query": "inflation"}
            ],
            "query": "interest rates",
            "combination": "rrf",
            "explain": true
        }"#,
    );
    let json: Value = serde_json::to_value(&response).unwrap();
    assert_eq!(json["result"]["combination"], "reciprocal-rank");
    let names: Vec<&str> = json["result"]["models"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["bm25", "pl2"]);
    assert!(json["result"]["documents"][0]["explanation"].is_array());
}

#[test]
fn test_empty_query_status_on_the_wire() {
    let response = execute_json(r#"{"model": {"name": "vector"}, "query": "  "}"#);
    let json: Value = serde_json::to_value(&response).unwrap();
    assert_eq!(json["status"], "empty-query");
    assert_eq!(json["total_candidates"], 0);
    assert!(json["result"]["documents"].as_array().unwrap().is_empty());
}

#[test]
fn test_response_survives_serde() {
    let response = execute_json(r#"{"model": {"name": "belief"}, "query": "central bank", "explain": true}"#);
    let text = serde_json::to_string(&response).unwrap();
    let back: RankingResponse = serde_json::from_str(&text).unwrap();
    assert_eq!(back.status, response.status);
    assert_eq!(back.snapshot_fingerprint, response.snapshot_fingerprint);
    assert_eq!(back.result.keys(), response.result.keys());
    for (a, b) in back.result.documents.iter().zip(&response.result.documents) {
        assert!((a.score - b.score).abs() < 1e-12);
        assert_eq!(
            a.explanation.as_ref().map(Vec::len),
            b.explanation.as_ref().map(Vec::len)
        );
    }
}
