// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Evaluation over a small judged topic set.

mod common;

use std::fs;

use polyrank::eval::{
    evaluate_run, load_qrels, load_topics, parse_qrels, EvalInputError, Judgments, Metric,
};
use polyrank::rank::{CancellationToken, ModelRequest, RankingRequest};
use tempfile::TempDir;

use common::{news_snapshot, ranker};

const QRELS: &str = "\
# topic iter doc grade
t1 0 n3 1
t1 0 n7 2
t1 0 n1 0
t2 0 n6 1
";

const TOPICS: &str = r#"[
    {"id": "t1", "query": "football"},
    {"id": "t2", "query": "inflation"},
    {"id": "t3", "query": "stadium"}
]"#;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_files_load() {
    let dir = TempDir::new().unwrap();
    let qrels_path = dir.path().join("qrels.txt");
    let topics_path = dir.path().join("topics.json");
    fs::write(&qrels_path, QRELS).unwrap();
    fs::write(&topics_path, TOPICS).unwrap();

    let qrels = load_qrels(&qrels_path).unwrap();
    assert_eq!(qrels.len(), 2);
    assert_eq!(qrels["t1"].grade("n7"), 2);
    assert!(!qrels["t1"].is_relevant("n1"));
    assert_eq!(qrels["t1"].num_relevant(), 2);

    let topics = load_topics(&topics_path).unwrap();
    assert_eq!(topics.len(), 3);
    assert_eq!(topics[1].query, "inflation");
}

#[test]
fn test_missing_and_malformed_inputs() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        load_qrels(dir.path().join("absent")),
        Err(EvalInputError::Io { .. })
    ));
    assert!(matches!(
        parse_qrels("t1 0 n1\n"),
        Err(EvalInputError::Qrels { line: 1, .. })
    ));
    assert!(matches!(
        parse_qrels("t1 0 n1 1\nt1 0 n2 high\n"),
        Err(EvalInputError::Qrels { line: 2, .. })
    ));
}

#[test]
fn test_bm25_run_over_news() {
    let qrels = parse_qrels(QRELS).unwrap();
    let topics = polyrank::eval::parse_topics(TOPICS).unwrap();
    let metrics = [
        Metric::Precision(3),
        Metric::Recall(3),
        Metric::ReciprocalRank,
        Metric::AveragePrecision,
    ];
    let template = RankingRequest::new(ModelRequest::new("bm25"), "");
    let report = evaluate_run(
        &ranker(news_snapshot()),
        &topics,
        &qrels,
        &template,
        &metrics,
        &CancellationToken::new(),
    )
    .unwrap();

    // t1 "football": n5 (6 tokens), n7 (7), n3 (8)
    // t2 "inflation": n2 (7 tokens), then n1 and n6 tied at 8, by id
    assert_eq!(report.topics.len(), 2);
    assert_eq!(report.unjudged, vec!["t3"]);
    let t1 = &report.topics[0];
    assert_eq!(t1.topic, "t1");
    assert_eq!(t1.retrieved, 3);
    assert!(close(t1.values[&Metric::Precision(3)], 2.0 / 3.0));
    assert!(close(t1.values[&Metric::Recall(3)], 1.0));
    assert!(close(t1.values[&Metric::ReciprocalRank], 0.5));
    assert!(close(t1.values[&Metric::AveragePrecision], (0.5 + 2.0 / 3.0) / 2.0));

    let t2 = &report.topics[1];
    assert!(close(t2.values[&Metric::ReciprocalRank], 1.0 / 3.0));
    assert!(close(t2.values[&Metric::Recall(3)], 1.0));

    assert!(close(
        report.mean(Metric::ReciprocalRank).unwrap(),
        (0.5 + 1.0 / 3.0) / 2.0
    ));
    assert!(close(report.mean(Metric::Recall(3)).unwrap(), 1.0));
    assert_eq!(report.mean(Metric::Ndcg(10)), None);
    assert_eq!(report.snapshot_fingerprint, news_snapshot().fingerprint_hex());
}

#[test]
fn test_depth_limits_what_metrics_see() {
    let qrels = parse_qrels(QRELS).unwrap();
    let topics = polyrank::eval::parse_topics(TOPICS).unwrap();
    let template = RankingRequest::new(ModelRequest::new("bm25"), "").with_top_k(1);
    let report = evaluate_run(
        &ranker(news_snapshot()),
        &topics,
        &qrels,
        &template,
        &[Metric::ReciprocalRank],
        &CancellationToken::new(),
    )
    .unwrap();
    assert!(report.topics.iter().all(|t| t.retrieved == 1));
    // n5 and n2 are at rank 1 and neither is relevant
    assert_eq!(report.mean(Metric::ReciprocalRank), Some(0.0));
}

#[test]
fn test_failing_topic_fails_the_run() {
    let qrels = parse_qrels(QRELS).unwrap();
    let topics = polyrank::eval::parse_topics(TOPICS).unwrap();
    let template = RankingRequest::new(ModelRequest::new("no-such-model"), "");
    let err = evaluate_run(
        &ranker(news_snapshot()),
        &topics,
        &qrels,
        &template,
        &[Metric::AveragePrecision],
        &CancellationToken::new(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), polyrank::ErrorKind::UnknownModel);
}

#[test]
fn test_graded_ndcg() {
    let judgments: Judgments = [("n7", 2), ("n3", 1)].into_iter().collect();
    // ideal: n7 then n3
    let ideal = 3.0 + 1.0 / 3f64.log2();
    let swapped = 1.0 + 3.0 / 3f64.log2();
    let ndcg = Metric::Ndcg(10).compute(&["n3", "n7"], &judgments);
    assert!(close(ndcg, swapped / ideal));
    assert!(close(Metric::Ndcg(10).compute(&["n7", "n3"], &judgments), 1.0));
    assert_eq!(Metric::Ndcg(10).compute(&["n1"], &judgments), 0.0);
}

#[test]
fn test_report_json_keys_are_metric_names() {
    let qrels = parse_qrels(QRELS).unwrap();
    let topics = polyrank::eval::parse_topics(TOPICS).unwrap();
    let report = evaluate_run(
        &ranker(news_snapshot()),
        &topics,
        &qrels,
        &RankingRequest::new(ModelRequest::new("pl2"), ""),
        &["map".parse().unwrap(), "ndcg@5".parse().unwrap()],
        &CancellationToken::new(),
    )
    .unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert!(json["means"]["map"].is_number());
    assert!(json["means"]["ndcg@5"].is_number());
    assert_eq!(json["unjudged"][0], "t3");
}
