// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use polyrank::error::ErrorKind;
use polyrank::index::SnapshotHandle;
use polyrank::rank::{CancellationToken, ModelRequest, Ranker, RankingRequest};
use polyrank::EngineConfig;

use crate::common::{news_snapshot, shared_ranker, toy_snapshot};

fn request(query: &str) -> RankingRequest {
    RankingRequest::new(ModelRequest::new("bm25"), query)
}

#[test]
fn test_publish_switches_new_requests_only() {
    let (handle, ranker) = shared_ranker(toy_snapshot());
    let token = CancellationToken::new();
    let before = ranker.execute(&request("dog"), &token).unwrap();
    let held = handle.current().unwrap();

    let replaced = handle.publish(news_snapshot()).unwrap();
    assert_eq!(replaced.fingerprint(), held.fingerprint());

    let after = ranker.execute(&request("dog"), &token).unwrap();
    assert_ne!(before.snapshot_fingerprint, after.snapshot_fingerprint);
    assert!(after.result.is_empty());
    // the reader that grabbed the old snapshot still sees it whole
    assert_eq!(held.num_docs(), 3);
    assert_eq!(held.document_frequency("dog"), 2);
}

#[test]
fn test_parallel_callers_agree() {
    let (_handle, ranker) = shared_ranker(news_snapshot());
    let requests: Vec<RankingRequest> = ["interest rates", "football", "central bank", "markets rally"]
        .into_iter()
        .map(request)
        .collect();
    let expected: Vec<String> = ranker
        .execute_batch(&requests, &CancellationToken::new())
        .into_iter()
        .map(|r| serde_json::to_string(&r.unwrap()).unwrap())
        .collect();

    thread::scope(|scope| {
        let workers: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    ranker
                        .execute_batch(&requests, &CancellationToken::new())
                        .into_iter()
                        .map(|r| serde_json::to_string(&r.unwrap()).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        for worker in workers {
            assert_eq!(worker.join().unwrap(), expected);
        }
    });
}

#[test]
fn test_cancellation_applies_to_the_whole_batch() {
    let (_handle, ranker) = shared_ranker(news_snapshot());
    let token = CancellationToken::new();
    let clone = token.clone();
    thread::spawn(move || clone.cancel()).join().unwrap();
    let results = ranker.execute_batch(&[request("bank"), request("rates")], &token);
    assert!(results.iter().all(|r| r.as_ref().unwrap_err().kind() == ErrorKind::Cancelled));
}

#[test]
fn test_rejection_wins_over_cancellation() {
    let (_handle, ranker) = shared_ranker(news_snapshot());
    let token = CancellationToken::new();
    token.cancel();
    let err = ranker
        .execute(&RankingRequest::new(ModelRequest::new("lsi"), "bank"), &token)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownModel);
}

#[test]
fn test_ranker_waits_for_first_publish() {
    let handle = Arc::new(SnapshotHandle::new());
    let ranker = Ranker::new(Arc::clone(&handle), EngineConfig::default());
    let err = ranker
        .execute(&request("dog"), &CancellationToken::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IndexUnavailable);

    let publisher = {
        let handle = Arc::clone(&handle);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            handle.publish(toy_snapshot());
        })
    };
    handle.wait_for_snapshot(Duration::from_secs(5)).unwrap();
    publisher.join().unwrap();
    assert!(ranker.execute(&request("dog"), &CancellationToken::new()).is_ok());
}
