// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Shared test utilities and fixtures.

#![allow(dead_code)]

use std::sync::Arc;

use polyrank::index::{IndexBuilder, IndexSnapshot, SnapshotHandle};
use polyrank::rank::{CancellationToken, ModelRequest, Ranker, RankingRequest, RankingResponse};
use polyrank::scoring::ranking::compare_documents;
use polyrank::scoring::ParamMap;

pub use polyrank::testing::{query, snapshot_from_texts, toy_snapshot};

/// A small news-like collection with enough vocabulary overlap to separate
/// the models.
pub const NEWS: [(&str, &str); 8] = [
    ("n1", "central bank raises interest rates to fight inflation"),
    ("n2", "interest rates held steady as inflation cools"),
    ("n3", "football club wins the league after dramatic final"),
    ("n4", "bank profits rise on higher interest margins"),
    ("n5", "league final draws record football crowd"),
    ("n6", "inflation data surprises markets and the central bank"),
    ("n7", "new stadium for the football club approved"),
    ("n8", "markets rally as rates fall"),
];

pub fn news_snapshot() -> IndexSnapshot {
    let mut builder = IndexBuilder::new();
    for (key, text) in NEWS {
        builder.add_text(key, text).expect("fixture documents are non-empty");
    }
    builder.build().expect("fixture snapshot is valid")
}

/// The news collection with a link graph pointing at n1 and n3.
pub fn linked_news_snapshot() -> IndexSnapshot {
    let mut builder = IndexBuilder::new();
    for (key, text) in NEWS {
        builder.add_text(key, text).expect("fixture documents are non-empty");
    }
    for from in ["n2", "n4", "n6", "n8"] {
        builder.add_link(from, "n1");
    }
    for from in ["n5", "n7"] {
        builder.add_link(from, "n3");
    }
    builder.build().expect("fixture snapshot is valid")
}

pub fn ranker(snapshot: IndexSnapshot) -> Ranker {
    Ranker::with_snapshot(snapshot)
}

pub fn shared_ranker(snapshot: IndexSnapshot) -> (Arc<SnapshotHandle>, Ranker) {
    let handle = Arc::new(SnapshotHandle::with_snapshot(snapshot));
    let ranker = Ranker::new(Arc::clone(&handle), Default::default());
    (handle, ranker)
}

pub fn rank(ranker: &Ranker, model: &str, params: ParamMap, text: &str) -> RankingResponse {
    let request = RankingRequest::new(ModelRequest::new(model).with_params(params), text).with_top_k(100);
    ranker
        .execute(&request, &CancellationToken::new())
        .unwrap_or_else(|e| panic!("{} failed on '{}': {}", model, text, e))
}

pub fn rank_keys(ranker: &Ranker, model: &str, text: &str) -> Vec<String> {
    rank(ranker, model, ParamMap::new(), text)
        .result
        .keys()
        .into_iter()
        .map(String::from)
        .collect()
}

/// Sorted by the total order, finite, no duplicate documents.
pub fn assert_well_formed(response: &RankingResponse) {
    let docs = &response.result.documents;
    for pair in docs.windows(2) {
        assert!(compare_documents(&pair[0], &pair[1]).is_lt(), "{:?}", pair);
    }
    assert!(docs.iter().all(|d| d.score.is_finite()));
    assert!(docs.len() <= response.total_candidates);
}
