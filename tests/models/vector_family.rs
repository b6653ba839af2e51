// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Vector space, generalized vector space, inference network and BIR.

use polyrank::scoring::{params, ParamMap};

use crate::common::{news_snapshot, rank, ranker, snapshot_from_texts};

#[test]
fn test_cosine_scores_are_bounded() {
    let ranker = ranker(news_snapshot());
    for weighting in ["tf", "tf-idf", "log-tf-idf"] {
        for model in ["vector", "gvsm"] {
            let response = rank(&ranker, model, params([("weighting", weighting)]), "bank interest rates inflation");
            for doc in &response.result.documents {
                assert!(doc.score > 0.0 && doc.score <= 1.0 + 1e-12, "{} {} {}", model, weighting, doc.score);
            }
        }
    }
}

#[test]
fn test_document_as_query_scores_one() {
    let ranker = ranker(news_snapshot());
    let response = rank(&ranker, "vector", params([("weighting", "tf")]), "markets rally as rates fall");
    let top = &response.result.documents[0];
    assert_eq!(top.key, "n8");
    assert!((top.score - 1.0).abs() < 1e-12);
}

#[test]
fn test_gvsm_without_cooccurrence_is_vsm() {
    let ranker = ranker(snapshot_from_texts(&["cat cat", "dog", "bird", "fish"]));
    for correlation in ["minterm", "cooccurrence"] {
        for weighting in ["tf", "tf-idf", "log-tf-idf"] {
            let vsm = rank(&ranker, "vector", params([("weighting", weighting)]), "cat dog");
            let gvsm = rank(
                &ranker,
                "gvsm",
                params([("correlation", correlation), ("weighting", weighting)]),
                "cat dog",
            );
            assert_eq!(vsm.result.keys(), gvsm.result.keys());
            for (a, b) in vsm.result.documents.iter().zip(&gvsm.result.documents) {
                assert!((a.score - b.score).abs() < 1e-12, "{} {}", correlation, weighting);
            }
        }
    }
}

#[test]
fn test_gvsm_echoes_its_params() {
    let ranker = ranker(news_snapshot());
    let response = rank(&ranker, "gvsm", params([("correlation", "cooccurrence")]), "bank");
    let echoed = &response.result.models[0].params;
    assert_eq!(echoed["correlation"].as_str(), Some("cooccurrence"));
    assert_eq!(echoed["weighting"].as_str(), Some("tf-idf"));
}

#[test]
fn test_belief_scores_are_probabilities() {
    let ranker = ranker(news_snapshot());
    for combination in ["noisy-or", "weighted-sum", "max"] {
        for term_weight in ["inquery", "tf-idf", "binary"] {
            let response = rank(
                &ranker,
                "belief",
                params([("combination", combination), ("term_weight", term_weight)]),
                "football club league",
            );
            assert!(!response.result.is_empty());
            for doc in &response.result.documents {
                assert!(doc.score > 0.0 && doc.score <= 1.0, "{} {}", combination, term_weight);
            }
        }
    }
}

#[test]
fn test_noisy_or_rewards_more_matching_terms() {
    let ranker = ranker(news_snapshot());
    let response = rank(&ranker, "belief", params([("combination", "noisy-or")]), "football club league");
    // n3 holds all three terms, n5 and n7 two each
    let keys = response.result.keys();
    assert_eq!(keys.len(), 3);
    assert_eq!(keys[0], "n3");
}

#[test]
fn test_probabilistic_feedback_keeps_candidates() {
    let ranker = ranker(news_snapshot());
    let initial = rank(&ranker, "probabilistic", params([("iterations", 0.0)]), "central bank rates");
    let refined = rank(&ranker, "probabilistic", ParamMap::new(), "central bank rates");
    let mut a = initial.result.keys();
    let mut b = refined.result.keys();
    a.sort_unstable();
    b.sort_unstable();
    assert_eq!(a, b);
}

#[test]
fn test_probabilistic_iteration_cap() {
    use polyrank::rank::{CancellationToken, ModelRequest, RankingRequest};
    let ranker = ranker(news_snapshot());
    let request = RankingRequest::new(
        ModelRequest::new("probabilistic").with_params(params([("iterations", 1000.0)])),
        "bank",
    );
    let err = ranker.execute(&request, &CancellationToken::new()).unwrap_err();
    assert_eq!(err.field(), Some("iterations"));
}
