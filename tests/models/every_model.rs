// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Properties every registered model has to satisfy.

use polyrank::rank::{CancellationToken, ModelRequest, RankingRequest, RankingStatus};
use polyrank::scoring::{ModelKind, ParamMap};

use crate::common::{assert_well_formed, news_snapshot, rank, ranker, NEWS};

const QUERIES: [&str; 4] = [
    "interest rates",
    "football club league",
    "central bank inflation",
    "markets",
];

#[test]
fn test_every_model_delivers_well_formed_rankings() {
    let ranker = ranker(news_snapshot());
    for kind in ModelKind::ALL {
        for query in QUERIES {
            let response = rank(&ranker, kind.name(), ParamMap::new(), query);
            assert_eq!(response.status, RankingStatus::Ranked);
            assert_well_formed(&response);
            assert_eq!(response.result.models[0].name, kind.name());
        }
    }
}

#[test]
fn test_every_delivered_document_contains_a_query_term() {
    let ranker = ranker(news_snapshot());
    for kind in ModelKind::ALL {
        for query in QUERIES {
            let words: Vec<&str> = query.split(' ').collect();
            for key in rank(&ranker, kind.name(), ParamMap::new(), query).result.keys() {
                let text = NEWS.iter().find(|(k, _)| *k == key).map(|(_, t)| *t).unwrap();
                assert!(
                    words.iter().any(|w| text.split(' ').any(|t| t == *w)),
                    "{} delivered {} for '{}'",
                    kind,
                    key,
                    query
                );
            }
        }
    }
}

#[test]
fn test_every_model_is_deterministic() {
    let ranker = ranker(news_snapshot());
    for kind in ModelKind::ALL {
        let first = rank(&ranker, kind.name(), ParamMap::new(), "interest rates inflation");
        let second = rank(&ranker, kind.name(), ParamMap::new(), "interest rates inflation");
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap(),
            "{}",
            kind
        );
    }
}

#[test]
fn test_unknown_terms_only_is_empty_ranked_result() {
    let ranker = ranker(news_snapshot());
    for kind in ModelKind::ALL {
        let response = rank(&ranker, kind.name(), ParamMap::new(), "zebra quokka");
        assert!(response.result.is_empty(), "{}", kind);
        assert_eq!(response.total_candidates, 0);
    }
}

#[test]
fn test_unknown_term_does_not_change_scores() {
    let ranker = ranker(news_snapshot());
    for kind in ModelKind::ALL.into_iter().filter(|k| !k.is_structured()) {
        let plain = rank(&ranker, kind.name(), ParamMap::new(), "interest rates");
        let noisy = rank(&ranker, kind.name(), ParamMap::new(), "interest zebra rates");
        assert_eq!(plain.result.keys(), noisy.result.keys(), "{}", kind);
        for (a, b) in plain.result.documents.iter().zip(&noisy.result.documents) {
            assert!((a.score - b.score).abs() < 1e-12, "{}", kind);
        }
    }
}

#[test]
fn test_unknown_parameter_is_rejected_for_every_model() {
    let ranker = ranker(news_snapshot());
    for kind in ModelKind::ALL {
        let request = RankingRequest::new(
            ModelRequest::new(kind.name()).with_params(polyrank::scoring::params([("bogus", 1.0)])),
            "markets",
        );
        let err = ranker.execute(&request, &CancellationToken::new()).unwrap_err();
        assert_eq!(err.field(), Some("bogus"), "{}", kind);
    }
}
