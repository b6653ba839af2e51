// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Boolean and extended Boolean (p-norm) retrieval.

use std::collections::BTreeSet;

use polyrank::query::DefaultOperator;
use polyrank::rank::{CancellationToken, ModelRequest, RankingRequest};
use polyrank::scoring::{params, ParamMap};

use crate::common::{news_snapshot, rank, rank_keys, ranker, toy_snapshot};

fn key_set(keys: Vec<String>) -> BTreeSet<String> {
    keys.into_iter().collect()
}

#[test]
fn test_cat_and_dog() {
    let ranker = ranker(toy_snapshot());
    assert_eq!(rank_keys(&ranker, "boolean", "cat AND dog"), vec!["doc1"]);
    assert_eq!(rank_keys(&ranker, "boolean", "cat AND NOT dog"), vec!["doc3"]);
    assert_eq!(rank_keys(&ranker, "boolean", "bird OR dog"), vec!["doc1", "doc2", "doc3"]);
}

#[test]
fn test_conjunction_with_query_and_its_negation_partitions() {
    let ranker = ranker(news_snapshot());
    for anchor in ["bank", "inflation", "football", "rates"] {
        let universe = key_set(rank_keys(&ranker, "boolean", anchor));
        for query in ["football OR league", "bank AND inflation", "rates AND NOT interest"] {
            let with = key_set(rank_keys(&ranker, "boolean", &format!("{} AND ({})", anchor, query)));
            let without = key_set(rank_keys(&ranker, "boolean", &format!("{} AND NOT ({})", anchor, query)));
            assert!(with.is_disjoint(&without), "{} / {}", anchor, query);
            assert_eq!(&with | &without, universe, "{} / {}", anchor, query);
        }
    }
}

#[test]
fn test_boolean_scores_are_one() {
    let response = rank(&ranker(news_snapshot()), "boolean", ParamMap::new(), "football OR markets");
    assert!(response.result.documents.iter().all(|d| d.score == 1.0));
}

#[test]
fn test_absent_term_in_conjunction_is_empty() {
    let ranker = ranker(news_snapshot());
    assert!(rank_keys(&ranker, "boolean", "bank AND zebra").is_empty());
    assert_eq!(
        rank_keys(&ranker, "boolean", "bank OR zebra"),
        rank_keys(&ranker, "boolean", "bank")
    );
}

#[test]
fn test_default_operator_and() {
    let ranker = ranker(news_snapshot());
    let request = RankingRequest::new(ModelRequest::new("boolean"), "interest rates")
        .with_default_operator(DefaultOperator::And);
    let response = ranker.execute(&request, &CancellationToken::new()).unwrap();
    assert_eq!(response.result.keys(), vec!["n1", "n2"]);
}

#[test]
fn test_infinite_p_matches_boolean_and() {
    let ranker = ranker(news_snapshot());
    for query in ["interest AND rates", "football AND club", "central AND bank AND inflation"] {
        let boolean = key_set(rank_keys(&ranker, "boolean", query));
        let extended = rank(&ranker, "extended-boolean", params([("p", "inf")]), query);
        assert_eq!(key_set(extended.result.keys().into_iter().map(String::from).collect()), boolean, "{}", query);
    }
}

#[test]
fn test_large_p_approaches_boolean_and() {
    let ranker = ranker(toy_snapshot());
    let score_of = |p: f64, key: &str| {
        rank(&ranker, "extended-boolean", params([("p", p)]), "cat AND dog")
            .result
            .documents
            .iter()
            .find(|d| d.key == key)
            .map_or(0.0, |d| d.score)
    };
    // doc2 has dog but no cat: its AND score shrinks towards 0 as p grows
    assert!(score_of(2.0, "doc2") > score_of(50.0, "doc2"));
    assert!((score_of(1e6, "doc1") - 1.0).abs() < 1e-9);
}

#[test]
fn test_large_p_returns_the_boolean_result_set() {
    let ranker = ranker(news_snapshot());
    for text in ["interest AND rates", "central AND bank AND inflation", "football AND (club OR final)"] {
        let boolean = rank(&ranker, "boolean", ParamMap::new(), text).result;
        for p in [1e3, 1e6] {
            let extended = rank(&ranker, "extended-boolean", params([("p", p)]), text).result;
            let mut expected = boolean.keys();
            let mut got = extended.keys();
            expected.sort_unstable();
            got.sort_unstable();
            assert_eq!(got, expected, "{} at p = {}", text, p);
        }
    }
}

#[test]
fn test_p_below_one_is_rejected() {
    let ranker = ranker(toy_snapshot());
    let request = RankingRequest::new(
        ModelRequest::new("extended-boolean").with_params(params([("p", 0.5)])),
        "cat AND dog",
    );
    let err = ranker.execute(&request, &CancellationToken::new()).unwrap_err();
    assert_eq!(err.field(), Some("p"));
}
