// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! BM25, its PageRank blend and the DFR models.

use polyrank::error::ErrorKind;
use polyrank::rank::{CancellationToken, ModelRequest, RankingRequest};
use polyrank::scoring::{params, ParamMap};

use crate::common::{linked_news_snapshot, news_snapshot, rank, rank_keys, ranker, toy_snapshot};

fn idf(n: f64, df: f64) -> f64 {
    (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
}

#[test]
fn test_toy_bm25_order() {
    assert_eq!(rank_keys(&ranker(toy_snapshot()), "bm25", "dog bird"), vec!["doc2", "doc3", "doc1"]);
}

#[test]
fn test_k1_zero_is_idf_presence() {
    let ranker = ranker(news_snapshot());
    for b in [0.0, 0.4, 1.0] {
        let response = rank(&ranker, "bm25", params([("k1", 0.0), ("b", b)]), "interest rates");
        let scores: Vec<(&str, f64)> = response
            .result
            .documents
            .iter()
            .map(|d| (d.key.as_str(), d.score))
            .collect();
        let one = idf(8.0, 3.0);
        assert_eq!(scores.len(), 4);
        // n1 and n2 contain both terms and tie; the lower id wins
        assert_eq!(scores[0].0, "n1");
        assert_eq!(scores[1].0, "n2");
        assert!((scores[0].1 - 2.0 * one).abs() < 1e-12);
        assert!((scores[1].1 - 2.0 * one).abs() < 1e-12);
        assert_eq!(
            scores[2..].iter().map(|(k, _)| *k).collect::<Vec<_>>(),
            vec!["n4", "n8"]
        );
        assert!((scores[3].1 - one).abs() < 1e-12);
    }
}

#[test]
fn test_length_normalization_prefers_shorter_documents() {
    let ranker = ranker(crate::common::snapshot_from_texts(&[
        "rates",
        "rates and many other words that dilute the document",
    ]));
    let keys = rank_keys(&ranker, "bm25", "rates");
    assert_eq!(keys, vec!["doc1", "doc2"]);
    let flat = rank(&ranker, "bm25", params([("b", 0.0)]), "rates");
    let docs = &flat.result.documents;
    assert!((docs[0].score - docs[1].score).abs() < 1e-12);
}

#[test]
fn test_pagerank_blend_never_exceeds_bm25() {
    let ranker = ranker(linked_news_snapshot());
    let query = "central bank interest rates";
    let bm25 = rank(&ranker, "bm25", ParamMap::new(), query);
    let blended = rank(&ranker, "pagerank-bm25", ParamMap::new(), query);
    assert_eq!(bm25.total_candidates, blended.total_candidates);
    for doc in &blended.result.documents {
        let plain = bm25.result.documents.iter().find(|d| d.doc == doc.doc).unwrap();
        assert!(doc.score <= plain.score + 1e-12, "{}", doc.key);
        if doc.key == "n1" {
            // the most linked-to document carries the maximum prior
            assert!((doc.score - plain.score).abs() < 1e-12);
        }
    }
}

#[test]
fn test_pagerank_blend_without_links_is_bm25() {
    let ranker = ranker(news_snapshot());
    let bm25 = rank(&ranker, "bm25", ParamMap::new(), "football club final");
    let blended = rank(&ranker, "pagerank-bm25", ParamMap::new(), "football club final");
    assert_eq!(bm25.result.documents, blended.result.documents);
}

#[test]
fn test_pagerank_alpha_one_is_bm25() {
    let ranker = ranker(linked_news_snapshot());
    let bm25 = rank(&ranker, "bm25", ParamMap::new(), "markets inflation");
    let blended = rank(&ranker, "pagerank-bm25", params([("alpha", 1.0)]), "markets inflation");
    assert_eq!(bm25.result.keys(), blended.result.keys());
}

#[test]
fn test_dfr_models_rank_rare_terms_higher() {
    let ranker = ranker(news_snapshot());
    for model in ["dfree", "pl2"] {
        // "stadium" occurs in n7 only
        let response = rank(&ranker, model, ParamMap::new(), "stadium");
        assert_eq!(response.result.keys(), vec!["n7"], "{}", model);
        assert!(response.result.documents[0].score > 0.0);
    }
}

#[test]
fn test_pl2_c_changes_scores_but_must_be_positive() {
    let ranker = ranker(news_snapshot());
    let low = rank(&ranker, "pl2", params([("c", 0.5)]), "inflation");
    let high = rank(&ranker, "pl2", params([("c", 8.0)]), "inflation");
    assert_ne!(low.result.documents[0].score, high.result.documents[0].score);

    let request = RankingRequest::new(ModelRequest::new("pl2").with_params(params([("c", 0.0)])), "inflation");
    let err = ranker.execute(&request, &CancellationToken::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    assert_eq!(err.field(), Some("c"));
}
