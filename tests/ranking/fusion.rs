// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeSet;

use polyrank::rank::{
    CancellationToken, Combination, ModelRequest, RankingRequest, RankingResponse, RunRequest,
};

use crate::common::{assert_well_formed, news_snapshot, rank_keys, ranker, toy_snapshot};

fn ensemble(models: &[&str], query: &str, combination: &str) -> RankingRequest {
    let runs = models.iter().map(|m| RunRequest::new(ModelRequest::new(*m))).collect();
    RankingRequest::ensemble(runs, query)
        .with_combination(combination)
        .with_top_k(100)
}

fn run(request: &RankingRequest) -> RankingResponse {
    ranker(news_snapshot())
        .execute(request, &CancellationToken::new())
        .unwrap()
}

#[test]
fn test_every_policy_gives_a_total_order_over_the_union() {
    let ranker = ranker(news_snapshot());
    let models = ["bm25", "vector", "dfree", "belief"];
    let query = "central bank interest rates";
    let union: BTreeSet<String> = models
        .iter()
        .flat_map(|m| rank_keys(&ranker, m, query))
        .collect();

    for policy in Combination::NAMES {
        let response = ranker
            .execute(&ensemble(&models, query, policy), &CancellationToken::new())
            .unwrap();
        assert_well_formed(&response);
        assert_eq!(response.result.combination.as_deref(), Some(policy));
        assert_eq!(response.result.models.len(), models.len());
        let fused: BTreeSet<String> = response.result.keys().into_iter().map(String::from).collect();
        assert_eq!(fused, union, "{}", policy);
    }
}

#[test]
fn test_fusion_is_deterministic() {
    for policy in Combination::NAMES {
        let request = ensemble(&["bm25", "pl2", "gvsm"], "football club final", policy);
        let a = serde_json::to_string(&run(&request)).unwrap();
        let b = serde_json::to_string(&run(&request)).unwrap();
        assert_eq!(a, b, "{}", policy);
    }
}

#[test]
fn test_single_run_rrf_keeps_the_run_order() {
    let ranker = ranker(news_snapshot());
    let single = rank_keys(&ranker, "bm25", "inflation markets rates");
    let response = ranker
        .execute(&ensemble(&["bm25"], "inflation markets rates", "rrf"), &CancellationToken::new())
        .unwrap();
    assert_eq!(response.result.keys(), single.iter().map(String::as_str).collect::<Vec<_>>());
    assert!((response.result.documents[0].score - 1.0 / 61.0).abs() < 1e-15);
}

#[test]
fn test_per_run_queries() {
    let runs = vec![
        RunRequest::new(ModelRequest::new("bm25")).with_query("stadium"),
        RunRequest::new(ModelRequest::new("bm25")).with_query("margins"),
    ];
    let request = RankingRequest::ensemble(runs, "").with_combination("borda");
    let response = run(&request);
    let mut keys = response.result.keys();
    keys.sort_unstable();
    assert_eq!(keys, vec!["n4", "n7"]);
}

#[test]
fn test_ensemble_with_only_empty_queries_is_empty_status() {
    let request = ensemble(&["bm25", "vector"], "!!!", "score-sum");
    let response = run(&request);
    assert_eq!(response.status, polyrank::rank::RankingStatus::EmptyQuery);
    assert!(response.result.is_empty());
}

#[test]
fn test_ensemble_explanations_list_terms_without_shares() {
    let request = ensemble(&["bm25", "pl2"], "dog bird", "score-sum").with_explain(true);
    let response = ranker(toy_snapshot())
        .execute(&request, &CancellationToken::new())
        .unwrap();
    let top = &response.result.documents[0];
    assert_eq!(top.key, "doc2");
    let explanation = top.explanation.as_ref().unwrap();
    let terms: Vec<&str> = explanation.iter().map(|c| c.term.as_str()).collect();
    assert_eq!(terms.len(), 2);
    assert!(terms.contains(&"dog") && terms.contains(&"bird"));
    assert!(explanation.iter().all(|c| c.contribution.is_none()));
}

#[test]
fn test_mixing_model_and_runs_is_rejected() {
    let mut request = ensemble(&["bm25"], "dog", "borda");
    request.model = Some(ModelRequest::new("vector"));
    let err = ranker(toy_snapshot())
        .execute(&request, &CancellationToken::new())
        .unwrap_err();
    assert_eq!(err.field(), Some("model"));
}

#[test]
fn test_unknown_run_model_rejects_the_whole_request() {
    let request = ensemble(&["bm25", "lsi"], "dog", "borda");
    let err = ranker(toy_snapshot())
        .execute(&request, &CancellationToken::new())
        .unwrap_err();
    assert_eq!(err, polyrank::RankError::UnknownModel { name: "lsi".into() });
}
