// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The ranking orchestrator.
//!
//! [`Ranker::execute`] takes one request through
//! `Received → Validated → Scored → Merged → Sorted → Truncated → Delivered`:
//!
//! 1. **Validate** everything up front: model names, parameters (config
//!    defaults merged under the request's own), queries, `top_k`, the
//!    combination policy. Nothing is scored for a request that fails here.
//! 2. **Score** every run against one `Arc` snapshot, in parallel with the
//!    `parallel` feature. Runs share nothing mutable.
//! 3. **Merge** the runs with the combination policy (single mode: identity).
//!    Rank-based policies see each run cut to the fusion depth.
//! 4. **Sort** by the total order, **truncate** to `top_k`, attach
//!    explanations when asked.
//!
//! The cancellation token is checked at each stage boundary and before each
//! run; cancellation discards all partial results.

pub mod cancel;
pub mod fusion;
pub mod lifecycle;
pub mod request;

use std::collections::BTreeSet;
use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, instrument, warn};

use crate::config::EngineConfig;
use crate::contracts::check_ranking_order;
use crate::error::RankError;
use crate::index::{IndexSnapshot, SnapshotHandle};
use crate::query::Query;
use crate::scoring::ranking::rank_scores;
use crate::scoring::{DocScores, ModelKind, ModelSpec, ScoringModel};
use crate::types::{DocId, RankingResult, ScoredDocument, TermContribution};

pub use cancel::CancellationToken;
pub use fusion::{Combination, CombinationPolicy, RankedRun};
pub use lifecycle::{Lifecycle, Stage};
pub use request::{
    ModelRequest, QueryInput, RankingRequest, RankingResponse, RankingStatus, RunRequest, ENSEMBLE,
};

/// A validated request, ready to score.
#[derive(Debug)]
struct Plan {
    runs: Vec<(ModelSpec, Query)>,
    combination: Option<Combination>,
    top_k: usize,
    fusion_depth: usize,
    explain: bool,
}

impl Plan {
    fn is_empty_query(&self) -> bool {
        self.runs.iter().all(|(_, q)| q.is_empty())
    }
}

/// Runs ranking requests against whatever snapshot is currently published.
pub struct Ranker {
    handle: Arc<SnapshotHandle>,
    config: EngineConfig,
}

impl Ranker {
    pub fn new(handle: Arc<SnapshotHandle>, config: EngineConfig) -> Self {
        Self { handle, config }
    }

    /// A ranker over one fixed snapshot with default configuration.
    pub fn with_snapshot(snapshot: impl Into<Arc<IndexSnapshot>>) -> Self {
        Self::new(Arc::new(SnapshotHandle::with_snapshot(snapshot)), EngineConfig::default())
    }

    pub fn handle(&self) -> &Arc<SnapshotHandle> {
        &self.handle
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[instrument(skip_all, fields(ensemble = request.is_ensemble(), runs = request.runs.len()))]
    pub fn execute(
        &self,
        request: &RankingRequest,
        token: &CancellationToken,
    ) -> Result<RankingResponse, RankError> {
        let mut lifecycle = Lifecycle::new();

        let plan = match self.plan(request) {
            Ok(plan) => plan,
            Err(err) => {
                lifecycle.advance(Stage::Rejected)?;
                warn!(kind = ?err.kind(), field = err.field(), error = %err, "request rejected");
                return Err(err);
            }
        };
        lifecycle.advance(Stage::Validated)?;
        let result = self.run(&plan, token, &mut lifecycle);
        if matches!(result, Err(RankError::Cancelled)) && !lifecycle.current().is_terminal() {
            lifecycle.advance(Stage::Cancelled)?;
            debug!("request cancelled");
        }
        result
    }

    /// Independent requests in parallel; results in request order.
    pub fn execute_batch(
        &self,
        requests: &[RankingRequest],
        token: &CancellationToken,
    ) -> Vec<Result<RankingResponse, RankError>> {
        #[cfg(feature = "parallel")]
        {
            requests.par_iter().map(|r| self.execute(r, token)).collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            requests.iter().map(|r| self.execute(r, token)).collect()
        }
    }

    // =========================================================================
    // VALIDATION
    // =========================================================================

    fn model(&self, request: &request::ModelRequest) -> Result<ModelSpec, RankError> {
        let kind: ModelKind = request.name.parse()?;
        let mut params = self.config.model_defaults(kind);
        params.extend(request.params.iter().map(|(k, v)| (k.clone(), v.clone())));
        ModelSpec::build(kind, &params)
    }

    fn plan(&self, request: &RankingRequest) -> Result<Plan, RankError> {
        let ranking = &self.config.ranking;
        let op = request.default_operator.unwrap_or(ranking.default_operator);
        let top_k = request.top_k.unwrap_or(ranking.top_k);
        if top_k == 0 {
            return Err(RankError::invalid_request("top_k", "must be >= 1"));
        }
        let fusion_depth = request
            .fusion_depth
            .or(ranking.fusion_depth)
            .unwrap_or(top_k);
        if fusion_depth == 0 {
            return Err(RankError::invalid_request("fusion_depth", "must be >= 1"));
        }
        let shared = request.query.resolve(op)?;

        if !request.is_ensemble() {
            let model = match &request.model {
                Some(model) => self.model(model)?,
                None => self.model(&ModelRequest::new(ranking.default_model.clone()))?,
            };
            if let Some(name) = &request.combination {
                Combination::parse(name, ranking.rrf_k)?;
            }
            return Ok(Plan {
                runs: vec![(model, shared)],
                combination: None,
                top_k,
                fusion_depth,
                explain: request.explain,
            });
        }

        if request.runs.is_empty() {
            return Err(RankError::invalid_request("runs", "an ensemble needs at least one run"));
        }
        if request.model.as_ref().is_some_and(|m| m.name != ENSEMBLE) {
            return Err(RankError::invalid_request(
                "model",
                "give either a single model or ensemble runs, not both",
            ));
        }
        let combination = Combination::parse(
            request.combination.as_deref().unwrap_or(&ranking.combination),
            ranking.rrf_k,
        )?;
        let runs = request
            .runs
            .iter()
            .map(|run| {
                let query = match &run.query {
                    Some(query) => query.resolve(op)?,
                    None => shared.clone(),
                };
                Ok((self.model(&run.model)?, query))
            })
            .collect::<Result<Vec<_>, RankError>>()?;
        Ok(Plan {
            runs,
            combination: Some(combination),
            top_k,
            fusion_depth,
            explain: request.explain,
        })
    }

    // =========================================================================
    // EXECUTION
    // =========================================================================

    fn run(
        &self,
        plan: &Plan,
        token: &CancellationToken,
        lifecycle: &mut Lifecycle,
    ) -> Result<RankingResponse, RankError> {
        let snapshot = self.handle.current()?;
        token.check()?;

        let score_run = |(model, query): &(ModelSpec, Query)| -> Result<DocScores, RankError> {
            token.check()?;
            model.score(query, &snapshot)
        };
        #[cfg(feature = "parallel")]
        let scored: Vec<DocScores> = plan.runs.par_iter().map(score_run).collect::<Result<_, _>>()?;
        #[cfg(not(feature = "parallel"))]
        let scored: Vec<DocScores> = plan.runs.iter().map(score_run).collect::<Result<_, _>>()?;
        lifecycle.advance(Stage::Scored)?;
        token.check()?;

        let merged = match &plan.combination {
            None => scored.into_iter().next().unwrap_or_default(),
            Some(policy) => {
                let mut ranked: Vec<RankedRun> = scored.iter().map(rank_scores).collect();
                if policy.is_rank_based() {
                    for run in &mut ranked {
                        run.truncate(plan.fusion_depth);
                    }
                }
                policy.combine(&ranked)
            }
        };
        lifecycle.advance(Stage::Merged)?;
        token.check()?;

        let ranked = rank_scores(&merged);
        let total_candidates = ranked.len();
        lifecycle.advance(Stage::Sorted)?;
        token.check()?;

        let documents: Vec<ScoredDocument> = ranked
            .into_iter()
            .take(plan.top_k)
            .map(|(doc, score)| ScoredDocument {
                doc,
                key: snapshot.doc_key(doc).unwrap_or_default().to_string(),
                score,
                explanation: plan.explain.then(|| explain(plan, &snapshot, doc)),
            })
            .collect();
        check_ranking_order(&documents);
        lifecycle.advance(Stage::Truncated)?;
        token.check()?;

        let status = if plan.is_empty_query() {
            RankingStatus::EmptyQuery
        } else {
            RankingStatus::Ranked
        };
        let response = RankingResponse {
            status,
            result: RankingResult {
                models: plan.runs.iter().map(|(model, _)| model.descriptor()).collect(),
                combination: plan.combination.map(|c| CombinationPolicy::name(&c).to_string()),
                documents,
            },
            total_candidates,
            snapshot_fingerprint: snapshot.fingerprint_hex(),
        };
        lifecycle.advance(Stage::Delivered)?;
        debug!(
            delivered = response.result.len(),
            total_candidates, "request delivered"
        );
        Ok(response)
    }
}

/// Single mode: the model's own explanation. Ensembles: the matched terms
/// across runs, with no per-term share since fused scores are not additive.
fn explain(plan: &Plan, snapshot: &IndexSnapshot, doc: DocId) -> Vec<TermContribution> {
    if plan.combination.is_none() {
        return plan
            .runs
            .first()
            .map(|(model, query)| model.explain(query, snapshot, doc))
            .unwrap_or_default();
    }
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for (model, query) in &plan.runs {
        for mut contribution in model.explain(query, snapshot, doc) {
            if seen.insert(contribution.term.clone()) {
                contribution.contribution = None;
                out.push(contribution);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::scoring::params;
    use crate::testing::toy_snapshot;

    fn ranker() -> Ranker {
        Ranker::with_snapshot(toy_snapshot())
    }

    fn keys(response: &RankingResponse) -> Vec<&str> {
        response.result.keys()
    }

    #[test]
    fn test_single_bm25() {
        let request = RankingRequest::new(ModelRequest::new("bm25"), "dog bird");
        let response = ranker().execute(&request, &CancellationToken::new()).unwrap();
        assert_eq!(response.status, RankingStatus::Ranked);
        assert_eq!(keys(&response), vec!["doc2", "doc3", "doc1"]);
        assert_eq!(response.total_candidates, 3);
        assert_eq!(response.result.models[0].name, "bm25");
    }

    #[test]
    fn test_top_k_truncates_after_counting() {
        let request = RankingRequest::new(ModelRequest::new("bm25"), "dog bird").with_top_k(1);
        let response = ranker().execute(&request, &CancellationToken::new()).unwrap();
        assert_eq!(keys(&response), vec!["doc2"]);
        assert_eq!(response.total_candidates, 3);
    }

    #[test]
    fn test_empty_query_is_a_status() {
        let request = RankingRequest::new(ModelRequest::new("bm25"), "");
        let response = ranker().execute(&request, &CancellationToken::new()).unwrap();
        assert_eq!(response.status, RankingStatus::EmptyQuery);
        assert!(response.result.is_empty());
    }

    #[test]
    fn test_rejections_name_the_field() {
        let ranker = ranker();
        let token = CancellationToken::new();
        let cases = [
            (RankingRequest::new(ModelRequest::new("lsi"), "dog"), ErrorKind::UnknownModel),
            (
                RankingRequest::new(
                    ModelRequest::new("bm25").with_params(params([("b", 3.0)])),
                    "dog",
                ),
                ErrorKind::InvalidParameter,
            ),
            (RankingRequest::new(ModelRequest::new("boolean"), "(dog"), ErrorKind::MalformedQuery),
            (
                RankingRequest::new(ModelRequest::new("bm25"), "dog").with_top_k(0),
                ErrorKind::InvalidRequest,
            ),
            (
                RankingRequest::new(ModelRequest::new(ENSEMBLE), "dog"),
                ErrorKind::InvalidRequest,
            ),
            (
                RankingRequest::new(ModelRequest::new("bm25"), "dog").with_combination("weighted"),
                ErrorKind::InvalidRequest,
            ),
        ];
        for (request, kind) in cases {
            let err = ranker.execute(&request, &token).unwrap_err();
            assert_eq!(err.kind(), kind, "{:?}", request);
            assert!(err.is_rejection());
        }
    }

    #[test]
    fn test_ensemble_score_sum_equals_sum_of_runs() {
        let ranker = ranker();
        let token = CancellationToken::new();
        let request = RankingRequest::ensemble(
            vec![
                RunRequest::new(ModelRequest::new("bm25")),
                RunRequest::new(ModelRequest::new("pl2")),
            ],
            "dog bird",
        )
        .with_combination("score-sum")
        .with_top_k(100);
        let fused = ranker.execute(&request, &token).unwrap();
        assert_eq!(fused.result.combination.as_deref(), Some("score-sum"));

        let single = |name: &str| {
            let req = RankingRequest::new(ModelRequest::new(name), "dog bird").with_top_k(100);
            ranker.execute(&req, &token).unwrap()
        };
        let (bm25, pl2) = (single("bm25"), single("pl2"));
        for doc in &fused.result.documents {
            let score_of = |r: &RankingResponse| {
                r.result
                    .documents
                    .iter()
                    .find(|d| d.doc == doc.doc)
                    .map_or(0.0, |d| d.score)
            };
            assert!((doc.score - (score_of(&bm25) + score_of(&pl2))).abs() < 1e-12);
        }
    }

    fn wide_ranker(config: EngineConfig) -> Ranker {
        let texts: Vec<String> = (0..400)
            .map(|i| {
                let mut text = "common ".repeat(i % 9 + 1);
                text.push_str(&"filler ".repeat(i % 13 + 1));
                text.push_str(if i % 2 == 0 { "even" } else { "odd" });
                text
            })
            .collect();
        let texts: Vec<&str> = texts.iter().map(String::as_str).collect();
        let snapshot = crate::testing::snapshot_from_texts(&texts);
        Ranker::new(Arc::new(SnapshotHandle::with_snapshot(snapshot)), config)
    }

    fn wide_ensemble(combination: &str) -> RankingRequest {
        RankingRequest::ensemble(
            vec![
                RunRequest::new(ModelRequest::new("bm25")),
                RunRequest::new(ModelRequest::new("pl2")),
                RunRequest::new(ModelRequest::new("vector")).with_query("common even"),
            ],
            "common filler",
        )
        .with_combination(combination)
        .with_top_k(5)
    }

    #[test]
    fn test_rank_based_fusion_reads_top_k_of_each_run() {
        let ranker = wide_ranker(EngineConfig::default());
        let token = CancellationToken::new();
        for name in ["reciprocal-rank", "borda", "markov-chain"] {
            let response = ranker.execute(&wide_ensemble(name), &token).unwrap();
            assert_eq!(response.result.len(), 5, "{}", name);
            assert!(response.total_candidates <= 3 * 5, "{}", name);
        }
        let summed = ranker.execute(&wide_ensemble("score-sum"), &token).unwrap();
        assert_eq!(summed.total_candidates, 400);
    }

    #[test]
    fn test_fusion_depth_from_request_then_config() {
        let token = CancellationToken::new();
        let mut config = EngineConfig::default();
        config.ranking.fusion_depth = Some(40);
        let ranker = wide_ranker(config);

        let configured = ranker.execute(&wide_ensemble("markov-chain"), &token).unwrap();
        assert!((40..=120).contains(&configured.total_candidates));
        let total: f64 = configured.result.documents.iter().map(|d| d.score).sum();
        assert!(total > 0.0 && total <= 1.0);

        let request = wide_ensemble("markov-chain").with_fusion_depth(2);
        let narrow = ranker.execute(&request, &token).unwrap();
        assert!((2..=6).contains(&narrow.total_candidates));

        let err = ranker
            .execute(&wide_ensemble("borda").with_fusion_depth(0), &token)
            .unwrap_err();
        assert_eq!(err.field(), Some("fusion_depth"));
    }

    #[test]
    fn test_cancelled_request_returns_nothing() {
        let token = CancellationToken::new();
        token.cancel();
        let request = RankingRequest::new(ModelRequest::new("bm25"), "dog");
        assert_eq!(ranker().execute(&request, &token), Err(RankError::Cancelled));
    }

    #[test]
    fn test_unpublished_snapshot_is_unavailable() {
        let ranker = Ranker::new(Arc::new(SnapshotHandle::new()), EngineConfig::default());
        let request = RankingRequest::new(ModelRequest::new("bm25"), "dog");
        let err = ranker.execute(&request, &CancellationToken::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IndexUnavailable);
    }

    #[test]
    fn test_config_defaults_under_request_params() {
        let mut config = EngineConfig::default();
        config.models.insert("bm25".into(), params([("k1", 0.0), ("b", 0.5)]));
        let ranker = Ranker::new(Arc::new(SnapshotHandle::with_snapshot(toy_snapshot())), config);
        let request = RankingRequest::new(
            ModelRequest::new("bm25").with_params(params([("b", 0.25)])),
            "dog",
        );
        let response = ranker.execute(&request, &CancellationToken::new()).unwrap();
        let echoed = &response.result.models[0].params;
        assert_eq!(echoed["k1"], params([("k1", 0.0)])["k1"]);
        assert_eq!(echoed["b"], params([("b", 0.25)])["b"]);
    }

    #[test]
    fn test_explanations() {
        let request = RankingRequest::new(ModelRequest::new("bm25"), "dog bird").with_explain(true);
        let response = ranker().execute(&request, &CancellationToken::new()).unwrap();
        let top = &response.result.documents[0];
        let explanation = top.explanation.as_ref().unwrap();
        let total: f64 = explanation.iter().filter_map(|c| c.contribution).sum();
        assert!((total - top.score).abs() < 1e-12);
    }

    #[test]
    fn test_identical_requests_serialize_identically() {
        let ranker = ranker();
        let token = CancellationToken::new();
        let request = RankingRequest::ensemble(
            vec![
                RunRequest::new(ModelRequest::new("vector")),
                RunRequest::new(ModelRequest::new("belief")),
                RunRequest::new(ModelRequest::new("dfree")).with_query("cat"),
            ],
            "dog bird",
        )
        .with_combination("markov-chain");
        let a = serde_json::to_string(&ranker.execute(&request, &token).unwrap()).unwrap();
        let b = serde_json::to_string(&ranker.execute(&request, &token).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_batch_keeps_order() {
        let requests = vec![
            RankingRequest::new(ModelRequest::new("bm25"), "cat"),
            RankingRequest::new(ModelRequest::new("nope"), "cat"),
            RankingRequest::new(ModelRequest::new("boolean"), "cat AND dog"),
        ];
        let results = ranker().execute_batch(&requests, &CancellationToken::new());
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert_eq!(keys(results[2].as_ref().unwrap()), vec!["doc1"]);
    }
}
