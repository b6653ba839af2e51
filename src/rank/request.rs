// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The request and response types of the orchestrator.
//!
//! ```json
//! {
//!   "model": { "name": "bm25", "params": { "k1": 0.9 } },
//!   "query": "dog bird",
//!   "top_k": 10,
//!   "explain": false
//! }
//! ```
//!
//! An ensemble replaces `model` with `runs`, each a model with an optional
//! query of its own, plus a `combination` policy and optionally a
//! `fusion_depth`.

use serde::{Deserialize, Serialize};

use crate::error::RankError;
use crate::query::{parse_query, DefaultOperator, Query, QueryExpr, QueryTerm};
use crate::scoring::ParamMap;
use crate::types::RankingResult;
use crate::utils::normalize;

/// Model name plus request-level parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "ParamMap::is_empty")]
    pub params: ParamMap,
}

impl ModelRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: ParamMap::new(),
        }
    }

    pub fn with_params(mut self, params: ParamMap) -> Self {
        self.params = params;
        self
    }
}

/// A query as text (parsed on arrival) or already structured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryInput {
    Text(String),
    Structured(Query),
}

impl Default for QueryInput {
    fn default() -> Self {
        QueryInput::Text(String::new())
    }
}

impl From<&str> for QueryInput {
    fn from(text: &str) -> Self {
        QueryInput::Text(text.to_string())
    }
}

impl From<Query> for QueryInput {
    fn from(query: Query) -> Self {
        QueryInput::Structured(query)
    }
}

fn normalize_expr(expr: &QueryExpr) -> QueryExpr {
    match expr {
        QueryExpr::Term(t) => QueryExpr::Term(normalize(t)),
        QueryExpr::And(children) => QueryExpr::And(children.iter().map(normalize_expr).collect()),
        QueryExpr::Or(children) => QueryExpr::Or(children.iter().map(normalize_expr).collect()),
        QueryExpr::Not(inner) => QueryExpr::not(normalize_expr(inner)),
    }
}

impl QueryInput {
    /// The analyzed, validated query.
    ///
    /// Structured terms go through the same normalization as indexed text,
    /// so `"Dog"` and `"dog"` are one term either way.
    pub fn resolve(&self, default_op: DefaultOperator) -> Result<Query, RankError> {
        let query = match self {
            QueryInput::Text(text) => parse_query(text, default_op)?,
            QueryInput::Structured(query) => Query {
                terms: query
                    .terms
                    .iter()
                    .map(|qt| QueryTerm {
                        term: normalize(&qt.term),
                        ..qt.clone()
                    })
                    .collect(),
                expr: query.expr.as_ref().map(normalize_expr),
            },
        };
        query.validate()?;
        Ok(query)
    }
}

/// One run of an ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRequest {
    pub model: ModelRequest,
    /// Overrides the request's shared query for this run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<QueryInput>,
}

impl RunRequest {
    pub fn new(model: ModelRequest) -> Self {
        Self { model, query: None }
    }

    pub fn with_query(mut self, query: impl Into<QueryInput>) -> Self {
        self.query = Some(query.into());
        self
    }
}

/// The name that selects ensemble mode in `model.name`.
pub const ENSEMBLE: &str = "ensemble";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankingRequest {
    /// Single mode. `None` with no `runs` uses the configured default model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelRequest>,
    /// Ensemble mode.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub runs: Vec<RunRequest>,
    #[serde(default)]
    pub query: QueryInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combination: Option<String>,
    /// Documents taken from each run by the rank-based policies. Defaults to
    /// the configured depth, then to `top_k`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fusion_depth: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_operator: Option<DefaultOperator>,
    #[serde(default)]
    pub explain: bool,
}

impl RankingRequest {
    pub fn new(model: ModelRequest, query: impl Into<QueryInput>) -> Self {
        Self {
            model: Some(model),
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn ensemble(runs: Vec<RunRequest>, query: impl Into<QueryInput>) -> Self {
        Self {
            runs,
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_combination(mut self, combination: impl Into<String>) -> Self {
        self.combination = Some(combination.into());
        self
    }

    pub fn with_fusion_depth(mut self, depth: usize) -> Self {
        self.fusion_depth = Some(depth);
        self
    }

    pub fn with_explain(mut self, explain: bool) -> Self {
        self.explain = explain;
        self
    }

    pub fn with_default_operator(mut self, op: DefaultOperator) -> Self {
        self.default_operator = Some(op);
        self
    }

    pub fn is_ensemble(&self) -> bool {
        !self.runs.is_empty() || self.model.as_ref().is_some_and(|m| m.name == ENSEMBLE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RankingStatus {
    Ranked,
    /// No scoring terms: no relevance signal, so no documents. Not an error.
    EmptyQuery,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingResponse {
    pub status: RankingStatus,
    pub result: RankingResult,
    /// Documents with a score before the top-k cutoff.
    pub total_candidates: usize,
    pub snapshot_fingerprint: String,
}
