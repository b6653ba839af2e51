// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Scoring: how candidate documents get their numbers.
//!
//! Every retrieval model implements [`ScoringModel`] over the same immutable
//! [`IndexSnapshot`]. A model is a plain value holding its validated
//! parameters, built once per request by [`ModelSpec::from_request`], so the
//! scoring path never re-checks a parameter domain and never mutates shared
//! state.
//!
//! | Name               | Model                               |
//! |--------------------|-------------------------------------|
//! | `boolean`          | strict set algebra                  |
//! | `vector`           | tf-idf cosine                       |
//! | `probabilistic`    | BIR with pseudo-relevance feedback  |
//! | `bm25`             | Okapi BM25                          |
//! | `belief`           | InQuery inference network           |
//! | `extended-boolean` | p-norm                              |
//! | `gvsm`             | generalized vector space            |
//! | `dfree`            | DFR, parameter free                 |
//! | `pl2`              | DFR, Poisson + Laplace              |
//! | `pagerank-bm25`    | BM25 times a static prior           |

mod core;
pub mod models;
mod params;
pub mod ranking;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::RankError;
use crate::index::IndexSnapshot;
use crate::query::Query;
use crate::types::{DocId, TermContribution};

pub use self::core::{ensure_finite, resolve_terms, ResolvedTerm, REC_LOG_2_OF_E};
pub use self::params::{params, ModelDescriptor, ParamMap, ParamReader, ParamValue};
pub use models::*;

/// Raw per-document scores, keyed in DocId order.
pub type DocScores = BTreeMap<DocId, f64>;

/// A retrieval model.
///
/// `score` must be deterministic for identical inputs, return only finite
/// values for a valid snapshot, and return an empty map for a query with no
/// scoring terms.
pub trait ScoringModel: Send + Sync {
    fn kind(&self) -> ModelKind;

    /// The fully resolved parameters, defaults included.
    fn params(&self) -> ParamMap;

    fn score(&self, query: &Query, index: &IndexSnapshot) -> Result<DocScores, RankError>;

    /// Per-term contributions to `doc`'s score.
    ///
    /// The default lists matched terms without a separable share, which is
    /// right for every non-additive model.
    fn explain(&self, query: &Query, index: &IndexSnapshot, doc: DocId) -> Vec<TermContribution> {
        self::core::matched_terms(&resolve_terms(query, index), index, doc)
    }

    fn descriptor(&self) -> ModelDescriptor {
        ModelDescriptor::new(self.kind().name(), self.params())
    }
}

// =============================================================================
// MODEL IDENTIFIERS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModelKind {
    Boolean,
    Vector,
    Probabilistic,
    Bm25,
    Belief,
    ExtendedBoolean,
    Gvsm,
    Dfree,
    Pl2,
    PagerankBm25,
}

impl ModelKind {
    pub const ALL: [ModelKind; 10] = [
        ModelKind::Boolean,
        ModelKind::Vector,
        ModelKind::Probabilistic,
        ModelKind::Bm25,
        ModelKind::Belief,
        ModelKind::ExtendedBoolean,
        ModelKind::Gvsm,
        ModelKind::Dfree,
        ModelKind::Pl2,
        ModelKind::PagerankBm25,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ModelKind::Boolean => "boolean",
            ModelKind::Vector => "vector",
            ModelKind::Probabilistic => "probabilistic",
            ModelKind::Bm25 => "bm25",
            ModelKind::Belief => "belief",
            ModelKind::ExtendedBoolean => "extended-boolean",
            ModelKind::Gvsm => "gvsm",
            ModelKind::Dfree => "dfree",
            ModelKind::Pl2 => "pl2",
            ModelKind::PagerankBm25 => "pagerank-bm25",
        }
    }

    /// Whether the model reads the boolean structure of the query rather than
    /// its bag of words.
    pub fn is_structured(self) -> bool {
        matches!(self, ModelKind::Boolean | ModelKind::ExtendedBoolean)
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = RankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_ascii_lowercase().as_str() {
            "boolean" => ModelKind::Boolean,
            "vector" | "vsm" => ModelKind::Vector,
            "probabilistic" | "bir" => ModelKind::Probabilistic,
            "bm25" | "okapi" => ModelKind::Bm25,
            "belief" | "inference" => ModelKind::Belief,
            "extended-boolean" | "p-norm" => ModelKind::ExtendedBoolean,
            "gvsm" => ModelKind::Gvsm,
            "dfree" => ModelKind::Dfree,
            "pl2" => ModelKind::Pl2,
            "pagerank-bm25" | "pagerank" => ModelKind::PagerankBm25,
            _ => {
                return Err(RankError::UnknownModel {
                    name: s.to_string(),
                })
            }
        };
        Ok(kind)
    }
}

// =============================================================================
// MODEL DISPATCH
// =============================================================================

/// A validated, ready-to-run model instance.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelSpec {
    Boolean(BooleanModel),
    Vector(VectorSpace),
    Probabilistic(Probabilistic),
    Bm25(Bm25),
    Belief(BeliefNetwork),
    ExtendedBoolean(ExtendedBoolean),
    Gvsm(Gvsm),
    Dfree(Dfree),
    Pl2(Pl2),
    PagerankBm25(PagerankBm25),
}

impl ModelSpec {
    /// Resolve a model name and its parameter map; fails before any scoring
    /// with `UnknownModel` or `InvalidParameter`.
    pub fn from_request(name: &str, params: &ParamMap) -> Result<Self, RankError> {
        Self::build(name.parse()?, params)
    }

    pub fn build(kind: ModelKind, params: &ParamMap) -> Result<Self, RankError> {
        Ok(match kind {
            ModelKind::Boolean => ModelSpec::Boolean(BooleanModel::from_params(params)?),
            ModelKind::Vector => ModelSpec::Vector(VectorSpace::from_params(params)?),
            ModelKind::Probabilistic => ModelSpec::Probabilistic(Probabilistic::from_params(params)?),
            ModelKind::Bm25 => ModelSpec::Bm25(Bm25::from_params(params)?),
            ModelKind::Belief => ModelSpec::Belief(BeliefNetwork::from_params(params)?),
            ModelKind::ExtendedBoolean => {
                ModelSpec::ExtendedBoolean(ExtendedBoolean::from_params(params)?)
            }
            ModelKind::Gvsm => ModelSpec::Gvsm(Gvsm::from_params(params)?),
            ModelKind::Dfree => ModelSpec::Dfree(Dfree::from_params(params)?),
            ModelKind::Pl2 => ModelSpec::Pl2(Pl2::from_params(params)?),
            ModelKind::PagerankBm25 => ModelSpec::PagerankBm25(PagerankBm25::from_params(params)?),
        })
    }

    /// Every model with its default parameters.
    pub fn defaults() -> Vec<ModelSpec> {
        ModelKind::ALL
            .iter()
            .filter_map(|&kind| Self::build(kind, &ParamMap::new()).ok())
            .collect()
    }

    fn inner(&self) -> &dyn ScoringModel {
        match self {
            ModelSpec::Boolean(m) => m,
            ModelSpec::Vector(m) => m,
            ModelSpec::Probabilistic(m) => m,
            ModelSpec::Bm25(m) => m,
            ModelSpec::Belief(m) => m,
            ModelSpec::ExtendedBoolean(m) => m,
            ModelSpec::Gvsm(m) => m,
            ModelSpec::Dfree(m) => m,
            ModelSpec::Pl2(m) => m,
            ModelSpec::PagerankBm25(m) => m,
        }
    }
}

impl ScoringModel for ModelSpec {
    fn kind(&self) -> ModelKind {
        self.inner().kind()
    }

    fn params(&self) -> ParamMap {
        self.inner().params()
    }

    fn score(&self, query: &Query, index: &IndexSnapshot) -> Result<DocScores, RankError> {
        ensure_finite(self.kind().name(), self.inner().score(query, index)?)
    }

    fn explain(&self, query: &Query, index: &IndexSnapshot, doc: DocId) -> Vec<TermContribution> {
        self.inner().explain(query, index, doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::{snapshot_from_texts, toy_snapshot};

    #[test]
    fn test_every_name_round_trips() {
        for kind in ModelKind::ALL {
            assert_eq!(kind.name().parse::<ModelKind>().unwrap(), kind);
        }
        assert_eq!("VSM".parse::<ModelKind>().unwrap(), ModelKind::Vector);
    }

    #[test]
    fn test_unknown_model() {
        let err = ModelSpec::from_request("lsi", &ParamMap::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownModel);
    }

    #[test]
    fn test_descriptor_echoes_defaults() {
        let spec = ModelSpec::from_request("bm25", &ParamMap::new()).unwrap();
        let descriptor = spec.descriptor();
        assert_eq!(descriptor.name, "bm25");
        assert_eq!(descriptor.params["k1"], ParamValue::Number(1.2));
        assert_eq!(descriptor.params["b"], ParamValue::Number(0.75));
    }

    #[test]
    fn test_every_model_empty_query_is_empty() {
        let index = toy_snapshot();
        for model in ModelSpec::defaults() {
            let scores = model.score(&Query::default(), &index).unwrap();
            assert!(scores.is_empty(), "{}", model.kind());
        }
    }

    #[test]
    fn test_every_model_ignores_absent_terms() {
        let index = toy_snapshot();
        let plain = Query::from_terms(["dog", "bird"]);
        let padded = Query::from_terms(["dog", "zebra", "bird", "unicorn"]);
        for model in ModelSpec::defaults() {
            assert_eq!(
                model.score(&plain, &index).unwrap(),
                model.score(&padded, &index).unwrap(),
                "{}",
                model.kind()
            );
        }
    }

    #[test]
    fn test_every_model_handles_single_document() {
        let index = snapshot_from_texts(&["lonely word"]);
        for model in ModelSpec::defaults() {
            let scores = model.score(&Query::from_terms(["word"]), &index).unwrap();
            assert!(scores.values().all(|s| s.is_finite()), "{}", model.kind());
        }
    }

    #[test]
    fn test_defaults_cover_every_kind() {
        let kinds: Vec<ModelKind> = ModelSpec::defaults().iter().map(|m| m.kind()).collect();
        assert_eq!(kinds, ModelKind::ALL.to_vec());
    }
}
