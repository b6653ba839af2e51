// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Inference network (belief network) retrieval, InQuery style.
//!
//! Each document node sets a belief on every query term node; the query node
//! combines those beliefs. A term the document does not contain contributes
//! belief 0, and a document sharing no term with the query is not a candidate.
//!
//! # Term belief
//!
//! ```text
//! inquery: bel = db + (1 - db) · T · I
//!          T   = tf / (tf + 0.5 + 1.5 · dl / avgdl)
//!          I   = ln((N + 0.5) / df) / ln(N + 1)
//! tf-idf:  bel = db + (1 - db) · (tf / max_tf(d)) · I
//! binary:  bel = db + (1 - db) · I
//! ```
//!
//! `db` is `default_belief`. Combination is a [`BeliefCombinator`], so new
//! rules plug in without touching the network.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::RankError;
use crate::index::IndexSnapshot;
use crate::query::Query;
use crate::scoring::core::{candidates, resolve_terms, ResolvedTerm};
use crate::scoring::params::{ensure, params, ParamMap, ParamReader};
use crate::scoring::{DocScores, ModelKind, ScoringModel};
use crate::types::DocId;

// =============================================================================
// COMBINATORS
// =============================================================================

/// Combines `(weight, belief)` pairs of the query's term nodes into one belief.
///
/// Implementations must map beliefs in [0, 1] to a value in [0, 1] and return
/// 0 when every belief is 0.
pub trait BeliefCombinator: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;
    fn combine(&self, beliefs: &[(f64, f64)]) -> f64;
}

/// `1 - Π (1 - bel)^w`
#[derive(Debug, Clone, Copy, Default)]
pub struct NoisyOr;

impl BeliefCombinator for NoisyOr {
    fn name(&self) -> &'static str {
        "noisy-or"
    }

    fn combine(&self, beliefs: &[(f64, f64)]) -> f64 {
        1.0 - beliefs
            .iter()
            .map(|&(w, bel)| (1.0 - bel).powf(w))
            .product::<f64>()
    }
}

/// `Σ w · bel / Σ w`
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedSum;

impl BeliefCombinator for WeightedSum {
    fn name(&self) -> &'static str {
        "weighted-sum"
    }

    fn combine(&self, beliefs: &[(f64, f64)]) -> f64 {
        let total: f64 = beliefs.iter().map(|&(w, _)| w).sum();
        if total == 0.0 {
            return 0.0;
        }
        beliefs.iter().map(|&(w, bel)| w * bel).sum::<f64>() / total
    }
}

/// Strongest single belief.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxBelief;

impl BeliefCombinator for MaxBelief {
    fn name(&self) -> &'static str {
        "max"
    }

    fn combine(&self, beliefs: &[(f64, f64)]) -> f64 {
        beliefs.iter().map(|&(_, bel)| bel).fold(0.0, f64::max)
    }
}

fn combinator_by_name(name: &str) -> Result<Arc<dyn BeliefCombinator>, String> {
    match name {
        "noisy-or" => Ok(Arc::new(NoisyOr)),
        "weighted-sum" => Ok(Arc::new(WeightedSum)),
        "max" => Ok(Arc::new(MaxBelief)),
        other => Err(format!(
            "unknown combination '{}' (expected noisy-or, weighted-sum or max)",
            other
        )),
    }
}

/// Combinator selected by name in a parameter map.
struct NamedCombinator(Arc<dyn BeliefCombinator>);

impl FromStr for NamedCombinator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        combinator_by_name(s).map(NamedCombinator)
    }
}

// =============================================================================
// TERM BELIEF
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TermBelief {
    #[default]
    Inquery,
    TfIdf,
    Binary,
}

impl TermBelief {
    pub fn name(self) -> &'static str {
        match self {
            TermBelief::Inquery => "inquery",
            TermBelief::TfIdf => "tf-idf",
            TermBelief::Binary => "binary",
        }
    }
}

impl FromStr for TermBelief {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inquery" => Ok(TermBelief::Inquery),
            "tf-idf" => Ok(TermBelief::TfIdf),
            "binary" => Ok(TermBelief::Binary),
            other => Err(format!(
                "unknown term_weight '{}' (expected inquery, tf-idf or binary)",
                other
            )),
        }
    }
}

// =============================================================================
// NETWORK
// =============================================================================

#[derive(Debug, Clone)]
pub struct BeliefNetwork {
    combinator: Arc<dyn BeliefCombinator>,
    pub term_belief: TermBelief,
    pub default_belief: f64,
}

impl Default for BeliefNetwork {
    fn default() -> Self {
        Self {
            combinator: Arc::new(NoisyOr),
            term_belief: TermBelief::Inquery,
            default_belief: 0.4,
        }
    }
}

impl PartialEq for BeliefNetwork {
    fn eq(&self, other: &Self) -> bool {
        self.combinator.name() == other.combinator.name()
            && self.term_belief == other.term_belief
            && self.default_belief == other.default_belief
    }
}

impl BeliefNetwork {
    /// Swap in any combination rule, including ones defined outside this crate.
    pub fn with_combinator(mut self, combinator: Arc<dyn BeliefCombinator>) -> Self {
        self.combinator = combinator;
        self
    }

    pub fn combinator(&self) -> &dyn BeliefCombinator {
        self.combinator.as_ref()
    }

    pub fn from_params(map: &ParamMap) -> Result<Self, RankError> {
        let name = ModelKind::Belief.name();
        let defaults = Self::default();
        let mut reader = ParamReader::new(name, map);
        let combinator = reader
            .choice("combination", NamedCombinator(Arc::clone(&defaults.combinator)))?
            .0;
        let term_belief = reader.choice("term_weight", defaults.term_belief)?;
        let default_belief = reader.number("default_belief", defaults.default_belief)?;
        reader.finish()?;
        ensure(
            name,
            "default_belief",
            (0.0..1.0).contains(&default_belief),
            "must be in [0, 1)",
        )?;
        Ok(Self {
            combinator,
            term_belief,
            default_belief,
        })
    }

    fn term_belief(&self, term: &ResolvedTerm, tf: u32, doc: DocId, index: &IndexSnapshot) -> f64 {
        if tf == 0 {
            return 0.0;
        }
        let stats = index.collection_statistics();
        let n = stats.num_docs as f64;
        let idf = ((n + 0.5) / f64::from(term.stats.df)).ln() / (n + 1.0).ln();
        let evidence = match self.term_belief {
            TermBelief::Inquery => {
                let tf = f64::from(tf);
                let dl = f64::from(index.document_length(doc));
                let t = tf / (tf + 0.5 + 1.5 * dl / stats.avg_doc_len);
                t * idf
            }
            TermBelief::TfIdf => {
                let max_tf = f64::from(index.max_tf(doc).max(1));
                f64::from(tf) / max_tf * idf
            }
            TermBelief::Binary => idf,
        };
        self.default_belief + (1.0 - self.default_belief) * evidence
    }
}

impl ScoringModel for BeliefNetwork {
    fn kind(&self) -> ModelKind {
        ModelKind::Belief
    }

    fn params(&self) -> ParamMap {
        params([
            ("combination", self.combinator.name().into()),
            ("term_weight", self.term_belief.name().into()),
            ("default_belief", crate::scoring::ParamValue::Number(self.default_belief)),
        ])
    }

    fn score(&self, query: &Query, index: &IndexSnapshot) -> Result<DocScores, RankError> {
        let terms = resolve_terms(query, index);
        let mut scores = DocScores::new();
        let mut beliefs = Vec::with_capacity(terms.len());
        for doc in candidates(&terms, index) {
            beliefs.clear();
            for term in &terms {
                let tf = index.tf(term.id, doc);
                beliefs.push((term.weight, self.term_belief(term, tf, doc, index)));
            }
            scores.insert(doc, self.combinator.combine(&beliefs));
        }
        Ok(scores)
    }
}
