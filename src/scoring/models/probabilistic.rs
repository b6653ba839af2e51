// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Binary independence model with pseudo-relevance feedback.
//!
//! A term's weight is the log odds ratio `ln(p (1 - u) / (u (1 - p)))`,
//! where `p` is the chance it occurs in a relevant document and `u` the
//! chance it occurs in a non-relevant one.
//!
//! Round 0 knows nothing about relevance: `p = initial_probability` and
//! `u = (df + 0.5) / (N + 1)`. Each feedback round takes the top `V` documents
//! of the previous ranking as relevant and re-estimates
//!
//! ```text
//! p = (V_t + 0.5) / (V + 1)
//! u = (df - V_t + 0.5) / (N - V + 1)
//! ```
//!
//! with `V_t` the number of those documents containing the term. Rounds are a
//! fold over an estimate vector: nothing outside the call is mutated.

use std::collections::BTreeSet;

use crate::error::RankError;
use crate::index::IndexSnapshot;
use crate::query::Query;
use crate::scoring::core::{additive_explanation, resolve_terms, ResolvedTerm};
use crate::scoring::params::{ensure, params, ParamMap, ParamReader};
use crate::scoring::ranking::rank_scores;
use crate::scoring::{DocScores, ModelKind, ScoringModel};
use crate::types::{DocId, TermContribution};

pub const MAX_ITERATIONS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Probabilistic {
    pub iterations: u32,
    pub initial_probability: f64,
    pub feedback_docs: u32,
}

impl Default for Probabilistic {
    fn default() -> Self {
        Self {
            iterations: 2,
            initial_probability: 0.5,
            feedback_docs: 10,
        }
    }
}

/// `(p, u)` for one term.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Estimate {
    p: f64,
    u: f64,
}

impl Estimate {
    #[inline]
    fn weight(self) -> f64 {
        ((self.p * (1.0 - self.u)) / (self.u * (1.0 - self.p))).ln()
    }
}

impl Probabilistic {
    pub fn from_params(map: &ParamMap) -> Result<Self, RankError> {
        let name = ModelKind::Probabilistic.name();
        let defaults = Self::default();
        let mut reader = ParamReader::new(name, map);
        let iterations = reader.count("iterations", defaults.iterations)?;
        let initial_probability =
            reader.number("initial_probability", defaults.initial_probability)?;
        let feedback_docs = reader.count("feedback_docs", defaults.feedback_docs)?;
        reader.finish()?;

        ensure(
            name,
            "iterations",
            iterations <= MAX_ITERATIONS,
            "must be at most 100",
        )?;
        ensure(
            name,
            "initial_probability",
            initial_probability > 0.0 && initial_probability < 1.0,
            "must be in (0, 1)",
        )?;
        ensure(name, "feedback_docs", feedback_docs >= 1, "must be >= 1")?;
        Ok(Self {
            iterations,
            initial_probability,
            feedback_docs,
        })
    }

    fn initial(&self, terms: &[ResolvedTerm], n: f64) -> Vec<Estimate> {
        terms
            .iter()
            .map(|t| Estimate {
                p: self.initial_probability,
                u: (f64::from(t.stats.df) + 0.5) / (n + 1.0),
            })
            .collect()
    }

    fn score_with(terms: &[ResolvedTerm], estimates: &[Estimate], index: &IndexSnapshot) -> DocScores {
        let mut scores = DocScores::new();
        for (term, estimate) in terms.iter().zip(estimates) {
            let w = term.weight * estimate.weight();
            for posting in index.postings_by_id(term.id) {
                *scores.entry(posting.doc).or_insert(0.0) += w;
            }
        }
        scores
    }

    fn refine(&self, terms: &[ResolvedTerm], scores: &DocScores, index: &IndexSnapshot, n: f64) -> Vec<Estimate> {
        let relevant: BTreeSet<DocId> = rank_scores(scores)
            .into_iter()
            .take(self.feedback_docs as usize)
            .map(|(doc, _)| doc)
            .collect();
        let v = relevant.len() as f64;
        terms
            .iter()
            .map(|t| {
                let v_t = index
                    .postings_by_id(t.id)
                    .iter()
                    .filter(|p| relevant.contains(&p.doc))
                    .count() as f64;
                Estimate {
                    p: (v_t + 0.5) / (v + 1.0),
                    u: (f64::from(t.stats.df) - v_t + 0.5) / (n - v + 1.0),
                }
            })
            .collect()
    }

    /// Term estimates after all feedback rounds.
    fn estimates(&self, terms: &[ResolvedTerm], index: &IndexSnapshot) -> Vec<Estimate> {
        let n = index.num_docs() as f64;
        (0..self.iterations).fold(self.initial(terms, n), |estimates, _| {
            let scores = Self::score_with(terms, &estimates, index);
            self.refine(terms, &scores, index, n)
        })
    }
}

impl ScoringModel for Probabilistic {
    fn kind(&self) -> ModelKind {
        ModelKind::Probabilistic
    }

    fn params(&self) -> ParamMap {
        params([
            ("iterations", f64::from(self.iterations)),
            ("initial_probability", self.initial_probability),
            ("feedback_docs", f64::from(self.feedback_docs)),
        ])
    }

    fn score(&self, query: &Query, index: &IndexSnapshot) -> Result<DocScores, RankError> {
        let terms = resolve_terms(query, index);
        if terms.is_empty() {
            return Ok(DocScores::new());
        }
        let estimates = self.estimates(&terms, index);
        Ok(Self::score_with(&terms, &estimates, index))
    }

    fn explain(&self, query: &Query, index: &IndexSnapshot, doc: DocId) -> Vec<TermContribution> {
        let terms = resolve_terms(query, index);
        let estimates = self.estimates(&terms, index);
        let weights: Vec<(String, f64)> = terms
            .iter()
            .zip(&estimates)
            .map(|(t, e)| (t.term.clone(), t.weight * e.weight()))
            .collect();
        additive_explanation(&terms, index, doc, |term, _| {
            weights
                .iter()
                .find(|(t, _)| *t == term.term)
                .map(|&(_, w)| w)
                .unwrap_or(0.0)
        })
    }
}
