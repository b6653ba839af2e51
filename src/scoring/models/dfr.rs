// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Divergence From Randomness models: DFRee and PL2.
//!
//! Both follow the definitions of Amati and van Rijsbergen as implemented in
//! Terrier. Logarithms are base 2. `T` is the total token count and `cf` the
//! term's collection frequency.
//!
//! # DFRee (parameter-free)
//!
//! ```text
//! prior     = tf / dl
//! posterior = (tf + 1) / (dl + 1)
//! norm      = tf · log2(posterior / prior)
//! score     = qw · norm · ( tf · -log2(prior · T / cf)
//!                         + (tf + 1) · log2(posterior · T / cf)
//!                         + 0.5 · log2(posterior / prior) )
//! ```
//!
//! # PL2 (Poisson model, Laplace after-effect, normalization 2)
//!
//! ```text
//! tfn   = tf · log2(1 + c · avgdl / dl)
//! f     = cf / N
//! score = qw / (tfn + 1) · ( tfn · log2(1 / f)
//!                          + f · log2(e)
//!                          + 0.5 · log2(2π · tfn)
//!                          + tfn · (log2(tfn) - log2(e)) )
//! ```
//!
//! A posting with `tf = 0`, or a document with `dl = 0`, contributes exactly 0
//! in both models; neither can produce `-inf` or NaN from a valid snapshot.

use crate::error::RankError;
use crate::index::IndexSnapshot;
use crate::query::Query;
use crate::scoring::core::{accumulate, additive_explanation, log2, resolve_terms, ResolvedTerm, REC_LOG_2_OF_E};
use crate::scoring::params::{ensure, params, ParamMap, ParamReader};
use crate::scoring::{DocScores, ModelKind, ScoringModel};
use crate::types::{DocId, TermContribution};

// =============================================================================
// DFREE
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Dfree;

/// One DFRee term contribution, before the query weight.
pub fn dfree_term(tf: f64, dl: f64, total_tokens: f64, cf: f64) -> f64 {
    if tf <= 0.0 || dl <= 0.0 || cf <= 0.0 {
        return 0.0;
    }
    let prior = tf / dl;
    let posterior = (tf + 1.0) / (dl + 1.0);
    let inv_prior_collection = total_tokens / cf;
    let norm = tf * log2(posterior / prior);
    norm * (tf * -log2(prior * inv_prior_collection)
        + (tf + 1.0) * log2(posterior * inv_prior_collection)
        + 0.5 * log2(posterior / prior))
}

impl Dfree {
    pub fn from_params(map: &ParamMap) -> Result<Self, RankError> {
        ParamReader::new(ModelKind::Dfree.name(), map).finish()?;
        Ok(Dfree)
    }

    fn contribution(term: &ResolvedTerm, tf: u32, dl: u32, index: &IndexSnapshot) -> f64 {
        let total = index.collection_statistics().total_tokens as f64;
        term.weight * dfree_term(f64::from(tf), f64::from(dl), total, term.stats.cf as f64)
    }
}

impl ScoringModel for Dfree {
    fn kind(&self) -> ModelKind {
        ModelKind::Dfree
    }

    fn params(&self) -> ParamMap {
        ParamMap::new()
    }

    fn score(&self, query: &Query, index: &IndexSnapshot) -> Result<DocScores, RankError> {
        let terms = resolve_terms(query, index);
        Ok(accumulate(&terms, index, |term, doc, tf| {
            Self::contribution(term, tf, index.document_length(doc), index)
        }))
    }

    fn explain(&self, query: &Query, index: &IndexSnapshot, doc: DocId) -> Vec<TermContribution> {
        let terms = resolve_terms(query, index);
        let dl = index.document_length(doc);
        additive_explanation(&terms, index, doc, |term, tf| Self::contribution(term, tf, dl, index))
    }
}

// =============================================================================
// PL2
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pl2 {
    pub c: f64,
}

impl Default for Pl2 {
    fn default() -> Self {
        Self { c: 1.0 }
    }
}

/// One PL2 term contribution, before the query weight.
pub fn pl2_term(tf: f64, dl: f64, avgdl: f64, c: f64, cf: f64, num_docs: f64) -> f64 {
    if tf <= 0.0 || dl <= 0.0 || num_docs <= 0.0 {
        return 0.0;
    }
    let tfn = tf * log2(1.0 + c * avgdl / dl);
    if tfn <= 0.0 {
        return 0.0;
    }
    let f = cf / num_docs;
    let norm = 1.0 / (tfn + 1.0);
    norm * (tfn * log2(1.0 / f)
        + f * REC_LOG_2_OF_E
        + 0.5 * log2(2.0 * std::f64::consts::PI * tfn)
        + tfn * (log2(tfn) - REC_LOG_2_OF_E))
}

impl Pl2 {
    pub fn new(c: f64) -> Self {
        Self { c }
    }

    pub fn from_params(map: &ParamMap) -> Result<Self, RankError> {
        let name = ModelKind::Pl2.name();
        let mut reader = ParamReader::new(name, map);
        let c = reader.number("c", Self::default().c)?;
        reader.finish()?;
        ensure(name, "c", c > 0.0, "must be > 0")?;
        Ok(Self { c })
    }

    fn contribution(&self, term: &ResolvedTerm, tf: u32, dl: u32, index: &IndexSnapshot) -> f64 {
        let stats = index.collection_statistics();
        term.weight
            * pl2_term(
                f64::from(tf),
                f64::from(dl),
                stats.avg_doc_len,
                self.c,
                term.stats.cf as f64,
                stats.num_docs as f64,
            )
    }
}

impl ScoringModel for Pl2 {
    fn kind(&self) -> ModelKind {
        ModelKind::Pl2
    }

    fn params(&self) -> ParamMap {
        params([("c", self.c)])
    }

    fn score(&self, query: &Query, index: &IndexSnapshot) -> Result<DocScores, RankError> {
        let terms = resolve_terms(query, index);
        Ok(accumulate(&terms, index, |term, doc, tf| {
            self.contribution(term, tf, index.document_length(doc), index)
        }))
    }

    fn explain(&self, query: &Query, index: &IndexSnapshot, doc: DocId) -> Vec<TermContribution> {
        let terms = resolve_terms(query, index);
        let dl = index.document_length(doc);
        additive_explanation(&terms, index, doc, |term, tf| self.contribution(term, tf, dl, index))
    }
}
