// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Okapi BM25.
//!
//! ```text
//! score(d) = Σ qw · idf(t) · tf (k1 + 1) / (tf + k1 (1 - b + b dl / avgdl))
//! idf(t)   = ln(1 + (N - df + 0.5) / (df + 0.5))
//! ```
//!
//! `k1 = 0` switches off tf saturation entirely and leaves pure idf presence
//! weighting; `b = 0` switches off length normalization.

use crate::error::RankError;
use crate::index::IndexSnapshot;
use crate::query::Query;
use crate::scoring::core::{accumulate, additive_explanation, bm25_idf, bm25_tf, resolve_terms, ResolvedTerm};
use crate::scoring::params::{ensure, params, ParamMap, ParamReader};
use crate::scoring::{DocScores, ModelKind, ScoringModel};
use crate::types::{DocId, TermContribution};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25 {
    pub k1: f64,
    pub b: f64,
}

impl Default for Bm25 {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

impl Bm25 {
    pub fn new(k1: f64, b: f64) -> Self {
        Self { k1, b }
    }

    pub fn from_params(map: &ParamMap) -> Result<Self, RankError> {
        let mut reader = ParamReader::new(ModelKind::Bm25.name(), map);
        let model = Self::read(&mut reader, ModelKind::Bm25.name())?;
        reader.finish()?;
        Ok(model)
    }

    /// Read and check `k1` and `b`; shared with the PageRank blend.
    pub(crate) fn read(reader: &mut ParamReader<'_>, model: &str) -> Result<Self, RankError> {
        let defaults = Self::default();
        let k1 = reader.number("k1", defaults.k1)?;
        let b = reader.number("b", defaults.b)?;
        ensure(model, "k1", k1 >= 0.0, "must be >= 0")?;
        ensure(model, "b", (0.0..=1.0).contains(&b), "must be in [0, 1]")?;
        Ok(Self { k1, b })
    }

    #[inline]
    fn contribution(&self, term: &ResolvedTerm, tf: u32, dl: u32, index: &IndexSnapshot) -> f64 {
        let stats = index.collection_statistics();
        term.weight * bm25_idf(stats.num_docs, term.stats.df) * bm25_tf(tf, dl, stats.avg_doc_len, self.k1, self.b)
    }
}

impl ScoringModel for Bm25 {
    fn kind(&self) -> ModelKind {
        ModelKind::Bm25
    }

    fn params(&self) -> ParamMap {
        params([("k1", self.k1), ("b", self.b)])
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
