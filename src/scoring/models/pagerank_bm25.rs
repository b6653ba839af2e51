// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! BM25 boosted by a static document prior.
//!
//! `score = α · bm25 + (1 - α) · prior(d) · bm25`. The prior is the
//! max-normalized PageRank stored in the snapshot; a snapshot without priors
//! uses 1 for every document, which makes this exactly BM25.

use crate::error::RankError;
use crate::index::IndexSnapshot;
use crate::query::Query;
use crate::scoring::models::Bm25;
use crate::scoring::params::{ensure, params, ParamMap, ParamReader};
use crate::scoring::{DocScores, ModelKind, ScoringModel};
use crate::types::{DocId, TermContribution};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PagerankBm25 {
    pub bm25: Bm25,
    pub alpha: f64,
}

impl Default for PagerankBm25 {
    fn default() -> Self {
        Self {
            bm25: Bm25::default(),
            alpha: 0.85,
        }
    }
}

impl PagerankBm25 {
    pub fn new(bm25: Bm25, alpha: f64) -> Self {
        Self { bm25, alpha }
    }

    pub fn from_params(map: &ParamMap) -> Result<Self, RankError> {
        let name = ModelKind::PagerankBm25.name();
        let mut reader = ParamReader::new(name, map);
        let bm25 = Bm25::read(&mut reader, name)?;
        let alpha = reader.number("alpha", Self::default().alpha)?;
        reader.finish()?;
        ensure(name, "alpha", (0.0..=1.0).contains(&alpha), "must be in [0, 1]")?;
        Ok(Self { bm25, alpha })
    }

    #[inline]
    fn boost(&self, index: &IndexSnapshot, doc: DocId) -> f64 {
        match index.prior(doc) {
            Some(prior) => self.alpha + (1.0 - self.alpha) * prior,
            None => 1.0,
        }
    }
}

impl ScoringModel for PagerankBm25 {
    fn kind(&self) -> ModelKind {
        ModelKind::PagerankBm25
    }

    fn params(&self) -> ParamMap {
        params([("k1", self.bm25.k1), ("b", self.bm25.b), ("alpha", self.alpha)])
    }

    fn score(&self, query: &Query, index: &IndexSnapshot) -> Result<DocScores, RankError> {
        let mut scores = self.bm25.score(query, index)?;
        for (&doc, score) in scores.iter_mut() {
            *score *= self.boost(index, doc);
        }
        Ok(scores)
    }

    fn explain(&self, query: &Query, index: &IndexSnapshot, doc: DocId) -> Vec<TermContribution> {
        let boost = self.boost(index, doc);
        self.bm25
            .explain(query, index, doc)
            .into_iter()
            .map(|mut c| {
                c.contribution = c.contribution.map(|x| x * boost);
                c
            })
            .collect()
    }
}
