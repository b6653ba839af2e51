// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Vector space model: cosine between query and document vectors.
//!
//! Document vectors span every term of the document (from the forward index),
//! not just the query terms, so long documents are normalized by their full
//! length. A zero vector on either side scores 0.

use std::fmt;
use std::str::FromStr;

use crate::error::RankError;
use crate::index::IndexSnapshot;
use crate::query::Query;
use crate::scoring::core::{candidates, idf, norm, resolve_terms, ResolvedTerm};
use crate::scoring::params::{ParamMap, ParamReader};
use crate::scoring::{DocScores, ModelKind, ScoringModel};
use crate::types::{DocId, TermId};

/// Term weighting scheme. idf is `ln(N / df)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Weighting {
    /// Raw frequency.
    Tf,
    /// `tf · idf`
    #[default]
    TfIdf,
    /// `ln(1 + tf) · idf`
    LogTfIdf,
}

impl Weighting {
    pub fn name(self) -> &'static str {
        match self {
            Weighting::Tf => "tf",
            Weighting::TfIdf => "tf-idf",
            Weighting::LogTfIdf => "log-tf-idf",
        }
    }

    #[inline]
    pub fn weight(self, tf: f64, idf: f64) -> f64 {
        match self {
            Weighting::Tf => tf,
            Weighting::TfIdf => tf * idf,
            Weighting::LogTfIdf => tf.ln_1p() * idf,
        }
    }
}

impl fmt::Display for Weighting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Weighting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tf" => Ok(Weighting::Tf),
            "tf-idf" | "tfidf" => Ok(Weighting::TfIdf),
            "log-tf-idf" => Ok(Weighting::LogTfIdf),
            other => Err(format!(
                "unknown weighting '{}' (expected tf, tf-idf or log-tf-idf)",
                other
            )),
        }
    }
}

/// Weighted document vector over all of the document's terms.
pub(crate) fn document_vector(
    index: &IndexSnapshot,
    doc: DocId,
    weighting: Weighting,
) -> Vec<(TermId, f64)> {
    let n = index.num_docs();
    index
        .document_terms(doc)
        .iter()
        .map(|&(id, tf)| {
            let df = index.term_stats(id).df;
            (id, weighting.weight(f64::from(tf), idf(n, df)))
        })
        .collect()
}

/// Weighted query vector over the resolved terms.
pub(crate) fn query_vector(
    terms: &[ResolvedTerm],
    num_docs: usize,
    weighting: Weighting,
) -> Vec<(TermId, f64)> {
    terms
        .iter()
        .map(|t| (t.id, weighting.weight(t.weight, idf(num_docs, t.stats.df))))
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VectorSpace {
    pub weighting: Weighting,
}

impl VectorSpace {
    pub fn new(weighting: Weighting) -> Self {
        Self { weighting }
    }

    pub fn from_params(params: &ParamMap) -> Result<Self, RankError> {
        let mut reader = ParamReader::new(ModelKind::Vector.name(), params);
        let weighting = reader.choice("weighting", Weighting::default())?;
        reader.finish()?;
        Ok(Self { weighting })
    }
}

impl ScoringModel for VectorSpace {
    fn kind(&self) -> ModelKind {
        ModelKind::Vector
    }

    fn params(&self) -> ParamMap {
        crate::scoring::params::params([("weighting", self.weighting.name())])
    }

    fn score(&self, query: &Query, index: &IndexSnapshot) -> Result<DocScores, RankError> {
        let terms = resolve_terms(query, index);
        if terms.is_empty() {
            return Ok(DocScores::new());
        }
        let q = query_vector(&terms, index.num_docs(), self.weighting);
        let q_norm = norm(q.iter().map(|&(_, w)| w));

        let mut scores = DocScores::new();
        for doc in candidates(&terms, index) {
            let d = document_vector(index, doc, self.weighting);
            let d_norm = norm(d.iter().map(|&(_, w)| w));
            let score = if q_norm == 0.0 || d_norm == 0.0 {
                0.0
            } else {
                // Document vectors are sorted by TermId.
                let dot: f64 = q
                    .iter()
                    .filter_map(|&(id, wq)| {
                        d.binary_search_by_key(&id, |&(t, _)| t)
                            .ok()
                            .map(|i| wq * d[i].1)
                    })
                    .sum();
                dot / (q_norm * d_norm)
            };
            scores.insert(doc, score);
        }
        Ok(scores)
    }
}
