// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The shared arithmetic of the models.
//!
//! Every model starts the same way: resolve the query's scoring terms against
//! the snapshot vocabulary, drop the ones with `df = 0`, and walk the postings
//! of what is left. Absent terms are dropped here, once, so no model has to
//! special-case them and none can give them a non-zero contribution.
//!
//! # Notation
//!
//! | Symbol | Meaning                              |
//! |--------|--------------------------------------|
//! | N      | number of documents                  |
//! | df     | documents containing the term        |
//! | cf     | occurrences of the term in the collection |
//! | tf     | occurrences of the term in a document |
//! | dl     | document length                      |
//! | avgdl  | average document length              |

use std::collections::{BTreeMap, BTreeSet};

use crate::error::RankError;
use crate::index::IndexSnapshot;
use crate::query::Query;
use crate::scoring::DocScores;
use crate::types::{DocId, Term, TermContribution, TermId, TermStats};

/// `1 / ln(2)`, the `log2(e)` constant of the DFR literature.
pub const REC_LOG_2_OF_E: f64 = std::f64::consts::LOG2_E;

/// A query term that exists in the snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTerm {
    pub id: TermId,
    pub term: Term,
    /// Summed weight of all occurrences in the query.
    pub weight: f64,
    pub stats: TermStats,
}

/// Scoring terms of `query` present in `index`, in query order.
pub fn resolve_terms(query: &Query, index: &IndexSnapshot) -> Vec<ResolvedTerm> {
    query
        .scoring_terms()
        .into_iter()
        .filter_map(|(term, weight)| {
            let id = index.term_id(&term)?;
            let stats = index.term_stats(id);
            (stats.df > 0).then_some(ResolvedTerm {
                id,
                term,
                weight,
                stats,
            })
        })
        .collect()
}

/// Documents containing at least one of `terms`.
pub fn candidates(terms: &[ResolvedTerm], index: &IndexSnapshot) -> BTreeSet<DocId> {
    terms
        .iter()
        .flat_map(|t| index.postings_by_id(t.id).iter().map(|p| p.doc))
        .collect()
}

/// Sum a per-posting contribution over every resolved term.
///
/// `f(term, doc, tf)` is called once per posting.
pub fn accumulate<F>(terms: &[ResolvedTerm], index: &IndexSnapshot, mut f: F) -> DocScores
where
    F: FnMut(&ResolvedTerm, DocId, u32) -> f64,
{
    let mut scores = BTreeMap::new();
    for term in terms {
        for posting in index.postings_by_id(term.id) {
            *scores.entry(posting.doc).or_insert(0.0) += f(term, posting.doc, posting.tf);
        }
    }
    scores
}

/// Per-term additive contributions for one document, for explanations.
pub fn additive_explanation<F>(
    terms: &[ResolvedTerm],
    index: &IndexSnapshot,
    doc: DocId,
    mut f: F,
) -> Vec<TermContribution>
where
    F: FnMut(&ResolvedTerm, u32) -> f64,
{
    terms
        .iter()
        .filter_map(|term| {
            let tf = index.tf(term.id, doc);
            (tf > 0).then(|| TermContribution {
                term: term.term.clone(),
                tf,
                contribution: Some(f(term, tf)),
            })
        })
        .collect()
}

/// Matched terms with no separable share of the score.
pub fn matched_terms(terms: &[ResolvedTerm], index: &IndexSnapshot, doc: DocId) -> Vec<TermContribution> {
    terms
        .iter()
        .filter_map(|term| {
            let tf = index.tf(term.id, doc);
            (tf > 0).then(|| TermContribution {
                term: term.term.clone(),
                tf,
                contribution: None,
            })
        })
        .collect()
}

/// Every score must be finite; the first offender becomes a `NumericalFault`.
pub fn ensure_finite(model: &str, scores: DocScores) -> Result<DocScores, RankError> {
    if let Some((&doc, _)) = scores.iter().find(|(_, s)| !s.is_finite()) {
        return Err(RankError::NumericalFault {
            model: model.to_string(),
            doc,
        });
    }
    Ok(scores)
}

// =============================================================================
// WEIGHTING FUNCTIONS
// =============================================================================

/// BM25 idf, the `+1` variant that never goes negative:
/// `ln(1 + (N - df + 0.5) / (df + 0.5))`.
#[inline]
pub fn bm25_idf(num_docs: usize, df: u32) -> f64 {
    let n = num_docs as f64;
    let df = f64::from(df);
    (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
}

/// BM25 saturating tf: `tf (k1 + 1) / (tf + k1 (1 - b + b dl / avgdl))`.
///
/// With `k1 = 0` this is exactly 1 for any `tf > 0`.
#[inline]
pub fn bm25_tf(tf: u32, dl: u32, avgdl: f64, k1: f64, b: f64) -> f64 {
    let tf = f64::from(tf);
    let norm = if avgdl > 0.0 {
        1.0 - b + b * f64::from(dl) / avgdl
    } else {
        1.0
    };
    tf * (k1 + 1.0) / (tf + k1 * norm)
}

/// Classic idf `ln(N / df)`; 0 for terms in every document.
#[inline]
pub fn idf(num_docs: usize, df: u32) -> f64 {
    if df == 0 {
        return 0.0;
    }
    (num_docs as f64 / f64::from(df)).ln()
}

#[inline]
pub fn log2(x: f64) -> f64 {
    x.log2()
}

/// Euclidean norm.
pub fn norm(values: impl IntoIterator<Item = f64>) -> f64 {
    values.into_iter().map(|v| v * v).sum::<f64>().sqrt()
}
