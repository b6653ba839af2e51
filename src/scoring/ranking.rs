// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Result ranking: how scored documents get sorted.
//!
//! One order everywhere: score descending, then DocId ascending. It is total
//! (scores are finite by the time they get here), so two runs over the same
//! snapshot produce the same list, tie for tie.

use std::cmp::Ordering;

use crate::index::IndexSnapshot;
use crate::scoring::DocScores;
use crate::types::{DocId, ScoredDocument};

/// Compare two `(doc, score)` pairs for ranking.
///
/// 1. **Score** - higher wins
/// 2. **Doc ID** - lower wins, for absolute determinism
#[inline]
pub fn compare_scores(a: (DocId, f64), b: (DocId, f64)) -> Ordering {
    match b.1.partial_cmp(&a.1) {
        Some(ord) if ord != Ordering::Equal => ord,
        _ => a.0.cmp(&b.0),
    }
}

pub fn compare_documents(a: &ScoredDocument, b: &ScoredDocument) -> Ordering {
    compare_scores((a.doc, a.score), (b.doc, b.score))
}

/// Scores as a ranked list.
pub fn rank_scores(scores: &DocScores) -> Vec<(DocId, f64)> {
    let mut ranked: Vec<(DocId, f64)> = scores.iter().map(|(&d, &s)| (d, s)).collect();
    ranked.sort_by(|a, b| compare_scores(*a, *b));
    ranked
}

/// Ranked `ScoredDocument`s without explanations.
pub fn scored_documents(scores: &DocScores, index: &IndexSnapshot) -> Vec<ScoredDocument> {
    rank_scores(scores)
        .into_iter()
        .map(|(doc, score)| ScoredDocument {
            doc,
            key: index.doc_key(doc).unwrap_or_default().to_string(),
            score,
            explanation: None,
        })
        .collect()
}

pub fn sort_documents(documents: &mut [ScoredDocument]) {
    documents.sort_by(compare_documents);
}
