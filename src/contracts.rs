// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Runtime contracts for the index and the ranking path.
//!
//! Debug-mode assertions over the properties everything downstream relies on.
//! They are **zero-cost in release builds** (`debug_assert!`) and catch a
//! broken invariant at the point it is introduced instead of three modules
//! later as a wrong score.
//!
//! `index::validate` rejects bad input with an error; these contracts guard
//! code paths that are supposed to be unable to produce bad output.
//!
//! | Contract                    | Property                                   |
//! |-----------------------------|--------------------------------------------|
//! | `check_postings_sorted`     | strictly ascending DocIds, tf > 0          |
//! | `check_document_lengths`    | every document length > 0                  |
//! | `check_ranking_order`       | score descending, DocId ascending on ties  |
//! | `check_scores_finite`       | no NaN or infinity leaves a model          |
//!
//! # INVARIANTS (DO NOT REMOVE THESE CHECKS)
//!
//! Metric reproducibility depends on the ranking order being total. Removing
//! `check_ranking_order` hides exactly the class of bug that makes two runs of
//! the same evaluation disagree.

use crate::scoring::ranking::compare_scores;
use crate::scoring::DocScores;
use crate::types::{Posting, ScoredDocument};

// ============================================================================
// INDEX CONTRACTS
// ============================================================================

/// Check that a postings list is sorted by DocId with no duplicates.
///
/// # Panics (debug builds only)
/// Panics on the first out-of-order pair or zero tf.
#[inline]
pub fn check_postings_sorted(postings: &[Posting]) {
    for window in postings.windows(2) {
        debug_assert!(
            window[0].doc < window[1].doc,
            "Contract violation: postings not strictly ascending - doc {} then doc {}",
            window[0].doc,
            window[1].doc
        );
    }
    for posting in postings {
        debug_assert!(
            posting.tf > 0,
            "Contract violation: zero tf for doc {}",
            posting.doc
        );
    }
}

/// Check that every document length is positive.
#[inline]
pub fn check_document_lengths(lengths: impl IntoIterator<Item = u32>) {
    for (i, length) in lengths.into_iter().enumerate() {
        debug_assert!(length > 0, "Contract violation: document {} has length 0", i);
    }
}

// ============================================================================
// RANKING CONTRACTS
// ============================================================================

/// Check that a ranked list follows the total order.
///
/// # Panics (debug builds only)
/// Panics if any adjacent pair is out of order or a DocId repeats.
#[inline]
pub fn check_ranking_order(documents: &[ScoredDocument]) {
    for (i, window) in documents.windows(2).enumerate() {
        let (a, b) = (&window[0], &window[1]);
        debug_assert!(
            compare_scores((a.doc, a.score), (b.doc, b.score)).is_lt(),
            "Contract violation: ranking[{}] ({}, {}) not before ranking[{}] ({}, {})",
            i,
            a.doc,
            a.score,
            i + 1,
            b.doc,
            b.score
        );
    }
}

/// Check that every score is finite.
#[inline]
pub fn check_scores_finite(scores: &DocScores) {
    for (doc, score) in scores {
        debug_assert!(
            score.is_finite(),
            "Contract violation: non-finite score {} for doc {}",
            score,
            doc
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocId;

    fn doc(id: u32, score: f64) -> ScoredDocument {
        ScoredDocument {
            doc: DocId(id),
            key: format!("doc{}", id),
            score,
            explanation: None,
        }
    }

    #[test]
    fn test_sorted_postings_pass() {
        check_postings_sorted(&[Posting::new(0, 1), Posting::new(3, 2), Posting::new(7, 1)]);
        check_postings_sorted(&[]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "not strictly ascending")]
    fn test_duplicate_posting_panics() {
        check_postings_sorted(&[Posting::new(2, 1), Posting::new(2, 1)]);
    }

    #[test]
    fn test_valid_ranking_passes() {
        check_ranking_order(&[doc(1, 3.0), doc(0, 1.0), doc(2, 1.0)]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "Contract violation")]
    fn test_tie_out_of_doc_order_panics() {
        check_ranking_order(&[doc(2, 1.0), doc(0, 1.0)]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "length 0")]
    fn test_zero_length_panics() {
        check_document_lengths([3, 0]);
    }
}
