// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The building blocks shared by the index, the models and the orchestrator.
//!
//! # Invariants (the stuff that breaks if you ignore it)
//!
//! - **Posting lists**: sorted by `doc`, no duplicate `doc`, never empty.
//! - **Documents**: `length > 0` and `length >= Σ tf` over the document's terms.
//! - **RankingResult**: score descending, ties broken by ascending `DocId`.
//!   The order is total, so metric computation over it is reproducible.
//!
//! The index builder and the snapshot loader enforce the first two
//! (see `index::validate`); `scoring::ranking` enforces the third.

use serde::{Deserialize, Serialize};

use crate::scoring::ModelDescriptor;

// =============================================================================
// NEWTYPES: Type-safe identifiers
// =============================================================================

/// A normalized token. Identity is exact string equality.
pub type Term = String;

/// Type-safe document identifier.
///
/// Assigned densely in insertion order by the snapshot builder, so it doubles
/// as an index into per-document arrays and as the ranking tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct DocId(pub u32);

impl DocId {
    /// Create a new DocId, validating it's within bounds.
    #[inline]
    pub fn new(id: u32, num_docs: usize) -> Option<Self> {
        if (id as usize) < num_docs {
            Some(DocId(id))
        } else {
            None
        }
    }

    /// Get the underlying value.
    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }

    /// Convert to usize for array indexing.
    #[inline]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for DocId {
    fn from(id: u32) -> Self {
        DocId(id)
    }
}

impl From<DocId> for usize {
    fn from(id: DocId) -> Self {
        id.0 as usize
    }
}

impl std::fmt::Display for DocId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of a term in the snapshot vocabulary (sorted lexicographically).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct TermId(pub u32);

impl TermId {
    #[inline]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

// =============================================================================
// INDEX TYPES
// =============================================================================

/// One entry of a term's postings list.
///
/// The term is implied by the list the posting lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Posting {
    pub doc: DocId,
    pub tf: u32,
}

impl Posting {
    pub fn new(doc: impl Into<DocId>, tf: u32) -> Self {
        Self {
            doc: doc.into(),
            tf,
        }
    }
}

/// Per-term collection statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermStats {
    /// Number of documents containing the term.
    pub df: u32,
    /// Total occurrences of the term across the collection.
    pub cf: u64,
}

/// Global statistics, derived from the postings when a snapshot is built or
/// loaded. Read-only afterward.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStatistics {
    pub num_docs: usize,
    pub total_tokens: u64,
    pub avg_doc_len: f64,
    pub vocabulary_size: usize,
    /// Indexed by `TermId`.
    #[serde(skip)]
    pub terms: Vec<TermStats>,
}

impl CollectionStatistics {
    /// Statistics for a term id, or zeroed stats when out of range.
    #[inline]
    pub fn term(&self, id: TermId) -> TermStats {
        self.terms.get(id.as_usize()).copied().unwrap_or_default()
    }
}

// =============================================================================
// RESULT TYPES
// =============================================================================

/// How much one query term contributed to a document's score.
///
/// `contribution` is `None` for models whose combination is not additive
/// (cosine, p-norm, noisy-OR): the term matched but has no separable share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermContribution {
    pub term: Term,
    pub tf: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contribution: Option<f64>,
}

/// One ranked document. Produced fresh per request and never mutated after
/// creation, only sorted and filtered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub doc: DocId,
    pub key: String,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<Vec<TermContribution>>,
}

/// Ordered output of one ranking request, with the model(s) and parameters
/// that produced it echoed back for auditability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingResult {
    pub models: Vec<ModelDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combination: Option<String>,
    pub documents: Vec<ScoredDocument>,
}

impl RankingResult {
    /// Document keys in rank order, the shape the evaluation adapter consumes.
    pub fn keys(&self) -> Vec<&str> {
        self.documents.iter().map(|d| d.key.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_id_bounds() {
        assert_eq!(DocId::new(2, 3), Some(DocId(2)));
        assert_eq!(DocId::new(3, 3), None);
    }

    #[test]
    fn test_posting_ordering_is_by_doc_first() {
        let mut postings = vec![Posting::new(3, 1), Posting::new(1, 9), Posting::new(2, 4)];
        postings.sort();
        let docs: Vec<u32> = postings.iter().map(|p| p.doc.get()).collect();
        assert_eq!(docs, vec![1, 2, 3]);
    }

    #[test]
    fn test_term_stats_out_of_range_is_zero() {
        let stats = CollectionStatistics::default();
        assert_eq!(stats.term(TermId(7)), TermStats::default());
    }
}
