// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Snapshot invariants, checked once when a snapshot is built or loaded.
//!
//! After `IndexSnapshot` construction succeeds, every accessor can assume:
//!
//! | Invariant                 | Checked by               |
//! |---------------------------|--------------------------|
//! | document length > 0       | `check_documents`        |
//! | keys unique and non-empty | `check_documents`        |
//! | postings sorted, no dups  | `check_postings`         |
//! | doc ids in range, tf > 0  | `check_postings`         |
//! | length >= Σ tf            | `check_lengths`          |
//! | priors aligned, in (0, 1] | `check_priors`           |
//!
//! The models never re-check any of this.

use std::collections::{BTreeMap, HashSet};

use thiserror::Error;

use crate::index::snapshot::Document;
use crate::types::{Posting, Term};

/// Error type for invariant violations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvariantError {
    /// A document key appears twice.
    #[error("duplicate document key '{key}'")]
    DuplicateKey { key: String },
    /// A document key is the empty string.
    #[error("document {doc} has an empty key")]
    EmptyKey { doc: u32 },
    /// A document has no tokens.
    #[error("document '{key}' has length 0")]
    EmptyDocument { key: String },
    /// A term is the empty string.
    #[error("vocabulary contains an empty term")]
    EmptyTerm,
    /// Posting list is empty (every term should have at least one posting).
    #[error("posting list for '{term}' is empty")]
    EmptyPostingList { term: String },
    /// Posting list is not sorted by doc id.
    #[error("posting list for '{term}' not sorted at position {position}")]
    UnsortedPostingList { term: String, position: usize },
    /// Posting list names the same document twice.
    #[error("posting list for '{term}' lists doc {doc} twice")]
    DuplicatePosting { term: String, doc: u32 },
    /// Posting refers to a document that does not exist.
    #[error("posting list for '{term}' has doc {doc} >= num_docs {num_docs}")]
    InvalidDocId {
        term: String,
        doc: u32,
        num_docs: usize,
    },
    /// Posting with a zero term frequency.
    #[error("posting for '{term}' in doc {doc} has tf 0")]
    ZeroTermFrequency { term: String, doc: u32 },
    /// Declared document length is smaller than its counted term occurrences.
    #[error("document '{key}' has length {length} but {counted} counted term occurrences")]
    LengthBelowTermCount {
        key: String,
        length: u32,
        counted: u64,
    },
    /// Priors and documents have different lengths.
    #[error("priors.len() {priors_len} != num_docs {num_docs}")]
    MismatchedPriors { priors_len: usize, num_docs: usize },
    /// A prior is outside (0, 1] or not finite.
    #[error("prior {value} for doc {doc} is outside (0, 1]")]
    InvalidPrior { doc: u32, value: f64 },
    /// Stored fingerprint does not match the content.
    #[error("fingerprint {stored:08x} does not match content {computed:08x}")]
    FingerprintMismatch { stored: u32, computed: u32 },
    /// A link endpoint names a key that was never added.
    #[error("link refers to unknown document '{key}'")]
    UnknownLinkEndpoint { key: String },
}

/// Keys unique and non-empty, lengths positive.
pub fn check_documents(documents: &[Document]) -> Result<(), InvariantError> {
    let mut seen = HashSet::with_capacity(documents.len());
    for (i, doc) in documents.iter().enumerate() {
        if doc.key.is_empty() {
            return Err(InvariantError::EmptyKey { doc: i as u32 });
        }
        if doc.length == 0 {
            return Err(InvariantError::EmptyDocument {
                key: doc.key.clone(),
            });
        }
        if !seen.insert(doc.key.as_str()) {
            return Err(InvariantError::DuplicateKey {
                key: doc.key.clone(),
            });
        }
    }
    Ok(())
}

/// Every list non-empty, strictly ascending by doc, in range, tf > 0.
pub fn check_postings(
    postings: &BTreeMap<Term, Vec<Posting>>,
    num_docs: usize,
) -> Result<(), InvariantError> {
    for (term, list) in postings {
        if term.is_empty() {
            return Err(InvariantError::EmptyTerm);
        }
        if list.is_empty() {
            return Err(InvariantError::EmptyPostingList { term: term.clone() });
        }
        for (i, posting) in list.iter().enumerate() {
            if posting.doc.as_usize() >= num_docs {
                return Err(InvariantError::InvalidDocId {
                    term: term.clone(),
                    doc: posting.doc.get(),
                    num_docs,
                });
            }
            if posting.tf == 0 {
                return Err(InvariantError::ZeroTermFrequency {
                    term: term.clone(),
                    doc: posting.doc.get(),
                });
            }
            if i > 0 {
                let prev = list[i - 1].doc;
                if prev == posting.doc {
                    return Err(InvariantError::DuplicatePosting {
                        term: term.clone(),
                        doc: posting.doc.get(),
                    });
                }
                if prev > posting.doc {
                    return Err(InvariantError::UnsortedPostingList {
                        term: term.clone(),
                        position: i,
                    });
                }
            }
        }
    }
    Ok(())
}

/// Declared lengths cover the counted occurrences.
///
/// Lengths may exceed Σ tf: the ingestion side is free to count tokens the
/// vocabulary dropped.
pub fn check_lengths(documents: &[Document], counted: &[u64]) -> Result<(), InvariantError> {
    for (doc, &occurrences) in documents.iter().zip(counted) {
        if u64::from(doc.length) < occurrences {
            return Err(InvariantError::LengthBelowTermCount {
                key: doc.key.clone(),
                length: doc.length,
                counted: occurrences,
            });
        }
    }
    Ok(())
}

/// One finite prior in (0, 1] per document.
pub fn check_priors(priors: &[f64], num_docs: usize) -> Result<(), InvariantError> {
    if priors.len() != num_docs {
        return Err(InvariantError::MismatchedPriors {
            priors_len: priors.len(),
            num_docs,
        });
    }
    for (i, &value) in priors.iter().enumerate() {
        if !value.is_finite() || value <= 0.0 || value > 1.0 {
            return Err(InvariantError::InvalidPrior {
                doc: i as u32,
                value,
            });
        }
    }
    Ok(())
}
