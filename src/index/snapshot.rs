// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The immutable index snapshot every model reads from.
//!
//! A snapshot is built once (by [`IndexBuilder`](super::IndexBuilder) or by
//! loading a snapshot file), validated, and then only ever read. Statistics are
//! derived inside the constructor, so there is no window in which a reader can
//! see postings that disagree with `df`, `cf` or `avgdl`.
//!
//! # File format
//!
//! ```json
//! {
//!   "version": 1,
//!   "documents": [{"key": "doc1", "length": 2}],
//!   "postings": {"cat": [[0, 1]], "dog": [[0, 1]]},
//!   "priors": [1.0],
//!   "fingerprint": 305419896
//! }
//! ```
//!
//! `priors` and `fingerprint` are optional. A stored fingerprint must match the
//! content on load.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::contracts::{check_document_lengths, check_postings_sorted};
use crate::error::SnapshotError;
use crate::index::validate::{
    check_documents, check_lengths, check_postings, check_priors, InvariantError,
};
use crate::types::{CollectionStatistics, DocId, Posting, Term, TermId, TermStats};

/// Current snapshot file version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// One indexed document: its external key and token count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub key: String,
    pub length: u32,
}

/// On-disk representation. Postings are `[doc, tf]` pairs.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
    version: u32,
    documents: Vec<Document>,
    postings: BTreeMap<Term, Vec<(u32, u32)>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    priors: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fingerprint: Option<u32>,
}

/// A point-in-time, read-only view of the collection.
#[derive(Debug, Clone)]
pub struct IndexSnapshot {
    documents: Vec<Document>,
    /// Sorted lexicographically; position is the `TermId`.
    vocabulary: Vec<Term>,
    term_ids: HashMap<Term, TermId>,
    /// Indexed by `TermId`.
    postings: Vec<Vec<Posting>>,
    /// Indexed by `DocId`; entries sorted by `TermId`.
    forward: Vec<Vec<(TermId, u32)>>,
    max_tf: Vec<u32>,
    key_index: HashMap<String, DocId>,
    priors: Option<Vec<f64>>,
    stats: CollectionStatistics,
    fingerprint: u32,
}

impl IndexSnapshot {
    /// Validate the raw parts and derive everything else.
    pub fn from_parts(
        documents: Vec<Document>,
        postings: BTreeMap<Term, Vec<Posting>>,
        priors: Option<Vec<f64>>,
    ) -> Result<Self, InvariantError> {
        check_documents(&documents)?;
        check_postings(&postings, documents.len())?;
        if let Some(priors) = &priors {
            check_priors(priors, documents.len())?;
        }

        let num_docs = documents.len();
        let mut vocabulary = Vec::with_capacity(postings.len());
        let mut lists = Vec::with_capacity(postings.len());
        let mut term_stats = Vec::with_capacity(postings.len());
        let mut forward: Vec<Vec<(TermId, u32)>> = vec![Vec::new(); num_docs];
        let mut counted = vec![0u64; num_docs];

        // BTreeMap iteration is sorted, so TermIds follow lexicographic order
        // and every forward list comes out sorted by TermId.
        for (i, (term, list)) in postings.into_iter().enumerate() {
            let id = TermId(i as u32);
            let mut cf = 0u64;
            for posting in &list {
                cf += u64::from(posting.tf);
                counted[posting.doc.as_usize()] += u64::from(posting.tf);
                forward[posting.doc.as_usize()].push((id, posting.tf));
            }
            check_postings_sorted(&list);
            term_stats.push(TermStats {
                df: list.len() as u32,
                cf,
            });
            vocabulary.push(term);
            lists.push(list);
        }
        check_lengths(&documents, &counted)?;
        check_document_lengths(documents.iter().map(|d| d.length));

        let max_tf = forward
            .iter()
            .map(|terms| terms.iter().map(|&(_, tf)| tf).max().unwrap_or(0))
            .collect();
        let term_ids = vocabulary
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), TermId(i as u32)))
            .collect();
        let key_index = documents
            .iter()
            .enumerate()
            .map(|(i, d)| (d.key.clone(), DocId(i as u32)))
            .collect();

        let total_tokens: u64 = documents.iter().map(|d| u64::from(d.length)).sum();
        let stats = CollectionStatistics {
            num_docs,
            total_tokens,
            avg_doc_len: if num_docs == 0 {
                0.0
            } else {
                total_tokens as f64 / num_docs as f64
            },
            vocabulary_size: vocabulary.len(),
            terms: term_stats,
        };

        let mut snapshot = IndexSnapshot {
            documents,
            vocabulary,
            term_ids,
            postings: lists,
            forward,
            max_tf,
            key_index,
            priors,
            stats,
            fingerprint: 0,
        };
        snapshot.fingerprint = snapshot.compute_fingerprint();
        Ok(snapshot)
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Postings for a term; empty for unknown terms.
    pub fn postings(&self, term: &str) -> &[Posting] {
        self.term_id(term)
            .map(|id| self.postings_by_id(id))
            .unwrap_or(&[])
    }

    #[inline]
    pub fn postings_by_id(&self, id: TermId) -> &[Posting] {
        self.postings
            .get(id.as_usize())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn term_id(&self, term: &str) -> Option<TermId> {
        self.term_ids.get(term).copied()
    }

    pub fn term_text(&self, id: TermId) -> Option<&str> {
        self.vocabulary.get(id.as_usize()).map(String::as_str)
    }

    pub fn document_frequency(&self, term: &str) -> u32 {
        self.term_id(term)
            .map(|id| self.stats.term(id).df)
            .unwrap_or(0)
    }

    pub fn collection_frequency(&self, term: &str) -> u64 {
        self.term_id(term)
            .map(|id| self.stats.term(id).cf)
            .unwrap_or(0)
    }

    #[inline]
    pub fn term_stats(&self, id: TermId) -> TermStats {
        self.stats.term(id)
    }

    /// Token count of a document; 0 for unknown ids.
    #[inline]
    pub fn document_length(&self, doc: DocId) -> u32 {
        self.documents
            .get(doc.as_usize())
            .map(|d| d.length)
            .unwrap_or(0)
    }

    /// Frequency of a term in a document; 0 when absent.
    pub fn tf(&self, id: TermId, doc: DocId) -> u32 {
        let list = self.postings_by_id(id);
        list.binary_search_by_key(&doc, |p| p.doc)
            .map(|i| list[i].tf)
            .unwrap_or(0)
    }

    pub fn collection_statistics(&self) -> &CollectionStatistics {
        &self.stats
    }

    #[inline]
    pub fn num_docs(&self) -> usize {
        self.documents.len()
    }

    /// All document ids in ascending order.
    pub fn documents(&self) -> impl Iterator<Item = DocId> + '_ {
        (0..self.documents.len() as u32).map(DocId)
    }

    /// Forward index: `(TermId, tf)` pairs of a document, sorted by `TermId`.
    pub fn document_terms(&self, doc: DocId) -> &[(TermId, u32)] {
        self.forward
            .get(doc.as_usize())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn max_tf(&self, doc: DocId) -> u32 {
        self.max_tf.get(doc.as_usize()).copied().unwrap_or(0)
    }

    pub fn doc_key(&self, doc: DocId) -> Option<&str> {
        self.documents.get(doc.as_usize()).map(|d| d.key.as_str())
    }

    pub fn doc_id(&self, key: &str) -> Option<DocId> {
        self.key_index.get(key).copied()
    }

    /// Static prior of a document, when the snapshot carries priors.
    pub fn prior(&self, doc: DocId) -> Option<f64> {
        self.priors.as_ref()?.get(doc.as_usize()).copied()
    }

    pub fn has_priors(&self) -> bool {
        self.priors.is_some()
    }

    /// The vocabulary in `TermId` order.
    pub fn vocabulary(&self) -> &[Term] {
        &self.vocabulary
    }

    /// CRC32 over the canonical content.
    pub fn fingerprint(&self) -> u32 {
        self.fingerprint
    }

    pub fn fingerprint_hex(&self) -> String {
        format!("{:08x}", self.fingerprint)
    }

    fn compute_fingerprint(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&SNAPSHOT_VERSION.to_le_bytes());
        for doc in &self.documents {
            hasher.update(doc.key.as_bytes());
            hasher.update(&[0]);
            hasher.update(&doc.length.to_le_bytes());
        }
        for (term, list) in self.vocabulary.iter().zip(&self.postings) {
            hasher.update(term.as_bytes());
            hasher.update(&[0]);
            for posting in list {
                hasher.update(&posting.doc.get().to_le_bytes());
                hasher.update(&posting.tf.to_le_bytes());
            }
        }
        if let Some(priors) = &self.priors {
            for prior in priors {
                hasher.update(&prior.to_bits().to_le_bytes());
            }
        }
        hasher.finalize()
    }

    // =========================================================================
    // PERSISTENCE
    // =========================================================================

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        let postings = self
            .vocabulary
            .iter()
            .zip(&self.postings)
            .map(|(term, list)| {
                let pairs = list.iter().map(|p| (p.doc.get(), p.tf)).collect();
                (term.clone(), pairs)
            })
            .collect();
        let file = SnapshotFile {
            version: SNAPSHOT_VERSION,
            documents: self.documents.clone(),
            postings,
            priors: self.priors.clone(),
            fingerprint: Some(self.fingerprint),
        };
        Ok(serde_json::to_string(&file)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let file: SnapshotFile = serde_json::from_str(json)?;
        if file.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: file.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        let postings = file
            .postings
            .into_iter()
            .map(|(term, pairs)| {
                let list = pairs.into_iter().map(|(doc, tf)| Posting::new(doc, tf)).collect();
                (term, list)
            })
            .collect();
        let snapshot = IndexSnapshot::from_parts(file.documents, postings, file.priors)?;
        if let Some(stored) = file.fingerprint {
            if stored != snapshot.fingerprint {
                return Err(InvariantError::FingerprintMismatch {
                    stored,
                    computed: snapshot.fingerprint,
                }
                .into());
            }
        }
        Ok(snapshot)
    }

    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}
