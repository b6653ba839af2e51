// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Snapshot construction, the hand-off point from ingestion.
//!
//! Documents arrive already tokenized (`add_document`) or as raw text run
//! through the shared analyzer (`add_text`). `build` counts terms per document
//! and merges them into postings lists:
//!
//! 1. **Map phase**: per-document term counting (parallel with `parallel`)
//! 2. **Reduce phase**: merge in DocId order, so every list comes out sorted
//!
//! The reduce is sequential on purpose: it is cheap, and walking documents in
//! order means the postings never need a sort.

use std::collections::{BTreeMap, HashMap};

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::error::SnapshotError;
use crate::index::pagerank::{pagerank, PageRankConfig};
use crate::index::snapshot::{Document, IndexSnapshot};
use crate::index::validate::InvariantError;
use crate::types::{DocId, Posting, Term};
use crate::utils::{normalize, tokenize};

#[derive(Debug, Default)]
pub struct IndexBuilder {
    keys: HashMap<String, DocId>,
    documents: Vec<(String, Vec<Term>)>,
    links: Vec<(String, String)>,
    pagerank: PageRankConfig,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pagerank(mut self, config: PageRankConfig) -> Self {
        self.pagerank = config;
        self
    }

    /// Add a pre-tokenized document. Tokens are normalized; empty ones dropped.
    pub fn add_document<I, T>(&mut self, key: impl Into<String>, tokens: I) -> Result<DocId, SnapshotError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let key = key.into();
        let tokens: Vec<Term> = tokens
            .into_iter()
            .map(|t| normalize(t.as_ref()))
            .filter(|t| !t.is_empty())
            .collect();
        self.push(key, tokens)
    }

    /// Add a raw-text document, tokenized with the same analyzer as queries.
    pub fn add_text(&mut self, key: impl Into<String>, text: &str) -> Result<DocId, SnapshotError> {
        self.push(key.into(), tokenize(text))
    }

    /// Record a hyperlink between two documents for the PageRank prior.
    ///
    /// Endpoints are resolved at `build` time, so links may be added before
    /// their documents.
    pub fn add_link(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.links.push((from.into(), to.into()));
        self
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn push(&mut self, key: String, tokens: Vec<Term>) -> Result<DocId, SnapshotError> {
        if key.is_empty() {
            return Err(InvariantError::EmptyKey {
                doc: self.documents.len() as u32,
            }
            .into());
        }
        if tokens.is_empty() {
            return Err(InvariantError::EmptyDocument { key }.into());
        }
        if self.keys.contains_key(&key) {
            return Err(InvariantError::DuplicateKey { key }.into());
        }
        let id = DocId(self.documents.len() as u32);
        self.keys.insert(key.clone(), id);
        self.documents.push((key, tokens));
        Ok(id)
    }

    #[instrument(skip(self), fields(docs = self.documents.len(), links = self.links.len()))]
    pub fn build(self) -> Result<IndexSnapshot, SnapshotError> {
        let priors = if self.links.is_empty() {
            None
        } else {
            let mut edges = Vec::with_capacity(self.links.len());
            for (from, to) in &self.links {
                let src = self.resolve(from)?;
                let dst = self.resolve(to)?;
                edges.push((src.as_usize(), dst.as_usize()));
            }
            Some(pagerank(self.documents.len(), &edges, &self.pagerank))
        };

        // MAP PHASE
        let per_doc = count_terms(&self.documents);

        // REDUCE PHASE
        let mut postings: BTreeMap<Term, Vec<Posting>> = BTreeMap::new();
        for (doc, counts) in per_doc.into_iter().enumerate() {
            for (term, tf) in counts {
                postings
                    .entry(term)
                    .or_default()
                    .push(Posting::new(doc as u32, tf));
            }
        }

        let documents = self
            .documents
            .iter()
            .map(|(key, tokens)| Document {
                key: key.clone(),
                length: tokens.len() as u32,
            })
            .collect();

        let snapshot = IndexSnapshot::from_parts(documents, postings, priors)?;
        debug!(
            terms = snapshot.collection_statistics().vocabulary_size,
            fingerprint = %snapshot.fingerprint_hex(),
            "snapshot built"
        );
        Ok(snapshot)
    }

    fn resolve(&self, key: &str) -> Result<DocId, InvariantError> {
        self.keys
            .get(key)
            .copied()
            .ok_or_else(|| InvariantError::UnknownLinkEndpoint {
                key: key.to_string(),
            })
    }
}

fn count_doc(tokens: &[Term]) -> BTreeMap<Term, u32> {
    let mut counts = BTreeMap::new();
    for token in tokens {
        *counts.entry(token.clone()).or_insert(0) += 1;
    }
    counts
}

#[cfg(feature = "parallel")]
fn count_terms(documents: &[(String, Vec<Term>)]) -> Vec<BTreeMap<Term, u32>> {
    documents
        .par_iter()
        .map(|(_, tokens)| count_doc(tokens))
        .collect()
}

/// Sequential version for builds without rayon.
#[cfg(not(feature = "parallel"))]
fn count_terms(documents: &[(String, Vec<Term>)]) -> Vec<BTreeMap<Term, u32>> {
    documents.iter().map(|(_, tokens)| count_doc(tokens)).collect()
}
