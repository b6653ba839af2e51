// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Generalized vector space model (Wong, Ziarko and Wong, 1985).
//!
//! Terms are no longer orthogonal: a correlation matrix `C` with unit diagonal
//! describes how much two terms overlap, and
//!
//! ```text
//! sim(d, q) = dᵀ C q / sqrt(dᵀ C d · qᵀ C q)
//! ```
//!
//! Two constructions of `C`:
//!
//! - **minterm**: Wong et al. Each distinct set of co-occurring terms (the
//!   term set of some document) is an orthonormal minterm basis vector. A term
//!   vector is `t_i = Σ_m c_im · m` with `c_im` the summed tf of `t_i` over the
//!   documents whose term set is `m`; `C_ij` is the cosine of `t_i` and `t_j`.
//! - **cooccurrence**: `C_ij` is the cosine of the two terms' document-tf
//!   vectors.
//!
//! Either way, terms that never share a document get `C_ij = 0`, and when no
//! pair of terms co-occurs `C` is the identity and the score is exactly the
//! vector space cosine.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::error::RankError;
use crate::index::IndexSnapshot;
use crate::query::Query;
use crate::scoring::core::{candidates, resolve_terms};
use crate::scoring::models::vector::{document_vector, query_vector, Weighting};
use crate::scoring::params::{params, ParamMap, ParamReader};
use crate::scoring::{DocScores, ModelKind, ScoringModel};
use crate::types::{DocId, TermId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Correlation {
    #[default]
    Minterm,
    Cooccurrence,
}

impl Correlation {
    pub fn name(self) -> &'static str {
        match self {
            Correlation::Minterm => "minterm",
            Correlation::Cooccurrence => "cooccurrence",
        }
    }
}

impl fmt::Display for Correlation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Correlation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minterm" => Ok(Correlation::Minterm),
            "cooccurrence" | "co-occurrence" => Ok(Correlation::Cooccurrence),
            other => Err(format!(
                "unknown correlation '{}' (expected minterm or cooccurrence)",
                other
            )),
        }
    }
}

/// Sparse basis coordinates of a term plus their norm.
struct TermVector {
    coords: BTreeMap<usize, f64>,
    norm: f64,
}

/// Lazily built correlations, valid for a single scoring call.
struct Correlations<'a> {
    index: &'a IndexSnapshot,
    method: Correlation,
    minterms: HashMap<Vec<TermId>, usize>,
    vectors: HashMap<TermId, TermVector>,
    pairs: HashMap<(TermId, TermId), f64>,
}

impl<'a> Correlations<'a> {
    fn new(index: &'a IndexSnapshot, method: Correlation) -> Self {
        Self {
            index,
            method,
            minterms: HashMap::new(),
            vectors: HashMap::new(),
            pairs: HashMap::new(),
        }
    }

    /// A minterm is identified by the set of terms, not their frequencies.
    fn minterm_of(&mut self, doc: DocId) -> usize {
        let key: Vec<TermId> = self.index.document_terms(doc).iter().map(|&(id, _)| id).collect();
        let next = self.minterms.len();
        *self.minterms.entry(key).or_insert(next)
    }

    fn vector(&mut self, term: TermId) -> &TermVector {
        if !self.vectors.contains_key(&term) {
            let index = self.index;
            let mut coords = BTreeMap::new();
            for posting in index.postings_by_id(term) {
                let axis = match self.method {
                    Correlation::Cooccurrence => posting.doc.as_usize(),
                    Correlation::Minterm => self.minterm_of(posting.doc),
                };
                *coords.entry(axis).or_insert(0.0) += f64::from(posting.tf);
            }
            let norm = coords.values().map(|v| v * v).sum::<f64>().sqrt();
            self.vectors.insert(term, TermVector { coords, norm });
        }
        &self.vectors[&term]
    }

    fn get(&mut self, a: TermId, b: TermId) -> f64 {
        if a == b {
            return 1.0;
        }
        let key = if a < b { (a, b) } else { (b, a) };
        if let Some(&c) = self.pairs.get(&key) {
            return c;
        }
        self.vector(a);
        self.vector(b);
        let (va, vb) = (&self.vectors[&key.0], &self.vectors[&key.1]);
        let c = if va.norm == 0.0 || vb.norm == 0.0 {
            0.0
        } else {
            let dot: f64 = va
                .coords
                .iter()
                .filter_map(|(axis, x)| vb.coords.get(axis).map(|y| x * y))
                .sum();
            dot / (va.norm * vb.norm)
        };
        self.pairs.insert(key, c);
        c
    }

    /// `xᵀ C y`
    fn bilinear(&mut self, x: &[(TermId, f64)], y: &[(TermId, f64)]) -> f64 {
        let mut total = 0.0;
        for &(i, xi) in x {
            if xi == 0.0 {
                continue;
            }
            for &(j, yj) in y {
                if yj != 0.0 {
                    total += xi * self.get(i, j) * yj;
                }
            }
        }
        total
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Gvsm {
    pub correlation: Correlation,
    pub weighting: Weighting,
}

impl Gvsm {
    pub fn new(correlation: Correlation, weighting: Weighting) -> Self {
        Self {
            correlation,
            weighting,
        }
    }

    pub fn from_params(map: &ParamMap) -> Result<Self, RankError> {
        let mut reader = ParamReader::new(ModelKind::Gvsm.name(), map);
        let correlation = reader.choice("correlation", Correlation::default())?;
        let weighting = reader.choice("weighting", Weighting::default())?;
        reader.finish()?;
        Ok(Self {
            correlation,
            weighting,
        })
    }
}

impl ScoringModel for Gvsm {
    fn kind(&self) -> ModelKind {
        ModelKind::Gvsm
    }

    fn params(&self) -> ParamMap {
        params([
            ("correlation", self.correlation.name()),
            ("weighting", self.weighting.name()),
        ])
    }

    fn score(&self, query: &Query, index: &IndexSnapshot) -> Result<DocScores, RankError> {
        let terms = resolve_terms(query, index);
        if terms.is_empty() {
            return Ok(DocScores::new());
        }
        let mut correlations = Correlations::new(index, self.correlation);
        let q = query_vector(&terms, index.num_docs(), self.weighting);
        let qq = correlations.bilinear(&q, &q);

        let mut scores = DocScores::new();
        for doc in candidates(&terms, index) {
            let d = document_vector(index, doc, self.weighting);
            let dd = correlations.bilinear(&d, &d);
            let score = if qq <= 0.0 || dd <= 0.0 {
                0.0
            } else {
                correlations.bilinear(&d, &q) / (dd * qq).sqrt()
            };
            scores.insert(doc, score);
        }
        Ok(scores)
    }
}
