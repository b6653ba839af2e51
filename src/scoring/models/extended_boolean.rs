// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Extended Boolean retrieval (Salton, Fox and Wu p-norm model).
//!
//! Term similarity is `w = (tf / max_tf(d)) · (idf / max_idf)` with
//! `idf = ln(1 + N / df)`, so every `w` lies in [0, 1]. Operators combine
//! child similarities `s_i` with query weights `a_i`:
//!
//! ```text
//! OR  = (Σ a^p s^p / Σ a^p)^(1/p)
//! AND = 1 - (Σ a^p (1 - s)^p / Σ a^p)^(1/p)
//! NOT = 1 - s
//! ```
//!
//! `p = 1` is a weighted average; `p = ∞` is evaluated as min / max, which is
//! strict Boolean logic on binary similarities. From [`SATURATION_P`] on, a
//! finite `p` is evaluated as `∞` too: there a p-norm is within `ln(k) / p`
//! of min / max for `k` children, and partial AND matches would otherwise
//! linger with scores of order `1 / p`. Documents scoring 0 are out.
//! Leaves for terms missing from the vocabulary are pruned before evaluation.

use std::collections::BTreeMap;

use crate::error::RankError;
use crate::index::IndexSnapshot;
use crate::query::{Query, QueryExpr};
use crate::scoring::params::{ensure, ParamMap, ParamReader, ParamValue};
use crate::scoring::{DocScores, ModelKind, ScoringModel};
use crate::types::DocId;

/// Finite `p` at or above this is evaluated as min / max.
pub const SATURATION_P: f64 = 1_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtendedBoolean {
    pub p: f64,
}

impl Default for ExtendedBoolean {
    fn default() -> Self {
        Self { p: 2.0 }
    }
}

/// Drop leaves whose term is not indexed, and collapse what becomes trivial.
fn prune(expr: &QueryExpr, index: &IndexSnapshot) -> Option<QueryExpr> {
    match expr {
        QueryExpr::Term(t) => (index.document_frequency(t) > 0).then(|| expr.clone()),
        QueryExpr::And(children) | QueryExpr::Or(children) => {
            let mut kept: Vec<QueryExpr> = children.iter().filter_map(|c| prune(c, index)).collect();
            match kept.len() {
                0 => None,
                1 => kept.pop(),
                _ => Some(match expr {
                    QueryExpr::And(_) => QueryExpr::And(kept),
                    _ => QueryExpr::Or(kept),
                }),
            }
        }
        QueryExpr::Not(inner) => prune(inner, index).map(QueryExpr::not),
    }
}

fn leaf_terms<'a>(expr: &'a QueryExpr, out: &mut Vec<&'a str>) {
    match expr {
        QueryExpr::Term(t) => out.push(t),
        QueryExpr::And(children) | QueryExpr::Or(children) => {
            children.iter().for_each(|c| leaf_terms(c, out))
        }
        QueryExpr::Not(inner) => leaf_terms(inner, out),
    }
}

/// Weighted power mean of `values`, computed relative to the maxima so large
/// `p` neither overflows nor underflows.
fn power_mean(items: &[(f64, f64)], p: f64) -> f64 {
    if p.is_infinite() {
        return items.iter().map(|&(_, x)| x).fold(0.0, f64::max);
    }
    let max_x = items.iter().map(|&(a, x)| a * x).fold(0.0, f64::max);
    if max_x == 0.0 {
        return 0.0;
    }
    let max_a = items.iter().map(|&(a, _)| a).fold(0.0, f64::max);
    let num: f64 = items.iter().map(|&(a, x)| (a * x / max_x).powf(p)).sum();
    let den: f64 = items.iter().map(|&(a, _)| (a / max_a).powf(p)).sum();
    (max_x / max_a) * (num / den).powf(1.0 / p)
}

struct Evaluator<'a> {
    index: &'a IndexSnapshot,
    weights: &'a BTreeMap<String, f64>,
    max_idf: f64,
    p: f64,
}

impl Evaluator<'_> {
    fn term_similarity(&self, term: &str, doc: DocId) -> f64 {
        let Some(id) = self.index.term_id(term) else {
            return 0.0;
        };
        let tf = self.index.tf(id, doc);
        if tf == 0 || self.max_idf == 0.0 {
            return 0.0;
        }
        let n = self.index.num_docs() as f64;
        let df = f64::from(self.index.term_stats(id).df);
        let max_tf = f64::from(self.index.max_tf(doc).max(1));
        (f64::from(tf) / max_tf) * ((1.0 + n / df).ln() / self.max_idf)
    }

    fn child(&self, expr: &QueryExpr, doc: DocId) -> (f64, f64) {
        let weight = match expr {
            QueryExpr::Term(t) => self.weights.get(t.as_str()).copied().unwrap_or(1.0),
            _ => 1.0,
        };
        (weight, self.eval(expr, doc))
    }

    fn eval(&self, expr: &QueryExpr, doc: DocId) -> f64 {
        let s = match expr {
            QueryExpr::Term(t) => self.term_similarity(t, doc),
            QueryExpr::Or(children) => {
                let items: Vec<(f64, f64)> = children.iter().map(|c| self.child(c, doc)).collect();
                power_mean(&items, self.p)
            }
            QueryExpr::And(children) => {
                let items: Vec<(f64, f64)> = children
                    .iter()
                    .map(|c| {
                        let (a, s) = self.child(c, doc);
                        (a, 1.0 - s)
                    })
                    .collect();
                if self.p.is_infinite() {
                    1.0 - items.iter().map(|&(_, x)| x).fold(0.0, f64::max)
                } else {
                    1.0 - power_mean(&items, self.p)
                }
            }
            QueryExpr::Not(inner) => 1.0 - self.eval(inner, doc),
        };
        s.clamp(0.0, 1.0)
    }
}

impl ExtendedBoolean {
    pub fn new(p: f64) -> Self {
        Self { p }
    }

    /// The exponent operators are evaluated with.
    fn effective_p(&self) -> f64 {
        if self.p >= SATURATION_P {
            f64::INFINITY
        } else {
            self.p
        }
    }

    pub fn from_params(map: &ParamMap) -> Result<Self, RankError> {
        let name = ModelKind::ExtendedBoolean.name();
        let mut reader = ParamReader::new(name, map);
        let p = reader.number_or_infinity("p", Self::default().p)?;
        reader.finish()?;
        ensure(name, "p", p >= 1.0, "must be >= 1 (or inf)")?;
        Ok(Self { p })
    }
}

impl ScoringModel for ExtendedBoolean {
    fn kind(&self) -> ModelKind {
        ModelKind::ExtendedBoolean
    }

    fn params(&self) -> ParamMap {
        let value = if self.p.is_infinite() {
            ParamValue::Text("inf".into())
        } else {
            ParamValue::Number(self.p)
        };
        ParamMap::from([("p".to_string(), value)])
    }

    fn score(&self, query: &Query, index: &IndexSnapshot) -> Result<DocScores, RankError> {
        if query.is_empty() {
            return Ok(DocScores::new());
        }
        let Some(expr) = query.expression().and_then(|e| prune(&e, index)) else {
            return Ok(DocScores::new());
        };

        let weights: BTreeMap<String, f64> = query.scoring_terms().into_iter().collect();
        let n = index.num_docs() as f64;
        let min_df = index
            .collection_statistics()
            .terms
            .iter()
            .map(|t| t.df)
            .filter(|&df| df > 0)
            .min()
            .unwrap_or(1);
        let evaluator = Evaluator {
            index,
            weights: &weights,
            max_idf: (1.0 + n / f64::from(min_df)).ln(),
            p: self.effective_p(),
        };

        let docs: Vec<DocId> = if expr.has_negation() {
            index.documents().collect()
        } else {
            let mut leaves = Vec::new();
            leaf_terms(&expr, &mut leaves);
            let set: std::collections::BTreeSet<DocId> = leaves
                .iter()
                .flat_map(|t| index.postings(t).iter().map(|p| p.doc))
                .collect();
            set.into_iter().collect()
        };

        Ok(docs
            .into_iter()
            .filter_map(|doc| {
                let s = evaluator.eval(&expr, doc);
                (s > 0.0).then_some((doc, s))
            })
            .collect())
    }
}
