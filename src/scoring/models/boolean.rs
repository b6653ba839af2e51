// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Strict Boolean retrieval.
//!
//! Set algebra over posting lists. A document either satisfies the expression
//! and scores exactly 1, or it is not in the result at all. A term missing
//! from the vocabulary denotes the empty set, so `cat AND zebra` matches
//! nothing while `cat OR zebra` matches what `cat` matches.

use std::collections::BTreeSet;

use crate::error::RankError;
use crate::index::IndexSnapshot;
use crate::query::{Query, QueryExpr};
use crate::scoring::params::{ParamMap, ParamReader};
use crate::scoring::{DocScores, ModelKind, ScoringModel};
use crate::types::DocId;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BooleanModel;

impl BooleanModel {
    pub fn from_params(params: &ParamMap) -> Result<Self, RankError> {
        ParamReader::new(ModelKind::Boolean.name(), params).finish()?;
        Ok(BooleanModel)
    }

    /// Documents satisfying `expr`.
    pub fn matching(expr: &QueryExpr, index: &IndexSnapshot) -> BTreeSet<DocId> {
        match expr {
            QueryExpr::Term(term) => index.postings(term).iter().map(|p| p.doc).collect(),
            QueryExpr::And(children) => {
                let mut sets = children.iter().map(|c| Self::matching(c, index));
                let Some(first) = sets.next() else {
                    return BTreeSet::new();
                };
                sets.fold(first, |acc, set| acc.intersection(&set).copied().collect())
            }
            QueryExpr::Or(children) => children
                .iter()
                .flat_map(|c| Self::matching(c, index))
                .collect(),
            QueryExpr::Not(inner) => {
                let excluded = Self::matching(inner, index);
                index.documents().filter(|d| !excluded.contains(d)).collect()
            }
        }
    }
}

impl ScoringModel for BooleanModel {
    fn kind(&self) -> ModelKind {
        ModelKind::Boolean
    }

    fn params(&self) -> ParamMap {
        ParamMap::new()
    }

    fn score(&self, query: &Query, index: &IndexSnapshot) -> Result<DocScores, RankError> {
        if query.is_empty() {
            return Ok(DocScores::new());
        }
        let Some(expr) = query.expression() else {
            return Ok(DocScores::new());
        };
        Ok(Self::matching(&expr, index)
            .into_iter()
            .map(|doc| (doc, 1.0))
            .collect())
    }
}
