// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Query representation.
//!
//! A query is an ordered list of weighted terms, each optionally tagged with
//! a Boolean role, plus an optional expression tree. Bag-of-words models read
//! [`Query::scoring_terms`]; Boolean-family models read [`Query::expression`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RankError;
use crate::types::Term;
use crate::utils::normalize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BooleanRole {
    And,
    Or,
    Not,
}

fn default_weight() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryTerm {
    pub term: Term,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<BooleanRole>,
}

impl QueryTerm {
    pub fn new(term: impl AsRef<str>) -> Self {
        Self {
            term: normalize(term.as_ref()),
            weight: 1.0,
            role: None,
        }
    }

    pub fn weighted(term: impl AsRef<str>, weight: f64) -> Self {
        Self {
            weight,
            ..Self::new(term)
        }
    }

    pub fn with_role(mut self, role: BooleanRole) -> Self {
        self.role = Some(role);
        self
    }
}

/// Boolean expression tree over normalized terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryExpr {
    Term(Term),
    And(Vec<QueryExpr>),
    Or(Vec<QueryExpr>),
    Not(Box<QueryExpr>),
}

impl QueryExpr {
    pub fn term(term: impl AsRef<str>) -> Self {
        QueryExpr::Term(normalize(term.as_ref()))
    }

    pub fn not(expr: QueryExpr) -> Self {
        QueryExpr::Not(Box::new(expr))
    }

    /// Whether any `Not` node appears in the tree.
    pub fn has_negation(&self) -> bool {
        match self {
            QueryExpr::Term(_) => false,
            QueryExpr::And(children) | QueryExpr::Or(children) => {
                children.iter().any(QueryExpr::has_negation)
            }
            QueryExpr::Not(_) => true,
        }
    }
}

impl fmt::Display for QueryExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, children: &[QueryExpr], op: &str) -> fmt::Result {
            write!(f, "(")?;
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    write!(f, " {} ", op)?;
                }
                write!(f, "{}", child)?;
            }
            write!(f, ")")
        }
        match self {
            QueryExpr::Term(t) => write!(f, "{}", t),
            QueryExpr::And(children) => join(f, children, "AND"),
            QueryExpr::Or(children) => join(f, children, "OR"),
            QueryExpr::Not(inner) => write!(f, "NOT {}", inner),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub terms: Vec<QueryTerm>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expr: Option<QueryExpr>,
}

impl Query {
    pub fn new(terms: Vec<QueryTerm>) -> Self {
        Self { terms, expr: None }
    }

    /// Unweighted, unroled terms.
    pub fn from_terms<I, T>(terms: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        Self::new(terms.into_iter().map(QueryTerm::new).collect())
    }

    pub fn with_expr(mut self, expr: QueryExpr) -> Self {
        self.expr = Some(expr);
        self
    }

    /// Distinct non-negated terms with their summed weights, in first-seen order.
    pub fn scoring_terms(&self) -> Vec<(Term, f64)> {
        let mut order: Vec<Term> = Vec::new();
        let mut weights: BTreeMap<&str, f64> = BTreeMap::new();
        for qt in &self.terms {
            if qt.role == Some(BooleanRole::Not) || qt.term.is_empty() {
                continue;
            }
            match weights.get_mut(qt.term.as_str()) {
                Some(w) => *w += qt.weight,
                None => {
                    weights.insert(qt.term.as_str(), qt.weight);
                    order.push(qt.term.clone());
                }
            }
        }
        order
            .into_iter()
            .map(|t| {
                let w = weights.get(t.as_str()).copied().unwrap_or(1.0);
                (t, w)
            })
            .collect()
    }

    /// No relevance signal: nothing left once negated terms are set aside.
    pub fn is_empty(&self) -> bool {
        self.scoring_terms().is_empty()
    }

    /// The explicit expression, or one derived from the term roles:
    /// every `And` term required, every `Not` term excluded, and at least
    /// one of the remaining terms present.
    pub fn expression(&self) -> Option<QueryExpr> {
        if let Some(expr) = &self.expr {
            return Some(expr.clone());
        }
        let mut required = Vec::new();
        let mut optional = Vec::new();
        let mut excluded = Vec::new();
        for qt in self.terms.iter().filter(|qt| !qt.term.is_empty()) {
            let leaf = QueryExpr::Term(qt.term.clone());
            match qt.role {
                Some(BooleanRole::And) => required.push(leaf),
                Some(BooleanRole::Not) => excluded.push(QueryExpr::not(leaf)),
                Some(BooleanRole::Or) | None => optional.push(leaf),
            }
        }
        let mut clauses = required;
        match optional.len() {
            0 => {}
            1 => clauses.extend(optional),
            _ => clauses.push(QueryExpr::Or(optional)),
        }
        clauses.extend(excluded);
        match clauses.len() {
            0 => None,
            1 => clauses.pop(),
            _ => Some(QueryExpr::And(clauses)),
        }
    }

    /// Weights must be finite and positive.
    pub fn validate(&self) -> Result<(), RankError> {
        for qt in &self.terms {
            if !qt.weight.is_finite() || qt.weight <= 0.0 {
                return Err(RankError::invalid_request(
                    "query",
                    format!("weight {} for term '{}' must be finite and > 0", qt.weight, qt.term),
                ));
            }
        }
        Ok(())
    }
}
