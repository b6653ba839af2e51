// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Query string parser.
//!
//! ```text
//! query   := or
//! or      := and (("OR" | juxtaposition) and)*
//! and     := unary (("AND" | juxtaposition) unary)*
//! unary   := "NOT" unary | primary
//! primary := word | "(" or ")"
//! word    := text ("^" weight)?
//! ```
//!
//! Operators are uppercase only, so `and` is an ordinary term. Juxtaposition
//! (`cat dog`) takes the precedence of the configured default operator.
//! Words go through the same analyzer as documents; a word that analyzes to
//! several terms (`e-mail`) becomes a group under the default operator, and a
//! word that analyzes to nothing (`!!!`) is dropped.

use serde::{Deserialize, Serialize};

use crate::error::RankError;
use crate::query::types::{BooleanRole, Query, QueryExpr, QueryTerm};
use crate::types::Term;
use crate::utils::tokenize;

/// Operator implied between adjacent operands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultOperator {
    And,
    #[default]
    Or,
}

impl std::str::FromStr for DefaultOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "and" => Ok(DefaultOperator::And),
            "or" => Ok(DefaultOperator::Or),
            other => Err(format!("unknown default operator '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word { terms: Vec<Term>, weight: f64 },
    And,
    Or,
    Not,
    LParen,
    RParen,
}

/// Parse tree whose leaves index into the occurrence list, so per-occurrence
/// weights survive until roles are assigned.
#[derive(Debug)]
enum Node {
    Leaf(usize),
    And(Vec<Node>),
    Or(Vec<Node>),
    Not(Box<Node>),
}

/// Parse a query string.
pub fn parse_query(input: &str, default_op: DefaultOperator) -> Result<Query, RankError> {
    let tokens = lex(input)?;
    if tokens.is_empty() {
        return Ok(Query::default());
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: input.len(),
        default_op,
        occurrences: Vec::new(),
    };
    let root = parser.parse_or()?;
    if let Some((_, at)) = parser.tokens.get(parser.pos) {
        return Err(RankError::malformed(*at, "unexpected ')'"));
    }

    let mut terms = Vec::with_capacity(parser.occurrences.len());
    let expr = lower(&root, None, false, &parser.occurrences, &mut terms);
    Ok(Query {
        terms,
        expr: Some(expr),
    })
}

fn lex(input: &str) -> Result<Vec<(Token, usize)>, RankError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();
    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '(' || c == ')' {
            chars.next();
            let token = if c == '(' { Token::LParen } else { Token::RParen };
            tokens.push((token, start));
            continue;
        }
        let mut end = start;
        while let Some(&(i, c)) = chars.peek() {
            if c.is_whitespace() || c == '(' || c == ')' {
                break;
            }
            end = i + c.len_utf8();
            chars.next();
        }
        let word = &input[start..end];
        match word {
            "AND" => tokens.push((Token::And, start)),
            "OR" => tokens.push((Token::Or, start)),
            "NOT" => tokens.push((Token::Not, start)),
            _ => {
                if let Some(token) = lex_word(word, start)? {
                    tokens.push((token, start));
                }
            }
        }
    }
    Ok(tokens)
}

fn lex_word(word: &str, start: usize) -> Result<Option<Token>, RankError> {
    let (text, weight) = match word.find('^') {
        Some(caret) => {
            let raw = &word[caret + 1..];
            let weight: f64 = raw.parse().map_err(|_| {
                RankError::malformed(start + caret, format!("invalid weight '{}'", raw))
            })?;
            if !weight.is_finite() || weight <= 0.0 {
                return Err(RankError::malformed(
                    start + caret,
                    format!("weight {} must be finite and > 0", weight),
                ));
            }
            if caret == 0 {
                return Err(RankError::malformed(start, "weight without a term"));
            }
            (&word[..caret], weight)
        }
        None => (word, 1.0),
    };
    let terms = tokenize(text);
    if terms.is_empty() {
        return Ok(None);
    }
    Ok(Some(Token::Word { terms, weight }))
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    end: usize,
    default_op: DefaultOperator,
    occurrences: Vec<(Term, f64)>,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.pos).map(|&(_, at)| at).unwrap_or(self.end)
    }

    fn starts_operand(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Word { .. } | Token::LParen | Token::Not)
        )
    }

    fn parse_or(&mut self) -> Result<Node, RankError> {
        let mut children = vec![self.parse_and()?];
        loop {
            if self.peek() == Some(&Token::Or) {
                self.pos += 1;
            } else if !(self.default_op == DefaultOperator::Or && self.starts_operand()) {
                break;
            }
            children.push(self.parse_and()?);
        }
        Ok(group(children, false))
    }

    fn parse_and(&mut self) -> Result<Node, RankError> {
        let mut children = vec![self.parse_unary()?];
        loop {
            if self.peek() == Some(&Token::And) {
                self.pos += 1;
            } else if !(self.default_op == DefaultOperator::And && self.starts_operand()) {
                break;
            }
            children.push(self.parse_unary()?);
        }
        Ok(group(children, true))
    }

    fn parse_unary(&mut self) -> Result<Node, RankError> {
        if self.peek() == Some(&Token::Not) {
            self.pos += 1;
            let inner = self.parse_unary()?;
            return Ok(Node::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Node, RankError> {
        let at = self.position();
        let Some((token, _)) = self.tokens.get(self.pos).cloned() else {
            return Err(RankError::malformed(at, "unexpected end of query"));
        };
        match token {
            Token::Word { terms, weight } => {
                self.pos += 1;
                let leaves = terms
                    .into_iter()
                    .map(|term| {
                        self.occurrences.push((term, weight));
                        Node::Leaf(self.occurrences.len() - 1)
                    })
                    .collect();
                Ok(group(leaves, self.default_op == DefaultOperator::And))
            }
            Token::LParen => {
                self.pos += 1;
                if self.peek() == Some(&Token::RParen) {
                    return Err(RankError::malformed(at, "empty parentheses"));
                }
                let inner = self.parse_or()?;
                if self.peek() != Some(&Token::RParen) {
                    return Err(RankError::malformed(at, "missing closing parenthesis"));
                }
                self.pos += 1;
                Ok(inner)
            }
            Token::RParen => Err(RankError::malformed(at, "unexpected ')'")),
            Token::And => Err(RankError::malformed(at, "AND is missing its left operand")),
            Token::Or => Err(RankError::malformed(at, "OR is missing its left operand")),
            Token::Not => Err(RankError::malformed(at, "NOT is missing its operand")),
        }
    }
}

/// Collapse singletons and flatten nested nodes of the same operator.
fn group(mut children: Vec<Node>, and: bool) -> Node {
    if children.len() == 1 {
        if let Some(only) = children.pop() {
            return only;
        }
    }
    let mut flat = Vec::with_capacity(children.len());
    for child in children {
        match (child, and) {
            (Node::And(inner), true) | (Node::Or(inner), false) => flat.extend(inner),
            (other, _) => flat.push(other),
        }
    }
    if and {
        Node::And(flat)
    } else {
        Node::Or(flat)
    }
}

/// Build the public expression and emit one `QueryTerm` per occurrence, in
/// textual order, with the role its position in the tree implies.
fn lower(
    node: &Node,
    parent: Option<BooleanRole>,
    negated: bool,
    occurrences: &[(Term, f64)],
    out: &mut Vec<QueryTerm>,
) -> QueryExpr {
    match node {
        Node::Leaf(i) => {
            let (term, weight) = occurrences[*i].clone();
            let role = if negated { Some(BooleanRole::Not) } else { parent };
            out.push(QueryTerm {
                term: term.clone(),
                weight,
                role,
            });
            QueryExpr::Term(term)
        }
        Node::And(children) => QueryExpr::And(
            children
                .iter()
                .map(|c| lower(c, Some(BooleanRole::And), negated, occurrences, out))
                .collect(),
        ),
        Node::Or(children) => QueryExpr::Or(
            children
                .iter()
                .map(|c| lower(c, Some(BooleanRole::Or), negated, occurrences, out))
                .collect(),
        ),
        Node::Not(inner) => QueryExpr::not(lower(inner, parent, !negated, occurrences, out)),
    }
}
