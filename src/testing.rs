// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Test fixtures shared across unit and integration tests.
//!
//! This module is always compiled but hidden from documentation.
//! It provides the canonical collections so every test agrees on what
//! "the toy collection" is.

#![doc(hidden)]

use crate::index::{IndexBuilder, IndexSnapshot};
use crate::query::{parse_query, DefaultOperator, Query};

/// The three-document collection used throughout the test suite.
///
/// | key  | text           |
/// |------|----------------|
/// | doc1 | cat dog        |
/// | doc2 | dog dog bird   |
/// | doc3 | cat bird bird  |
pub fn toy_snapshot() -> IndexSnapshot {
    snapshot_from_texts(&["cat dog", "dog dog bird", "cat bird bird"])
}

/// A snapshot over `texts`, keyed `doc1`, `doc2`, ... in order.
///
/// # Panics
/// Panics if a text analyzes to no tokens.
pub fn snapshot_from_texts(texts: &[&str]) -> IndexSnapshot {
    let mut builder = IndexBuilder::new();
    for (i, text) in texts.iter().enumerate() {
        builder
            .add_text(format!("doc{}", i + 1), text)
            .expect("fixture documents are non-empty");
    }
    builder.build().expect("fixture snapshot is valid")
}

/// Parse with the default OR operator.
pub fn query(input: &str) -> Query {
    parse_query(input, DefaultOperator::Or).expect("fixture query parses")
}
