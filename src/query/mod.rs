// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Query representation and parsing.

mod parser;
mod types;

pub use parser::{parse_query, DefaultOperator};
pub use types::{BooleanRole, Query, QueryExpr, QueryTerm};
