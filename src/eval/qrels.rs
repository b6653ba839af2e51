// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Relevance judgments and topics from files.
//!
//! Qrels use the TREC format, one judgment per line:
//!
//! ```text
//! <topic> <iteration> <document key> <grade>
//! ```
//!
//! The iteration column is ignored. Blank lines and lines starting with `#`
//! are skipped. Negative grades (some collections use -1 for "judged junk")
//! count as non-relevant. Topics are a JSON array of `{ "id", "query" }`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::eval::Judgments;

#[derive(Debug, Error)]
pub enum EvalInputError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("qrels line {line}: {reason}")]
    Qrels { line: usize, reason: String },

    #[error("topics are not valid JSON: {0}")]
    Topics(#[from] serde_json::Error),
}

/// All judgments, keyed by topic id.
pub type Qrels = BTreeMap<String, Judgments>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub query: String,
}

pub fn parse_qrels(text: &str) -> Result<Qrels, EvalInputError> {
    let mut qrels = Qrels::new();
    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        let &[topic, _iteration, key, grade] = fields.as_slice() else {
            return Err(EvalInputError::Qrels {
                line: i + 1,
                reason: format!("expected 4 columns, found {}", fields.len()),
            });
        };
        let grade: i64 = grade.parse().map_err(|_| EvalInputError::Qrels {
            line: i + 1,
            reason: format!("grade '{}' is not an integer", grade),
        })?;
        let grade = u32::try_from(grade.max(0)).unwrap_or(u32::MAX);
        qrels.entry(topic.to_string()).or_default().insert(key, grade);
    }
    Ok(qrels)
}

pub fn load_qrels(path: impl AsRef<Path>) -> Result<Qrels, EvalInputError> {
    parse_qrels(&read(path.as_ref())?)
}

pub fn parse_topics(json: &str) -> Result<Vec<Topic>, EvalInputError> {
    Ok(serde_json::from_str(json)?)
}

pub fn load_topics(path: impl AsRef<Path>) -> Result<Vec<Topic>, EvalInputError> {
    parse_topics(&read(path.as_ref())?)
}

fn read(path: &Path) -> Result<String, EvalInputError> {
    std::fs::read_to_string(path).map_err(|source| EvalInputError::Io {
        path: path.to_path_buf(),
        source,
    })
}
