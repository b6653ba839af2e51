// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Error types.
//!
//! Three families, one per boundary:
//!
//! - [`RankError`]: a ranking request failed. Every variant carries the
//!   offending field so callers can render an actionable message. Nothing in
//!   here is used for normal control flow: an unknown term is not an error and
//!   an empty query is a [`RankingStatus`](crate::rank::RankingStatus).
//! - [`SnapshotError`]: building, loading or saving an index snapshot failed.
//! - [`ConfigError`]: the engine configuration could not be loaded.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::index::InvariantError;
use crate::types::DocId;

/// Result alias for ranking operations.
pub type Result<T, E = RankError> = std::result::Result<T, E>;

/// Why a ranking request did not produce a result.
///
/// None of these are retried internally. Parameter and numerical errors are
/// permanent for the request; `IndexUnavailable` is surfaced so the caller's
/// own retry policy can decide.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RankError {
    #[error("unknown model '{name}'")]
    UnknownModel { name: String },

    #[error("invalid parameter '{field}' for model '{model}': {reason}")]
    InvalidParameter {
        model: String,
        field: String,
        reason: String,
    },

    #[error("malformed query at byte {position}: {reason}")]
    MalformedQuery { position: usize, reason: String },

    #[error("index unavailable: {reason}")]
    IndexUnavailable { reason: String },

    #[error("invalid request field '{field}': {reason}")]
    InvalidRequest { field: String, reason: String },

    #[error("model '{model}' produced a non-finite score for document {doc}")]
    NumericalFault { model: String, doc: DocId },

    #[error("illegal lifecycle transition {from} -> {to}")]
    IllegalTransition { from: &'static str, to: &'static str },

    #[error("request cancelled")]
    Cancelled,
}

/// The structured kind of a [`RankError`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    UnknownModel,
    InvalidParameter,
    MalformedQuery,
    IndexUnavailable,
    InvalidRequest,
    NumericalFault,
    Internal,
    Cancelled,
}

impl RankError {
    pub(crate) fn invalid_param(
        model: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        RankError::InvalidParameter {
            model: model.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_request(field: impl Into<String>, reason: impl Into<String>) -> Self {
        RankError::InvalidRequest {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(position: usize, reason: impl Into<String>) -> Self {
        RankError::MalformedQuery {
            position,
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RankError::UnknownModel { .. } => ErrorKind::UnknownModel,
            RankError::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            RankError::MalformedQuery { .. } => ErrorKind::MalformedQuery,
            RankError::IndexUnavailable { .. } => ErrorKind::IndexUnavailable,
            RankError::InvalidRequest { .. } => ErrorKind::InvalidRequest,
            RankError::NumericalFault { .. } => ErrorKind::NumericalFault,
            RankError::IllegalTransition { .. } => ErrorKind::Internal,
            RankError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// The request field the error points at, when there is one.
    pub fn field(&self) -> Option<&str> {
        match self {
            RankError::UnknownModel { .. } => Some("model"),
            RankError::InvalidParameter { field, .. } => Some(field),
            RankError::MalformedQuery { .. } => Some("query"),
            RankError::InvalidRequest { field, .. } => Some(field),
            RankError::NumericalFault { .. }
            | RankError::IndexUnavailable { .. }
            | RankError::IllegalTransition { .. }
            | RankError::Cancelled => None,
        }
    }

    /// Whether the request was refused before any scoring work started.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::UnknownModel
                | ErrorKind::InvalidParameter
                | ErrorKind::MalformedQuery
                | ErrorKind::InvalidRequest
        )
    }
}

/// Snapshot build, load and save failures.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read or write snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("snapshot invariant violated: {0}")]
    Invariant(#[from] InvariantError),
}

impl From<SnapshotError> for RankError {
    fn from(err: SnapshotError) -> Self {
        RankError::IndexUnavailable {
            reason: err.to_string(),
        }
    }
}

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value '{field}': {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
