// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Classical information-retrieval ranking over immutable index snapshots.
//!
//! Ten scoring models behind one capability trait, an orchestrator that
//! validates, scores, fuses, sorts and truncates, and an evaluation adapter
//! for TREC-style test collections.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │    index     │────▶│   scoring    │────▶│     rank     │
//! │ (builder,    │     │ (ModelSpec,  │     │ (Ranker,     │
//! │  snapshot,   │     │  10 models,  │     │  fusion,     │
//! │  handle)     │     │  ranking)    │     │  lifecycle)  │
//! └──────────────┘     └──────────────┘     └──────────────┘
//!        ▲                    ▲                    │
//!        │             ┌──────────────┐            ▼
//!        └─────────────│    query     │     ┌──────────────┐
//!                      │ (parser)     │     │     eval     │
//!                      └──────────────┘     │ (metrics)    │
//!                                           └──────────────┘
//! ```
//!
//! | Module      | Role                                                    |
//! |-------------|---------------------------------------------------------|
//! | `index`     | Build, validate, persist and publish snapshots          |
//! | `query`     | Parse text queries into weighted terms and a tree       |
//! | `scoring`   | The models and the total ranking order                  |
//! | `rank`      | Request validation, parallel runs, fusion, cancellation |
//! | `eval`      | Precision, recall, MAP, MRR, nDCG over qrels            |
//! | `config`    | TOML configuration with env overrides                   |
//! | `contracts` | Debug-build runtime checks                              |
//!
//! # Usage
//!
//! ```
//! use polyrank::index::IndexBuilder;
//! use polyrank::rank::{CancellationToken, ModelRequest, Ranker, RankingRequest};
//!
//! let mut builder = IndexBuilder::new();
//! builder.add_text("doc1", "cat dog").unwrap();
//! builder.add_text("doc2", "dog dog bird").unwrap();
//! builder.add_text("doc3", "cat bird bird").unwrap();
//! let ranker = Ranker::with_snapshot(builder.build().unwrap());
//!
//! let request = RankingRequest::new(ModelRequest::new("bm25"), "dog bird");
//! let response = ranker.execute(&request, &CancellationToken::new()).unwrap();
//! assert_eq!(response.result.keys(), vec!["doc2", "doc3", "doc1"]);
//! ```

pub mod config;
pub mod contracts;
pub mod error;
pub mod eval;
pub mod index;
pub mod logging;
pub mod query;
pub mod rank;
pub mod scoring;
pub mod testing;
pub mod types;
pub mod utils;

pub use config::EngineConfig;
pub use error::{ConfigError, ErrorKind, RankError, SnapshotError};
pub use index::{IndexBuilder, IndexSnapshot, SnapshotHandle};
pub use query::{parse_query, DefaultOperator, Query};
pub use rank::{CancellationToken, ModelRequest, Ranker, RankingRequest, RankingResponse};
pub use scoring::{ModelKind, ModelSpec, ScoringModel};
pub use types::{DocId, RankingResult, ScoredDocument};
