// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Evaluation adapter: effectiveness metrics over delivered rankings.
//!
//! The metric functions are pure and take document keys in rank order, the
//! shape [`RankingResult::keys`](crate::types::RankingResult::keys) returns.
//! [`evaluate_run`] drives a whole test collection (TREC qrels plus a topic
//! file) through a [`Ranker`](crate::rank::Ranker).

mod metrics;
mod qrels;
mod run;

pub use metrics::{
    average_precision, default_metrics, f1_at_k, ndcg_at_k, precision_at_k, recall_at_k,
    reciprocal_rank, Judgments, Metric,
};
pub use qrels::{load_qrels, load_topics, parse_qrels, parse_topics, EvalInputError, Qrels, Topic};
pub use run::{evaluate_run, evaluate_run_with_progress, EvaluationReport, TopicEvaluation, DEFAULT_DEPTH};
