// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Rank every topic of a test collection and score the rankings.

use std::collections::BTreeMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::RankError;
use crate::eval::{Metric, Qrels, Topic};
use crate::rank::{CancellationToken, QueryInput, Ranker, RankingRequest};

/// Ranking depth when the template request leaves `top_k` unset.
pub const DEFAULT_DEPTH: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicEvaluation {
    pub topic: String,
    pub retrieved: usize,
    pub values: BTreeMap<Metric, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub snapshot_fingerprint: String,
    pub topics: Vec<TopicEvaluation>,
    /// Mean of each metric over the evaluated topics.
    pub means: BTreeMap<Metric, f64>,
    /// Topics without judgments; they do not count towards the means.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unjudged: Vec<String>,
}

impl EvaluationReport {
    pub fn mean(&self, metric: Metric) -> Option<f64> {
        self.means.get(&metric).copied()
    }
}

/// [`evaluate_run_with_progress`] without a progress callback.
pub fn evaluate_run(
    ranker: &Ranker,
    topics: &[Topic],
    qrels: &Qrels,
    template: &RankingRequest,
    metrics: &[Metric],
    token: &CancellationToken,
) -> Result<EvaluationReport, RankError> {
    evaluate_run_with_progress(ranker, topics, qrels, template, metrics, token, &|_| {})
}

/// Rank each judged topic with `template`, its query replaced by the topic's,
/// and compute `metrics` on the delivered keys.
///
/// Topics are independent and run in parallel. The first failing topic fails
/// the whole run. `progress` is called once per finished topic.
#[instrument(skip_all, fields(topics = topics.len(), metrics = metrics.len()))]
pub fn evaluate_run_with_progress(
    ranker: &Ranker,
    topics: &[Topic],
    qrels: &Qrels,
    template: &RankingRequest,
    metrics: &[Metric],
    token: &CancellationToken,
    progress: &(dyn Fn(&str) + Sync),
) -> Result<EvaluationReport, RankError> {
    let (judged, unjudged): (Vec<&Topic>, Vec<&Topic>) =
        topics.iter().partition(|t| qrels.contains_key(&t.id));
    let depth = template.top_k.unwrap_or(DEFAULT_DEPTH);

    let evaluate = |topic: &&Topic| -> Result<(TopicEvaluation, String), RankError> {
        let request = RankingRequest {
            query: QueryInput::Text(topic.query.clone()),
            top_k: Some(depth),
            ..template.clone()
        };
        let response = ranker.execute(&request, token)?;
        let keys = response.result.keys();
        let judgments = &qrels[&topic.id];
        let values = metrics
            .iter()
            .map(|&metric| (metric, metric.compute(&keys, judgments)))
            .collect();
        progress(&topic.id);
        Ok((
            TopicEvaluation {
                topic: topic.id.clone(),
                retrieved: keys.len(),
                values,
            },
            response.snapshot_fingerprint,
        ))
    };

    #[cfg(feature = "parallel")]
    let evaluated: Vec<_> = judged.par_iter().map(evaluate).collect::<Result<_, _>>()?;
    #[cfg(not(feature = "parallel"))]
    let evaluated: Vec<_> = judged.iter().map(evaluate).collect::<Result<_, _>>()?;

    let snapshot_fingerprint = match evaluated.first() {
        Some((_, fingerprint)) => fingerprint.clone(),
        None => ranker.handle().current()?.fingerprint_hex(),
    };
    let topics: Vec<TopicEvaluation> = evaluated.into_iter().map(|(t, _)| t).collect();
    let means = metrics
        .iter()
        .map(|&metric| {
            let sum: f64 = topics.iter().map(|t| t.values[&metric]).sum();
            let mean = if topics.is_empty() {
                0.0
            } else {
                sum / topics.len() as f64
            };
            (metric, mean)
        })
        .collect();

    info!(
        evaluated = topics.len(),
        unjudged = unjudged.len(),
        "evaluation finished"
    );
    Ok(EvaluationReport {
        snapshot_fingerprint,
        topics,
        means,
        unjudged: unjudged.into_iter().map(|t| t.id.clone()).collect(),
    })
}
