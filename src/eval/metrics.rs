// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Effectiveness metrics over one ranking and its judgments.
//!
//! Rankings are document keys in rank order. A key is relevant when its grade
//! is `> 0`; unjudged keys are not relevant. Every function returns 0 rather
//! than NaN when a denominator would be 0.
//!
//! | Metric        | Definition                                               |
//! |---------------|----------------------------------------------------------|
//! | `precision@k` | relevant in top k / k                                    |
//! | `recall@k`    | relevant in top k / relevant judged                      |
//! | `f1@k`        | harmonic mean of the two                                 |
//! | `map`         | Σ precision@i over relevant ranks i / relevant judged    |
//! | `mrr`         | 1 / rank of the first relevant document                  |
//! | `ndcg@k`      | DCG@k / ideal DCG@k, gain `2^rel - 1`, discount `log2(i + 1)` |
//!
//! nDCG gains are capped at grade [`MAX_GAIN_GRADE`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Graded relevance judgments for one topic: document key → grade.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Judgments {
    grades: BTreeMap<String, u32>,
}

impl Judgments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, grade: u32) {
        self.grades.insert(key.into(), grade);
    }

    /// Grade of `key`; 0 when unjudged.
    pub fn grade(&self, key: &str) -> u32 {
        self.grades.get(key).copied().unwrap_or(0)
    }

    pub fn is_relevant(&self, key: &str) -> bool {
        self.grade(key) > 0
    }

    pub fn num_relevant(&self) -> usize {
        self.grades.values().filter(|&&g| g > 0).count()
    }

    pub fn len(&self) -> usize {
        self.grades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grades.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, u32)> for Judgments {
    fn from_iter<I: IntoIterator<Item = (K, u32)>>(iter: I) -> Self {
        Self {
            grades: iter.into_iter().map(|(k, g)| (k.into(), g)).collect(),
        }
    }
}

fn relevant_in_top<S: AsRef<str>>(ranking: &[S], judgments: &Judgments, k: usize) -> usize {
    ranking
        .iter()
        .take(k)
        .filter(|key| judgments.is_relevant(key.as_ref()))
        .count()
}

/// A ranking shorter than `k` counts as padded with non-relevant documents.
pub fn precision_at_k<S: AsRef<str>>(ranking: &[S], judgments: &Judgments, k: usize) -> f64 {
    if k == 0 {
        return 0.0;
    }
    relevant_in_top(ranking, judgments, k) as f64 / k as f64
}

pub fn recall_at_k<S: AsRef<str>>(ranking: &[S], judgments: &Judgments, k: usize) -> f64 {
    let total = judgments.num_relevant();
    if total == 0 {
        return 0.0;
    }
    relevant_in_top(ranking, judgments, k) as f64 / total as f64
}

pub fn f1_at_k<S: AsRef<str>>(ranking: &[S], judgments: &Judgments, k: usize) -> f64 {
    let p = precision_at_k(ranking, judgments, k);
    let r = recall_at_k(ranking, judgments, k);
    if p + r == 0.0 {
        0.0
    } else {
        2.0 * p * r / (p + r)
    }
}

pub fn average_precision<S: AsRef<str>>(ranking: &[S], judgments: &Judgments) -> f64 {
    let total = judgments.num_relevant();
    if total == 0 {
        return 0.0;
    }
    let mut hits = 0usize;
    let mut sum = 0.0;
    for (i, key) in ranking.iter().enumerate() {
        if judgments.is_relevant(key.as_ref()) {
            hits += 1;
            sum += hits as f64 / (i + 1) as f64;
        }
    }
    sum / total as f64
}

pub fn reciprocal_rank<S: AsRef<str>>(ranking: &[S], judgments: &Judgments) -> f64 {
    ranking
        .iter()
        .position(|key| judgments.is_relevant(key.as_ref()))
        .map_or(0.0, |i| 1.0 / (i + 1) as f64)
}

/// Grades above this share its gain.
pub const MAX_GAIN_GRADE: u32 = 64;

fn dcg(grades: impl Iterator<Item = u32>) -> f64 {
    grades
        .enumerate()
        .map(|(i, rel)| {
            let gain = 2f64.powf(f64::from(rel.min(MAX_GAIN_GRADE))) - 1.0;
            gain / ((i + 2) as f64).log2()
        })
        .sum()
}

/// The ideal ordering is every judged grade, best first.
pub fn ndcg_at_k<S: AsRef<str>>(ranking: &[S], judgments: &Judgments, k: usize) -> f64 {
    let mut ideal: Vec<u32> = judgments.grades.values().copied().filter(|&g| g > 0).collect();
    ideal.sort_unstable_by(|a, b| b.cmp(a));
    let ideal_dcg = dcg(ideal.into_iter().take(k));
    if ideal_dcg == 0.0 {
        return 0.0;
    }
    dcg(ranking.iter().take(k).map(|key| judgments.grade(key.as_ref()))) / ideal_dcg
}

// =============================================================================
// METRIC NAMES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Metric {
    Precision(usize),
    Recall(usize),
    F1(usize),
    AveragePrecision,
    ReciprocalRank,
    Ndcg(usize),
}

impl Metric {
    pub fn compute<S: AsRef<str>>(self, ranking: &[S], judgments: &Judgments) -> f64 {
        match self {
            Metric::Precision(k) => precision_at_k(ranking, judgments, k),
            Metric::Recall(k) => recall_at_k(ranking, judgments, k),
            Metric::F1(k) => f1_at_k(ranking, judgments, k),
            Metric::AveragePrecision => average_precision(ranking, judgments),
            Metric::ReciprocalRank => reciprocal_rank(ranking, judgments),
            Metric::Ndcg(k) => ndcg_at_k(ranking, judgments, k),
        }
    }

    /// The largest rank the metric looks at, if it has a cutoff.
    pub fn cutoff(self) -> Option<usize> {
        match self {
            Metric::Precision(k) | Metric::Recall(k) | Metric::F1(k) | Metric::Ndcg(k) => Some(k),
            Metric::AveragePrecision | Metric::ReciprocalRank => None,
        }
    }
}

/// `ndcg@{3,5,10,20}`, `precision@{3,5,10}`, `recall@{3,5,10}`.
pub fn default_metrics() -> Vec<Metric> {
    let mut metrics: Vec<Metric> = [3, 5, 10, 20].into_iter().map(Metric::Ndcg).collect();
    metrics.extend([3, 5, 10].into_iter().map(Metric::Precision));
    metrics.extend([3, 5, 10].into_iter().map(Metric::Recall));
    metrics
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Precision(k) => write!(f, "precision@{}", k),
            Metric::Recall(k) => write!(f, "recall@{}", k),
            Metric::F1(k) => write!(f, "f1@{}", k),
            Metric::AveragePrecision => f.write_str("map"),
            Metric::ReciprocalRank => f.write_str("mrr"),
            Metric::Ndcg(k) => write!(f, "ndcg@{}", k),
        }
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        let (name, k) = match s.split_once('@') {
            Some((name, k)) => {
                let k: usize = k
                    .parse()
                    .map_err(|_| format!("invalid cutoff in metric '{}'", s))?;
                if k == 0 {
                    return Err(format!("cutoff of metric '{}' must be >= 1", s));
                }
                (name, Some(k))
            }
            None => (s.as_str(), None),
        };
        let metric = match (name, k) {
            ("precision" | "p", Some(k)) => Metric::Precision(k),
            ("recall" | "r", Some(k)) => Metric::Recall(k),
            ("f1", Some(k)) => Metric::F1(k),
            ("ndcg", Some(k)) => Metric::Ndcg(k),
            ("map" | "ap", None) => Metric::AveragePrecision,
            ("mrr" | "rr", None) => Metric::ReciprocalRank,
            ("precision" | "p" | "recall" | "r" | "f1" | "ndcg", None) => {
                return Err(format!("metric '{}' needs a cutoff, e.g. '{}@10'", name, name))
            }
            _ => return Err(format!("unknown metric '{}'", s)),
        };
        Ok(metric)
    }
}

impl TryFrom<String> for Metric {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Metric> for String {
    fn from(metric: Metric) -> Self {
        metric.to_string()
    }
}
