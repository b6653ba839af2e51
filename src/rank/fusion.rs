// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Combining the rankings of several runs into one.
//!
//! Each run arrives as a ranked list `(doc, score)` in the total ranking
//! order. A [`CombinationPolicy`] turns the lists into one fused score per
//! document; the orchestrator then sorts those with the same total order.
//!
//! | Policy            | Fused score of `d`                                        |
//! |-------------------|-----------------------------------------------------------|
//! | `score-sum`       | `Σ s_r(d)` (CombSUM)                                      |
//! | `normalized-sum`  | `Σ (s_r(d) - min_r) / (max_r - min_r)`                    |
//! | `reciprocal-rank` | `Σ 1 / (k + rank_r(d))`, rank 1-based                     |
//! | `borda`           | `Σ (n - rank_r(d))`, `n` = size of the union, 0 if absent |
//! | `markov-chain`    | stationary probability of the MC4 chain                   |
//!
//! A document absent from a run contributes nothing to the sums.
//!
//! The rank-based policies only look at positions, so the orchestrator cuts
//! every run to the request's fusion depth before handing it to them. The
//! summing policies always combine the full candidate lists.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::RankError;
use crate::scoring::DocScores;
use crate::types::DocId;

/// `k` of reciprocal rank fusion (Cormack et al.).
pub const DEFAULT_RRF_K: f64 = 60.0;

/// MC4 ergodicity mixing factor.
pub const MC4_ERGODIC: f64 = 0.15;
/// MC4 convergence threshold, per component.
pub const MC4_PRECISION: f64 = 1e-7;
pub const MC4_MAX_ITERATIONS: usize = 200;

/// A ranked run: `(doc, score)` best first.
pub type RankedRun = Vec<(DocId, f64)>;

/// How several runs become one.
///
/// Implementations must be deterministic in their input, and must not invent
/// documents that appear in no run.
pub trait CombinationPolicy: Send + Sync {
    fn name(&self) -> &'static str;
    fn combine(&self, runs: &[RankedRun]) -> DocScores;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Combination {
    ScoreSum,
    NormalizedSum,
    ReciprocalRank { k: f64 },
    Borda,
    MarkovChain,
}

impl Default for Combination {
    fn default() -> Self {
        Combination::ReciprocalRank { k: DEFAULT_RRF_K }
    }
}

impl Combination {
    pub const NAMES: [&'static str; 5] = [
        "score-sum",
        "normalized-sum",
        "reciprocal-rank",
        "borda",
        "markov-chain",
    ];

    /// Whether the policy reads run positions only. These fuse the first
    /// `fusion_depth` documents of every run.
    pub fn is_rank_based(&self) -> bool {
        matches!(
            self,
            Combination::ReciprocalRank { .. } | Combination::Borda | Combination::MarkovChain
        )
    }

    /// Parse a policy name, using `rrf_k` for reciprocal rank fusion.
    pub fn parse(name: &str, rrf_k: f64) -> Result<Self, RankError> {
        match name.parse::<Combination>()? {
            Combination::ReciprocalRank { .. } => Ok(Combination::ReciprocalRank { k: rrf_k }),
            other => Ok(other),
        }
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(CombinationPolicy::name(self))
    }
}

impl FromStr for Combination {
    type Err = RankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "score-sum" | "sum" | "combsum" => Ok(Combination::ScoreSum),
            "normalized-sum" => Ok(Combination::NormalizedSum),
            "reciprocal-rank" | "rrf" => Ok(Combination::ReciprocalRank { k: DEFAULT_RRF_K }),
            "borda" | "borda-count" => Ok(Combination::Borda),
            "markov-chain" | "mc4" => Ok(Combination::MarkovChain),
            other => Err(RankError::invalid_request(
                "combination",
                format!("unknown policy '{}' (expected one of {})", other, Self::NAMES.join(", ")),
            )),
        }
    }
}

impl CombinationPolicy for Combination {
    fn name(&self) -> &'static str {
        match self {
            Combination::ScoreSum => "score-sum",
            Combination::NormalizedSum => "normalized-sum",
            Combination::ReciprocalRank { .. } => "reciprocal-rank",
            Combination::Borda => "borda",
            Combination::MarkovChain => "markov-chain",
        }
    }

    fn combine(&self, runs: &[RankedRun]) -> DocScores {
        match *self {
            Combination::ScoreSum => score_sum(runs),
            Combination::NormalizedSum => normalized_sum(runs),
            Combination::ReciprocalRank { k } => reciprocal_rank(runs, k),
            Combination::Borda => borda(runs),
            Combination::MarkovChain => markov_chain(runs),
        }
    }
}

fn score_sum(runs: &[RankedRun]) -> DocScores {
    let mut fused = DocScores::new();
    for run in runs {
        for &(doc, score) in run {
            *fused.entry(doc).or_insert(0.0) += score;
        }
    }
    fused
}

/// Min-max normalized CombSUM. A run whose scores are all equal maps every
/// document to 1.
fn normalized_sum(runs: &[RankedRun]) -> DocScores {
    let mut fused = DocScores::new();
    for run in runs {
        let (min, max) = run
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, s)| (lo.min(s), hi.max(s)));
        let range = max - min;
        for &(doc, score) in run {
            let normalized = if range > 0.0 { (score - min) / range } else { 1.0 };
            *fused.entry(doc).or_insert(0.0) += normalized;
        }
    }
    fused
}

fn reciprocal_rank(runs: &[RankedRun], k: f64) -> DocScores {
    let mut fused = DocScores::new();
    for run in runs {
        for (rank, &(doc, _)) in run.iter().enumerate() {
            *fused.entry(doc).or_insert(0.0) += 1.0 / (k + rank as f64 + 1.0);
        }
    }
    fused
}

/// Every document of the union, ascending.
fn union(runs: &[RankedRun]) -> Vec<DocId> {
    let mut docs: Vec<DocId> = runs.iter().flatten().map(|&(d, _)| d).collect();
    docs.sort_unstable();
    docs.dedup();
    docs
}

fn borda(runs: &[RankedRun]) -> DocScores {
    let docs = union(runs);
    let n = docs.len() as f64;
    let mut fused: DocScores = docs.into_iter().map(|d| (d, 0.0)).collect();
    for run in runs {
        for (i, &(doc, _)) in run.iter().enumerate() {
            if let Some(points) = fused.get_mut(&doc) {
                *points += n - (i as f64 + 1.0);
            }
        }
    }
    fused
}

/// MC4 rank aggregation (Dwork et al.).
///
/// From state `i` the chain moves to `j` whenever `j` is not beaten by `i` in
/// a majority of the runs. The chain is made ergodic by mixing in a uniform
/// jump with probability [`MC4_ERGODIC`], then iterated from the uniform
/// distribution. Documents missing from a run share the position just past
/// that run's end.
///
/// The transition matrix is dense in the union, so the caller bounds the
/// union by cutting the runs first.
fn markov_chain(runs: &[RankedRun]) -> DocScores {
    let docs = union(runs);
    let n = docs.len();
    if n == 0 {
        return DocScores::new();
    }
    let slot: BTreeMap<DocId, usize> = docs.iter().enumerate().map(|(i, &d)| (d, i)).collect();

    // positions[run][doc], 1-based
    let positions: Vec<Vec<usize>> = runs
        .iter()
        .map(|run| {
            let mut pos = vec![run.len() + 1; n];
            for (rank, (doc, _)) in run.iter().enumerate() {
                pos[slot[doc]] = rank + 1;
            }
            pos
        })
        .collect();
    let half = runs.len() as f64 / 2.0;

    let nf = n as f64;
    // row-major, transition[i * n + j]
    let mut transition = vec![0.0; n * n];
    for (i, row) in transition.chunks_mut(n).enumerate() {
        let mut off_diagonal = 0.0;
        for j in (0..n).filter(|&j| j != i) {
            let wins = positions.iter().filter(|p| p[i] < p[j]).count() as f64;
            if wins <= half {
                row[j] = 1.0 / nf;
                off_diagonal += 1.0 / nf;
            }
        }
        row[i] = 1.0 - off_diagonal;
        for p in row.iter_mut() {
            *p = *p * (1.0 - MC4_ERGODIC) + MC4_ERGODIC / nf;
        }
    }

    let mut state = vec![1.0 / nf; n];
    for _ in 0..MC4_MAX_ITERATIONS {
        let mut next = vec![0.0; n];
        for (weight, row) in state.iter().zip(transition.chunks(n)) {
            for (cell, p) in next.iter_mut().zip(row) {
                *cell += weight * p;
            }
        }
        let converged = next
            .iter()
            .zip(&state)
            .all(|(a, b)| (a - b).abs() < MC4_PRECISION);
        state = next;
        if converged {
            break;
        }
    }

    docs.into_iter().zip(state).collect()
}
