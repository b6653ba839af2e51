// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! PageRank over the document link graph, stored as static priors.
//!
//! Power iteration with uniform teleportation. Dangling nodes (no out-links)
//! spread their mass uniformly. The result is scaled by its maximum so every
//! prior lands in (0, 1], which is the range the snapshot validates.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageRankConfig {
    pub damping: f64,
    pub max_iterations: usize,
    /// Stop once the L1 change between iterations drops below this.
    pub tolerance: f64,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            max_iterations: 100,
            tolerance: 1e-9,
        }
    }
}

/// Max-normalized PageRank for `num_nodes` nodes and directed `edges`.
///
/// Self-loops and duplicate edges count like any other edge.
pub fn pagerank(num_nodes: usize, edges: &[(usize, usize)], config: &PageRankConfig) -> Vec<f64> {
    if num_nodes == 0 {
        return Vec::new();
    }
    let n = num_nodes as f64;
    let mut out_degree = vec![0usize; num_nodes];
    let mut incoming: Vec<Vec<usize>> = vec![Vec::new(); num_nodes];
    for &(from, to) in edges {
        if from < num_nodes && to < num_nodes {
            out_degree[from] += 1;
            incoming[to].push(from);
        }
    }

    let mut rank = vec![1.0 / n; num_nodes];
    for _ in 0..config.max_iterations {
        let dangling: f64 = rank
            .iter()
            .zip(&out_degree)
            .filter(|&(_, &deg)| deg == 0)
            .map(|(r, _)| r)
            .sum();
        let base = (1.0 - config.damping) / n + config.damping * dangling / n;
        let next: Vec<f64> = incoming
            .iter()
            .map(|sources| {
                let flow: f64 = sources
                    .iter()
                    .map(|&src| rank[src] / out_degree[src] as f64)
                    .sum();
                base + config.damping * flow
            })
            .collect();
        let delta: f64 = next.iter().zip(&rank).map(|(a, b)| (a - b).abs()).sum();
        rank = next;
        if delta < config.tolerance {
            break;
        }
    }

    let max = rank.iter().copied().fold(0.0_f64, f64::max);
    if max > 0.0 {
        for r in &mut rank {
            *r /= max;
        }
    }
    rank
}
