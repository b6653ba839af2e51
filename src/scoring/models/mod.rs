// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The retrieval models, one file per family.

mod belief;
mod bm25;
mod boolean;
mod dfr;
mod extended_boolean;
mod gvsm;
mod pagerank_bm25;
mod probabilistic;
pub(crate) mod vector;

pub use belief::{BeliefCombinator, BeliefNetwork, MaxBelief, NoisyOr, TermBelief, WeightedSum};
pub use bm25::Bm25;
pub use boolean::BooleanModel;
pub use dfr::{dfree_term, pl2_term, Dfree, Pl2};
pub use extended_boolean::ExtendedBoolean;
pub use gvsm::{Correlation, Gvsm};
pub use pagerank_bm25::PagerankBm25;
pub use probabilistic::{Probabilistic, MAX_ITERATIONS};
pub use vector::{VectorSpace, Weighting};
