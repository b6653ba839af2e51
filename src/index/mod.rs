// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The index store: immutable snapshots and how they get built and published.
//!
//! - [`IndexBuilder`] turns tokenized documents into a validated snapshot
//! - [`IndexSnapshot`] is the read-only view every model scores against
//! - [`SnapshotHandle`] publishes new snapshots without disturbing readers

mod builder;
mod handle;
pub mod pagerank;
mod snapshot;
pub mod validate;

pub use builder::IndexBuilder;
pub use handle::SnapshotHandle;
pub use pagerank::PageRankConfig;
pub use snapshot::{Document, IndexSnapshot, SNAPSHOT_VERSION};
pub use validate::InvariantError;
