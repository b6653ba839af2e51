// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The request state machine.
//!
//! ```text
//! Received → Validated → Scored → Merged → Sorted → Truncated → Delivered
//!     │                    │         │        │          │
//!     └─→ Rejected         └─────────┴────────┴──────────┴─→ Cancelled
//! ```
//!
//! `Validated` may also go to `Cancelled`. `Rejected`, `Cancelled` and
//! `Delivered` are terminal.

use tracing::debug;

use crate::error::RankError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Validated,
    Scored,
    Merged,
    Sorted,
    Truncated,
    Delivered,
    Rejected,
    Cancelled,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Received => "received",
            Stage::Validated => "validated",
            Stage::Scored => "scored",
            Stage::Merged => "merged",
            Stage::Sorted => "sorted",
            Stage::Truncated => "truncated",
            Stage::Delivered => "delivered",
            Stage::Rejected => "rejected",
            Stage::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Delivered | Stage::Rejected | Stage::Cancelled)
    }

    fn can_advance_to(self, next: Stage) -> bool {
        use Stage::*;
        matches!(
            (self, next),
            (Received, Validated)
                | (Received, Rejected)
                | (Validated, Scored)
                | (Scored, Merged)
                | (Merged, Sorted)
                | (Sorted, Truncated)
                | (Truncated, Delivered)
                | (Validated | Scored | Merged | Sorted | Truncated, Cancelled)
        )
    }
}

/// Tracks one request through its stages.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    current: Stage,
    history: Vec<Stage>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            current: Stage::Received,
            history: vec![Stage::Received],
        }
    }

    pub fn current(&self) -> Stage {
        self.current
    }

    /// Every stage visited, in order.
    pub fn history(&self) -> &[Stage] {
        &self.history
    }

    pub fn advance(&mut self, next: Stage) -> Result<(), RankError> {
        if !self.current.can_advance_to(next) {
            return Err(RankError::IllegalTransition {
                from: self.current.name(),
                to: next.name(),
            });
        }
        debug!(from = self.current.name(), to = next.name(), "request stage");
        self.current = next;
        self.history.push(next);
        Ok(())
    }
}
