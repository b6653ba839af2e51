// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::RankError;

/// Cooperative cancellation for one request (or a batch sharing the token).
///
/// Cloning shares the flag. The orchestrator checks it at every stage
/// boundary and between runs; a cancelled request returns
/// [`RankError::Cancelled`] and nothing else.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// `Err(Cancelled)` once cancelled.
    #[inline]
    pub fn check(&self) -> Result<(), RankError> {
        if self.is_cancelled() {
            Err(RankError::Cancelled)
        } else {
            Ok(())
        }
    }
}
