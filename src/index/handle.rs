// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Snapshot publication.
//!
//! Rebuilding never mutates a live snapshot: the builder produces a new one
//! and `publish` swaps the `Arc`. Requests hold the `Arc` they started with,
//! so a swap mid-request is invisible to them.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, RwLock};
use tracing::info;

use crate::error::RankError;
use crate::index::snapshot::IndexSnapshot;

#[derive(Debug, Default)]
pub struct SnapshotHandle {
    current: RwLock<Option<Arc<IndexSnapshot>>>,
    published: Mutex<bool>,
    ready: Condvar,
}

impl SnapshotHandle {
    /// A handle with nothing published yet.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: impl Into<Arc<IndexSnapshot>>) -> Self {
        let handle = Self::new();
        handle.publish(snapshot);
        handle
    }

    /// Swap in a new snapshot, returning the one it replaced.
    pub fn publish(&self, snapshot: impl Into<Arc<IndexSnapshot>>) -> Option<Arc<IndexSnapshot>> {
        let snapshot = snapshot.into();
        info!(
            fingerprint = %snapshot.fingerprint_hex(),
            docs = snapshot.num_docs(),
            "publishing snapshot"
        );
        let previous = self.current.write().replace(snapshot);
        let mut published = self.published.lock();
        *published = true;
        self.ready.notify_all();
        previous
    }

    /// The point-in-time snapshot, or `IndexUnavailable` before the first publish.
    pub fn current(&self) -> Result<Arc<IndexSnapshot>, RankError> {
        self.current
            .read()
            .clone()
            .ok_or_else(|| RankError::IndexUnavailable {
                reason: "no snapshot has been published".into(),
            })
    }

    pub fn is_ready(&self) -> bool {
        self.current.read().is_some()
    }

    /// Block until a snapshot is published or `timeout` elapses. A timeout
    /// past the clock's range waits without a deadline.
    pub fn wait_for_snapshot(&self, timeout: Duration) -> Result<Arc<IndexSnapshot>, RankError> {
        let deadline = Instant::now().checked_add(timeout);
        let mut published = self.published.lock();
        while !*published {
            match deadline {
                Some(deadline) => {
                    if self.ready.wait_until(&mut published, deadline).timed_out() {
                        break;
                    }
                }
                None => self.ready.wait(&mut published),
            }
        }
        drop(published);
        self.current().map_err(|_| RankError::IndexUnavailable {
            reason: format!("no snapshot published within {:?}", timeout),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::toy_snapshot;

    #[test]
    fn test_unavailable_before_publish() {
        let handle = SnapshotHandle::new();
        let err = handle.current().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IndexUnavailable);
    }

    #[test]
    fn test_publish_swaps_and_keeps_old_arc() {
        let handle = SnapshotHandle::with_snapshot(toy_snapshot());
        let held = handle.current().unwrap();
        let previous = handle.publish(toy_snapshot()).unwrap();
        assert!(Arc::ptr_eq(&held, &previous));
        assert!(!Arc::ptr_eq(&held, &handle.current().unwrap()));
    }

    #[test]
    fn test_wait_times_out() {
        let handle = SnapshotHandle::new();
        let err = handle
            .wait_for_snapshot(Duration::from_millis(10))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IndexUnavailable);
    }

    #[test]
    fn test_wait_wakes_on_publish() {
        let handle = Arc::new(SnapshotHandle::new());
        let publisher = Arc::clone(&handle);
        let thread = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            publisher.publish(toy_snapshot());
        });
        let snapshot = handle.wait_for_snapshot(Duration::from_secs(5)).unwrap();
        assert_eq!(snapshot.num_docs(), 3);
        thread.join().unwrap();
    }

    #[test]
    fn test_unbounded_wait() {
        let ready = SnapshotHandle::with_snapshot(toy_snapshot());
        assert!(ready.wait_for_snapshot(Duration::MAX).is_ok());

        let handle = Arc::new(SnapshotHandle::new());
        let publisher = Arc::clone(&handle);
        let thread = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            publisher.publish(toy_snapshot());
        });
        let snapshot = handle.wait_for_snapshot(Duration::MAX).unwrap();
        assert_eq!(snapshot.num_docs(), 3);
        thread.join().unwrap();
    }
}
