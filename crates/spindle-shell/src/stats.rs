//! Request counters with snapshot-and-reset read semantics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for dispatched shell requests.
///
/// Increments happen on the dispatch path, reads through
/// [`RequestCounters::take`]; both are lock-free, so concurrent increments
/// are never lost to a snapshot.
#[derive(Debug, Default)]
pub(crate) struct RequestCounters {
    query: AtomicU64,
    submit: AtomicU64,
}

impl RequestCounters {
    pub(crate) fn record_query(&self) {
        self.query.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_submit(&self) {
        self.submit.fetch_add(1, Ordering::Relaxed);
    }

    /// Atomically exchanges both counters with zero, returning the counts
    /// accumulated since the previous call as `(query, submit)`.
    pub(crate) fn take(&self) -> (u64, u64) {
        (
            self.query.swap(0, Ordering::Relaxed),
            self.submit.swap(0, Ordering::Relaxed),
        )
    }
}

/// One reading of the node's request-volume statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Query requests dispatched since the previous snapshot.
    pub query_requests: u64,
    /// Submit requests dispatched since the previous snapshot.
    pub submit_requests: u64,
    /// Cumulative HTTP requests since node start; not reset by snapshots.
    pub http_requests: u64,
}
