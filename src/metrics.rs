use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing document lifecycle activity.
#[derive(Default)]
pub struct LifecycleMetrics {
    uploaded: AtomicU64,
    processed: AtomicU64,
    deleted: AtomicU64,
    failed: AtomicU64,
}

impl LifecycleMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a stored upload.
    pub fn record_upload(&self) {
        self.uploaded.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a document transitioning to `PROCESSED`.
    pub fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a deleted document.
    pub fn record_delete(&self) {
        self.deleted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a handler invocation that ended in an error.
    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_uploaded: self.uploaded.load(Ordering::Relaxed),
            documents_processed: self.processed.load(Ordering::Relaxed),
            documents_deleted: self.deleted.load(Ordering::Relaxed),
            failed_requests: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of lifecycle counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Uploads stored since startup.
    pub documents_uploaded: u64,
    /// Documents processed since startup.
    pub documents_processed: u64,
    /// Documents deleted since startup.
    pub documents_deleted: u64,
    /// Handler invocations that failed since startup.
    pub failed_requests: u64,
}
