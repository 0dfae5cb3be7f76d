//! Service counters
//!
//! Counters only, monotonic, reset on process start. Relaxed atomics;
//! readers may observe counters slightly out of step with each other.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct MetricsRegistry {
    queries_executed: AtomicU64,
    queries_rejected: AtomicU64,
    queries_cancelled: AtomicU64,
    queries_failed: AtomicU64,
    chapters_submitted: AtomicU64,
    chapters_rejected: AtomicU64,
    http_requests: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_queries_executed(&self) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries_rejected(&self) {
        self.queries_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries_cancelled(&self) {
        self.queries_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries_failed(&self) {
        self.queries_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_chapters_submitted(&self) {
        self.chapters_submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_chapters_rejected(&self) {
        self.chapters_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_http_requests(&self) {
        self.http_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all counters as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            queries_rejected: self.queries_rejected.load(Ordering::Relaxed),
            queries_cancelled: self.queries_cancelled.load(Ordering::Relaxed),
            queries_failed: self.queries_failed.load(Ordering::Relaxed),
            chapters_submitted: self.chapters_submitted.load(Ordering::Relaxed),
            chapters_rejected: self.chapters_rejected.load(Ordering::Relaxed),
            http_requests: self.http_requests.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of all counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub queries_executed: u64,
    pub queries_rejected: u64,
    pub queries_cancelled: u64,
    pub queries_failed: u64,
    pub chapters_submitted: u64,
    pub chapters_rejected: u64,
    pub http_requests: u64,
}
