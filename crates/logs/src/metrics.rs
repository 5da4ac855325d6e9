//! Stream metrics — lock-free counters for one streaming session.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Per-session counters. All updates use `Relaxed`; these are observability
/// numbers, not synchronization.
#[derive(Debug, Default)]
pub struct StreamMetrics {
    frames_received: AtomicU64,
    bytes_received: AtomicU64,
    entries_delivered: AtomicU64,
    protocol_errors: AtomicU64,
    keep_alive_ticks: AtomicU64,
    keep_alive_failures: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreamMetricsSnapshot {
    pub frames_received: u64,
    pub bytes_received: u64,
    pub entries_delivered: u64,
    pub protocol_errors: u64,
    pub keep_alive_ticks: u64,
    pub keep_alive_failures: u64,
}

impl StreamMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_frame(&self, len: usize) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(len as u64, Ordering::Relaxed);
    }

    pub fn record_entry(&self) {
        self.entries_delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_protocol_error(&self) {
        self.protocol_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_keep_alive(&self, sent: bool) {
        self.keep_alive_ticks.fetch_add(1, Ordering::Relaxed);
        if !sent {
            self.keep_alive_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn keep_alive_ticks(&self) -> u64 {
        self.keep_alive_ticks.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StreamMetricsSnapshot {
        StreamMetricsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            entries_delivered: self.entries_delivered.load(Ordering::Relaxed),
            protocol_errors: self.protocol_errors.load(Ordering::Relaxed),
            keep_alive_ticks: self.keep_alive_ticks.load(Ordering::Relaxed),
            keep_alive_failures: self.keep_alive_failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_updates() {
        let metrics = StreamMetrics::new();
        metrics.record_frame(10);
        metrics.record_frame(5);
        metrics.record_entry();
        metrics.record_protocol_error();
        metrics.record_keep_alive(true);
        metrics.record_keep_alive(false);

        let snap = metrics.snapshot();
        assert_eq!(snap.frames_received, 2);
        assert_eq!(snap.bytes_received, 15);
        assert_eq!(snap.entries_delivered, 1);
        assert_eq!(snap.protocol_errors, 1);
        assert_eq!(snap.keep_alive_ticks, 2);
        assert_eq!(snap.keep_alive_failures, 1);
    }

    #[test]
    fn test_snapshot_serializes() {
        let json = serde_json::to_string(&StreamMetrics::new().snapshot()).unwrap();
        assert!(json.contains("\"frames_received\":0"));
    }
}
