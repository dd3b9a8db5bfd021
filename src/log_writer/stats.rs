//! Writer statistics
//!
//! Counters are bumped from producer threads and the writer thread without
//! taking the document lock.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Point-in-time view of a writer's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    /// Records accepted by `submit`
    pub submitted: u64,
    /// Records appended to the document
    pub written: u64,
    /// Records whose append failed
    pub failed: u64,
    /// Submissions refused because the log was closed
    pub rejected: u64,
    /// Bytes appended by records (header and tail excluded)
    pub bytes_written: u64,
    /// A write failed and the log stopped accepting records
    pub broken: bool,
}

impl WriterStats {
    /// Records accepted but not yet written or failed
    pub fn pending(&self) -> u64 {
        self.submitted.saturating_sub(self.written + self.failed)
    }

    /// Format size in human-readable format
    pub fn format_size(bytes: u64) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        const GB: u64 = MB * 1024;

        if bytes >= GB {
            format!("{:.2} GB", bytes as f64 / GB as f64)
        } else if bytes >= MB {
            format!("{:.2} MB", bytes as f64 / MB as f64)
        } else if bytes >= KB {
            format!("{:.2} KB", bytes as f64 / KB as f64)
        } else {
            format!("{} B", bytes)
        }
    }
}

/// Shared atomic counters behind [`WriterStats`]
#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    submitted: AtomicU64,
    written: AtomicU64,
    failed: AtomicU64,
    rejected: AtomicU64,
    bytes_written: AtomicU64,
    broken: AtomicBool,
}

impl StatsCounters {
    pub(crate) fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_written(&self, bytes: usize) {
        self.written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns `true` for the first rejection only
    pub(crate) fn record_rejected(&self) -> bool {
        self.rejected.fetch_add(1, Ordering::Relaxed) == 0
    }

    /// Returns `true` for the first failure only
    pub(crate) fn mark_broken(&self) -> bool {
        !self.broken.swap(true, Ordering::SeqCst)
    }

    pub(crate) fn is_broken(&self) -> bool {
        self.broken.load(Ordering::SeqCst)
    }

    pub(crate) fn snapshot(&self) -> WriterStats {
        WriterStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            written: self.written.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            broken: self.is_broken(),
        }
    }
}
