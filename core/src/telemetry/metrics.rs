use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for the polling loop and command dispatch.
#[derive(Debug, Default)]
pub struct MetricsRecorder {
    polls_issued: AtomicU64,
    polls_skipped: AtomicU64,
    polls_failed: AtomicU64,
    commands_sent: AtomicU64,
    commands_failed: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub polls_issued: u64,
    pub polls_skipped: u64,
    pub polls_failed: u64,
    pub commands_sent: u64,
    pub commands_failed: u64,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_poll_issued(&self) {
        self.polls_issued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_poll_skipped(&self) {
        self.polls_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_poll_failed(&self) {
        self.polls_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_command_sent(&self) {
        self.commands_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_command_failed(&self) {
        self.commands_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            polls_issued: self.polls_issued.load(Ordering::Relaxed),
            polls_skipped: self.polls_skipped.load(Ordering::Relaxed),
            polls_failed: self.polls_failed.load(Ordering::Relaxed),
            commands_sent: self.commands_sent.load(Ordering::Relaxed),
            commands_failed: self.commands_failed.load(Ordering::Relaxed),
        }
    }
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "polls {} (skipped {}, failed {}) | commands {} (failed {})",
            self.polls_issued,
            self.polls_skipped,
            self.polls_failed,
            self.commands_sent,
            self.commands_failed
        )
    }
}
