//! Success/failure tallies for telemetry sends

use crate::telemetry::TelemetryKind;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use tracing::info;

#[derive(Debug, Default, Clone, Copy)]
struct Counts {
    success: [u64; 3],
    failed: [u64; 3],
}

/// Per-kind send outcomes for one ingestion run.
///
/// Shared between workers behind an `Arc`. The lock is only held for an
/// increment or a snapshot.
#[derive(Debug, Default)]
pub struct OutcomeCounters {
    counts: Mutex<Counts>,
}

impl OutcomeCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, kind: TelemetryKind) {
        self.lock().success[kind.index()] += 1;
    }

    pub fn record_failure(&self, kind: TelemetryKind) {
        self.lock().failed[kind.index()] += 1;
    }

    /// Point-in-time snapshot of all counters
    pub fn summarize(&self) -> SendSummary {
        let counts = *self.lock();
        let outcome = |kind: TelemetryKind| KindOutcome {
            success: counts.success[kind.index()],
            failed: counts.failed[kind.index()],
        };

        SendSummary {
            traces: outcome(TelemetryKind::Traces),
            logs: outcome(TelemetryKind::Logs),
            metrics: outcome(TelemetryKind::Metrics),
            captured_at: Utc::now(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Counts> {
        // Counters stay meaningful even if a holder panicked mid-increment
        self.counts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct KindOutcome {
    pub success: u64,
    pub failed: u64,
}

impl KindOutcome {
    pub fn attempts(&self) -> u64 {
        self.success + self.failed
    }
}

#[derive(Debug, Clone)]
pub struct SendSummary {
    pub traces: KindOutcome,
    pub logs: KindOutcome,
    pub metrics: KindOutcome,
    pub captured_at: DateTime<Utc>,
}

impl SendSummary {
    pub fn get(&self, kind: TelemetryKind) -> KindOutcome {
        match kind {
            TelemetryKind::Traces => self.traces,
            TelemetryKind::Logs => self.logs,
            TelemetryKind::Metrics => self.metrics,
        }
    }

    pub fn total_success(&self) -> u64 {
        self.traces.success + self.logs.success + self.metrics.success
    }

    pub fn total_failed(&self) -> u64 {
        self.traces.failed + self.logs.failed + self.metrics.failed
    }

    pub fn total_attempts(&self) -> u64 {
        self.total_success() + self.total_failed()
    }

    /// Emit the summary as structured log events, skipping idle kinds
    pub fn log(&self) {
        info!("=== Telemetry Send Summary ===");
        for kind in TelemetryKind::ALL {
            let outcome = self.get(kind);
            if outcome.attempts() > 0 {
                info!(kind = %kind, success = outcome.success, failed = outcome.failed, "{}", kind);
            }
        }
        info!(
            success = self.total_success(),
            failed = self.total_failed(),
            captured_at = %self.captured_at.to_rfc3339(),
            "Total"
        );
    }
}

impl fmt::Display for SendSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Telemetry Send Summary ===")?;
        for kind in TelemetryKind::ALL {
            let outcome = self.get(kind);
            if outcome.attempts() > 0 {
                writeln!(f, "{}: success={} failed={}", kind, outcome.success, outcome.failed)?;
            }
        }
        write!(
            f,
            "Total: success={} failed={}",
            self.total_success(),
            self.total_failed()
        )
    }
}
