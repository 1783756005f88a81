//! Instrumentation counters shared by the parse engine and the diagnostics
//! pipeline. Tests use them to observe whether work was recomputed or served
//! from a cache.
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct Stats {
    strict_parses: AtomicUsize,
    tolerant_parses: AtomicUsize,
    tolerant_reparses: AtomicUsize,
    diagnostic_computations: AtomicUsize,
    type_checks: AtomicUsize,
    stale_type_checks: AtomicUsize,
}

/// Point-in-time copy of [`Stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub strict_parses: usize,
    pub tolerant_parses: usize,
    pub tolerant_reparses: usize,
    pub diagnostic_computations: usize,
    pub type_checks: usize,
    pub stale_type_checks: usize,
}

impl Stats {
    pub fn record_strict_parse(&self) {
        self.strict_parses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tolerant_parse(&self) {
        self.tolerant_parses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tolerant_reparse(&self) {
        self.tolerant_reparses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_diagnostic_computation(&self) {
        self.diagnostic_computations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_type_check(&self) {
        self.type_checks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_type_check(&self) {
        self.stale_type_checks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            strict_parses: self.strict_parses.load(Ordering::Relaxed),
            tolerant_parses: self.tolerant_parses.load(Ordering::Relaxed),
            tolerant_reparses: self.tolerant_reparses.load(Ordering::Relaxed),
            diagnostic_computations: self.diagnostic_computations.load(Ordering::Relaxed),
            type_checks: self.type_checks.load(Ordering::Relaxed),
            stale_type_checks: self.stale_type_checks.load(Ordering::Relaxed),
        }
    }
}
