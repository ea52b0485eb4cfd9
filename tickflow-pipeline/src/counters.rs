//! Pipeline counters.
//!
//! Steady-state errors and shed load never stop a stage; they only show up
//! here. One shared block, written with relaxed atomics off the hot path's
//! critical ordering and read as an advisory snapshot.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct PipelineCounters {
    frames: AtomicU64,
    decode_errors: AtomicU64,
    non_ticker: AtomicU64,
    ingress_drops: AtomicU64,
    persistence_drops: AtomicU64,
    records_written: AtomicU64,
    write_errors: AtomicU64,
}

impl PipelineCounters {
    pub fn new() -> Self {
        PipelineCounters::default()
    }

    pub fn record_frame(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_non_ticker(&self) {
        self.non_ticker.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ingress_drop(&self) {
        self.ingress_drops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_persistence_drop(&self) {
        self.persistence_drops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_written(&self) {
        self.records_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write_error(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn ingress_drops(&self) -> u64 {
        self.ingress_drops.load(Ordering::Relaxed)
    }

    pub fn persistence_drops(&self) -> u64 {
        self.persistence_drops.load(Ordering::Relaxed)
    }

    pub fn records_written(&self) -> u64 {
        self.records_written.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            frames: self.frames.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            non_ticker: self.non_ticker.load(Ordering::Relaxed),
            ingress_drops: self.ingress_drops.load(Ordering::Relaxed),
            persistence_drops: self.persistence_drops.load(Ordering::Relaxed),
            records_written: self.records_written.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of all counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CountersSnapshot {
    pub frames: u64,
    pub decode_errors: u64,
    pub non_ticker: u64,
    pub ingress_drops: u64,
    pub persistence_drops: u64,
    pub records_written: u64,
    pub write_errors: u64,
}
