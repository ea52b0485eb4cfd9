//! Streaming statistics over the ticker feed.
//!
//! The feed publishes far more often than the smoothing cadence we want, so
//! the EMAs here are gated on event time: a sample only advances the average
//! when at least one interval has elapsed since the last accepted sample.
//! Time is supplied by the caller (the record's event time), which keeps the
//! statistics deterministic under replay.

mod ema;

pub use ema::{EmaEngine, GatedEma};
