//! The tickflow pipeline.
//!
//! Three stages joined by two SPSC rings:
//!
//! ```text
//! frame ──► Ingress ──► Ring-A ──► Compute ──► Ring-B ──► Persistence ──► file
//! ```
//!
//! The ingress callback runs on the feed's task and never blocks: its only
//! downstream action is a non-blocking push. Compute is a dedicated task that
//! enriches records with the gated EMAs. Persistence runs on the blocking
//! pool and owns the only file handle. Overruns shed load instead of
//! blocking: Ring-A drops the newest frame, Ring-B drops the oldest pending
//! row; both are counted.

pub mod compute;
pub mod counters;
pub mod error;
pub mod ingress;
pub mod orchestrator;
pub mod persist;
pub mod tuning;

pub use compute::Compute;
pub use counters::{CountersSnapshot, PipelineCounters};
pub use error::PipelineError;
pub use ingress::Ingress;
pub use orchestrator::{PipelineConfig, ShutdownHandle, TickerPipeline};
pub use persist::{CsvSink, Persistence};
pub use tuning::{DefaultTuner, StageTuner};
