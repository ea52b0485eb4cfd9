//! Stage scheduling hooks.
//!
//! Thread naming, priority elevation, core pinning, and NUMA placement are
//! performance-advisory: the pipeline is correct without them, and not every
//! platform (or container) grants them. They hang off a capability trait so
//! a deployment that wants them supplies its own implementation; the default
//! leaves scheduling entirely to the OS.

use tracing::debug;

/// Capability hook invoked from inside each stage task before its loop
/// starts. Implementations may rename, pin, or re-prioritize the calling
/// thread. Must not panic; a hook that cannot apply its tuning should
/// degrade to a no-op.
pub trait StageTuner: Send + Sync {
    fn tune(&self, stage: &str);
}

/// Default tuner: logs the stage coming up and changes nothing.
#[derive(Debug, Default)]
pub struct DefaultTuner;

impl StageTuner for DefaultTuner {
    fn tune(&self, stage: &str) {
        debug!(stage, "stage task started");
    }
}
