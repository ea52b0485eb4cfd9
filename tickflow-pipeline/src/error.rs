//! Pipeline error type.
//!
//! Only two failures ever reach the orchestrator: the output log cannot be
//! opened at startup, or the transport dies. Everything else is absorbed
//! where it happens and surfaces through the counters.

use thiserror::Error;

use tickflow_feed::FeedError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to open output log: {0}")]
    OpenLog(#[source] std::io::Error),
    #[error(transparent)]
    Feed(#[from] FeedError),
}
