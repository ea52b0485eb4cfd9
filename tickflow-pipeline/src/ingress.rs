//! Ingress stage: one frame in, one record handed to compute.

use std::sync::Arc;

use tracing::debug;

use tickflow_core::TickerRecord;
use tickflow_feed::{decode_frame, DecodeError};
use tickflow_transport::SpscRing;

use crate::counters::PipelineCounters;

/// Decodes frames on the feed task and pushes records into Ring-A.
///
/// Runs inline in the transport's read loop, so it must never block: the
/// only downstream action is a non-blocking push. When compute falls behind
/// and the ring fills, the newest frame is dropped and counted; records
/// already queued keep their place.
pub struct Ingress {
    ring: Arc<SpscRing<TickerRecord>>,
    counters: Arc<PipelineCounters>,
}

impl Ingress {
    pub fn new(ring: Arc<SpscRing<TickerRecord>>, counters: Arc<PipelineCounters>) -> Self {
        Ingress { ring, counters }
    }

    /// Handle one text frame from the feed.
    pub fn on_frame(&self, text: &str) {
        self.counters.record_frame();

        let record = match decode_frame(text) {
            Ok(record) => record,
            Err(DecodeError::NotTicker) => {
                self.counters.record_non_ticker();
                return;
            }
            Err(DecodeError::Malformed(err)) => {
                debug!(%err, "dropping malformed frame");
                self.counters.record_decode_error();
                return;
            }
        };

        if self.ring.try_push(record).is_err() {
            self.counters.record_ingress_drop();
        }
    }
}
