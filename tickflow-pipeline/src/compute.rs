//! Compute stage: EMA enrichment between the two rings.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::trace;

use tickflow_core::{EmaEngine, TickerRecord};
use tickflow_transport::SpscRing;

use crate::counters::PipelineCounters;

/// Dedicated task that drains Ring-A, fills in the two EMA fields, and
/// forwards into Ring-B.
///
/// The EMA clock is the record's event time, not the wall clock, so a
/// replayed capture produces identical output. When Ring-B is full the
/// oldest pending row is evicted so the log keeps the most recent records;
/// this is the opposite policy from Ring-A and intentional.
pub struct Compute {
    ring_a: Arc<SpscRing<TickerRecord>>,
    ring_b: Arc<SpscRing<TickerRecord>>,
    emas: EmaEngine,
    counters: Arc<PipelineCounters>,
    stop: Arc<AtomicBool>,
}

impl Compute {
    pub fn new(
        ring_a: Arc<SpscRing<TickerRecord>>,
        ring_b: Arc<SpscRing<TickerRecord>>,
        emas: EmaEngine,
        counters: Arc<PipelineCounters>,
        stop: Arc<AtomicBool>,
    ) -> Self {
        Compute {
            ring_a,
            ring_b,
            emas,
            counters,
            stop,
        }
    }

    /// Run until stop is requested and Ring-A has been drained.
    pub async fn run(mut self) {
        loop {
            while let Some(mut record) = self.ring_a.try_pop() {
                self.enrich(&mut record);
                if self.ring_b.force_push(record).is_some() {
                    self.counters.record_persistence_drop();
                }
            }
            if self.stop.load(Ordering::Acquire) && self.ring_a.is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
    }

    fn enrich(&mut self, record: &mut TickerRecord) {
        record.price_ema = match record.price.parse::<f64>() {
            Ok(price) => self.emas.update_price(price, record.event_time),
            // Unparseable price: no sample, the record carries the current
            // average downstream.
            Err(_) => self.emas.price_or_zero(),
        };
        record.mid_price_ema = self.emas.update_mid_price(record.mid_price, record.event_time);

        trace!(
            product_id = %record.product_id,
            price = %record.price,
            price_ema = record.price_ema,
            mid_price_ema = record.mid_price_ema,
            "record enriched"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(price: &str, secs: i64) -> TickerRecord {
        TickerRecord {
            kind: "ticker".to_string(),
            product_id: "BTC-USD".to_string(),
            price: price.to_string(),
            event_time: Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
            ..Default::default()
        }
    }

    struct Fixture {
        ring_a: Arc<SpscRing<TickerRecord>>,
        ring_b: Arc<SpscRing<TickerRecord>>,
        counters: Arc<PipelineCounters>,
        stop: Arc<AtomicBool>,
    }

    fn fixture(slots_b: usize) -> (Fixture, Compute) {
        let ring_a = Arc::new(SpscRing::with_capacity(256));
        let ring_b = Arc::new(SpscRing::with_capacity(slots_b));
        let counters = Arc::new(PipelineCounters::new());
        let stop = Arc::new(AtomicBool::new(false));
        let compute = Compute::new(
            Arc::clone(&ring_a),
            Arc::clone(&ring_b),
            EmaEngine::from_interval_secs(5),
            Arc::clone(&counters),
            Arc::clone(&stop),
        );
        (
            Fixture {
                ring_a,
                ring_b,
                counters,
                stop,
            },
            compute,
        )
    }

    #[tokio::test]
    async fn test_enriches_and_forwards_in_order() {
        let (fx, compute) = fixture(256);
        fx.ring_a.try_push(record("100.0", 0)).unwrap();
        fx.ring_a.try_push(record("200.0", 6)).unwrap();
        fx.stop.store(true, Ordering::Release);
        compute.run().await;

        let first = fx.ring_b.try_pop().unwrap();
        let second = fx.ring_b.try_pop().unwrap();
        assert_eq!(first.price, "100.0");
        assert_eq!(first.price_ema, 100.0);
        // 6s later with a 5s interval: (1/3)*200 + (2/3)*100.
        assert!((second.price_ema - 400.0 / 3.0).abs() < 1e-9);
        assert!(fx.ring_b.is_empty());
    }

    #[tokio::test]
    async fn test_gate_holds_ema_between_close_samples() {
        let (fx, compute) = fixture(256);
        let mut early = record("200.0", 0);
        early.event_time = early.event_time + chrono::TimeDelta::milliseconds(100);
        fx.ring_a.try_push(record("100.0", 0)).unwrap();
        fx.ring_a.try_push(early).unwrap();
        fx.stop.store(true, Ordering::Release);
        compute.run().await;

        fx.ring_b.try_pop().unwrap();
        let second = fx.ring_b.try_pop().unwrap();
        assert_eq!(second.price_ema, 100.0);
    }

    #[tokio::test]
    async fn test_unparseable_price_still_flows() {
        let (fx, compute) = fixture(256);
        fx.ring_a.try_push(record("100.0", 0)).unwrap();
        fx.ring_a.try_push(record("n/a", 6)).unwrap();
        fx.stop.store(true, Ordering::Release);
        compute.run().await;

        fx.ring_b.try_pop().unwrap();
        let bad = fx.ring_b.try_pop().unwrap();
        // No sample applied; the record carries the standing average.
        assert_eq!(bad.price_ema, 100.0);
    }

    #[tokio::test]
    async fn test_mid_price_ema_updates_even_when_price_does_not() {
        let (fx, compute) = fixture(256);
        let mut r = record("n/a", 0);
        r.mid_price = 42.0;
        fx.ring_a.try_push(r).unwrap();
        fx.stop.store(true, Ordering::Release);
        compute.run().await;

        let out = fx.ring_b.try_pop().unwrap();
        assert_eq!(out.price_ema, 0.0);
        assert_eq!(out.mid_price_ema, 42.0);
    }

    #[tokio::test]
    async fn test_ring_b_overrun_keeps_newest_rows() {
        let (fx, compute) = fixture(8);
        for i in 0..20 {
            // All inside one gate interval; EMA values are irrelevant here.
            fx.ring_a.try_push(record(&format!("{i}.0"), 0)).unwrap();
        }
        fx.stop.store(true, Ordering::Release);
        compute.run().await;

        assert_eq!(fx.counters.persistence_drops(), 13);
        // Capacity 7: rows 13..=19 survive, in order.
        for i in 13..20 {
            assert_eq!(fx.ring_b.try_pop().unwrap().price, format!("{i}.0"));
        }
        assert!(fx.ring_b.is_empty());
    }
}
