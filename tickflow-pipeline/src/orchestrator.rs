//! Pipeline lifecycle.
//!
//! Bring-up is leaves-first: rings, then the sink (which must be ready
//! before any frame can arrive), then the persistence and compute tasks,
//! and only then the feed subscription. Teardown is the reverse and
//! cooperative: stop the frame source, let compute drain Ring-A, let
//! persistence drain Ring-B, each join bounded by a timeout after which
//! in-flight records are abandoned.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{error, info, warn};

use tickflow_core::EmaEngine;
use tickflow_feed::{FeedClient, FeedConfig, FeedSession};
use tickflow_transport::SpscRing;

use crate::compute::Compute;
use crate::counters::PipelineCounters;
use crate::error::PipelineError;
use crate::ingress::Ingress;
use crate::persist::{CsvSink, Persistence};
use crate::tuning::{DefaultTuner, StageTuner};

/// Construction parameters for one pipeline instance.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub product_id: String,
    pub output_path: PathBuf,
    pub ws_url: String,
    /// Slots per ring; power of two, usable capacity is one less.
    pub ring_slots: usize,
    pub ema_interval_secs: u32,
    pub flush_interval: Duration,
    pub idle_sleep: Duration,
    pub join_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            product_id: "BTC-USD".to_string(),
            output_path: PathBuf::from("ticker_data.csv"),
            ws_url: tickflow_feed::COINBASE_WS_URL.to_string(),
            ring_slots: 8192,
            ema_interval_secs: 5,
            flush_interval: Duration::from_millis(10),
            idle_sleep: Duration::from_micros(200),
            join_timeout: Duration::from_secs(5),
        }
    }
}

/// Requests cooperative shutdown of a running pipeline. Cloneable; the
/// signal is level-triggered and idempotent.
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    fn new() -> Self {
        let (tx, _) = watch::channel(false);
        ShutdownHandle { tx: Arc::new(tx) }
    }

    pub fn request(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_requested(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// One product, one feed session, one output log.
pub struct TickerPipeline {
    config: PipelineConfig,
    counters: Arc<PipelineCounters>,
    shutdown: ShutdownHandle,
    tuner: Arc<dyn StageTuner>,
}

impl TickerPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        TickerPipeline {
            config,
            counters: Arc::new(PipelineCounters::new()),
            shutdown: ShutdownHandle::new(),
            tuner: Arc::new(DefaultTuner),
        }
    }

    /// Replace the default no-op scheduling hooks.
    pub fn with_tuner(mut self, tuner: Arc<dyn StageTuner>) -> Self {
        self.tuner = tuner;
        self
    }

    pub fn counters(&self) -> Arc<PipelineCounters> {
        Arc::clone(&self.counters)
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Run the pipeline until the feed ends, the transport fails, or
    /// shutdown is requested.
    pub async fn run(&self) -> Result<(), PipelineError> {
        let ring_a: Arc<SpscRing<_>> = Arc::new(SpscRing::with_capacity(self.config.ring_slots));
        let ring_b: Arc<SpscRing<_>> = Arc::new(SpscRing::with_capacity(self.config.ring_slots));

        // The sink must be ready before any frame can arrive; an unopenable
        // log aborts startup.
        let sink = CsvSink::open(&self.config.output_path, self.config.flush_interval)
            .map_err(PipelineError::OpenLog)?;
        info!(path = %self.config.output_path.display(), "output log ready");

        let compute_stop = Arc::new(AtomicBool::new(false));
        let persist_stop = Arc::new(AtomicBool::new(false));

        let persistence = Persistence::new(
            Arc::clone(&ring_b),
            sink,
            Arc::clone(&self.counters),
            Arc::clone(&persist_stop),
            self.config.idle_sleep,
        );
        let tuner = Arc::clone(&self.tuner);
        let persist_task = tokio::task::spawn_blocking(move || {
            tuner.tune("persistence");
            persistence.run();
        });

        let compute = Compute::new(
            Arc::clone(&ring_a),
            Arc::clone(&ring_b),
            EmaEngine::from_interval_secs(self.config.ema_interval_secs),
            Arc::clone(&self.counters),
            Arc::clone(&compute_stop),
        );
        let tuner = Arc::clone(&self.tuner);
        let compute_task = tokio::spawn(async move {
            tuner.tune("compute");
            compute.run().await;
        });

        // Transport comes up last; from here frames have somewhere to go.
        let client = FeedClient::new(FeedConfig {
            ws_url: self.config.ws_url.clone(),
            product_id: self.config.product_id.clone(),
        });
        info!(
            product_id = %client.config().product_id,
            url = %client.config().ws_url,
            "feed configured"
        );
        let ingress = Ingress::new(Arc::clone(&ring_a), Arc::clone(&self.counters));
        let mut shutdown_rx = self.shutdown.subscribe();

        let result = match client.connect().await {
            Ok(mut session) => match session.subscribe().await {
                Ok(()) => {
                    info!("subscribed, ingesting");
                    let outcome = ingress_loop(&mut session, &ingress, &mut shutdown_rx).await;
                    let _ = session.close().await;
                    outcome
                }
                Err(err) => {
                    error!(%err, "subscription failed");
                    Err(err.into())
                }
            },
            Err(err) => {
                error!(%err, "feed connection failed");
                Err(err.into())
            }
        };

        // Drain order matters: compute first so Ring-A empties into Ring-B,
        // then persistence.
        compute_stop.store(true, Ordering::Release);
        if timeout(self.config.join_timeout, compute_task).await.is_err() {
            warn!("compute stage did not stop in time, abandoning queued records");
        }
        persist_stop.store(true, Ordering::Release);
        if timeout(self.config.join_timeout, persist_task).await.is_err() {
            warn!("persistence stage did not stop in time, abandoning queued records");
        }

        let snapshot = self.counters.snapshot();
        info!(
            frames = snapshot.frames,
            written = snapshot.records_written,
            ingress_drops = snapshot.ingress_drops,
            persistence_drops = snapshot.persistence_drops,
            decode_errors = snapshot.decode_errors,
            write_errors = snapshot.write_errors,
            "pipeline stopped"
        );

        result
    }
}

async fn ingress_loop(
    session: &mut FeedSession,
    ingress: &Ingress,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<(), PipelineError> {
    loop {
        tokio::select! {
            frame = session.next_frame() => match frame? {
                Some(text) => ingress.on_frame(&text),
                None => {
                    info!("feed stream ended");
                    return Ok(());
                }
            },
            _ = shutdown.wait_for(|stopped| *stopped) => {
                info!("shutdown requested");
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.product_id, "BTC-USD");
        assert_eq!(config.output_path, PathBuf::from("ticker_data.csv"));
        assert!(config.ring_slots.is_power_of_two());
        assert_eq!(config.ema_interval_secs, 5);
    }

    #[test]
    fn test_shutdown_handle_is_idempotent() {
        let handle = ShutdownHandle::new();
        assert!(!handle.is_requested());
        handle.request();
        handle.request();
        assert!(handle.is_requested());
        assert!(handle.clone().is_requested());
    }

    #[tokio::test]
    async fn test_shutdown_wakes_subscribers() {
        let handle = ShutdownHandle::new();
        let mut rx = handle.subscribe();
        let waiter = tokio::spawn(async move {
            rx.wait_for(|stopped| *stopped).await.map(|_| ()).ok();
        });
        handle.request();
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_unopenable_log_aborts_startup() {
        let config = PipelineConfig {
            output_path: PathBuf::from("/no-such-dir/ticks.csv"),
            ..Default::default()
        };
        let pipeline = TickerPipeline::new(config);
        match pipeline.run().await {
            Err(PipelineError::OpenLog(_)) => {}
            other => panic!("expected OpenLog error, got {other:?}"),
        }
    }
}
