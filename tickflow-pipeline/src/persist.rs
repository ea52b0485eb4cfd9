//! Persistence stage: append-only CSV log with batched flushing.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use tickflow_core::{TickerRecord, CSV_HEADER};
use tickflow_transport::SpscRing;

use crate::counters::PipelineCounters;

/// Append-only CSV sink. Writes the header exactly once, on first creation
/// of the file; reopening an existing non-empty log appends rows only.
///
/// Rows are buffered and flushed on a wall-clock cadence rather than per
/// record, bounding both syscall overhead and the data-loss window.
pub struct CsvSink {
    writer: BufWriter<File>,
    path: PathBuf,
    flush_interval: Duration,
    last_flush: Instant,
}

impl CsvSink {
    pub fn open(path: &Path, flush_interval: Duration) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let needs_header = file.metadata()?.len() == 0;
        let mut writer = BufWriter::new(file);
        if needs_header {
            writer.write_all(CSV_HEADER.as_bytes())?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        Ok(CsvSink {
            writer,
            path: path.to_path_buf(),
            flush_interval,
            last_flush: Instant::now(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a `\n`-terminated row.
    pub fn append(&mut self, record: &TickerRecord) -> io::Result<()> {
        self.writer.write_all(record.to_csv_row().as_bytes())?;
        self.writer.write_all(b"\n")
    }

    /// Flush if the cadence interval has elapsed.
    pub fn flush_if_due(&mut self) -> io::Result<()> {
        if self.last_flush.elapsed() >= self.flush_interval {
            self.flush()?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()?;
        self.last_flush = Instant::now();
        Ok(())
    }
}

/// Dedicated blocking loop that drains Ring-B into the sink.
///
/// All blocking I/O in the pipeline lives here, which is why the stage sits
/// behind its own ring. Write failures after startup are counted and logged
/// but do not stop the stage; the log can be rotated out from under a sick
/// disk without restarting the feed.
pub struct Persistence {
    ring: Arc<SpscRing<TickerRecord>>,
    sink: CsvSink,
    counters: Arc<PipelineCounters>,
    stop: Arc<AtomicBool>,
    idle_sleep: Duration,
}

impl Persistence {
    pub fn new(
        ring: Arc<SpscRing<TickerRecord>>,
        sink: CsvSink,
        counters: Arc<PipelineCounters>,
        stop: Arc<AtomicBool>,
        idle_sleep: Duration,
    ) -> Self {
        Persistence {
            ring,
            sink,
            counters,
            stop,
            idle_sleep,
        }
    }

    /// Run until stop is requested and Ring-B has been drained, then flush
    /// and close.
    pub fn run(mut self) {
        loop {
            let mut wrote = false;
            while let Some(record) = self.ring.try_pop() {
                self.write(&record);
                wrote = true;
            }
            if let Err(err) = self.sink.flush_if_due() {
                warn!(%err, "log flush failed");
                self.counters.record_write_error();
            }
            if self.stop.load(Ordering::Acquire) && self.ring.is_empty() {
                break;
            }
            if !wrote {
                std::thread::sleep(self.idle_sleep);
            }
        }

        if let Err(err) = self.sink.flush() {
            warn!(%err, "final log flush failed");
            self.counters.record_write_error();
        }
        info!(
            path = %self.sink.path().display(),
            records = self.counters.records_written(),
            "persistence stopped"
        );
    }

    fn write(&mut self, record: &TickerRecord) {
        match self.sink.append(record) {
            Ok(()) => self.counters.record_written(),
            Err(err) => {
                warn!(%err, "failed to append record");
                self.counters.record_write_error();
            }
        }
    }
}
