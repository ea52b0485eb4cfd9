//! Core domain types for the tickflow pipeline.
//!
//! Holds the ticker record that flows through the pipeline and the
//! streaming statistics applied to it. No I/O and no async here; the
//! pipeline crates own the tasks and the hand-off buffers.

pub mod record;
pub mod stats;

pub use record::{TickerRecord, CSV_HEADER};
pub use stats::{EmaEngine, GatedEma};
