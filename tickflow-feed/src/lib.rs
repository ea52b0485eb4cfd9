//! Coinbase ticker feed: websocket session and frame decoding.
//!
//! The feed is a collaborator of the pipeline, not part of it: the pipeline
//! owns the stages and hand-off rings, this crate owns the wire. A session
//! yields raw text frames; [`decode_frame`] turns one frame into a
//! [`tickflow_core::TickerRecord`] or a counted [`DecodeError`].
//!
//! There is deliberately no reconnect logic. A dropped transport ends the
//! session and the caller decides what to do with the process.

pub mod client;
pub mod config;
pub mod error;
pub mod parser;

pub use client::{FeedClient, FeedSession};
pub use config::{FeedConfig, COINBASE_WS_URL};
pub use error::{DecodeError, FeedError};
pub use parser::{decode_frame, ticker_from_value};
