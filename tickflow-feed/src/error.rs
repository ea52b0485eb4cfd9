//! Feed error types.
//!
//! Two severities, handled very differently upstream: [`FeedError`] is fatal
//! and ends the session, [`DecodeError`] is per-frame noise that the ingress
//! stage counts and drops.

use thiserror::Error;

/// Fatal transport-level failure.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("connection error: {0}")]
    Connection(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Per-frame decode failure. Never fatal.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Well-formed frame that is not a ticker event (subscription acks,
    /// heartbeats, frames missing `product_id` or `price`).
    #[error("frame is not a ticker message")]
    NotTicker,
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
}
