//! Ticker frame decoding.

use chrono::Utc;
use serde_json::Value;

use tickflow_core::TickerRecord;

use crate::error::DecodeError;

/// Decode one text frame into a ticker record.
pub fn decode_frame(text: &str) -> Result<TickerRecord, DecodeError> {
    let value: Value = serde_json::from_str(text)?;
    ticker_from_value(&value)
}

/// Build a record from a decoded frame.
///
/// A frame qualifies as a ticker event iff `type` equals `"ticker"` and both
/// `product_id` and `price` are present. Missing optional fields default to
/// the empty string. Numeric tokens are stringified so the log preserves the
/// wire value either way.
pub fn ticker_from_value(value: &Value) -> Result<TickerRecord, DecodeError> {
    if value.get("type").and_then(Value::as_str) != Some("ticker") {
        return Err(DecodeError::NotTicker);
    }
    if value.get("product_id").is_none() || value.get("price").is_none() {
        return Err(DecodeError::NotTicker);
    }

    let mut record = TickerRecord {
        kind: string_field(value, "type"),
        sequence: string_field(value, "sequence"),
        product_id: string_field(value, "product_id"),
        price: string_field(value, "price"),
        open_24h: string_field(value, "open_24h"),
        volume_24h: string_field(value, "volume_24h"),
        low_24h: string_field(value, "low_24h"),
        high_24h: string_field(value, "high_24h"),
        volume_30d: string_field(value, "volume_30d"),
        best_bid: string_field(value, "best_bid"),
        best_ask: string_field(value, "best_ask"),
        side: string_field(value, "side"),
        time: string_field(value, "time"),
        trade_id: string_field(value, "trade_id"),
        last_size: string_field(value, "last_size"),
        ..TickerRecord::default()
    };

    record.mid_price = record.mid_price_from_quotes();
    record.event_time = record.parse_event_time().unwrap_or_else(Utc::now);

    Ok(record)
}

/// String fields pass through verbatim; number tokens are stringified.
fn string_field(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}
