//! Ticker record and CSV row serialization.

use std::borrow::Cow;
use std::fmt::Write as _;

use chrono::{DateTime, NaiveDateTime, Utc};

/// Header row for the ticker log. Column order is fixed; the three real-valued
/// columns come last.
pub const CSV_HEADER: &str = "type,sequence,product_id,price,open_24h,volume_24h,\
low_24h,high_24h,volume_30d,best_bid,best_ask,side,time,trade_id,last_size,\
price_ema,mid_price_ema,mid_price";

/// One decoded ticker event.
///
/// The fifteen transport fields are kept verbatim as strings so the log
/// reproduces exactly what the exchange sent. The three `f64` fields are
/// derived: `mid_price` is filled in at decode time, the two EMA fields are
/// filled in by the compute stage and stay `0.0` until the first sample is
/// applied. After decode, only the EMA fields are ever written.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerRecord {
    pub kind: String,
    pub sequence: String,
    pub product_id: String,
    pub price: String,
    pub open_24h: String,
    pub volume_24h: String,
    pub low_24h: String,
    pub high_24h: String,
    pub volume_30d: String,
    pub best_bid: String,
    pub best_ask: String,
    pub side: String,
    pub time: String,
    pub trade_id: String,
    pub last_size: String,

    pub price_ema: f64,
    pub mid_price_ema: f64,
    pub mid_price: f64,

    /// Event instant parsed from `time`; falls back to the wall clock when the
    /// exchange timestamp is absent or malformed.
    pub event_time: DateTime<Utc>,
}

impl Default for TickerRecord {
    fn default() -> Self {
        TickerRecord {
            kind: String::new(),
            sequence: String::new(),
            product_id: String::new(),
            price: String::new(),
            open_24h: String::new(),
            volume_24h: String::new(),
            low_24h: String::new(),
            high_24h: String::new(),
            volume_30d: String::new(),
            best_bid: String::new(),
            best_ask: String::new(),
            side: String::new(),
            time: String::new(),
            trade_id: String::new(),
            last_size: String::new(),
            price_ema: 0.0,
            mid_price_ema: 0.0,
            mid_price: 0.0,
            event_time: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

impl TickerRecord {
    /// Mid-price from the quoted top of book, `0.0` when either side fails to
    /// parse.
    pub fn mid_price_from_quotes(&self) -> f64 {
        match (
            self.best_bid.parse::<f64>(),
            self.best_ask.parse::<f64>(),
        ) {
            (Ok(bid), Ok(ask)) => (bid + ask) / 2.0,
            _ => 0.0,
        }
    }

    /// Parse the exchange timestamp (`time` field) as ISO-8601. The trailing
    /// `Z` is optional; Coinbase sends it, replayed captures sometimes do not.
    pub fn parse_event_time(&self) -> Option<DateTime<Utc>> {
        parse_iso8601(&self.time)
    }

    /// Serialize as one CSV row, without the trailing newline.
    ///
    /// Fields containing `,`, `"`, or a newline are quoted with embedded
    /// quotes doubled. The three real-valued columns are fixed-point with
    /// eight fractional digits.
    pub fn to_csv_row(&self) -> String {
        let mut row = String::with_capacity(192);
        for field in [
            &self.kind,
            &self.sequence,
            &self.product_id,
            &self.price,
            &self.open_24h,
            &self.volume_24h,
            &self.low_24h,
            &self.high_24h,
            &self.volume_30d,
            &self.best_bid,
            &self.best_ask,
            &self.side,
            &self.time,
            &self.trade_id,
            &self.last_size,
        ] {
            row.push_str(&escape_csv(field));
            row.push(',');
        }
        let _ = write!(
            row,
            "{:.8},{:.8},{:.8}",
            self.price_ema, self.mid_price_ema, self.mid_price
        );
        row
    }
}

/// ISO-8601 with optional fractional seconds and optional trailing `Z`.
pub fn parse_iso8601(time: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(time) {
        return Some(dt.with_timezone(&Utc));
    }
    let bare = time.strip_suffix('Z').unwrap_or(time);
    NaiveDateTime::parse_from_str(bare, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn escape_csv(field: &str) -> Cow<'_, str> {
    if !field.contains([',', '"', '\n']) {
        return Cow::Borrowed(field);
    }
    let mut escaped = String::with_capacity(field.len() + 2);
    escaped.push('"');
    for c in field.chars() {
        if c == '"' {
            escaped.push_str("\"\"");
        } else {
            escaped.push(c);
        }
    }
    escaped.push('"');
    Cow::Owned(escaped)
}
