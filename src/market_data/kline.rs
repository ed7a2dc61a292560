use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{parse_number, parse_time};

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A kline in display shape: parsed date, numeric OHLC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub date: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    /// Epoch milliseconds of the candle's timestamp.
    pub fn time_ms(&self) -> i64 {
        self.date.timestamp_millis()
    }

    /// True when the candle closed below its open (drawn red).
    pub fn is_bearish(&self) -> bool {
        self.open > self.close
    }
}

/// Parse one backend kline record.
///
/// Expected shape:
/// ```json
/// { "time": 1700000000, "open": 37000.0, "high": "37050", "low": 36990, "close": 37020 }
/// ```
/// `time` may also be a date string.
pub fn parse_kline(record: &serde_json::Value) -> Result<Candle> {
    let time = record.get("time").context("missing field time")?;
    let date = parse_time(time).context("invalid field time")?;

    let field = |name: &str| -> Result<f64> {
        let v = record
            .get(name)
            .with_context(|| format!("missing field {name}"))?;
        parse_number(v, name)
    };

    Ok(Candle {
        date,
        open: field("open")?,
        high: field("high")?,
        low: field("low")?,
        close: field("close")?,
    })
}

/// Convert raw records into candles sorted ascending by time.
///
/// Malformed records are skipped. The sort is stable, so duplicate
/// timestamps keep their input order.
pub fn normalize_klines(records: &[serde_json::Value]) -> Vec<Candle> {
    let mut candles: Vec<Candle> = records
        .iter()
        .enumerate()
        .filter_map(|(i, r)| match parse_kline(r) {
            Ok(c) => Some(c),
            Err(e) => {
                warn!(index = i, error = %e, "skipping malformed kline record");
                None
            }
        })
        .collect();
    candles.sort_by_key(|c| c.date);
    candles
}
