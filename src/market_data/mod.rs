pub mod indicators;
pub mod kline;
pub mod orderbook;

pub use indicators::{IndicatorKind, IndicatorRecord};
pub use kline::Candle;
pub use orderbook::{OrderBookSnapshot, PriceLevel};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Backend numbers arrive either as JSON numbers or as numeric strings.
pub(crate) fn parse_number(val: &serde_json::Value, name: &str) -> Result<f64> {
    match val {
        serde_json::Value::Number(n) => n
            .as_f64()
            .with_context(|| format!("field {name} is not a valid f64")),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<f64>()
            .with_context(|| format!("failed to parse {name} as f64: {s}")),
        _ => bail!("field {name} has unexpected JSON type"),
    }
}

/// Parse a timestamp that is either epoch seconds or a date string.
///
/// Naive strings (no offset) are taken as UTC.
pub(crate) fn parse_time(val: &serde_json::Value) -> Result<DateTime<Utc>> {
    match val {
        serde_json::Value::Number(n) => {
            let secs = n.as_f64().context("timestamp is not a valid number")?;
            let millis = (secs * 1000.0).round() as i64;
            Utc.timestamp_millis_opt(millis)
                .single()
                .with_context(|| format!("timestamp out of range: {secs}"))
        }
        serde_json::Value::String(s) => parse_time_str(s.trim()),
        _ => bail!("timestamp has unexpected JSON type"),
    }
}

fn parse_time_str(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    bail!("unrecognised timestamp format: {s}")
}
