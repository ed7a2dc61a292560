use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::parse_time;
use crate::types::ContainerId;

/// Which upstream indicator family a chart shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorKind {
    Sentiment,
    Volatility,
    Technical,
}

impl IndicatorKind {
    pub const ALL: [IndicatorKind; 3] = [Self::Sentiment, Self::Volatility, Self::Technical];

    pub fn container(&self) -> ContainerId {
        match self {
            Self::Sentiment => ContainerId::SentimentChartContainer,
            Self::Volatility => ContainerId::VolatilityChartContainer,
            Self::Technical => ContainerId::TechnicalChartContainer,
        }
    }
}

impl std::fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sentiment => write!(f, "sentiment"),
            Self::Volatility => write!(f, "volatility"),
            Self::Technical => write!(f, "technical"),
        }
    }
}

/// A flat record of named indicator values at one timestamp.
///
/// A `None` value means the indicator is undefined at that point: JSON
/// `null`, a missing key and a non-numeric value all read as `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorRecord {
    pub time: DateTime<Utc>,
    pub values: BTreeMap<String, Option<f64>>,
}

impl IndicatorRecord {
    /// Parse one record. The timestamp is `transaction_time`; every other
    /// field becomes a named value.
    pub fn from_value(record: &Value) -> Result<Self> {
        let obj = record.as_object().context("indicator record is not an object")?;
        let time = obj
            .get("transaction_time")
            .context("missing field transaction_time")?;
        let time = parse_time(time).context("invalid field transaction_time")?;

        let values = obj
            .iter()
            .filter(|(k, _)| k.as_str() != "transaction_time")
            .map(|(k, v)| (k.clone(), numeric(v)))
            .collect();

        Ok(Self { time, values })
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied().flatten()
    }
}

fn numeric(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64().filter(|x| x.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|x| x.is_finite()),
        _ => None,
    }
}

/// Parse records delivered newest-first and return them oldest-first.
pub fn to_chronological(records: &[Value]) -> Vec<IndicatorRecord> {
    let mut parsed: Vec<IndicatorRecord> = records
        .iter()
        .enumerate()
        .filter_map(|(i, r)| match IndicatorRecord::from_value(r) {
            Ok(rec) => Some(rec),
            Err(e) => {
                warn!(index = i, error = %e, "skipping malformed indicator record");
                None
            }
        })
        .collect();
    parsed.reverse();
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nulls_and_missing_keys_are_none() {
        let rec = IndicatorRecord::from_value(&json!({
            "transaction_time": "2024-01-01T00:00:00Z",
            "ema_20": 101.5,
            "ema_50": null,
            "note": "n/a"
        }))
        .unwrap();
        assert_eq!(rec.get("ema_20"), Some(101.5));
        assert_eq!(rec.get("ema_50"), None);
        assert_eq!(rec.get("ema_200"), None);
        assert_eq!(rec.get("note"), None);
    }

    #[test]
    fn input_is_reversed_to_chronological() {
        let raw = vec![
            json!({"transaction_time": "2024-01-03T00:00:00Z", "atr_14": 3}),
            json!({"transaction_time": "2024-01-02T00:00:00Z", "atr_14": 2}),
            json!({"transaction_time": "2024-01-01T00:00:00Z", "atr_14": 1}),
        ];
        let recs = to_chronological(&raw);
        let vals: Vec<Option<f64>> = recs.iter().map(|r| r.get("atr_14")).collect();
        assert_eq!(vals, vec![Some(1.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn record_without_time_is_skipped() {
        let raw = vec![json!({"atr_14": 3}), json!({"transaction_time": 1_700_000_000, "atr_14": 2})];
        assert_eq!(to_chronological(&raw).len(), 1);
    }

    #[test]
    fn kinds_map_to_containers() {
        assert_eq!(IndicatorKind::Technical.container(), ContainerId::TechnicalChartContainer);
        assert_eq!(IndicatorKind::Sentiment.to_string(), "sentiment");
    }
}
