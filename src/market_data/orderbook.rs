// =============================================================================
// Order Book Snapshot — parsed from the backend order-book endpoint
// =============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DashboardError;

/// One price level. Unparseable entries are kept as `NaN` and skipped when
/// rendered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: f64,
    pub amount: f64,
}

impl PriceLevel {
    pub fn new(price: f64, amount: f64) -> Self {
        Self { price, amount }
    }

    /// Quote value of the level (price × amount).
    pub fn total(&self) -> f64 {
        self.price * self.amount
    }

    pub fn is_valid(&self) -> bool {
        self.price.is_finite() && self.amount.is_finite()
    }
}

/// Bids and asks as delivered. No ordering is enforced: bids are expected
/// best-first (descending) and asks best-first (ascending).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
}

impl OrderBookSnapshot {
    pub fn new(bids: Vec<PriceLevel>, asks: Vec<PriceLevel>) -> Self {
        Self { bids, asks }
    }

    /// Parse the endpoint payload.
    ///
    /// Expected shape (the last element is the current snapshot):
    /// ```json
    /// { "data": [ { "bids": "[[\"100.0\",\"1.5\"]]", "asks": "[[\"101.0\",\"0.3\"]]" } ] }
    /// ```
    /// `bids`/`asks` may be JSON-encoded strings or plain arrays.
    pub fn from_payload(root: &Value) -> Result<Self, DashboardError> {
        let data = root
            .get("data")
            .and_then(Value::as_array)
            .ok_or_else(|| DashboardError::Payload("order book data is not an array".into()))?;

        let latest = data
            .last()
            .ok_or_else(|| DashboardError::Payload("order book data is empty".into()))?;

        let bids = decode_side(latest.get("bids"), "bids")?;
        let asks = decode_side(latest.get("asks"), "asks")?;

        Ok(Self {
            bids: parse_levels(&bids),
            asks: parse_levels(&asks),
        })
    }

    /// First bid in input order.
    pub fn best_bid(&self) -> Option<f64> {
        self.bids.first().map(|l| l.price).filter(|p| p.is_finite())
    }

    /// First ask in input order.
    pub fn best_ask(&self) -> Option<f64> {
        self.asks.first().map(|l| l.price).filter(|p| p.is_finite())
    }

    pub fn mid_price(&self) -> Option<f64> {
        Some((self.best_bid()? + self.best_ask()?) / 2.0)
    }

    /// Spread as a percentage of the best bid.
    pub fn spread_pct(&self) -> Option<f64> {
        let bid = self.best_bid()?;
        let ask = self.best_ask()?;
        if bid == 0.0 {
            return None;
        }
        Some((ask - bid) / bid * 100.0)
    }
}

/// Sides are stored as JSON text by the backend; decode them when needed.
fn decode_side(val: Option<&Value>, name: &str) -> Result<Vec<Value>, DashboardError> {
    let val = val.ok_or_else(|| DashboardError::Payload(format!("missing field {name}")))?;
    let decoded = match val {
        Value::String(s) => serde_json::from_str::<Value>(s)
            .map_err(|e| DashboardError::Payload(format!("{name} is not valid JSON: {e}")))?,
        other => other.clone(),
    };
    match decoded {
        Value::Array(items) if items.is_empty() => {
            Err(DashboardError::Payload(format!("{name} is empty")))
        }
        Value::Array(items) => Ok(items),
        _ => Err(DashboardError::Payload(format!("{name} is not an array"))),
    }
}

fn parse_levels(items: &[Value]) -> Vec<PriceLevel> {
    items.iter().map(parse_level).collect()
}

fn parse_level(item: &Value) -> PriceLevel {
    let num = |idx: usize| -> f64 {
        item.get(idx)
            .and_then(|v| match v {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            })
            .unwrap_or(f64::NAN)
    };
    PriceLevel::new(num(0), num(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mid_and_spread_for_simple_book() {
        let book = OrderBookSnapshot::new(
            vec![PriceLevel::new(100.0, 1.0)],
            vec![PriceLevel::new(101.0, 1.0)],
        );
        assert!((book.mid_price().unwrap() - 100.5).abs() < 1e-12);
        assert!((book.spread_pct().unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn payload_with_string_encoded_sides() {
        let root = json!({
            "data": [
                { "bids": "[[\"90\", \"2\"]]", "asks": "[[\"91\", \"2\"]]" },
                { "bids": "[[\"100.0\", \"1.5\"], [\"99.5\", \"3\"]]", "asks": "[[\"101.0\", \"0.25\"]]" }
            ]
        });
        let book = OrderBookSnapshot::from_payload(&root).unwrap();
        assert_eq!(book.bids.len(), 2);
        assert_eq!(book.asks.len(), 1);
        assert_eq!(book.best_bid(), Some(100.0));
        assert!((book.bids[1].total() - 298.5).abs() < 1e-9);
    }

    #[test]
    fn payload_with_plain_arrays() {
        let root = json!({ "data": [ { "bids": [[100, 1]], "asks": [[101, 1]] } ] });
        let book = OrderBookSnapshot::from_payload(&root).unwrap();
        assert_eq!(book.best_ask(), Some(101.0));
    }

    #[test]
    fn empty_or_missing_data_is_payload_error() {
        for root in [json!({ "data": [] }), json!({}), json!({ "data": "x" })] {
            let err = OrderBookSnapshot::from_payload(&root).unwrap_err();
            assert!(matches!(err, DashboardError::Payload(_)));
        }
    }

    #[test]
    fn non_array_side_is_payload_error() {
        let asks = "[[\"101\", \"1\"]]";
        let root = json!({ "data": [ { "bids": "{\"a\": 1}", "asks": asks } ] });
        assert!(OrderBookSnapshot::from_payload(&root).is_err());
        let root = json!({ "data": [ { "bids": "not json", "asks": asks } ] });
        assert!(OrderBookSnapshot::from_payload(&root).is_err());
        let root = json!({ "data": [ { "asks": asks } ] });
        assert!(OrderBookSnapshot::from_payload(&root).is_err());
    }

    #[test]
    fn empty_side_is_payload_error() {
        let root = json!({ "data": [ { "bids": "[[\"100\", \"1\"]]", "asks": "[]" } ] });
        let err = OrderBookSnapshot::from_payload(&root).unwrap_err();
        assert!(matches!(err, DashboardError::Payload(ref m) if m == "asks is empty"));

        let root = json!({ "data": [ { "bids": [], "asks": [[101, 1]] } ] });
        let err = OrderBookSnapshot::from_payload(&root).unwrap_err();
        assert!(matches!(err, DashboardError::Payload(ref m) if m == "bids is empty"));
    }

    #[test]
    fn unparseable_levels_become_nan() {
        let root = json!({ "data": [ { "bids": [["x", "1"]], "asks": [[101, 1]] } ] });
        let book = OrderBookSnapshot::from_payload(&root).unwrap();
        assert!(!book.bids[0].is_valid());
        assert_eq!(book.best_bid(), None);
        assert_eq!(book.mid_price(), None);
    }
}
