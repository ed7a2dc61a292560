// =============================================================================
// Backend API Client — kline, order-book and indicator fetches
// =============================================================================
//
// Thin wrapper over a shared reqwest client. Every call is a plain GET with
// query parameters; a non-2xx status is an error, the body must be JSON, and
// each fetch validates only the part of the payload its chart consumes.
// =============================================================================

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::DashboardError;
use crate::market_data::OrderBookSnapshot;
use crate::types::Resolution;

/// Query for a kline fetch. `table` is derived from the resolution so the two
/// can never disagree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KlineQuery {
    pub resolution: Resolution,
    pub limit: u32,
}

impl KlineQuery {
    pub fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("resolution", self.resolution.as_str().to_string()),
            ("limit", self.limit.to_string()),
            ("table", self.resolution.table().to_string()),
        ]
    }
}

#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
}

impl ApiClient {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    pub fn new(timeout: Duration) -> Result<Self, DashboardError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DashboardError::Network(format!("failed to build HTTP client: {e}")))?;
        debug!(timeout_ms = timeout.as_millis() as u64, "ApiClient initialised");
        Ok(Self { client })
    }

    // -------------------------------------------------------------------------
    // Generic GET
    // -------------------------------------------------------------------------

    /// GET `url` with `params` and parse the body as JSON.
    #[instrument(skip(self, params), name = "api::get_json")]
    pub async fn get_json(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<Value, DashboardError> {
        let resp = self.client.get(url).query(params).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DashboardError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = resp.bytes().await?;
        let body: Value = serde_json::from_slice(&bytes)?;
        Ok(body)
    }

    // -------------------------------------------------------------------------
    // Klines
    // -------------------------------------------------------------------------

    /// Fetch klines and return the raw `data` records.
    ///
    /// Expected shape: `{ "coin": "...", "resolution": "1d", "data": [ {...}, ... ] }`.
    /// An empty `data` array is returned as-is.
    #[instrument(skip(self), name = "api::fetch_klines")]
    pub async fn fetch_klines(
        &self,
        url: &str,
        query: &KlineQuery,
    ) -> Result<Vec<Value>, DashboardError> {
        let body = self.get_json(url, &query.params()).await?;

        let data = match body.get("data") {
            Some(Value::Array(items)) => items.clone(),
            Some(_) => return Err(DashboardError::Payload("kline data is not an array".into())),
            None => return Err(DashboardError::Payload("kline response has no data field".into())),
        };

        debug!(resolution = %query.resolution, count = data.len(), "klines fetched");
        Ok(data)
    }

    // -------------------------------------------------------------------------
    // Order book
    // -------------------------------------------------------------------------

    /// Fetch the order-book history and return its latest snapshot.
    #[instrument(skip(self), name = "api::fetch_order_book")]
    pub async fn fetch_order_book(&self, url: &str) -> Result<OrderBookSnapshot, DashboardError> {
        let body = self.get_json(url, &[]).await?;
        let book = OrderBookSnapshot::from_payload(&body)?;
        debug!(bids = book.bids.len(), asks = book.asks.len(), "order book fetched");
        Ok(book)
    }

    // -------------------------------------------------------------------------
    // Indicators
    // -------------------------------------------------------------------------

    /// Fetch indicator records (newest-first as served).
    ///
    /// The endpoint answers with a bare JSON array; a `{ "data": [...] }`
    /// envelope is accepted too.
    #[instrument(skip(self), name = "api::fetch_indicators")]
    pub async fn fetch_indicators(
        &self,
        url: &str,
        limit: u32,
    ) -> Result<Vec<Value>, DashboardError> {
        let body = self.get_json(url, &[("limit", limit.to_string())]).await?;

        let records = match body {
            Value::Array(items) => items,
            Value::Object(mut obj) => match obj.remove("data") {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(DashboardError::Payload(
                        "indicator response is not an array".into(),
                    ))
                }
            },
            _ => {
                return Err(DashboardError::Payload(
                    "indicator response is not an array".into(),
                ))
            }
        };

        debug!(count = records.len(), "indicator records fetched");
        Ok(records)
    }
}
