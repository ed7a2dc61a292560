//! In-process backend used by async tests.

use std::collections::HashMap;
use std::time::Duration;

use axum::{
    extract::Query,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

/// Bind `router` on an ephemeral local port and return its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("test server");
    });
    format!("http://{addr}")
}

/// A fake backend exposing the endpoints the dashboard polls.
pub fn test_backend() -> Router {
    Router::new()
        .route("/klines", get(klines))
        .route("/slow_klines", get(slow_klines))
        .route("/empty_book", get(empty_book))
        .route("/empty_indicators", get(|| async { Json(json!([])) }))
        .route("/orderbook", get(orderbook))
        .route("/indicators", get(indicators))
        .route("/empty", get(|| async { Json(json!({ "data": [] })) }))
        .route("/fail", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route("/text", get(|| async { "not json" }))
}

fn limit(params: &HashMap<String, String>, default: usize) -> usize {
    params
        .get("limit")
        .and_then(|l| l.parse().ok())
        .unwrap_or(default)
}

/// Candles newest-first so callers must sort. Returns nothing unless
/// `table` agrees with `resolution`.
async fn klines(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    let resolution = params.get("resolution").cloned().unwrap_or_default();
    let table_ok = params.get("table") == Some(&format!("coins_kline_{resolution}"));
    let n = if table_ok { limit(&params, 10) } else { 0 };

    let data: Vec<Value> = (0..n)
        .rev()
        .map(|i| {
            let base = 100.0 + i as f64;
            json!({
                "time": 1_700_000_000 + (i as i64) * 86_400,
                "open": base,
                "high": base + 2.0,
                "low": base - 2.0,
                "close": if i % 2 == 0 { base + 1.0 } else { base - 1.0 },
                "volume": 10.0
            })
        })
        .collect();
    Json(json!({ "coin": "BTCUSDT", "resolution": resolution, "data": data }))
}

/// `1h` answers after 400 ms with the full limit; every other resolution
/// answers at once with 3 candles.
async fn slow_klines(Query(mut params): Query<HashMap<String, String>>) -> impl IntoResponse {
    if params.get("resolution").map(String::as_str) == Some("1h") {
        tokio::time::sleep(Duration::from_millis(400)).await;
    } else {
        params.insert("limit".into(), "3".into());
    }
    klines(Query(params)).await
}

async fn empty_book() -> impl IntoResponse {
    Json(json!({ "data": [ { "bids": "[]", "asks": "[[\"101.0\", \"1.0\"]]" } ] }))
}

async fn orderbook() -> impl IntoResponse {
    Json(json!({
        "data": [
            { "bids": "[[\"90.0\", \"1\"]]", "asks": "[[\"95.0\", \"1\"]]" },
            {
                "bids": "[[\"100.0\", \"1.0\"], [\"99.0\", \"2.0\"]]",
                "asks": "[[\"101.0\", \"1.0\"], [\"102.0\", \"0.5\"]]"
            }
        ]
    }))
}

/// Records newest-first carrying every field the indicator charts read.
async fn indicators(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    let n = limit(&params, 20);
    let records: Vec<Value> = (0..n)
        .rev()
        .map(|i| {
            let x = i as f64;
            json!({
                "transaction_time": 1_700_000_000 + (i as i64) * 3_600,
                "open_interest": 1_000.0 + x,
                "funding_rate": 0.0001 * x,
                "long_short_ratio": 1.0 + x / 100.0,
                "atr_14": 10.0 + x,
                "atr_21": 12.0 + x,
                "vwap": 100.0 + x,
                "vwap_high_band": 105.0 + x,
                "vwap_low_band": 95.0 + x,
                "ema_20": 100.0 + x,
                "ema_50": if i == 0 { Value::Null } else { json!(99.0 + x) },
                "ema_100": 98.0 + x,
                "ema_200": 97.0 + x,
                "stoch_rsi_k": 0.5,
                "stoch_rsi_d": 0.4
            })
        })
        .collect();
    Json(Value::Array(records))
}
