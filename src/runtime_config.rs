// =============================================================================
// Dashboard Configuration — API endpoints, refresh cadence, viewports
// =============================================================================
//
// Loaded once at startup from `dashboard_config.json`. Every field carries a
// serde default so a partial (or empty) file still loads. Persistence uses
// the atomic tmp + rename pattern.
//
// The API endpoints are exposed to the page through the `data-config`
// element; `DataConfig` is the parsed form of that element's dataset.
// =============================================================================

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::DashboardError;
use crate::types::{ContainerId, HoverDisplay, Locale, Resolution, Viewport};

// =============================================================================
// Default-value helpers
// =============================================================================

const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000/coins";

fn default_coin() -> String {
    "BTCUSDT".to_string()
}

fn default_kline_limit() -> u32 {
    500
}

fn default_indicator_limit() -> u32 {
    100
}

fn default_orderbook_refresh_secs() -> u64 {
    5
}

fn default_indicator_refresh_secs() -> u64 {
    30
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_kline_viewport() -> Viewport {
    Viewport::new(960.0, 500.0)
}

fn default_indicator_viewport() -> Viewport {
    Viewport::new(960.0, 400.0)
}

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_containers() -> Vec<ContainerId> {
    ContainerId::ALL.to_vec()
}

// =============================================================================
// ApiEndpoints
// =============================================================================

/// Backend endpoints the dashboard polls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEndpoints {
    #[serde(default)]
    pub klines_url: String,
    #[serde(default)]
    pub orderbook_url: String,
    #[serde(default)]
    pub sentiment_url: String,
    #[serde(default)]
    pub volatility_url: String,
    #[serde(default)]
    pub technical_url: String,
}

impl ApiEndpoints {
    /// Build the standard endpoint set for `coin` under `base`.
    pub fn for_coin(base: &str, coin: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            klines_url: format!("{base}/api/klines/{coin}/"),
            orderbook_url: format!("{base}/api/orderbook/{coin}/"),
            sentiment_url: format!("{base}/api/sentiment/{coin}/"),
            volatility_url: format!("{base}/api/volatility/{coin}/"),
            technical_url: format!("{base}/api/technical/{coin}/"),
        }
    }
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self::for_coin(DEFAULT_API_BASE, &default_coin())
    }
}

// =============================================================================
// DashboardConfig
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    // --- Backend ------------------------------------------------------------

    #[serde(default)]
    pub api: ApiEndpoints,

    /// Coin the page is showing (display only; URLs already embed it).
    #[serde(default = "default_coin")]
    pub coin: String,

    /// Candles requested per kline fetch.
    #[serde(default = "default_kline_limit")]
    pub kline_limit: u32,

    /// Records requested per indicator fetch.
    #[serde(default = "default_indicator_limit")]
    pub indicator_limit: u32,

    #[serde(default)]
    pub default_resolution: Resolution,

    // --- Refresh cadence ----------------------------------------------------

    #[serde(default = "default_orderbook_refresh_secs")]
    pub orderbook_refresh_secs: u64,

    #[serde(default = "default_indicator_refresh_secs")]
    pub indicator_refresh_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    // --- Presentation -------------------------------------------------------

    #[serde(default = "default_kline_viewport")]
    pub kline_viewport: Viewport,

    #[serde(default = "default_indicator_viewport")]
    pub indicator_viewport: Viewport,

    #[serde(default)]
    pub hover_display: HoverDisplay,

    #[serde(default)]
    pub locale: Locale,

    /// Containers present in the page markup. Loads targeting any other
    /// container fail with a lookup error.
    #[serde(default = "default_containers")]
    pub containers: Vec<ContainerId>,

    // --- Server -------------------------------------------------------------

    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api: ApiEndpoints::default(),
            coin: default_coin(),
            kline_limit: default_kline_limit(),
            indicator_limit: default_indicator_limit(),
            default_resolution: Resolution::default(),
            orderbook_refresh_secs: default_orderbook_refresh_secs(),
            indicator_refresh_secs: default_indicator_refresh_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            kline_viewport: default_kline_viewport(),
            indicator_viewport: default_indicator_viewport(),
            hover_display: HoverDisplay::default(),
            locale: Locale::default(),
            containers: default_containers(),
            bind_addr: default_bind_addr(),
        }
    }
}

impl DashboardConfig {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read dashboard config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse dashboard config from {}", path.display()))?;

        info!(
            path = %path.display(),
            coin = %config.coin,
            resolution = %config.default_resolution,
            "dashboard config loaded"
        );

        Ok(config)
    }

    /// Persist the configuration atomically (write `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise dashboard config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "dashboard config saved (atomic)");
        Ok(())
    }

    /// Apply `DASHBOARD_API_BASE` / `DASHBOARD_COIN` / `DASHBOARD_BIND_ADDR`.
    ///
    /// Setting either the base or the coin rebuilds every endpoint URL.
    pub fn apply_env_overrides(&mut self) {
        let base = std::env::var("DASHBOARD_API_BASE").ok();
        let coin = std::env::var("DASHBOARD_COIN").ok();
        self.apply_overrides(base.as_deref(), coin.as_deref());

        if let Ok(addr) = std::env::var("DASHBOARD_BIND_ADDR") {
            if !addr.trim().is_empty() {
                self.bind_addr = addr.trim().to_string();
            }
        }
    }

    fn apply_overrides(&mut self, base: Option<&str>, coin: Option<&str>) {
        if base.is_none() && coin.is_none() {
            return;
        }
        if let Some(c) = coin.map(str::trim).filter(|c| !c.is_empty()) {
            self.coin = c.to_uppercase();
        }
        let base = base.unwrap_or(DEFAULT_API_BASE);
        self.api = ApiEndpoints::for_coin(base, &self.coin);
    }

    /// The attributes rendered on the `data-config` element.
    pub fn dataset(&self) -> BTreeMap<&'static str, String> {
        let mut attrs = BTreeMap::new();
        attrs.insert("api-url", self.api.klines_url.clone());
        attrs.insert("orderbook-url", self.api.orderbook_url.clone());
        attrs.insert("sentiment-url", self.api.sentiment_url.clone());
        attrs.insert("volatility-url", self.api.volatility_url.clone());
        attrs.insert("technical-url", self.api.technical_url.clone());
        attrs
    }
}

// =============================================================================
// DataConfig
// =============================================================================

/// API URLs as read back from the `data-config` element's dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DataConfig {
    pub api_url: String,
    pub orderbook_url: Option<String>,
    pub sentiment_url: Option<String>,
    pub volatility_url: Option<String>,
    pub technical_url: Option<String>,
}

impl DataConfig {
    /// Read the dataset. The kline URL (`api-url`) is mandatory; the others
    /// disable their chart when absent or blank.
    pub fn from_dataset(dataset: &BTreeMap<&'static str, String>) -> Result<Self, DashboardError> {
        let get = |key: &str| {
            dataset
                .get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let api_url = get("api-url")
            .ok_or_else(|| DashboardError::MissingConfig("data-config[data-api-url]".into()))?;

        Ok(Self {
            api_url,
            orderbook_url: get("orderbook-url"),
            sentiment_url: get("sentiment-url"),
            volatility_url: get("volatility-url"),
            technical_url: get("technical-url"),
        })
    }
}
