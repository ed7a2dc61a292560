// =============================================================================
// Shared types used across the kline dashboard
// =============================================================================

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DashboardError;

/// Candle resolution selectable from the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
}

impl Resolution {
    /// All resolutions in button order.
    pub const ALL: [Resolution; 6] = [
        Self::M1,
        Self::M5,
        Self::M15,
        Self::H1,
        Self::H4,
        Self::D1,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::M1 => "1m",
            Self::M5 => "5m",
            Self::M15 => "15m",
            Self::H1 => "1h",
            Self::H4 => "4h",
            Self::D1 => "1d",
        }
    }

    /// Backend aggregate table holding candles of this resolution.
    pub fn table(&self) -> &'static str {
        match self {
            Self::M1 => "coins_kline_1m",
            Self::M5 => "coins_kline_5m",
            Self::M15 => "coins_kline_15m",
            Self::H1 => "coins_kline_1h",
            Self::H4 => "coins_kline_4h",
            Self::D1 => "coins_kline_1d",
        }
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::D1
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s.trim())
            .ok_or_else(|| DashboardError::InvalidResolution(s.to_string()))
    }
}

/// Named page containers. Each chart type draws into exactly one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContainerId {
    KlineChartContainer,
    OrderbookContainer,
    SentimentChartContainer,
    VolatilityChartContainer,
    TechnicalChartContainer,
}

impl ContainerId {
    pub const ALL: [ContainerId; 5] = [
        Self::KlineChartContainer,
        Self::OrderbookContainer,
        Self::SentimentChartContainer,
        Self::VolatilityChartContainer,
        Self::TechnicalChartContainer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KlineChartContainer => "kline-chart-container",
            Self::OrderbookContainer => "orderbook-container",
            Self::SentimentChartContainer => "sentiment-chart-container",
            Self::VolatilityChartContainer => "volatility-chart-container",
            Self::TechnicalChartContainer => "technical-chart-container",
        }
    }
}

impl std::fmt::Display for ContainerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContainerId {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| DashboardError::MissingContainer(s.to_string()))
    }
}

/// Language of user-facing labels and messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    Ru,
}

impl Default for Locale {
    fn default() -> Self {
        Self::En
    }
}

/// How the hovered candle is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoverDisplay {
    /// Floating tooltip positioned by the client next to the cursor.
    Tooltip,
    /// Text bar drawn above the plot area inside the chart itself.
    InfoBar,
}

impl Default for HoverDisplay {
    fn default() -> Self {
        Self::Tooltip
    }
}

/// Pixel size of a chart viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_maps_to_table() {
        assert_eq!(Resolution::M1.table(), "coins_kline_1m");
        assert_eq!(Resolution::D1.table(), "coins_kline_1d");
        assert_eq!("4h".parse::<Resolution>().unwrap(), Resolution::H4);
    }

    #[test]
    fn unknown_resolution_is_rejected() {
        let err = "2w".parse::<Resolution>().unwrap_err();
        assert!(matches!(err, DashboardError::InvalidResolution(_)));
    }

    #[test]
    fn container_names_round_trip() {
        for id in ContainerId::ALL {
            assert_eq!(id.as_str().parse::<ContainerId>().unwrap(), id);
        }
        assert!("chart-container".parse::<ContainerId>().is_err());
    }

    #[test]
    fn resolution_serde_uses_short_names() {
        let json = serde_json::to_string(&Resolution::M15).unwrap();
        assert_eq!(json, "\"15m\"");
        let r: Resolution = serde_json::from_str("\"1h\"").unwrap();
        assert_eq!(r, Resolution::H1);
    }
}
