// =============================================================================
// Central Application State — Kline Dashboard
// =============================================================================
//
// Shared by the controller, the refresh loops and the HTTP handlers via
// `Arc<AppState>`.
//
// Thread safety:
//   - Atomic counter for lock-free version tracking.
//   - parking_lot::RwLock for every mutable piece of state.
//   - Lock order: `kline_chart` before the page registry's slots.
// =============================================================================

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;

use crate::chart::CandlestickChart;
use crate::dashboard::page::PageRegistry;
use crate::runtime_config::DashboardConfig;
use crate::types::{ContainerId, Resolution};

/// Serialisable view of the page pushed to WebSocket clients.
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub version: u64,
    pub resolution: Resolution,
    pub server_time: i64,
    /// Container id → current inner HTML.
    pub containers: BTreeMap<ContainerId, String>,
}

pub struct AppState {
    // ── Version tracking ────────────────────────────────────────────────
    /// Incremented whenever a container's content changes. The WebSocket
    /// feed polls it to decide when to push.
    pub state_version: AtomicU64,

    // ── Configuration ───────────────────────────────────────────────────
    pub config: Arc<RwLock<DashboardConfig>>,

    // ── Page ────────────────────────────────────────────────────────────
    pub page: PageRegistry,
    pub resolution: RwLock<Resolution>,
    /// Retained kline chart for zoom/resize/hover; `None` until a
    /// non-empty series has loaded.
    pub kline_chart: RwLock<Option<CandlestickChart>>,

    // ── Timing ──────────────────────────────────────────────────────────
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        let page = PageRegistry::new(&config.containers);
        let resolution = config.default_resolution;
        Self {
            state_version: AtomicU64::new(1),
            config: Arc::new(RwLock::new(config)),
            page,
            resolution: RwLock::new(resolution),
            kline_chart: RwLock::new(None),
            start_time: std::time::Instant::now(),
        }
    }

    // ── Version Management ──────────────────────────────────────────────

    /// Returns the previous version.
    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst)
    }

    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn resolution(&self) -> Resolution {
        *self.resolution.read()
    }

    pub fn set_resolution(&self, resolution: Resolution) {
        *self.resolution.write() = resolution;
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            version: self.current_state_version(),
            resolution: self.resolution(),
            server_time: Utc::now().timestamp_millis(),
            containers: self
                .page
                .snapshot()
                .into_iter()
                .map(|(id, c)| (id, c.to_html()))
                .collect(),
        }
    }
}
