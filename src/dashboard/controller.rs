// =============================================================================
// Dashboard Controller — fetch, build, render and commit each container
// =============================================================================
//
// Flow per load:
//   1. take a ticket for the target container
//   2. fetch from the backend
//   3. build the chart / view and render it
//   4. commit; stale results are dropped by the registry
// A failed fetch is logged and becomes localized error text in the
// container. Nothing is retried: the next refresh tick tries again.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::page::ContainerContent;
use super::subscription::{Subscription, Subscriptions};
use crate::api_client::{ApiClient, KlineQuery};
use crate::app_state::AppState;
use crate::chart::candlestick::KLINE_MARGIN;
use crate::chart::indicator::MultiSeriesChart;
use crate::chart::{CandlestickChart, HoverInfo, OrderBookView, ZoomTransform};
use crate::error::DashboardError;
use crate::i18n::{self, Msg};
use crate::market_data::IndicatorKind;
use crate::runtime_config::DataConfig;
use crate::types::{ContainerId, HoverDisplay, Resolution, Viewport};

#[derive(Clone)]
pub struct DashboardController {
    state: Arc<AppState>,
    client: ApiClient,
    urls: DataConfig,
}

impl DashboardController {
    /// Read the endpoint URLs from the page's data-config attributes.
    pub fn new(state: Arc<AppState>, client: ApiClient) -> Result<Self, DashboardError> {
        let dataset = state.config.read().dataset();
        let urls = DataConfig::from_dataset(&dataset)?;
        Ok(Self { state, client, urls })
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    fn indicator_url(&self, kind: IndicatorKind) -> Option<&str> {
        match kind {
            IndicatorKind::Sentiment => self.urls.sentiment_url.as_deref(),
            IndicatorKind::Volatility => self.urls.volatility_url.as_deref(),
            IndicatorKind::Technical => self.urls.technical_url.as_deref(),
        }
    }

    fn committed(&self, container: ContainerId, stored: bool) {
        if stored {
            self.state.increment_version();
            debug!(container = %container, "container updated");
        }
    }

    // -------------------------------------------------------------------------
    // Loads
    // -------------------------------------------------------------------------

    /// Fetch klines for `resolution` and redraw the candlestick chart.
    pub async fn load_klines(&self, resolution: Resolution) -> Result<(), DashboardError> {
        let id = ContainerId::KlineChartContainer;
        let ticket = self.state.page.begin_load(id)?;
        let (limit, viewport, display, locale) = {
            let cfg = self.state.config.read();
            (cfg.kline_limit, cfg.kline_viewport, cfg.hover_display, cfg.locale)
        };

        let query = KlineQuery { resolution, limit };
        let (chart, content) = match self.client.fetch_klines(&self.urls.api_url, &query).await {
            Ok(records) => {
                let chart = CandlestickChart::from_records(&records, viewport, display, locale);
                if chart.is_empty() {
                    (None, ContainerContent::Message(i18n::text(locale, Msg::NoData).into()))
                } else {
                    let svg = chart.render_svg();
                    (Some(chart), ContainerContent::Svg(svg))
                }
            }
            Err(e) => {
                warn!(error = %e, resolution = %resolution, "kline load failed");
                (None, ContainerContent::Error(e.user_message(locale, Msg::KlineLoadFailed)))
            }
        };

        let mut retained = self.state.kline_chart.write();
        let stored = self.state.page.commit(ticket, content)?;
        if stored {
            *retained = chart;
        }
        drop(retained);
        self.committed(id, stored);
        Ok(())
    }

    /// Fetch the latest order-book snapshot and redraw the depth table.
    pub async fn load_order_book(&self) -> Result<(), DashboardError> {
        let id = ContainerId::OrderbookContainer;
        let Some(url) = self.urls.orderbook_url.as_deref() else {
            debug!("no order-book url configured");
            return Ok(());
        };
        let ticket = self.state.page.begin_load(id)?;
        let locale = self.state.config.read().locale;

        let content = match self.client.fetch_order_book(url).await {
            Ok(book) => ContainerContent::Html(OrderBookView::build(Some(&book)).render_html(locale)),
            Err(e) => {
                warn!(error = %e, "order book load failed");
                ContainerContent::Error(e.user_message(locale, Msg::OrderBookLoadFailed))
            }
        };

        let stored = self.state.page.commit(ticket, content)?;
        self.committed(id, stored);
        Ok(())
    }

    /// Fetch one indicator family and redraw its chart.
    pub async fn load_indicator(&self, kind: IndicatorKind) -> Result<(), DashboardError> {
        let id = kind.container();
        let Some(url) = self.indicator_url(kind) else {
            debug!(indicator = %kind, "no url configured");
            return Ok(());
        };
        let ticket = self.state.page.begin_load(id)?;
        let (limit, viewport, locale) = {
            let cfg = self.state.config.read();
            (cfg.indicator_limit, cfg.indicator_viewport, cfg.locale)
        };

        let content = match self.client.fetch_indicators(url, limit).await {
            Ok(records) => {
                let chart = MultiSeriesChart::from_records(kind, &records, viewport, locale);
                if chart.is_empty() {
                    ContainerContent::Message(i18n::text(locale, Msg::NoData).into())
                } else {
                    ContainerContent::Svg(chart.render_svg())
                }
            }
            Err(e) => {
                warn!(error = %e, indicator = %kind, "indicator load failed");
                ContainerContent::Error(e.user_message(locale, Msg::IndicatorLoadFailed))
            }
        };

        let stored = self.state.page.commit(ticket, content)?;
        self.committed(id, stored);
        Ok(())
    }

    /// Switch resolution: the zoom resets because the chart is rebuilt.
    pub async fn select_resolution(&self, resolution: Resolution) -> Result<(), DashboardError> {
        info!(resolution = %resolution, "resolution selected");
        self.state.set_resolution(resolution);
        self.load_klines(resolution).await
    }

    /// Load every registered container once, concurrently.
    pub async fn load_all(&self) {
        let resolution = self.state.resolution();
        let page = &self.state.page;

        let klines = async {
            if page.contains(ContainerId::KlineChartContainer) {
                log_failure("klines", self.load_klines(resolution).await);
            }
        };
        let book = async {
            if page.contains(ContainerId::OrderbookContainer) {
                log_failure("order book", self.load_order_book().await);
            }
        };
        let indicators = futures_util::future::join_all(
            IndicatorKind::ALL
                .into_iter()
                .filter(|k| page.contains(k.container()))
                .map(|k| async move { log_failure("indicator", self.load_indicator(k).await) }),
        );

        tokio::join!(klines, book, indicators);
    }

    /// Initial load plus the periodic refresh loops.
    pub async fn start(&self) -> Subscriptions {
        self.load_all().await;

        let (book_period, indicator_period) = {
            let cfg = self.state.config.read();
            (
                Duration::from_secs(cfg.orderbook_refresh_secs.max(1)),
                Duration::from_secs(cfg.indicator_refresh_secs.max(1)),
            )
        };

        let mut subs = Subscriptions::default();

        if self.urls.orderbook_url.is_some() && self.state.page.contains(ContainerId::OrderbookContainer) {
            let ctl = self.clone();
            subs.push(Subscription::spawn("orderbook", book_period, move || {
                let ctl = ctl.clone();
                async move { log_failure("order book", ctl.load_order_book().await) }
            }));
        }

        for kind in IndicatorKind::ALL {
            if self.indicator_url(kind).is_none() || !self.state.page.contains(kind.container()) {
                continue;
            }
            let ctl = self.clone();
            subs.push(Subscription::spawn(kind.to_string(), indicator_period, move || {
                let ctl = ctl.clone();
                async move { log_failure("indicator", ctl.load_indicator(kind).await) }
            }));
        }

        info!(subscriptions = subs.len(), "dashboard started");
        subs
    }

    // -------------------------------------------------------------------------
    // Kline interactions
    // -------------------------------------------------------------------------

    /// Re-render the retained chart after `f` and publish it. Without a
    /// chart, returns the container's current markup unchanged.
    fn redraw_kline<F>(&self, f: F) -> Result<String, DashboardError>
    where
        F: FnOnce(&mut CandlestickChart),
    {
        let id = ContainerId::KlineChartContainer;
        let mut retained = self.state.kline_chart.write();
        let Some(chart) = retained.as_mut() else {
            return Ok(self.state.page.get(id)?.to_html());
        };
        f(chart);
        let svg = chart.render_svg();
        self.state.page.replace(id, ContainerContent::Svg(svg.clone()))?;
        drop(retained);
        self.committed(id, true);
        Ok(svg)
    }

    pub fn zoom(&self, transform: ZoomTransform) -> Result<String, DashboardError> {
        self.redraw_kline(|chart| {
            let applied = chart.zoom(transform);
            debug!(k = applied.k, x = applied.x, "kline zoom");
        })
    }

    /// Resize the kline chart; later loads use the new viewport too.
    pub fn resize(&self, viewport: Viewport) -> Result<String, DashboardError> {
        self.state.config.write().kline_viewport = viewport;
        self.redraw_kline(|chart| chart.resize(viewport))
    }

    /// Hover at plot-area x `px`. Outside the plot area clears the hover.
    pub fn hover(&self, px: f64) -> Result<Option<HoverInfo>, DashboardError> {
        let mut info = None;
        let mut changed = false;
        {
            let mut retained = self.state.kline_chart.write();
            let Some(chart) = retained.as_mut() else {
                return Ok(None);
            };
            let (w, _) = KLINE_MARGIN.inner(chart.viewport());
            if (0.0..=w).contains(&px) {
                info = chart.hover_at(px);
            } else {
                chart.clear_hover();
            }
            if self.state.config.read().hover_display == HoverDisplay::InfoBar {
                changed = true;
            }
        }
        // The info bar is part of the scene, so the chart must be redrawn.
        if changed {
            self.redraw_kline(|_| {})?;
        }
        Ok(info)
    }
}

fn log_failure(what: &str, result: Result<(), DashboardError>) {
    if let Err(e) = result {
        warn!(error = %e, load = what, "load skipped");
    }
}
