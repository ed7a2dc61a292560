// =============================================================================
// Candlestick Chart — OHLC series → scene, with zoom, resize and hover
// =============================================================================
//
// `CandlestickChart` retains only the inputs (candles, viewport, zoom, hover).
// Every scene is rebuilt from scratch, so redraws after a resize or zoom can
// never accumulate elements.
//
// Layout:
//   margin {top 20, right 50, bottom 30, left 50}
//   x: time scale over the candle dates, rescaled by the zoom transform
//   y: linear scale over [min(low) * 0.98, max(high) * 1.02]
//   candles are clipped to the inner plot area
// =============================================================================

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::axis::{bottom_axis, left_axis};
use super::scale::{LinearScale, TimeScale, ZoomTransform};
use super::scene::{ClipRect, Scene, Shape, TextAnchor};
use super::svg::render_svg;
use super::Margin;
use crate::i18n::{self, Msg};
use crate::market_data::kline::{normalize_klines, Candle};
use crate::types::{HoverDisplay, Locale, Viewport};

pub const KLINE_MARGIN: Margin = Margin {
    top: 20.0,
    right: 50.0,
    bottom: 30.0,
    left: 50.0,
};

pub const CLIP_ID: &str = "clip-kline";

/// Width used when there are too few candles to measure spacing.
pub const DEFAULT_CANDLE_WIDTH: f64 = 10.0;
/// Narrowest candle body ever drawn.
pub const MIN_CANDLE_WIDTH: f64 = 2.0;
/// Share of the candle interval covered by the body.
const BODY_FILL: f64 = 0.8;

const INFO_BAR_HEIGHT: f64 = 20.0;

const COLOR_UP: &str = "green";
const COLOR_DOWN: &str = "red";

// ---------------------------------------------------------------------------
// Geometry helpers
// ---------------------------------------------------------------------------

/// Body width in pixels at the current scale.
///
/// Uses the median spacing between consecutive candles so a single gap in
/// the series does not inflate every body.
pub fn candle_width(candles: &[Candle], scale: &TimeScale) -> f64 {
    if candles.len() < 2 {
        return DEFAULT_CANDLE_WIDTH;
    }

    let mut deltas: Vec<f64> = candles
        .windows(2)
        .map(|w| (w[1].time_ms() - w[0].time_ms()) as f64)
        .collect();
    let interval = median(&mut deltas);

    let base = candles[0].time_ms() as f64;
    let width = scale.map(base + interval) - scale.map(base);
    (width * BODY_FILL).max(MIN_CANDLE_WIDTH)
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}

/// Index of the candle closest to `t_ms` in a date-sorted slice.
///
/// Binary search; equal distances resolve to the earlier candle, and times
/// outside the series clamp to its first or last candle.
pub fn nearest_candle(candles: &[Candle], t_ms: f64) -> Option<usize> {
    if candles.is_empty() {
        return None;
    }
    let idx = candles.partition_point(|c| (c.time_ms() as f64) < t_ms);
    if idx == 0 {
        return Some(0);
    }
    if idx == candles.len() {
        return Some(candles.len() - 1);
    }
    let before = t_ms - candles[idx - 1].time_ms() as f64;
    let after = candles[idx].time_ms() as f64 - t_ms;
    if after < before {
        Some(idx)
    } else {
        Some(idx - 1)
    }
}

/// One-line OHLC summary shown in the tooltip / info bar.
pub fn hover_text(candle: &Candle, locale: Locale) -> String {
    let t = |m| i18n::text(locale, m);
    format!(
        "{}: {} | {}: {:.2} | {}: {:.2} | {}: {:.2} | {}: {:.2}",
        t(Msg::Date),
        candle.date.format("%Y-%m-%d %H:%M:%S"),
        t(Msg::Open),
        candle.open,
        t(Msg::High),
        candle.high,
        t(Msg::Low),
        candle.low,
        t(Msg::Close),
        candle.close,
    )
}

/// The candle under the cursor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoverInfo {
    pub index: usize,
    pub date: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub text: String,
}

// ---------------------------------------------------------------------------
// CandlestickChart
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CandlestickChart {
    candles: Vec<Candle>,
    viewport: Viewport,
    transform: ZoomTransform,
    hover: Option<usize>,
    display: HoverDisplay,
    locale: Locale,
}

impl CandlestickChart {
    /// Build a chart; candles are (stably) sorted by date.
    pub fn new(mut candles: Vec<Candle>, viewport: Viewport, display: HoverDisplay, locale: Locale) -> Self {
        candles.sort_by_key(|c| c.date);
        Self {
            candles,
            viewport,
            transform: ZoomTransform::IDENTITY,
            hover: None,
            display,
            locale,
        }
    }

    /// Build a chart straight from backend kline records.
    pub fn from_records(
        records: &[serde_json::Value],
        viewport: Viewport,
        display: HoverDisplay,
        locale: Locale,
    ) -> Self {
        Self::new(normalize_klines(records), viewport, display, locale)
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn transform(&self) -> ZoomTransform {
        self.transform
    }

    fn inner_size(&self) -> (f64, f64) {
        KLINE_MARGIN.inner(self.viewport)
    }

    /// Un-zoomed time scale over the full series.
    pub fn base_x_scale(&self) -> Option<TimeScale> {
        let first = self.candles.first()?.time_ms() as f64;
        let last = self.candles.last()?.time_ms() as f64;
        let (w, _) = self.inner_size();
        Some(TimeScale::new((first, last), (0.0, w)))
    }

    /// Time scale as currently zoomed.
    pub fn x_scale(&self) -> Option<TimeScale> {
        self.base_x_scale().map(|s| self.transform.rescale_x(&s))
    }

    pub fn y_scale(&self) -> Option<LinearScale> {
        let low = self.candles.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
        let high = self
            .candles
            .iter()
            .map(|c| c.high)
            .fold(f64::NEG_INFINITY, f64::max);
        if !low.is_finite() || !high.is_finite() {
            return None;
        }
        let (_, h) = self.inner_size();
        Some(LinearScale::new((low * 0.98, high * 1.02), (h, 0.0)))
    }

    // -----------------------------------------------------------------------
    // Interaction
    // -----------------------------------------------------------------------

    /// Apply a zoom/pan transform; returns the constrained transform.
    pub fn zoom(&mut self, transform: ZoomTransform) -> ZoomTransform {
        let (w, _) = self.inner_size();
        self.transform = transform.constrain(w, -KLINE_MARGIN.left, w + KLINE_MARGIN.right);
        self.transform
    }

    /// Change the viewport; the current zoom is re-constrained to it.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        let t = self.transform;
        self.zoom(t);
    }

    /// Select the candle nearest to `px` (plot-area x) on the current scale.
    pub fn hover_at(&mut self, px: f64) -> Option<HoverInfo> {
        let scale = self.x_scale()?;
        let idx = nearest_candle(&self.candles, scale.invert(px))?;
        self.hover = Some(idx);
        let c = &self.candles[idx];
        Some(HoverInfo {
            index: idx,
            date: c.date,
            open: c.open,
            high: c.high,
            low: c.low,
            close: c.close,
            text: hover_text(c, self.locale),
        })
    }

    /// Cursor left the plot area.
    pub fn clear_hover(&mut self) {
        self.hover = None;
    }

    pub fn hovered(&self) -> Option<&Candle> {
        self.hover.and_then(|i| self.candles.get(i))
    }

    // -----------------------------------------------------------------------
    // Scene
    // -----------------------------------------------------------------------

    pub fn scene(&self) -> Scene {
        let mut scene = Scene::new(self.viewport.width, self.viewport.height);
        let (w, h) = self.inner_size();

        let (Some(x), Some(y)) = (self.x_scale(), self.y_scale()) else {
            scene.push(Shape::text(
                self.viewport.width / 2.0,
                self.viewport.height / 2.0,
                i18n::text(self.locale, Msg::NoData),
                TextAnchor::Middle,
            ));
            return scene;
        };

        scene.clips.push(ClipRect {
            id: CLIP_ID.to_string(),
            width: w,
            height: h,
        });

        let bar = candle_width(&self.candles, &x);
        let candles: Vec<Shape> = self
            .candles
            .iter()
            .map(|c| candle_shape(c, &x, &y, bar))
            .collect();

        let mut root = vec![
            Shape::Group {
                id: None,
                class: Some("chart-body".into()),
                translate: None,
                clip_path: Some(CLIP_ID.to_string()),
                children: candles,
            },
            bottom_axis(&x, h),
            left_axis(&y),
        ];

        if self.display == HoverDisplay::InfoBar {
            root.push(self.info_bar(w));
        }

        scene.push(Shape::Group {
            id: None,
            class: Some("chart-root".into()),
            translate: Some((KLINE_MARGIN.left, KLINE_MARGIN.top)),
            clip_path: None,
            children: root,
        });
        scene
    }

    fn info_bar(&self, width: f64) -> Shape {
        let text = self
            .hovered()
            .map(|c| hover_text(c, self.locale))
            .unwrap_or_default();
        let mut bg = Shape::rect(0.0, 0.0, width, INFO_BAR_HEIGHT, "rgba(255, 255, 255, 0.9)");
        if let Shape::Rect { stroke, .. } = &mut bg {
            *stroke = Some("#ffffff".into());
        }
        Shape::Group {
            id: Some("info-box".into()),
            class: Some("info-box".into()),
            translate: Some((0.0, -INFO_BAR_HEIGHT)),
            clip_path: None,
            children: vec![bg, Shape::text(8.0, 14.0, text, TextAnchor::Start).with_class("info-text")],
        }
    }

    pub fn render_svg(&self) -> String {
        render_svg(&self.scene())
    }
}

fn candle_shape(c: &Candle, x: &TimeScale, y: &LinearScale, bar: f64) -> Shape {
    let cx = x.map_date(&c.date);
    let color = if c.is_bearish() { COLOR_DOWN } else { COLOR_UP };

    let wick = Shape::line(cx, y.map(c.high), cx, y.map(c.low), color).with_class("wick");
    let body = Shape::rect(
        cx - bar / 2.0,
        y.map(c.open.max(c.close)),
        bar,
        (y.map(c.open) - y.map(c.close)).abs(),
        color,
    )
    .with_class("candle");

    Shape::group("candle-group", vec![wick, body])
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const DAY_MS: i64 = 86_400_000;

    fn candle_at(ms: i64, open: f64, close: f64) -> Candle {
        Candle {
            date: Utc.timestamp_millis_opt(ms).unwrap(),
            open,
            high: open.max(close) + 1.0,
            low: open.min(close) - 1.0,
            close,
        }
    }

    fn daily(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| candle_at(i as i64 * DAY_MS, 100.0 + i as f64, 101.0 + i as f64))
            .collect()
    }

    fn chart(candles: Vec<Candle>) -> CandlestickChart {
        CandlestickChart::new(candles, Viewport::new(900.0, 450.0), HoverDisplay::Tooltip, Locale::En)
    }

    // ---- candle_width ----------------------------------------------------

    #[test]
    fn width_is_ten_with_fewer_than_two_candles() {
        let scale = TimeScale::new((0.0, 1.0), (0.0, 800.0));
        assert_eq!(candle_width(&[], &scale), 10.0);
        assert_eq!(candle_width(&daily(1), &scale), 10.0);
    }

    #[test]
    fn width_uses_median_spacing() {
        // Spacings: 1d, 1d, 1d, 5d => median 1d even with the gap.
        let mut candles = daily(4);
        candles.push(candle_at(8 * DAY_MS, 1.0, 2.0));
        let scale = TimeScale::new((0.0, 8.0 * DAY_MS as f64), (0.0, 800.0));
        // One day = 100 px, 80% body.
        assert!((candle_width(&candles, &scale) - 80.0).abs() < 1e-9);
    }

    #[test]
    fn width_is_floored_at_two_pixels() {
        let candles = daily(1000);
        let scale = TimeScale::new((0.0, 999.0 * DAY_MS as f64), (0.0, 500.0));
        assert_eq!(candle_width(&candles, &scale), MIN_CANDLE_WIDTH);
    }

    #[test]
    fn width_grows_with_zoom() {
        let c = chart(daily(10));
        let before = candle_width(c.candles(), &c.x_scale().unwrap());
        let mut c = c;
        c.zoom(ZoomTransform::new(4.0, -100.0));
        let after = candle_width(c.candles(), &c.x_scale().unwrap());
        assert!((after - before * 4.0).abs() < 1e-6);
    }

    // ---- nearest_candle --------------------------------------------------

    #[test]
    fn nearest_picks_closest() {
        let candles = daily(3);
        assert_eq!(nearest_candle(&candles, 0.2 * DAY_MS as f64), Some(0));
        assert_eq!(nearest_candle(&candles, 0.7 * DAY_MS as f64), Some(1));
        assert_eq!(nearest_candle(&candles, 2.0 * DAY_MS as f64), Some(2));
    }

    #[test]
    fn nearest_tie_resolves_to_earlier_candle() {
        let candles = daily(3);
        assert_eq!(nearest_candle(&candles, 0.5 * DAY_MS as f64), Some(0));
        assert_eq!(nearest_candle(&candles, 1.5 * DAY_MS as f64), Some(1));
    }

    #[test]
    fn nearest_clamps_outside_range() {
        let candles = daily(3);
        assert_eq!(nearest_candle(&candles, -5.0 * DAY_MS as f64), Some(0));
        assert_eq!(nearest_candle(&candles, 50.0 * DAY_MS as f64), Some(2));
        assert_eq!(nearest_candle(&[], 0.0), None);
    }

    // ---- chart -----------------------------------------------------------

    #[test]
    fn unsorted_input_is_sorted() {
        let mut candles = daily(5);
        candles.reverse();
        let c = chart(candles);
        let times: Vec<i64> = c.candles().iter().map(|c| c.time_ms()).collect();
        let mut sorted = times.clone();
        sorted.sort();
        assert_eq!(times, sorted);
    }

    #[test]
    fn y_domain_pads_low_and_high() {
        let c = chart(daily(3));
        let y = c.y_scale().unwrap();
        assert!((y.domain.0 - 99.0 * 0.98).abs() < 1e-9);
        assert!((y.domain.1 - 104.0 * 1.02).abs() < 1e-9);
    }

    #[test]
    fn scene_has_one_group_per_candle_and_colors_by_direction() {
        let mut candles = daily(4);
        candles[2] = candle_at(2 * DAY_MS, 110.0, 105.0);
        let c = chart(candles);
        let scene = c.scene();
        assert_eq!(scene.find_by_class("candle-group").len(), 4);
        let bodies = scene.find_by_class("candle");
        let fills: Vec<&str> = bodies
            .iter()
            .map(|s| match s {
                Shape::Rect { fill, .. } => fill.as_str(),
                _ => "",
            })
            .collect();
        assert_eq!(fills, vec!["green", "green", "red", "green"]);
    }

    #[test]
    fn resize_redraw_is_idempotent() {
        let mut c = chart(daily(30));
        let first = c.render_svg();
        c.resize(Viewport::new(1200.0, 600.0));
        c.resize(Viewport::new(700.0, 300.0));
        let svg = c.render_svg();

        assert_eq!(svg.matches("<svg").count(), 1);
        assert_eq!(svg.matches(r#"class="candle-group""#).count(), 30);
        assert_eq!(svg.matches(r#"class="x-axis""#).count(), 1);
        assert_eq!(svg.matches(r#"class="y-axis""#).count(), 1);
        assert_eq!(svg.matches("<clipPath").count(), 1);
        assert!(svg.contains(r#"width="700""#));

        c.resize(Viewport::new(900.0, 450.0));
        assert_eq!(c.render_svg(), first);
    }

    #[test]
    fn hover_uses_zoomed_scale() {
        let mut c = chart(daily(10));
        // Zoomed x2 and panned so the plot starts at day 4.5.
        let (w, _) = KLINE_MARGIN.inner(c.viewport());
        let t = c.zoom(ZoomTransform::new(2.0, -w));
        assert!((t.x + w).abs() < 1e-9);
        let info = c.hover_at(0.0).unwrap();
        assert_eq!(info.index, 4);
        assert!(info.text.starts_with("Date: 1970-01-05 00:00:00 | Open: 104.00"));
    }

    #[test]
    fn info_bar_shows_hovered_candle() {
        let mut c = CandlestickChart::new(daily(3), Viewport::new(600.0, 300.0), HoverDisplay::InfoBar, Locale::En);
        assert!(c.render_svg().contains(r#"id="info-box""#));
        c.hover_at(10_000.0);
        assert!(c.render_svg().contains("Close: 103.00"));
        c.clear_hover();
        assert!(!c.render_svg().contains("Close: 103.00"));
    }

    #[test]
    fn empty_chart_renders_no_data_message() {
        let c = chart(Vec::new());
        assert!(c.is_empty());
        let svg = c.render_svg();
        assert!(svg.contains("No data to display"));
        assert!(!svg.contains("candle-group"));
    }
}
