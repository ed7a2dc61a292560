// =============================================================================
// Indicator Charts — multi-series line charts driven by a ChartSpec
// =============================================================================
//
// The three indicator panels (sentiment, volatility, technical) differ only
// in which keys they plot, their colors and how series share y scales. All
// three are `MultiSeriesChart` with a preset `ChartSpec`.
//
// Scales:
//   Auto(name)       extent of every non-null value of every series in the
//                    group (after `factor`)
//   Fixed(min, max)  constant domain
// The left axis shows the first series' scale.
// =============================================================================

use std::fmt::Write;

use serde_json::Value;

use super::axis::{bottom_axis, left_axis};
use super::scale::{extent, LinearScale, TimeScale};
use super::scene::{Scene, Shape, TextAnchor};
use super::svg::{num, render_svg};
use super::Margin;
use crate::i18n::{self, Msg};
use crate::market_data::indicators::{to_chronological, IndicatorKind, IndicatorRecord};
use crate::types::{Locale, Viewport};

pub const INDICATOR_MARGIN: Margin = Margin {
    top: 20.0,
    right: 30.0,
    bottom: 50.0,
    left: 60.0,
};

const LEGEND_ROW: f64 = 20.0;

// ---------------------------------------------------------------------------
// Chart description
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScaleGroup {
    /// Shared auto-extent scale, keyed by name.
    Auto(&'static str),
    /// Constant domain.
    Fixed(f64, f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSpec {
    /// Record field to plot.
    pub key: &'static str,
    /// Legend label; `None` folds the series into an earlier entry.
    pub label: Option<&'static str>,
    pub color: &'static str,
    pub stroke_width: f64,
    pub scale: ScaleGroup,
    /// Multiplier applied to every raw value.
    pub factor: f64,
}

impl SeriesSpec {
    fn new(key: &'static str, label: &'static str, color: &'static str, scale: ScaleGroup) -> Self {
        Self {
            key,
            label: Some(label),
            color,
            stroke_width: 1.5,
            scale,
            factor: 1.0,
        }
    }

    fn value(&self, record: &IndicatorRecord) -> Option<f64> {
        record.get(self.key).map(|v| v * self.factor)
    }
}

/// Horizontal dashed guide at `value` on the `scale` group.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceLine {
    pub value: f64,
    pub scale: ScaleGroup,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: &'static str,
    pub series: Vec<SeriesSpec>,
    pub reference_lines: Vec<ReferenceLine>,
    pub legend_width: f64,
}

impl ChartSpec {
    pub fn for_kind(kind: IndicatorKind) -> Self {
        match kind {
            IndicatorKind::Sentiment => Self::sentiment(),
            IndicatorKind::Volatility => Self::volatility(),
            IndicatorKind::Technical => Self::technical(),
        }
    }

    pub fn sentiment() -> Self {
        Self {
            title: "Sentiment",
            series: vec![
                SeriesSpec::new("open_interest", "Open Interest", "steelblue", ScaleGroup::Auto("open_interest")),
                SeriesSpec::new("funding_rate", "Funding Rate", "red", ScaleGroup::Auto("funding_rate")),
                SeriesSpec::new("long_short_ratio", "L/S Ratio", "green", ScaleGroup::Auto("long_short_ratio")),
            ],
            reference_lines: Vec::new(),
            legend_width: 150.0,
        }
    }

    pub fn volatility() -> Self {
        let atr = ScaleGroup::Auto("atr");
        let vwap = ScaleGroup::Auto("vwap");
        let band = |key| SeriesSpec {
            stroke_width: 1.0,
            ..SeriesSpec::new(key, "VWAP Bands", "lightgreen", vwap)
        };
        Self {
            title: "Volatility / Liquidity",
            series: vec![
                SeriesSpec::new("atr_14", "ATR 14", "blue", atr),
                SeriesSpec::new("atr_21", "ATR 21", "orange", atr),
                SeriesSpec::new("vwap", "VWAP", "green", vwap),
                band("vwap_high_band"),
                SeriesSpec {
                    label: None,
                    ..band("vwap_low_band")
                },
            ],
            reference_lines: Vec::new(),
            legend_width: 150.0,
        }
    }

    pub fn technical() -> Self {
        let ema = ScaleGroup::Auto("ema");
        let stoch = ScaleGroup::Fixed(0.0, 100.0);
        let pct = |key, label, color| SeriesSpec {
            factor: 100.0,
            ..SeriesSpec::new(key, label, color, stoch)
        };
        Self {
            title: "Technical",
            series: vec![
                SeriesSpec::new("ema_20", "EMA 20", "#FF6B6B", ema),
                SeriesSpec::new("ema_50", "EMA 50", "#4ECDC4", ema),
                SeriesSpec::new("ema_100", "EMA 100", "#45B7D1", ema),
                SeriesSpec::new("ema_200", "EMA 200", "#96CEB4", ema),
                pct("stoch_rsi_k", "Stoch RSI K", "#FFEAA7"),
                pct("stoch_rsi_d", "Stoch RSI D", "#FD79A8"),
            ],
            reference_lines: vec![
                ReferenceLine { value: 20.0, scale: stoch },
                ReferenceLine { value: 80.0, scale: stoch },
            ],
            legend_width: 180.0,
        }
    }

    /// Distinct legend entries `(label, color)` in series order.
    pub fn legend_entries(&self) -> Vec<(&'static str, &'static str)> {
        let mut out: Vec<(&'static str, &'static str)> = Vec::new();
        for s in &self.series {
            if let Some(label) = s.label {
                if !out.iter().any(|(l, _)| *l == label) {
                    out.push((label, s.color));
                }
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Geometry helpers
// ---------------------------------------------------------------------------

/// SVG path data that lifts the pen over undefined points.
pub fn line_path<I>(points: I) -> String
where
    I: IntoIterator<Item = Option<(f64, f64)>>,
{
    let mut d = String::new();
    let mut pen_down = false;
    for p in points {
        match p {
            Some((x, y)) => {
                let cmd = if pen_down { 'L' } else { 'M' };
                let _ = write!(d, "{cmd}{},{}", num(x), num(y));
                pen_down = true;
            }
            None => pen_down = false,
        }
    }
    d
}

/// Domain for an auto scale; never empty or zero-width.
fn auto_domain<I: IntoIterator<Item = f64>>(values: I) -> (f64, f64) {
    match extent(values) {
        None => (0.0, 1.0),
        Some((lo, hi)) if lo == hi => (lo - 0.5, hi + 0.5),
        Some(d) => d,
    }
}

// ---------------------------------------------------------------------------
// MultiSeriesChart
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct MultiSeriesChart {
    spec: ChartSpec,
    records: Vec<IndicatorRecord>,
    viewport: Viewport,
    locale: Locale,
}

impl MultiSeriesChart {
    /// `records` must already be oldest-first.
    pub fn new(spec: ChartSpec, records: Vec<IndicatorRecord>, viewport: Viewport, locale: Locale) -> Self {
        Self {
            spec,
            records,
            viewport,
            locale,
        }
    }

    /// Build the preset chart for `kind` from newest-first backend records.
    pub fn from_records(kind: IndicatorKind, records: &[Value], viewport: Viewport, locale: Locale) -> Self {
        Self::new(ChartSpec::for_kind(kind), to_chronological(records), viewport, locale)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn y_scale(&self, group: ScaleGroup, height: f64) -> LinearScale {
        let domain = match group {
            ScaleGroup::Fixed(lo, hi) => (lo, hi),
            ScaleGroup::Auto(_) => auto_domain(
                self.spec
                    .series
                    .iter()
                    .filter(|s| s.scale == group)
                    .flat_map(|s| self.records.iter().filter_map(move |r| s.value(r))),
            ),
        };
        LinearScale::new(domain, (height, 0.0))
    }

    pub fn scene(&self) -> Scene {
        let mut scene = Scene::new(self.viewport.width, self.viewport.height);
        let t = |m| i18n::text(self.locale, m);

        let (Some(first), Some(last)) = (self.records.first(), self.records.last()) else {
            scene.push(Shape::text(
                self.viewport.width / 2.0,
                self.viewport.height / 2.0,
                t(Msg::NoData),
                TextAnchor::Middle,
            ));
            return scene;
        };

        let (w, h) = INDICATOR_MARGIN.inner(self.viewport);
        let x = TimeScale::new(
            (first.time.timestamp_millis() as f64, last.time.timestamp_millis() as f64),
            (0.0, w),
        );

        let mut scales: Vec<(ScaleGroup, LinearScale)> = Vec::new();
        for s in &self.spec.series {
            if !scales.iter().any(|(g, _)| *g == s.scale) {
                scales.push((s.scale, self.y_scale(s.scale, h)));
            }
        }
        let scale_of = |g: ScaleGroup| {
            scales
                .iter()
                .find(|(k, _)| *k == g)
                .map(|(_, s)| *s)
                .unwrap_or_else(|| self.y_scale(g, h))
        };

        let mut body = vec![bottom_axis(&x, h)];
        if let Some(s) = self.spec.series.first() {
            body.push(left_axis(&scale_of(s.scale)));
        }

        for s in &self.spec.series {
            let y = scale_of(s.scale);
            let d = line_path(self.records.iter().map(|r| {
                s.value(r)
                    .map(|v| (x.map(r.time.timestamp_millis() as f64), y.map(v)))
            }));
            body.push(Shape::Path {
                d,
                stroke: s.color.to_string(),
                stroke_width: s.stroke_width,
                class: Some("line".into()),
            });
        }

        for r in &self.spec.reference_lines {
            let y = scale_of(r.scale).map(r.value);
            body.push(Shape::Line {
                x1: 0.0,
                y1: y,
                x2: w,
                y2: y,
                stroke: "gray".into(),
                stroke_width: 1.0,
                dash: Some("5,5".into()),
                class: Some("reference-line".into()),
            });
        }

        body.push(self.legend());

        scene.push(Shape::Group {
            id: None,
            class: Some("chart-root".into()),
            translate: Some((INDICATOR_MARGIN.left, INDICATOR_MARGIN.top)),
            clip_path: None,
            children: body,
        });

        // Axis titles sit on the svg root, outside the plot translate.
        scene.push(
            Shape::text(w / 2.0, h + INDICATOR_MARGIN.top + 30.0, t(Msg::Time), TextAnchor::Middle)
                .with_class("axis-label"),
        );
        scene.push(Shape::Text {
            x: -(h / 2.0),
            y: 12.0,
            content: t(Msg::Values).to_string(),
            anchor: TextAnchor::Middle,
            font_size: 12.0,
            rotate: Some(-90.0),
            class: Some("axis-label".into()),
        });
        scene
    }

    fn legend(&self) -> Shape {
        let entries = self.spec.legend_entries();
        let mut bg = Shape::rect(
            0.0,
            0.0,
            self.spec.legend_width,
            entries.len() as f64 * LEGEND_ROW + 10.0,
            "white",
        );
        if let Shape::Rect { stroke, opacity, .. } = &mut bg {
            *stroke = Some("black".into());
            *opacity = Some(0.8);
        }

        let mut children = vec![bg];
        for (i, (label, color)) in entries.into_iter().enumerate() {
            let row = i as f64 * LEGEND_ROW;
            children.push(Shape::Circle {
                cx: 10.0,
                cy: 15.0 + row,
                r: 5.0,
                fill: color.to_string(),
            });
            children.push(Shape::text(20.0, 20.0 + row, label, TextAnchor::Start));
        }

        Shape::Group {
            id: None,
            class: Some("legend".into()),
            translate: Some((10.0, 10.0)),
            clip_path: None,
            children,
        }
    }

    pub fn render_svg(&self) -> String {
        render_svg(&self.scene())
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(n: usize) -> Vec<Value> {
        // Newest first, as the backend sends them.
        (0..n)
            .rev()
            .map(|i| {
                json!({
                    "transaction_time": 1_700_000_000 + i as i64 * 3600,
                    "ema_20": 100.0 + i as f64,
                    "ema_50": if i == 1 { Value::Null } else { json!(90.0 + i as f64) },
                    "ema_100": 80.0,
                    "ema_200": 70.0,
                    "stoch_rsi_k": 0.5,
                    "stoch_rsi_d": 0.25,
                })
            })
            .collect()
    }

    fn chart(kind: IndicatorKind, n: usize) -> MultiSeriesChart {
        MultiSeriesChart::from_records(kind, &records(n), Viewport::new(800.0, 400.0), Locale::En)
    }

    fn paths(scene: &Scene) -> Vec<String> {
        scene
            .find_by_class("line")
            .into_iter()
            .filter_map(|s| match s {
                Shape::Path { d, .. } => Some(d.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn line_path_breaks_on_gaps() {
        let d = line_path(vec![Some((0.0, 1.0)), Some((1.0, 2.0)), None, Some((3.0, 4.5))]);
        assert_eq!(d, "M0,1L1,2M3,4.5");
        assert_eq!(line_path(vec![None, None]), "");
    }

    #[test]
    fn presets_share_scales() {
        let v = ChartSpec::volatility();
        assert_eq!(v.series[0].scale, v.series[1].scale);
        assert_eq!(v.series[2].scale, v.series[4].scale);
        assert_ne!(v.series[0].scale, v.series[2].scale);

        let s = ChartSpec::sentiment();
        assert_ne!(s.series[0].scale, s.series[1].scale);

        let t = ChartSpec::technical();
        assert_eq!(t.series[4].scale, ScaleGroup::Fixed(0.0, 100.0));
        assert_eq!(t.series[5].factor, 100.0);
        assert_eq!(t.reference_lines.len(), 2);
    }

    #[test]
    fn vwap_bands_share_one_legend_entry() {
        let labels: Vec<&str> = ChartSpec::volatility()
            .legend_entries()
            .into_iter()
            .map(|(l, _)| l)
            .collect();
        assert_eq!(labels, vec!["ATR 14", "ATR 21", "VWAP", "VWAP Bands"]);
    }

    #[test]
    fn technical_scene_has_every_series_and_guides() {
        let c = chart(IndicatorKind::Technical, 4);
        let scene = c.scene();
        let d = paths(&scene);
        assert_eq!(d.len(), 6);
        // ema_50 is null at the second record: its path restarts once.
        assert_eq!(d[1].matches('M').count(), 2);
        assert_eq!(scene.find_by_class("reference-line").len(), 2);
        assert_eq!(scene.find_by_class("legend").len(), 1);
    }

    #[test]
    fn stoch_values_are_scaled_to_percent() {
        let c = chart(IndicatorKind::Technical, 3);
        let (_, h) = INDICATOR_MARGIN.inner(Viewport::new(800.0, 400.0));
        let d = &paths(&c.scene())[4];
        // 0.5 × 100 on [0, 100] lands mid-height.
        assert!(d.starts_with(&format!("M0,{}", num(h / 2.0))));
    }

    #[test]
    fn records_are_drawn_oldest_first() {
        let c = chart(IndicatorKind::Technical, 3);
        // ema_20 rises over time: the leftmost point sits lowest (largest y).
        let d = &paths(&c.scene())[0];
        let ys: Vec<f64> = d
            .split(['M', 'L'])
            .filter(|p| !p.is_empty())
            .map(|p| p.split(',').nth(1).unwrap().parse().unwrap())
            .collect();
        assert_eq!(ys.len(), 3);
        assert!(ys[0] > ys[1] && ys[1] > ys[2]);
    }

    #[test]
    fn missing_series_emits_empty_path() {
        // Technical records carry no sentiment fields.
        let c = chart(IndicatorKind::Sentiment, 3);
        assert!(paths(&c.scene()).iter().all(|d| d.is_empty()));
    }

    #[test]
    fn axis_labels_are_localized() {
        let c = MultiSeriesChart::from_records(
            IndicatorKind::Volatility,
            &records(2),
            Viewport::new(800.0, 400.0),
            Locale::Ru,
        );
        let svg = c.render_svg();
        assert!(svg.contains("Время"));
        assert!(svg.contains("Значения"));
        assert!(svg.contains(r#"transform="rotate(-90)""#));
    }

    #[test]
    fn empty_input_shows_no_data() {
        let c = chart(IndicatorKind::Sentiment, 0);
        assert!(c.is_empty());
        let svg = c.render_svg();
        assert!(svg.contains("No data to display"));
        assert!(!svg.contains("legend"));
    }
}
