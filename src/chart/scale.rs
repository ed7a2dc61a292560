// =============================================================================
// Scales & Zoom — domain/range projections used by every chart
// =============================================================================
//
// Time is carried as epoch milliseconds in f64 so zoomed (fractional) domains
// stay exact enough for pixel work.
// =============================================================================

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Timelike, Utc};

// -----------------------------------------------------------------------------
// Linear scale
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn map(&self, v: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = d1 - d0;
        if span == 0.0 || !span.is_finite() {
            return (r0 + r1) / 2.0;
        }
        r0 + (v - d0) / span * (r1 - r0)
    }

    pub fn invert(&self, px: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = r1 - r0;
        if span == 0.0 {
            return (d0 + d1) / 2.0;
        }
        d0 + (px - r0) / span * (d1 - d0)
    }

    /// Roughly `count` round-numbered ticks inside the domain.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (lo, hi) = ordered(self.domain);
        if !lo.is_finite() || !hi.is_finite() {
            return Vec::new();
        }
        if lo == hi {
            return vec![lo];
        }
        let step = tick_step(lo, hi, count.max(1));
        let first = (lo / step).ceil();
        let last = (hi / step).floor();
        let n = (last - first) as i64;
        (0..=n).map(|i| (first + i as f64) * step).collect()
    }
}

fn ordered((a, b): (f64, f64)) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Step of 1, 2 or 5 × 10^n that yields about `count` ticks over [lo, hi].
pub fn tick_step(lo: f64, hi: f64, count: usize) -> f64 {
    let raw = (hi - lo).abs() / count as f64;
    let power = 10f64.powf(raw.log10().floor());
    let error = raw / power;
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    factor * power
}

/// Min/max of the finite values, if any.
pub fn extent<I: IntoIterator<Item = f64>>(values: I) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

// -----------------------------------------------------------------------------
// Time scale
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    inner: LinearScale,
}

const SECOND: i64 = 1_000;
const MINUTE: i64 = 60 * SECOND;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

/// Fixed-width tick intervals, smallest first.
const FIXED_INTERVALS: &[i64] = &[
    SECOND,
    5 * SECOND,
    15 * SECOND,
    30 * SECOND,
    MINUTE,
    5 * MINUTE,
    15 * MINUTE,
    30 * MINUTE,
    HOUR,
    3 * HOUR,
    6 * HOUR,
    12 * HOUR,
    DAY,
    2 * DAY,
    7 * DAY,
];

impl TimeScale {
    /// Domain in epoch milliseconds.
    pub fn new(domain_ms: (f64, f64), range: (f64, f64)) -> Self {
        Self {
            inner: LinearScale::new(domain_ms, range),
        }
    }

    pub fn domain(&self) -> (f64, f64) {
        self.inner.domain
    }

    pub fn range(&self) -> (f64, f64) {
        self.inner.range
    }

    pub fn map(&self, t_ms: f64) -> f64 {
        self.inner.map(t_ms)
    }

    pub fn map_date(&self, date: &DateTime<Utc>) -> f64 {
        self.map(date.timestamp_millis() as f64)
    }

    /// Pixel → epoch milliseconds.
    pub fn invert(&self, px: f64) -> f64 {
        self.inner.invert(px)
    }

    /// Ticks (epoch ms) at calendar-friendly boundaries.
    pub fn ticks(&self, count: usize) -> Vec<i64> {
        let (lo, hi) = ordered(self.inner.domain);
        if !lo.is_finite() || !hi.is_finite() {
            return Vec::new();
        }
        let (lo, hi) = (lo.ceil() as i64, hi.floor() as i64);
        if lo >= hi {
            return vec![lo];
        }
        let target = ((hi - lo) as f64 / count.max(1) as f64).max(1.0);

        if let Some(&step) = FIXED_INTERVALS.iter().find(|&&s| s as f64 >= target) {
            let first = lo.div_euclid(step) * step;
            let first = if first < lo { first + step } else { first };
            return (0..)
                .map(|i| first + i * step)
                .take_while(|t| *t <= hi)
                .collect();
        }

        let months = if target <= 31.0 * DAY as f64 {
            1
        } else if target <= 92.0 * DAY as f64 {
            3
        } else {
            let years = (target / (365.0 * DAY as f64)).ceil().max(1.0) as i32;
            return year_ticks(lo, hi, years);
        };
        month_ticks(lo, hi, months)
    }
}

fn to_utc(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

fn month_start(year: i32, month: u32) -> Option<i64> {
    NaiveDate::from_ymd_opt(year, month, 1)?
        .and_hms_opt(0, 0, 0)
        .map(|n| Utc.from_utc_datetime(&n).timestamp_millis())
}

fn month_ticks(lo: i64, hi: i64, every: u32) -> Vec<i64> {
    let Some(start) = to_utc(lo) else {
        return Vec::new();
    };
    let mut year = start.year();
    let mut month = start.month0() / every * every;
    let mut out = Vec::new();
    loop {
        let Some(t) = month_start(year, month + 1) else {
            break;
        };
        if t > hi {
            break;
        }
        if t >= lo {
            out.push(t);
        }
        month += every;
        if month >= 12 {
            month -= 12;
            year += 1;
        }
    }
    out
}

fn year_ticks(lo: i64, hi: i64, every: i32) -> Vec<i64> {
    let (Some(a), Some(b)) = (to_utc(lo), to_utc(hi)) else {
        return Vec::new();
    };
    let first = a.year().div_euclid(every) * every;
    (0..)
        .map(|i| first + i * every)
        .take_while(|y| *y <= b.year())
        .filter_map(|y| month_start(y, 1))
        .filter(|t| *t >= lo && *t <= hi)
        .collect()
}

/// Label for a time tick, choosing the coarsest field that changed.
pub fn format_time_tick(ms: i64) -> String {
    let Some(t) = to_utc(ms) else {
        return String::new();
    };
    if t.second() != 0 {
        t.format(":%S").to_string()
    } else if t.minute() != 0 || t.hour() != 0 {
        t.format("%H:%M").to_string()
    } else if t.day() != 1 {
        t.format("%b %d").to_string()
    } else if t.month() != 1 {
        t.format("%B").to_string()
    } else {
        t.format("%Y").to_string()
    }
}

/// Label for a value tick: trims trailing zeros, keeps up to 6 decimals.
pub fn format_value_tick(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    let s = format!("{v:.6}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    s.to_string()
}

// -----------------------------------------------------------------------------
// Zoom transform
// -----------------------------------------------------------------------------

/// Horizontal zoom/pan state: pixel `px` maps to `px * k + x`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ZoomTransform {
    pub k: f64,
    pub x: f64,
}

pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 40.0;

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ZoomTransform {
    pub const IDENTITY: ZoomTransform = ZoomTransform { k: 1.0, x: 0.0 };

    pub fn new(k: f64, x: f64) -> Self {
        Self { k, x }
    }

    pub fn invert_x(&self, px: f64) -> f64 {
        (px - self.x) / self.k
    }

    /// Rescale `scale`'s domain so the zoomed view maps onto the same range.
    pub fn rescale_x(&self, scale: &TimeScale) -> TimeScale {
        let (r0, r1) = scale.range();
        let d0 = scale.invert(self.invert_x(r0));
        let d1 = scale.invert(self.invert_x(r1));
        TimeScale::new((d0, d1), (r0, r1))
    }

    /// Clamp `k` to [`MIN_ZOOM`, `MAX_ZOOM`] and shift `x` so the viewport
    /// `[0, view_width]` never leaves the translate extent `[tx0, tx1]`.
    pub fn constrain(&self, view_width: f64, tx0: f64, tx1: f64) -> Self {
        let k = if self.k.is_finite() {
            self.k.clamp(MIN_ZOOM, MAX_ZOOM)
        } else {
            MIN_ZOOM
        };
        let x = if self.x.is_finite() { self.x } else { 0.0 };
        let t = Self { k, x };

        let dx0 = t.invert_x(0.0) - tx0;
        let dx1 = t.invert_x(view_width) - tx1;
        let shift = if dx1 > dx0 {
            (dx0 + dx1) / 2.0
        } else {
            let low = dx0.min(0.0);
            if low != 0.0 {
                low
            } else {
                dx1.max(0.0)
            }
        };
        Self { k, x: x + k * shift }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn linear_map_and_invert() {
        let s = LinearScale::new((0.0, 100.0), (400.0, 0.0));
        assert!(approx(s.map(25.0), 300.0));
        assert!(approx(s.invert(300.0), 25.0));
    }

    #[test]
    fn degenerate_domain_maps_to_midpoint() {
        let s = LinearScale::new((5.0, 5.0), (0.0, 100.0));
        assert!(approx(s.map(5.0), 50.0));
    }

    #[test]
    fn linear_ticks_are_round() {
        let s = LinearScale::new((0.0, 1.0), (0.0, 100.0));
        let ticks = s.ticks(10);
        assert_eq!(ticks.len(), 11);
        assert!(approx(ticks[3], 0.3));

        let s = LinearScale::new((95.3, 112.7), (0.0, 100.0));
        let ticks = s.ticks(10);
        assert!(approx(ticks[0], 96.0));
        assert!(ticks.iter().all(|t| (t % 2.0).abs() < 1e-9));
    }

    #[test]
    fn extent_ignores_non_finite() {
        assert_eq!(extent(vec![3.0, f64::NAN, -1.0, 7.0]), Some((-1.0, 7.0)));
        assert_eq!(extent(Vec::<f64>::new()), None);
    }

    #[test]
    fn time_ticks_pick_daily_boundaries() {
        let day0 = 1_704_067_200_000_f64; // 2024-01-01
        let s = TimeScale::new((day0, day0 + 10.0 * DAY as f64), (0.0, 800.0));
        let ticks = s.ticks(10);
        assert_eq!(ticks.len(), 11);
        assert!(ticks.iter().all(|t| t % DAY == 0));
        assert_eq!(format_time_tick(ticks[0]), "2024");
        assert_eq!(format_time_tick(ticks[1]), "Jan 02");
    }

    #[test]
    fn time_ticks_use_months_for_long_spans() {
        let jan = 1_704_067_200_000_f64; // 2024-01-01
        let s = TimeScale::new((jan, jan + 300.0 * DAY as f64), (0.0, 800.0));
        let ticks = s.ticks(10);
        assert!(!ticks.is_empty());
        for t in &ticks {
            let d = Utc.timestamp_millis_opt(*t).unwrap();
            assert_eq!(d.day(), 1);
        }
    }

    #[test]
    fn intraday_tick_labels() {
        // 2024-01-01 13:30:00
        assert_eq!(format_time_tick(1_704_115_800_000), "13:30");
        assert_eq!(format_time_tick(1_704_115_815_000), ":15");
        assert_eq!(format_time_tick(1_706_745_600_000), "February");
    }

    #[test]
    fn value_tick_labels_trim_zeros() {
        assert_eq!(format_value_tick(100.0), "100");
        assert_eq!(format_value_tick(0.25), "0.25");
        assert_eq!(format_value_tick(0.0001), "0.0001");
    }

    #[test]
    fn identity_rescale_keeps_domain() {
        let s = TimeScale::new((0.0, 1000.0), (0.0, 100.0));
        let r = ZoomTransform::IDENTITY.rescale_x(&s);
        assert!(approx(r.domain().0, 0.0));
        assert!(approx(r.domain().1, 1000.0));
    }

    #[test]
    fn zoom_narrows_domain() {
        let s = TimeScale::new((0.0, 1000.0), (0.0, 100.0));
        let r = ZoomTransform::new(2.0, -50.0).rescale_x(&s);
        assert!(approx(r.domain().0, 250.0));
        assert!(approx(r.domain().1, 750.0));
    }

    #[test]
    fn constrain_clamps_scale_factor() {
        let t = ZoomTransform::new(100.0, 0.0).constrain(800.0, -50.0, 850.0);
        assert!(approx(t.k, MAX_ZOOM));
        let t = ZoomTransform::new(0.2, 0.0).constrain(800.0, -50.0, 850.0);
        assert!(approx(t.k, MIN_ZOOM));
    }

    #[test]
    fn constrain_limits_panning_to_margins() {
        // Dragging far right stops once the left margin is reached.
        let t = ZoomTransform::new(1.0, 500.0).constrain(800.0, -50.0, 850.0);
        assert!(approx(t.x, 50.0));
        // Dragging far left stops at the right margin.
        let t = ZoomTransform::new(1.0, -500.0).constrain(800.0, -50.0, 850.0);
        assert!(approx(t.x, -50.0));
        // Zoomed in, panning inside the extent is untouched.
        let t = ZoomTransform::new(4.0, -1200.0).constrain(800.0, -50.0, 850.0);
        assert!(approx(t.x, -1200.0));
    }
}
