pub mod axis;
pub mod candlestick;
pub mod indicator;
pub mod orderbook;
pub mod scale;
pub mod scene;
pub mod svg;

pub use candlestick::{CandlestickChart, HoverInfo};
pub use indicator::{ChartSpec, ScaleGroup, SeriesSpec};
pub use orderbook::OrderBookView;
pub use scale::ZoomTransform;

use crate::types::Viewport;

/// Space between the viewport edge and the plot area, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margin {
    /// Plot-area `(width, height)` inside `viewport`, never negative.
    pub fn inner(&self, viewport: Viewport) -> (f64, f64) {
        (
            (viewport.width - self.left - self.right).max(0.0),
            (viewport.height - self.top - self.bottom).max(0.0),
        )
    }
}
