// =============================================================================
// Order Book View — two-sided depth table with a mid-price/spread row
// =============================================================================
//
//   header   Price | Amount | Total
//   asks     highest … lowest        (input reversed)
//   spread   Mid price: 100.50 (Spread: 1.00%)
//   bids     as delivered (best first)
//
// Building never fails: a missing snapshot becomes a placeholder.
// =============================================================================

use std::fmt::Write;

use serde::Serialize;

use super::svg::escape;
use crate::i18n::{self, Msg};
use crate::market_data::orderbook::{OrderBookSnapshot, PriceLevel};
use crate::types::Locale;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Ask,
    Bid,
}

/// One formatted table row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookRow {
    pub side: Side,
    pub price: String,
    pub amount: String,
    pub total: String,
}

impl BookRow {
    fn new(side: Side, level: &PriceLevel) -> Self {
        Self {
            side,
            price: format!("{:.2}", level.price),
            amount: format!("{:.6}", level.amount),
            total: format!("{:.2}", level.total()),
        }
    }
}

/// Formatted mid price and spread percentage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpreadRow {
    pub mid: String,
    pub spread_pct: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum OrderBookView {
    /// No snapshot or an unusable one.
    Invalid,
    Book {
        asks: Vec<BookRow>,
        spread: Option<SpreadRow>,
        bids: Vec<BookRow>,
    },
}

impl OrderBookView {
    pub fn build(snapshot: Option<&OrderBookSnapshot>) -> Self {
        let Some(book) = snapshot else {
            return Self::Invalid;
        };

        let rows = |levels: &[PriceLevel], side| -> Vec<BookRow> {
            levels
                .iter()
                .filter(|l| l.is_valid())
                .map(|l| BookRow::new(side, l))
                .collect()
        };

        let mut asks = rows(&book.asks, Side::Ask);
        asks.reverse();
        let bids = rows(&book.bids, Side::Bid);

        let spread = book
            .mid_price()
            .zip(book.spread_pct())
            .map(|(mid, pct)| SpreadRow {
                mid: format!("{mid:.2}"),
                spread_pct: format!("{pct:.2}"),
            });

        Self::Book { asks, spread, bids }
    }

    /// Spread line as shown between the two sides.
    pub fn spread_text(&self, locale: Locale) -> Option<String> {
        match self {
            Self::Invalid => None,
            Self::Book { spread: Some(s), .. } => Some(format!(
                "{}: {} ({}: {}%)",
                i18n::text(locale, Msg::MidPrice),
                s.mid,
                i18n::text(locale, Msg::Spread),
                s.spread_pct
            )),
            Self::Book { spread: None, .. } => Some(i18n::text(locale, Msg::NoMidPrice).to_string()),
        }
    }

    pub fn render_html(&self, locale: Locale) -> String {
        let t = |m| i18n::text(locale, m);
        let Self::Book { asks, bids, .. } = self else {
            return format!(
                r#"<p class="text-muted text-center">{}</p>"#,
                escape(t(Msg::InvalidOrderBook))
            );
        };

        let mut out = String::from(r#"<div class="order-book-container-wrapper">"#);
        let _ = write!(
            out,
            r#"<div class="order-book-header"><span>{}</span><span>{}</span><span>{}</span></div>"#,
            escape(t(Msg::Price)),
            escape(t(Msg::Amount)),
            escape(t(Msg::Total)),
        );

        write_side(&mut out, "order-book-asks", asks, t(Msg::NoAsks));
        let _ = write!(
            out,
            r#"<div class="spread">{}</div>"#,
            escape(&self.spread_text(locale).unwrap_or_default())
        );
        write_side(&mut out, "order-book-bids", bids, t(Msg::NoBids));

        out.push_str("</div>");
        out
    }
}

fn write_side(out: &mut String, class: &str, rows: &[BookRow], empty: &str) {
    let _ = write!(out, r#"<div class="{class}">"#);
    if rows.is_empty() {
        let _ = write!(out, r#"<div class="text-muted">{}</div>"#, escape(empty));
    }
    for row in rows {
        let color = match row.side {
            Side::Ask => "text-danger",
            Side::Bid => "text-success",
        };
        let _ = write!(
            out,
            r#"<div class="order-book-row {color}"><span>{}</span><span>{}</span><span>{}</span></div>"#,
            row.price, row.amount, row.total,
        );
    }
    out.push_str("</div>");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(bids: &[(f64, f64)], asks: &[(f64, f64)]) -> OrderBookSnapshot {
        let levels = |s: &[(f64, f64)]| s.iter().map(|&(p, a)| PriceLevel::new(p, a)).collect();
        OrderBookSnapshot::new(levels(bids), levels(asks))
    }

    #[test]
    fn mid_price_and_spread() {
        let view = OrderBookView::build(Some(&book(&[(100.0, 1.0)], &[(101.0, 1.0)])));
        assert_eq!(
            view.spread_text(Locale::En).unwrap(),
            "Mid price: 100.50 (Spread: 1.00%)"
        );
    }

    #[test]
    fn asks_are_reversed_and_rows_formatted() {
        let view = OrderBookView::build(Some(&book(
            &[(100.0, 1.0), (99.0, 2.0)],
            &[(101.0, 1.0), (102.0, 0.5)],
        )));
        let OrderBookView::Book { asks, bids, .. } = &view else {
            panic!("expected book");
        };
        assert_eq!(asks[0].price, "102.00");
        assert_eq!(asks[0].amount, "0.500000");
        assert_eq!(asks[0].total, "51.00");
        assert_eq!(asks[1].price, "101.00");
        assert_eq!(bids[0].price, "100.00");
        assert_eq!(bids[1].total, "198.00");
    }

    #[test]
    fn html_orders_asks_spread_bids() {
        let html = OrderBookView::build(Some(&book(&[(100.0, 1.0)], &[(101.0, 1.0)]))).render_html(Locale::En);
        let asks = html.find("order-book-asks").unwrap();
        let spread = html.find(r#"class="spread""#).unwrap();
        let bids = html.find("order-book-bids").unwrap();
        assert!(asks < spread && spread < bids);
        assert!(html.contains("<span>Price</span><span>Amount</span><span>Total</span>"));
    }

    #[test]
    fn missing_side_fails_soft() {
        let view = OrderBookView::build(Some(&book(&[(100.0, 1.0)], &[])));
        assert_eq!(view.spread_text(Locale::En).unwrap(), "No data to compute mid price");
        let html = view.render_html(Locale::En);
        assert!(html.contains("No ask data"));
        assert!(html.contains("100.00"));
    }

    #[test]
    fn invalid_levels_are_skipped() {
        let view = OrderBookView::build(Some(&book(&[(f64::NAN, 1.0), (99.0, 1.0)], &[(101.0, 1.0)])));
        let OrderBookView::Book { bids, spread, .. } = &view else {
            panic!("expected book");
        };
        assert_eq!(bids.len(), 1);
        // The first bid is unusable, so no mid price can be computed.
        assert!(spread.is_none());
    }

    #[test]
    fn no_snapshot_renders_placeholder() {
        let view = OrderBookView::build(None);
        assert_eq!(view, OrderBookView::Invalid);
        assert!(view.render_html(Locale::En).contains("Invalid order book data."));
        assert!(view.render_html(Locale::Ru).contains("Некорректные данные стакана."));
    }
}
