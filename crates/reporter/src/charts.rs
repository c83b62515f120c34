//! Standalone SVG charts of the price and return series.

use chrono::{Datelike, NaiveDate};
use core_types::{PriceField, PriceSeries, ReturnSeries};

const WIDTH: i32 = 720;
const HEIGHT: i32 = 320;
const PADDING: f64 = 44.0;
const TITLE_OFFSET: f64 = 18.0;
const PRICE_COLOR: &str = "#348dc1";
const RETURN_COLOR: &str = "#ff9933";
const AXIS_COLOR: &str = "#8c8c8c";

/// Line chart of the selected price against date. `None` when there is nothing to plot.
pub fn price_chart(prices: &PriceSeries, field: PriceField) -> Option<String> {
    let field = prices.effective_field(field);
    let points = prices.closes(field);
    if points.is_empty() {
        return None;
    }

    let (dates, values): (Vec<NaiveDate>, Vec<f64>) = points.into_iter().unzip();
    let (min_v, max_v) = extent(&values, false)?;
    let xs = x_positions(dates.len(), WIDTH as f64);
    let height = HEIGHT as f64;

    let title = format!(
        "{} - {} (last {} days)",
        prices.symbol.to_uppercase(),
        field.label(),
        dates.len()
    );

    let mut svg = svg_header(WIDTH, HEIGHT);
    push_title(&mut svg, &title);
    add_value_labels(&mut svg, min_v, max_v, height, "");

    let coords = xs
        .iter()
        .zip(&values)
        .map(|(x, v)| format!("{x:.2},{y:.2}", y = scale_value(*v, min_v, max_v, height)))
        .collect::<Vec<_>>()
        .join(" ");
    svg.push_str(&format!(
        r#"<polyline fill="none" stroke="{PRICE_COLOR}" stroke-width="1.5" points="{coords}" />"#
    ));

    add_time_axis(&mut svg, &dates, &xs, WIDTH as f64, height);
    svg.push_str(svg_footer());
    Some(svg)
}

/// Bar chart of the daily returns (%) against date, with a zero line.
/// Missing returns are skipped. `None` when no return is defined.
pub fn returns_chart(returns: &ReturnSeries, symbol: &str) -> Option<String> {
    let observations = returns.dated_values();
    if observations.is_empty() {
        return None;
    }

    let (dates, values): (Vec<NaiveDate>, Vec<f64>) = observations.into_iter().unzip();
    let (min_v, max_v) = extent(&values, true)?;
    let width = WIDTH as f64;
    let height = HEIGHT as f64;
    let xs = x_positions(dates.len(), width);

    let slot = (width - 2.0 * PADDING) / dates.len() as f64;
    let bar_width = (slot * 0.8).max(0.5);
    let zero_y = scale_value(0.0, min_v, max_v, height);

    let title = format!("{} - Daily Returns (%)", symbol.to_uppercase());

    let mut svg = svg_header(WIDTH, HEIGHT);
    push_title(&mut svg, &title);
    add_value_labels(&mut svg, min_v, max_v, height, "%");

    for (x, value) in xs.iter().zip(&values) {
        let y = scale_value(*value, min_v, max_v, height);
        let (top, bar_height) = if y < zero_y { (y, zero_y - y) } else { (zero_y, y - zero_y) };
        svg.push_str(&format!(
            r#"<rect x="{x:.2}" y="{top:.2}" width="{bar_width:.2}" height="{bar_height:.2}" fill="{RETURN_COLOR}" />"#,
            x = x - bar_width / 2.0,
        ));
    }

    svg.push_str(&format!(
        r##"<line x1="{x1:.2}" y1="{zero_y:.2}" x2="{x2:.2}" y2="{zero_y:.2}" stroke="#bbbbbb" stroke-width="1" stroke-dasharray="4 3" />"##,
        x1 = PADDING,
        x2 = width - PADDING,
    ));

    add_time_axis(&mut svg, &dates, &xs, width, height);
    svg.push_str(svg_footer());
    Some(svg)
}

/// Escapes the characters that are special in XML text and attributes.
pub(crate) fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn svg_header(width: i32, height: i32) -> String {
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {width} {height}" width="{width}" height="{height}"><style>text{{font-family:Arial,sans-serif;font-size:10px;fill:#666}}</style><rect width="100%" height="100%" fill="#ffffff" />"##
    )
}

fn svg_footer() -> &'static str {
    "</svg>"
}

fn push_title(svg: &mut String, title: &str) {
    svg.push_str(&format!(
        r##"<text x="{x:.2}" y="{TITLE_OFFSET:.2}" text-anchor="middle" font-size="13" fill="#333">{title}</text>"##,
        x = WIDTH as f64 / 2.0,
        title = escape_xml(title),
    ));
}

fn extent(values: &[f64], include_zero: bool) -> Option<(f64, f64)> {
    let mut min_v = f64::INFINITY;
    let mut max_v = f64::NEG_INFINITY;
    for v in values.iter().filter(|v| v.is_finite()) {
        min_v = min_v.min(*v);
        max_v = max_v.max(*v);
    }

    if include_zero {
        min_v = min_v.min(0.0);
        max_v = max_v.max(0.0);
    }

    if !min_v.is_finite() || !max_v.is_finite() {
        return None;
    }

    if min_v == max_v {
        let adjust = if min_v == 0.0 { 1.0 } else { min_v.abs() * 0.1 }; // widen flat ranges
        min_v -= adjust;
        max_v += adjust;
    }

    Some((min_v, max_v))
}

fn scale_value(value: f64, min_v: f64, max_v: f64, height: f64) -> f64 {
    let inner_height = height - 2.0 * PADDING;
    let norm = (value - min_v) / (max_v - min_v);
    PADDING + (1.0 - norm) * inner_height
}

fn x_positions(len: usize, width: f64) -> Vec<f64> {
    if len == 0 {
        return Vec::new();
    }

    if len == 1 {
        return vec![width / 2.0];
    }

    let inner_width = width - 2.0 * PADDING;
    (0..len)
        .map(|i| PADDING + inner_width * (i as f64 / (len - 1) as f64))
        .collect()
}

fn add_value_labels(svg: &mut String, min_v: f64, max_v: f64, height: f64, suffix: &str) {
    for value in [max_v, min_v] {
        let y = scale_value(value, min_v, max_v, height);
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="end">{value:.2}{suffix}</text>"#,
            x = PADDING - 4.0,
            y = y + 3.0,
        ));
    }
}

/// Draws the axis line and one tick per calendar month.
fn add_time_axis(svg: &mut String, dates: &[NaiveDate], xs: &[f64], width: f64, height: f64) {
    let axis_y = height - PADDING + 5.0;

    svg.push_str(&format!(
        r#"<line x1="{x1:.2}" y1="{axis_y:.2}" x2="{x2:.2}" y2="{axis_y:.2}" stroke="{AXIS_COLOR}" stroke-width="1" />"#,
        x1 = PADDING,
        x2 = width - PADDING,
    ));

    // Long series would crowd the axis with monthly labels.
    let month_count = dates
        .windows(2)
        .filter(|w| (w[0].year(), w[0].month()) != (w[1].year(), w[1].month()))
        .count()
        + 1;
    let label_every = month_count.div_ceil(12).max(1);

    let mut last_month: Option<(i32, u32)> = None;
    let mut month_index = 0usize;
    for (date, x) in dates.iter().zip(xs) {
        let key = (date.year(), date.month());
        if last_month == Some(key) {
            continue;
        }
        last_month = Some(key);
        month_index += 1;
        if (month_index - 1) % label_every != 0 {
            continue;
        }

        svg.push_str(&format!(
            r##"<line x1="{x:.2}" y1="{y1:.2}" x2="{x:.2}" y2="{y2:.2}" stroke="#dddddd" stroke-width="0.5" />"##,
            y1 = PADDING,
            y2 = height - PADDING,
        ));
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="middle">{label}</text>"#,
            y = axis_y + 16.0,
            label = date.format("%Y-%m"),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::PricePoint;
    use rust_decimal_macros::dec;

    fn prices() -> PriceSeries {
        let day = |m, d| NaiveDate::from_ymd_opt(2024, m, d).unwrap();
        PriceSeries::new(
            "aapl",
            None,
            vec![
                PricePoint::new(day(1, 30), dec!(100), None),
                PricePoint::new(day(1, 31), dec!(102), None),
                PricePoint::new(day(2, 1), dec!(99), None),
                PricePoint::new(day(2, 2), dec!(101), None),
            ],
        )
        .unwrap()
    }

    #[test]
    fn price_chart_draws_one_vertex_per_point() {
        let svg = price_chart(&prices(), PriceField::Close).unwrap();

        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("AAPL - Close (last 4 days)"));
        let polyline = svg.split("points=\"").nth(1).unwrap();
        let coords = polyline.split('"').next().unwrap();
        assert_eq!(coords.split(' ').count(), 4);
        assert!(svg.contains(">2024-01<"));
        assert!(svg.contains(">2024-02<"));
    }

    #[test]
    fn returns_chart_skips_missing_first_period() {
        let returns = ReturnSeries::from_prices(&prices(), PriceField::Close);
        let svg = returns_chart(&returns, "aapl").unwrap();

        assert_eq!(svg.matches("<rect x=").count(), 3);
        assert!(svg.contains("AAPL - Daily Returns (%)"));
        assert!(svg.contains("stroke-dasharray=\"4 3\""));
    }

    #[test]
    fn empty_inputs_produce_no_chart() {
        assert!(price_chart(&PriceSeries::empty("X"), PriceField::Close).is_none());
        assert!(returns_chart(&ReturnSeries::default(), "X").is_none());
    }

    #[test]
    fn flat_series_still_renders() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let flat = PriceSeries::new(
            "FLAT",
            None,
            vec![
                PricePoint::new(day, dec!(10), None),
                PricePoint::new(day.succ_opt().unwrap(), dec!(10), None),
            ],
        )
        .unwrap();

        let svg = price_chart(&flat, PriceField::Close).unwrap();
        assert!(!svg.contains("NaN"));
    }

    #[test]
    fn title_names_the_field_actually_plotted() {
        // No adjusted values in the fixture, so the raw close is drawn.
        let svg = price_chart(&prices(), PriceField::AdjustedClose).unwrap();
        assert!(svg.contains("AAPL - Close (last 4 days)"));
    }

    #[test]
    fn titles_are_escaped() {
        assert_eq!(escape_xml("S&P <500>"), "S&amp;P &lt;500&gt;");
    }
}
