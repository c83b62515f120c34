use crate::charts::{self, escape_xml};
use crate::interpretation::{Thresholds, Tone, interpret};
use analytics::MetricsReport;
use chrono::NaiveDateTime;
use core_types::{PriceField, PriceSeries, ReturnSeries};
use std::fmt::Write;

/// Everything a report is rendered from.
#[derive(Debug, Clone, Copy)]
pub struct ReportInput<'a> {
    pub symbol: &'a str,
    pub prices: &'a PriceSeries,
    pub returns: &'a ReturnSeries,
    pub metrics: &'a MetricsReport,
    pub price_field: PriceField,
    pub generated_at: NaiveDateTime,
}

/// Rows of the recent-prices table, newest first.
const RECENT_ROWS: usize = 10;

const STYLE: &str = r#"
body { font-family: Helvetica, Arial, sans-serif; color: #222; margin: 32px auto; max-width: 760px; }
h1 { color: #003366; text-align: center; font-size: 24px; margin-bottom: 4px; }
h2 { color: #005599; font-size: 16px; margin-top: 28px; }
.generated { text-align: center; color: #666; font-size: 12px; }
.info { font-size: 13px; color: #444; }
table.metrics { border-collapse: collapse; margin: 0 auto; width: 420px; }
table.metrics th { background: #005599; color: #fff; padding: 6px 10px; font-size: 13px; }
table.metrics td { background: #f5f5f5; border: 1px solid #999; padding: 5px 10px; text-align: center; font-size: 13px; }
.finding { font-size: 13px; margin: 6px 0; }
.finding.positive::before { content: "\2714  "; color: #2e7d32; }
.finding.caution::before { content: "\26A0  "; color: #ef6c00; }
.finding.negative::before { content: "\2716  "; color: #c62828; }
.chart { page-break-inside: avoid; margin: 18px 0; text-align: center; }
.charts { page-break-before: always; }
footer { margin-top: 36px; font-size: 11px; color: #777; }
@page { size: A4; margin: 18mm; }
"#;

/// Renders the report as a single self-contained HTML document.
pub fn render_html(input: &ReportInput<'_>, thresholds: &Thresholds) -> String {
    let symbol = escape_xml(&input.symbol.to_uppercase());
    let mut html = String::with_capacity(16 * 1024);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(html, "<title>Financial Report - {symbol}</title>");
    let _ = writeln!(html, "<style>{STYLE}</style>\n</head>\n<body>");

    // Header
    let _ = writeln!(html, "<h1>Financial Report - {symbol}</h1>");
    let _ = writeln!(
        html,
        "<p class=\"generated\">Generated on: {}</p>",
        input.generated_at.format("%d/%m/%Y %H:%M")
    );
    push_instrument_info(&mut html, input);

    // Metrics table
    html.push_str("<h2>Statistical Summary</h2>\n");
    html.push_str("<table class=\"metrics\">\n<tr><th>Metric</th><th>Value</th></tr>\n");
    for (metric, value) in input.metrics.entries() {
        let _ = writeln!(html, "<tr><td>{}</td><td>{value}</td></tr>", escape_xml(metric.label()));
    }
    html.push_str("</table>\n");

    // Interpretation
    html.push_str("<h2>Performance Interpretation</h2>\n");
    for finding in interpret(input.metrics, thresholds) {
        let class = match finding.tone {
            Tone::Positive => "positive",
            Tone::Caution => "caution",
            Tone::Negative => "negative",
        };
        let _ = writeln!(html, "<p class=\"finding {class}\">{}</p>", escape_xml(&finding.text));
    }

    // Recent prices
    let recent = input.prices.tail(RECENT_ROWS);
    if !recent.is_empty() {
        html.push_str("<h2>Recent Prices</h2>\n");
        html.push_str(
            "<table class=\"metrics\">\n<tr><th>Date</th><th>Close</th><th>Adj Close</th></tr>\n",
        );
        for point in recent.iter().rev() {
            let adj = point
                .adj_close
                .map_or_else(|| "-".to_string(), |a| a.round_dp(2).to_string());
            let _ = writeln!(
                html,
                "<tr><td>{}</td><td>{}</td><td>{adj}</td></tr>",
                point.date,
                point.close.round_dp(2)
            );
        }
        html.push_str("</table>\n");
    }

    // Charts
    let price_chart = charts::price_chart(input.prices, input.price_field);
    let returns_chart = charts::returns_chart(input.returns, input.symbol);
    if price_chart.is_some() || returns_chart.is_some() {
        html.push_str("<section class=\"charts\">\n<h2>Charts</h2>\n");
        for svg in [price_chart, returns_chart].into_iter().flatten() {
            let _ = writeln!(html, "<div class=\"chart\">{svg}</div>");
        }
        html.push_str("</section>\n");
    }

    html.push_str(
        "<footer>Generated automatically by the PriceLens financial data analysis system.</footer>\n",
    );
    html.push_str("</body>\n</html>\n");
    html
}

fn push_instrument_info(html: &mut String, input: &ReportInput<'_>) {
    let mut parts = Vec::new();
    if let Some(info) = &input.prices.info {
        if let Some(name) = &info.long_name {
            parts.push(escape_xml(name));
        }
        if let Some(exchange) = &info.exchange {
            parts.push(format!("Exchange: {}", escape_xml(exchange)));
        }
        if let Some(currency) = &info.currency {
            parts.push(format!("Currency: {}", escape_xml(currency)));
        }
    }
    if let Some((first, last)) = input.prices.date_range() {
        parts.push(format!("Period: {first} to {last}"));
    }
    parts.push(format!(
        "Returns from {} ({} observations)",
        input.prices.effective_field(input.price_field).label(),
        input.metrics.observations
    ));

    let _ = writeln!(html, "<p class=\"info\">{}</p>", parts.join(" &middot; "));
}

#[cfg(test)]
mod tests {
    use super::*;
    use analytics::StatisticsEngine;
    use chrono::NaiveDate;
    use core_types::{InstrumentInfo, PricePoint};
    use rust_decimal_macros::dec;

    fn fixture() -> (PriceSeries, ReturnSeries) {
        let day = |d| NaiveDate::from_ymd_opt(2024, 4, d).unwrap();
        let prices = PriceSeries::new(
            "msft",
            Some(InstrumentInfo {
                long_name: Some("Microsoft Corporation".to_string()),
                currency: Some("USD".to_string()),
                exchange: Some("NMS".to_string()),
                instrument_type: Some("EQUITY".to_string()),
            }),
            vec![
                PricePoint::new(day(1), dec!(100), None),
                PricePoint::new(day(2), dec!(102), None),
                PricePoint::new(day(3), dec!(100.98), None),
                PricePoint::new(day(4), dec!(104.0094), None),
            ],
        )
        .unwrap();
        let returns = ReturnSeries::from_prices(&prices, PriceField::Close);
        (prices, returns)
    }

    fn generated_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 4, 5)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    #[test]
    fn document_has_title_timestamp_table_and_interpretation() {
        let (prices, returns) = fixture();
        let metrics = StatisticsEngine::new().compute(&returns).unwrap();
        let input = ReportInput {
            symbol: "msft",
            prices: &prices,
            returns: &returns,
            metrics: &metrics,
            price_field: PriceField::Close,
            generated_at: generated_at(),
        };

        let html = render_html(&input, &Thresholds::default());

        assert!(html.contains("<h1>Financial Report - MSFT</h1>"));
        assert!(html.contains("Generated on: 05/04/2024 09:30"));
        assert!(html.contains("Microsoft Corporation"));
        assert!(html.contains("<tr><th>Metric</th><th>Value</th></tr>"));
        // Five metric rows plus the four recent prices.
        assert_eq!(html.matches("<tr><td>").count(), 9);
        assert!(html.contains("Returns from Close (3 observations)"));
        assert!(html.contains("<tr><td>Average Return (%)</td><td>1.33</td></tr>"));
        assert_eq!(html.matches("class=\"finding ").count(), 2);
        assert_eq!(html.matches("<svg").count(), 2);
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn recent_prices_are_listed_newest_first() {
        let (prices, returns) = fixture();
        let metrics = StatisticsEngine::new().compute(&returns).unwrap();
        let input = ReportInput {
            symbol: "msft",
            prices: &prices,
            returns: &returns,
            metrics: &metrics,
            price_field: PriceField::AdjustedClose,
            generated_at: generated_at(),
        };

        let html = render_html(&input, &Thresholds::default());

        assert!(html.contains("<h2>Recent Prices</h2>"));
        let newest = html.find("<tr><td>2024-04-04</td><td>104.01</td><td>-</td></tr>").unwrap();
        let oldest = html.find("<tr><td>2024-04-01</td><td>100</td><td>-</td></tr>").unwrap();
        assert!(newest < oldest);
        // No adjusted prices in the fixture, so the raw close is what returns use.
        assert!(html.contains("Returns from Close ("));
    }

    #[test]
    fn undefined_sharpe_is_rendered_as_text() {
        let (prices, _) = fixture();
        let flat = ReturnSeries::from_values(vec![0.0, 0.0, 0.0]);
        let metrics = StatisticsEngine::new().compute(&flat).unwrap();
        let input = ReportInput {
            symbol: "flat",
            prices: &prices,
            returns: &flat,
            metrics: &metrics,
            price_field: PriceField::Close,
            generated_at: generated_at(),
        };

        let html = render_html(&input, &Thresholds::default());

        assert!(html.contains("<tr><td>Sharpe Ratio</td><td>undefined</td></tr>"));
        assert!(!html.contains("NaN"));
        // The undated series has no return chart, the price chart remains.
        assert_eq!(html.matches("<svg").count(), 1);
    }
}
