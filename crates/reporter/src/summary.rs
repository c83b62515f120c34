use analytics::MetricsReport;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{CellAlignment, ContentArrangement, Table};
use core_types::PriceSeries;

/// A two-column console table of the metrics.
pub fn summary_table(symbol: &str, report: &MetricsReport) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![symbol.to_uppercase(), "Value".to_string()]);

    for (metric, value) in report.entries() {
        table.add_row(vec![metric.label().to_string(), value.to_string()]);
    }

    if let Some(column) = table.column_mut(1) {
        column.set_cell_alignment(CellAlignment::Right);
    }
    table
}

/// The last `rows` quotes, newest first.
pub fn recent_prices_table(prices: &PriceSeries, rows: usize) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Date", "Close", "Adj Close"]);

    for point in prices.tail(rows).iter().rev() {
        table.add_row(vec![
            point.date.to_string(),
            point.close.round_dp(2).to_string(),
            point
                .adj_close
                .map_or_else(|| "-".to_string(), |a| a.round_dp(2).to_string()),
        ]);
    }
    table
}
