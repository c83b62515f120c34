//! # PriceLens Reporter
//!
//! Turns a `MetricsReport` and the series it was computed from into documents:
//! SVG charts, a self-contained HTML report and a console summary table.
//!
//! Callers only reach this crate with a successfully computed report; an empty
//! series stops at the analytics engine.

use crate::error::ReportError;
use configuration::ReportConfig;
use core_types::{PriceField, PriceSeries, ReturnSeries};
use std::fs;
use std::path::{Path, PathBuf};

pub mod charts;
pub mod document;
pub mod error;
pub mod interpretation;
pub mod summary;

pub use document::{ReportInput, render_html};
pub use interpretation::{Finding, Thresholds, Tone, interpret};
pub use summary::{recent_prices_table, summary_table};

/// Writes report documents into the configured output directory.
pub struct ReportGenerator {
    config: ReportConfig,
}

impl ReportGenerator {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    /// Renders and writes the HTML report, returning its path.
    pub fn generate(&self, input: &ReportInput<'_>) -> Result<PathBuf, ReportError> {
        fs::create_dir_all(&self.config.output_dir)?;

        let file_name = format!(
            "report_{}_{}.html",
            file_stem(input.symbol),
            input.generated_at.format("%Y%m%d_%H%M%S")
        );
        let path = self.config.output_dir.join(file_name);

        let html = render_html(input, &Thresholds::from(&self.config));
        fs::write(&path, html)?;

        tracing::info!(symbol = input.symbol, path = %path.display(), "Report written.");
        Ok(path)
    }

    /// Writes `{SYMBOL}_price.svg` and `{SYMBOL}_returns.svg`, skipping charts
    /// that have nothing to plot.
    pub fn write_charts(
        &self,
        prices: &PriceSeries,
        returns: &ReturnSeries,
        field: PriceField,
    ) -> Result<Vec<PathBuf>, ReportError> {
        fs::create_dir_all(&self.config.output_dir)?;

        let stem = file_stem(&prices.symbol);
        let charts = [
            ("price", charts::price_chart(prices, field)),
            ("returns", charts::returns_chart(returns, &prices.symbol)),
        ];

        let mut written = Vec::new();
        for (kind, svg) in charts {
            let Some(svg) = svg else {
                tracing::warn!(symbol = %prices.symbol, kind, "No data to plot.");
                continue;
            };
            let path = self.config.output_dir.join(format!("{stem}_{kind}.svg"));
            fs::write(&path, svg)?;
            written.push(path);
        }
        Ok(written)
    }
}

/// Symbols such as `BTC-USD` or `^GSPC` are kept readable but filesystem-safe.
fn file_stem(symbol: &str) -> String {
    symbol
        .to_uppercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
        .collect()
}
