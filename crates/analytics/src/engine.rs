use crate::error::AnalyticsError;
use crate::report::MetricsReport;
use core_types::ReturnSeries;

/// A stateless calculator for deriving risk/return statistics from a return series.
#[derive(Debug, Default)]
pub struct StatisticsEngine {}

impl StatisticsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The main entry point for calculating the metrics of a return series.
    ///
    /// Missing values are dropped first; the remaining returns keep their
    /// chronological order.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `MetricsReport`, or `AnalyticsError::EmptyInput`
    /// when no defined returns remain.
    pub fn compute(&self, returns: &ReturnSeries) -> Result<MetricsReport, AnalyticsError> {
        let cleaned = returns.cleaned();
        if cleaned.is_empty() {
            return Err(AnalyticsError::EmptyInput);
        }

        let average = mean(&cleaned);
        let volatility = sample_std_dev(&cleaned);

        // Zero risk-free rate.
        let sharpe_ratio = match volatility {
            Some(vol) if vol != 0.0 => Some(average / vol),
            _ => {
                tracing::warn!(
                    observations = cleaned.len(),
                    "Volatility is zero or undefined; Sharpe ratio is undefined."
                );
                None
            }
        };

        let report = MetricsReport {
            average_return_pct: average,
            volatility_pct: volatility,
            cumulative_return_pct: cumulative_return_pct(&cleaned),
            sharpe_ratio,
            max_drawdown_pct: max_drawdown_pct(&cleaned),
            observations: cleaned.len(),
        };

        tracing::debug!(?report, "Computed metrics.");
        Ok(report)
    }
}

/// Arithmetic mean. Zero for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (N-1 denominator). `None` for fewer than two values.
///
/// Identical values give exactly `0.0`, even when their mean is not exactly
/// representable.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let first = values[0];
    if values.iter().all(|v| *v == first) {
        return Some(0.0);
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Compounded return of percentage returns, as a percentage.
pub fn cumulative_return_pct(returns_pct: &[f64]) -> f64 {
    let growth = returns_pct
        .iter()
        .fold(1.0, |acc, r| acc * (1.0 + r / 100.0));
    (growth - 1.0) * 100.0
}

/// Drawdown from the running peak of the compounded path, one value per return,
/// as fractions (`-0.02` is a 2% decline).
pub fn drawdown_series(returns_pct: &[f64]) -> Vec<f64> {
    let mut wealth = 1.0_f64;
    let mut peak = f64::NEG_INFINITY;

    returns_pct
        .iter()
        .map(|r| {
            wealth *= 1.0 + r / 100.0;
            peak = peak.max(wealth);
            if peak > 0.0 { wealth / peak - 1.0 } else { 0.0 }
        })
        .collect()
}

/// The deepest drawdown, as a percentage. Zero for a path that never declines.
pub fn max_drawdown_pct(returns_pct: &[f64]) -> f64 {
    let deepest = drawdown_series(returns_pct)
        .into_iter()
        .fold(0.0_f64, f64::min);
    deepest * 100.0
}
