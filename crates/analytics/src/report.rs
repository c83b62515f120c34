use serde::{Deserialize, Serialize};
use std::fmt;

/// The five statistics produced for a return series.
///
/// This struct is the final output of the `StatisticsEngine` and the data transfer
/// object consumed by the report and chart renderers. All percentages are raw
/// percentage values (`2.5` means 2.5%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub average_return_pct: f64,
    pub volatility_pct: Option<f64>, // Option<> because a single observation has no sample stdev
    pub cumulative_return_pct: f64,
    pub sharpe_ratio: Option<f64>, // Option<> for cases with zero volatility
    pub max_drawdown_pct: f64,

    /// Number of returns left after dropping missing values.
    pub observations: usize,
}

/// The fixed key set of a `MetricsReport`, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    AverageReturn,
    Volatility,
    CumulativeReturn,
    SharpeRatio,
    MaxDrawdown,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::AverageReturn,
        Metric::Volatility,
        Metric::CumulativeReturn,
        Metric::SharpeRatio,
        Metric::MaxDrawdown,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Metric::AverageReturn => "Average Return (%)",
            Metric::Volatility => "Volatility (%)",
            Metric::CumulativeReturn => "Cumulative Return (%)",
            Metric::SharpeRatio => "Sharpe Ratio",
            Metric::MaxDrawdown => "Max Drawdown (%)",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A metric value, or the explicit marker for a metric that is not defined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Value(f64),
    Undefined,
}

impl MetricValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Value(v) => Some(*v),
            MetricValue::Undefined => None,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, MetricValue::Undefined)
    }
}

impl From<Option<f64>> for MetricValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(MetricValue::Undefined, MetricValue::Value)
    }
}

/// Two decimals by default; the precision flag is honoured when given.
impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Value(v) => {
                let precision = f.precision().unwrap_or(2);
                write!(f, "{v:.precision$}")
            }
            MetricValue::Undefined => f.write_str("undefined"),
        }
    }
}

/// Non-fatal conditions detected while computing a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricWarning {
    /// Volatility is zero or undefined, so the Sharpe ratio has no value.
    UndefinedSharpe,
    /// Fewer than two observations, so the sample volatility has no value.
    UndefinedVolatility,
}

impl fmt::Display for MetricWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricWarning::UndefinedSharpe => {
                f.write_str("Sharpe ratio is undefined because volatility is zero")
            }
            MetricWarning::UndefinedVolatility => {
                f.write_str("Volatility is undefined for fewer than two observations")
            }
        }
    }
}

impl MetricsReport {
    pub fn get(&self, metric: Metric) -> MetricValue {
        match metric {
            Metric::AverageReturn => MetricValue::Value(self.average_return_pct),
            Metric::Volatility => self.volatility_pct.into(),
            Metric::CumulativeReturn => MetricValue::Value(self.cumulative_return_pct),
            Metric::SharpeRatio => self.sharpe_ratio.into(),
            Metric::MaxDrawdown => MetricValue::Value(self.max_drawdown_pct),
        }
    }

    /// All five metrics in reporting order.
    pub fn entries(&self) -> [(Metric, MetricValue); 5] {
        Metric::ALL.map(|metric| (metric, self.get(metric)))
    }

    pub fn warnings(&self) -> Vec<MetricWarning> {
        let mut warnings = Vec::new();
        if self.volatility_pct.is_none() {
            warnings.push(MetricWarning::UndefinedVolatility);
        }
        if self.sharpe_ratio.is_none() {
            warnings.push(MetricWarning::UndefinedSharpe);
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(sharpe: Option<f64>) -> MetricsReport {
        MetricsReport {
            average_return_pct: 0.6,
            volatility_pct: Some(2.0736),
            cumulative_return_pct: 2.9485,
            sharpe_ratio: sharpe,
            max_drawdown_pct: -2.0,
            observations: 5,
        }
    }

    #[test]
    fn entries_follow_reporting_order() {
        let keys: Vec<_> = report(Some(0.29)).entries().iter().map(|(m, _)| *m).collect();
        assert_eq!(keys, Metric::ALL.to_vec());
    }

    #[test]
    fn undefined_displays_as_text() {
        assert_eq!(MetricValue::Undefined.to_string(), "undefined");
        assert_eq!(MetricValue::Value(1.23456).to_string(), "1.23");
        assert_eq!(format!("{:.4}", MetricValue::Value(1.23456)), "1.2346");
    }

    #[test]
    fn undefined_sharpe_is_distinct_from_zero() {
        let undefined = report(None);
        let zero = report(Some(0.0));

        assert!(undefined.get(Metric::SharpeRatio).is_undefined());
        assert_eq!(zero.get(Metric::SharpeRatio), MetricValue::Value(0.0));
        assert_eq!(undefined.warnings(), vec![MetricWarning::UndefinedSharpe]);
        assert!(zero.warnings().is_empty());
    }

    #[test]
    fn undefined_serializes_as_null() {
        let json = serde_json::to_value(report(None)).unwrap();
        assert!(json["sharpe_ratio"].is_null());
        assert_eq!(json["observations"], 5);

        let value = serde_json::to_value(MetricValue::Undefined).unwrap();
        assert!(value.is_null());
    }
}
