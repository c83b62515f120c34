use analytics::MetricsReport;
use configuration::ReportConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Positive,
    Caution,
    Negative,
}

/// One qualitative sentence about the metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub tone: Tone,
    pub text: String,
}

impl Finding {
    fn new(tone: Tone, text: &str) -> Self {
        Self {
            tone,
            text: text.to_string(),
        }
    }
}

/// Thresholds of the two interpretation rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub good_sharpe: f64,
    pub severe_drawdown_pct: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            good_sharpe: 1.0,
            severe_drawdown_pct: -30.0,
        }
    }
}

impl From<&ReportConfig> for Thresholds {
    fn from(config: &ReportConfig) -> Self {
        Self {
            good_sharpe: config.good_sharpe,
            severe_drawdown_pct: config.severe_drawdown_pct,
        }
    }
}

/// Applies the Sharpe rule and the drawdown rule, one sentence each.
pub fn interpret(report: &MetricsReport, thresholds: &Thresholds) -> Vec<Finding> {
    let sharpe = match report.sharpe_ratio {
        Some(s) if s > thresholds.good_sharpe => Finding::new(
            Tone::Positive,
            "The asset shows a good relationship between risk and return.",
        ),
        Some(s) if s > 0.0 => Finding::new(
            Tone::Caution,
            "The asset's return is moderate relative to its risk.",
        ),
        Some(_) => Finding::new(
            Tone::Negative,
            "The asset does not offer an adequate return for the risk taken.",
        ),
        None => Finding::new(
            Tone::Caution,
            "The Sharpe ratio is undefined because returns showed no volatility; risk-adjusted performance cannot be assessed.",
        ),
    };

    let drawdown = if report.max_drawdown_pct < thresholds.severe_drawdown_pct {
        Finding::new(
            Tone::Caution,
            "The asset has experienced significant declines during the analyzed period.",
        )
    } else {
        Finding::new(
            Tone::Positive,
            "Maximum historical declines remain within acceptable ranges.",
        )
    };

    vec![sharpe, drawdown]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(sharpe: Option<f64>, drawdown: f64) -> MetricsReport {
        MetricsReport {
            average_return_pct: 0.1,
            volatility_pct: Some(1.0),
            cumulative_return_pct: 5.0,
            sharpe_ratio: sharpe,
            max_drawdown_pct: drawdown,
            observations: 250,
        }
    }

    fn tones(sharpe: Option<f64>, drawdown: f64) -> (Tone, Tone) {
        let findings = interpret(&report(sharpe, drawdown), &Thresholds::default());
        assert_eq!(findings.len(), 2);
        (findings[0].tone, findings[1].tone)
    }

    #[test]
    fn sharpe_rule_boundaries() {
        assert_eq!(tones(Some(1.5), -5.0).0, Tone::Positive);
        // Exactly 1 is not "greater than 1".
        assert_eq!(tones(Some(1.0), -5.0).0, Tone::Caution);
        assert_eq!(tones(Some(0.3), -5.0).0, Tone::Caution);
        assert_eq!(tones(Some(0.0), -5.0).0, Tone::Negative);
        assert_eq!(tones(Some(-0.4), -5.0).0, Tone::Negative);
    }

    #[test]
    fn drawdown_rule_boundaries() {
        assert_eq!(tones(Some(0.5), -30.5).1, Tone::Caution);
        assert_eq!(tones(Some(0.5), -30.0).1, Tone::Positive);
        assert_eq!(tones(Some(0.5), 0.0).1, Tone::Positive);
    }

    #[test]
    fn undefined_sharpe_gets_its_own_sentence() {
        let findings = interpret(&report(None, -1.0), &Thresholds::default());
        assert!(findings[0].text.contains("undefined"));
    }

    #[test]
    fn thresholds_come_from_config() {
        let config = ReportConfig {
            good_sharpe: 2.0,
            severe_drawdown_pct: -10.0,
            ..ReportConfig::default()
        };
        let findings = interpret(&report(Some(1.5), -12.0), &Thresholds::from(&config));

        assert_eq!(findings[0].tone, Tone::Caution);
        assert_eq!(findings[1].tone, Tone::Caution);
    }
}
