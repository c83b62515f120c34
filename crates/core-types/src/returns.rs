use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::enums::PriceField;
use crate::structs::PriceSeries;

/// An ordered series of period-over-period percentage returns.
///
/// Values are raw percentages: `1.5` means 1.5%. A value is `None` when the return
/// is not defined for that period (the first period of a price series, or a period
/// whose previous price is zero).
///
/// `dates` is either empty (an undated series) or exactly as long as `values`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    dates: Vec<NaiveDate>,
    values: Vec<Option<f64>>,
}

impl ReturnSeries {
    /// Derives daily percentage returns from a price series.
    ///
    /// The price field is resolved once for the whole series, see
    /// [`PriceSeries::effective_field`].
    pub fn from_prices(prices: &PriceSeries, field: PriceField) -> Self {
        let field = prices.effective_field(field);
        let mut dates = Vec::with_capacity(prices.len());
        let mut values = Vec::with_capacity(prices.len());
        let mut previous: Option<Decimal> = None;

        for point in &prices.points {
            let price = point.price(field);
            let value = previous.and_then(|prev| pct_change(prev, price));
            dates.push(point.date);
            values.push(value);
            previous = Some(price);
        }

        tracing::debug!(
            symbol = %prices.symbol,
            field = %field,
            periods = values.len(),
            "Derived return series from prices."
        );

        Self { dates, values }
    }

    /// Wraps returns that were computed elsewhere. Non-finite values are stored as missing.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self {
            dates: Vec::new(),
            values: values.into_iter().map(|v| v.is_finite().then_some(v)).collect(),
        }
    }

    /// Wraps returns that may already contain missing values.
    pub fn from_optional(values: Vec<Option<f64>>) -> Self {
        Self {
            dates: Vec::new(),
            values: values
                .into_iter()
                .map(|v| v.filter(|x| x.is_finite()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Dated observations, skipping missing values. Empty for an undated series.
    pub fn dated_values(&self) -> Vec<(NaiveDate, f64)> {
        self.dates
            .iter()
            .zip(&self.values)
            .filter_map(|(date, value)| value.map(|v| (*date, v)))
            .collect()
    }

    /// The defined returns in chronological order.
    pub fn cleaned(&self) -> Vec<f64> {
        self.values
            .iter()
            .filter_map(|v| v.filter(|x| x.is_finite()))
            .collect()
    }
}

fn pct_change(previous: Decimal, current: Decimal) -> Option<f64> {
    if previous.is_zero() {
        return None;
    }
    let ratio = current.checked_div(previous)?;
    ((ratio - Decimal::ONE) * Decimal::ONE_HUNDRED).to_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::PricePoint;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn series(prices: &[(u32, Decimal, Option<Decimal>)]) -> PriceSeries {
        let points = prices
            .iter()
            .map(|(d, close, adj)| PricePoint::new(day(*d), *close, *adj))
            .collect();
        PriceSeries::new("TEST", None, points).unwrap()
    }

    #[test]
    fn first_period_has_no_return() {
        let prices = series(&[(2, dec!(100), None), (3, dec!(102), None), (4, dec!(99.96), None)]);
        let returns = ReturnSeries::from_prices(&prices, PriceField::Close);

        assert_eq!(returns.len(), 3);
        assert_eq!(returns.values()[0], None);
        assert!((returns.values()[1].unwrap() - 2.0).abs() < 1e-9);
        assert!((returns.values()[2].unwrap() + 2.0).abs() < 1e-9);
        assert_eq!(returns.cleaned().len(), 2);
        assert_eq!(returns.dates(), &[day(2), day(3), day(4)]);
    }

    #[test]
    fn zero_previous_price_yields_missing_value() {
        let prices = series(&[(2, dec!(0), None), (3, dec!(5), None), (4, dec!(10), None)]);
        let returns = ReturnSeries::from_prices(&prices, PriceField::Close);

        assert_eq!(returns.values(), &[None, None, Some(100.0)]);
    }

    #[test]
    fn adjusted_field_uses_adjusted_prices() {
        let prices = series(&[
            (2, dec!(100), Some(dec!(50))),
            (3, dec!(100), Some(dec!(55))),
        ]);

        let raw = ReturnSeries::from_prices(&prices, PriceField::Close);
        let adjusted = ReturnSeries::from_prices(&prices, PriceField::AdjustedClose);

        assert_eq!(raw.cleaned(), vec![0.0]);
        assert!((adjusted.cleaned()[0] - 10.0).abs() < 1e-9);
    }

    #[test]
    fn partially_adjusted_series_never_mixes_fields() {
        let prices = series(&[(2, dec!(100), Some(dec!(50))), (3, dec!(100), None)]);
        let returns = ReturnSeries::from_prices(&prices, PriceField::AdjustedClose);

        assert_eq!(returns.values(), &[None, Some(0.0)]);
    }

    #[test]
    fn from_values_marks_non_finite_as_missing() {
        let returns = ReturnSeries::from_values(vec![1.0, f64::NAN, -2.0, f64::INFINITY]);

        assert_eq!(returns.len(), 4);
        assert_eq!(returns.cleaned(), vec![1.0, -2.0]);
        assert!(returns.dated_values().is_empty());
    }
}
