use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::enums::PriceField;
use crate::error::CoreError;

/// A single daily quote for an instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: Decimal,
    /// Dividend/split-adjusted close, when the provider reports one.
    pub adj_close: Option<Decimal>,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: Decimal, adj_close: Option<Decimal>) -> Self {
        Self { date, close, adj_close }
    }

    /// Returns the price selected by `field`.
    pub fn price(&self, field: PriceField) -> Decimal {
        match field {
            PriceField::Close => self.close,
            PriceField::AdjustedClose => self.adj_close.unwrap_or(self.close),
        }
    }
}

/// Descriptive metadata about an instrument, as reported by the data provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstrumentInfo {
    pub long_name: Option<String>,
    pub currency: Option<String>,
    pub exchange: Option<String>,
    pub instrument_type: Option<String>,
}

/// An ordered series of daily quotes for one instrument.
///
/// Points are kept in ascending date order with at most one point per date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    pub info: Option<InstrumentInfo>,
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Builds a series, sorting the points by date.
    ///
    /// When two points share a date the later one in the input wins. Negative
    /// prices are rejected.
    pub fn new(
        symbol: impl Into<String>,
        info: Option<InstrumentInfo>,
        mut points: Vec<PricePoint>,
    ) -> Result<Self, CoreError> {
        let symbol = symbol.into();

        if let Some(bad) = points
            .iter()
            .find(|p| p.close.is_sign_negative() || p.adj_close.is_some_and(|a| a.is_sign_negative()))
        {
            let value = if bad.close.is_sign_negative() {
                bad.close
            } else {
                bad.adj_close.unwrap_or(bad.close)
            };
            return Err(CoreError::InvalidInput(
                format!("{symbol} price on {}", bad.date),
                format!("negative price {value}"),
            ));
        }

        // Stable sort keeps input order for equal dates, so the last duplicate wins below.
        points.sort_by_key(|p| p.date);
        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }

        Ok(Self {
            symbol,
            info,
            points: deduped,
        })
    }

    /// The value a retrieval failure degrades to.
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            info: None,
            points: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date)),
            _ => None,
        }
    }

    /// The field actually read for the whole series.
    ///
    /// `AdjustedClose` is only honoured when every point carries an adjusted value;
    /// otherwise the series falls back to `Close` as a whole, so that no return
    /// compares a raw price with an adjusted one.
    pub fn effective_field(&self, field: PriceField) -> PriceField {
        match field {
            PriceField::AdjustedClose if self.points.iter().any(|p| p.adj_close.is_none()) => {
                if !self.points.is_empty() {
                    tracing::debug!(symbol = %self.symbol, "Adjusted close incomplete, reading close.");
                }
                PriceField::Close
            }
            other => other,
        }
    }

    /// The selected price as `f64`, paired with its date. Used for plotting.
    pub fn closes(&self, field: PriceField) -> Vec<(NaiveDate, f64)> {
        let field = self.effective_field(field);
        self.points
            .iter()
            .filter_map(|p| p.price(field).to_f64().map(|v| (p.date, v)))
            .collect()
    }

    /// The last `n` points, oldest first.
    pub fn tail(&self, n: usize) -> &[PricePoint] {
        &self.points[self.points.len().saturating_sub(n)..]
    }
}
