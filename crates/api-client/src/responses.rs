use crate::error::ApiError;
use chrono::{DateTime, NaiveDate};
use core_types::{InstrumentInfo, PricePoint, PriceSeries};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;

// Using `#[serde(rename_all = "camelCase")]` to automatically map from JSON camelCase to Rust snake_case.

/// The envelope of a `GET /v8/finance/chart/{symbol}` response.
#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    pub chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
pub struct ChartEnvelope {
    pub result: Option<Vec<ChartData>>,
    pub error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
pub struct ChartData {
    pub meta: ChartMeta,
    pub timestamp: Option<Vec<i64>>,
    pub indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub symbol: Option<String>,
    pub currency: Option<String>,
    pub exchange_name: Option<String>,
    pub instrument_type: Option<String>,
    pub long_name: Option<String>,
    /// Offset of the exchange time zone from UTC, in seconds.
    pub gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct Indicators {
    pub quote: Vec<Quote>,
    pub adjclose: Option<Vec<AdjClose>>,
}

#[derive(Debug, Deserialize)]
pub struct Quote {
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
pub struct AdjClose {
    #[serde(default)]
    pub adjclose: Vec<Option<f64>>,
}

/// Represents an error response from the Yahoo Finance API.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartError {
    pub code: String,
    pub description: String,
}

/// Parses a chart response body into a daily price series.
///
/// Rows without a close are skipped. Timestamps are shifted into the exchange's
/// time zone before taking the calendar date.
pub fn parse_chart_response(symbol: &str, body: &str) -> Result<PriceSeries, ApiError> {
    let response: ChartResponse =
        serde_json::from_str(body).map_err(|e| ApiError::Deserialization(e.to_string()))?;

    if let Some(error) = response.chart.error {
        return Err(ApiError::Provider {
            code: error.code,
            description: error.description,
        });
    }

    let data = response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| ApiError::NoData(symbol.to_string()))?;

    let timestamps = data.timestamp.unwrap_or_default();
    let closes = data
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();
    let adj_closes = data
        .indicators
        .adjclose
        .and_then(|a| a.into_iter().next())
        .map(|a| a.adjclose)
        .unwrap_or_default();

    let offset = data.meta.gmtoffset.unwrap_or(0);
    let mut points = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        let Some(close) = closes.get(i).copied().flatten() else {
            continue;
        };
        let adj_close = adj_closes.get(i).copied().flatten();

        points.push(PricePoint {
            date: trading_date(*ts, offset)?,
            close: to_decimal(close)?,
            adj_close: adj_close.map(to_decimal).transpose()?,
        });
    }

    let info = InstrumentInfo {
        long_name: data.meta.long_name,
        currency: data.meta.currency,
        exchange: data.meta.exchange_name,
        instrument_type: data.meta.instrument_type,
    };

    let series = PriceSeries::new(symbol, Some(info), points)?;
    Ok(series)
}

fn trading_date(timestamp: i64, gmt_offset: i64) -> Result<NaiveDate, ApiError> {
    DateTime::from_timestamp(timestamp + gmt_offset, 0)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| ApiError::InvalidData(format!("Invalid timestamp: {timestamp}")))
}

fn to_decimal(value: f64) -> Result<Decimal, ApiError> {
    Decimal::from_f64(value).ok_or_else(|| ApiError::InvalidData(format!("Invalid price: {value}")))
}
