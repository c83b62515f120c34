use crate::error::ApiError;
use async_trait::async_trait;
use chrono::{Days, NaiveDate, NaiveTime};
use configuration::DataConfig;
use core_types::PriceSeries;

pub mod cache;
pub mod error;
pub mod responses;
// --- Public API ---
pub use cache::{CacheKey, PriceCache};
pub use responses::parse_chart_response;

/// The generic, abstract interface for a market-data provider.
/// This trait is the contract that the CLI uses, allowing the underlying
/// implementation (live, cached or mock) to be swapped out.
#[async_trait]
pub trait MarketDataClient: Send + Sync {
    /// Fetches daily quotes for `symbol` between `start` and `end`, both inclusive.
    async fn fetch_daily_prices(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, ApiError>;
}

/// A concrete implementation of the `MarketDataClient` for Yahoo Finance.
#[derive(Clone)]
pub struct YahooClient {
    client: reqwest::Client,
    base_url: String,
}

impl YahooClient {
    pub fn new(config: &DataConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl MarketDataClient for YahooClient {
    async fn fetch_daily_prices(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, ApiError> {
        let url = format!("{}/{}", self.base_url, symbol);
        // period2 is exclusive, so ask for the midnight after `end`.
        let period1 = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        let period2 = (end + Days::new(1)).and_time(NaiveTime::MIN).and_utc().timestamp();

        tracing::info!(symbol, %start, %end, "Fetching daily prices.");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "div,split".to_string()),
                ("includeAdjustedClose", "true".to_string()),
            ])
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        // Yahoo reports unknown symbols with a 404 and a regular chart error body.
        let series = parse_chart_response(symbol, &text).map_err(|e| match e {
            ApiError::Deserialization(msg) if !status.is_success() => {
                ApiError::Deserialization(format!("HTTP {status}: {msg}"))
            }
            other => other,
        })?;

        tracing::debug!(symbol, points = series.len(), "Received daily prices.");
        Ok(series)
    }
}

/// The `(start, end)` window covering the last `days` calendar days up to `today`.
pub fn lookback_window(days: u32, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = today
        .checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN);
    (start, today)
}

/// Fetches prices, degrading any retrieval failure to an empty series.
///
/// The failure is logged here; the empty series then surfaces as an empty-input
/// error from the statistics engine.
pub async fn load_prices_or_empty<C>(
    client: &C,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> PriceSeries
where
    C: MarketDataClient + ?Sized,
{
    match client.fetch_daily_prices(symbol, start, end).await {
        Ok(series) => series,
        Err(e) => {
            tracing::error!(symbol, error = %e, "Could not retrieve prices.");
            PriceSeries::empty(symbol)
        }
    }
}
