use crate::MarketDataClient;
use crate::error::ApiError;
use async_trait::async_trait;
use chrono::NaiveDate;
use core_types::PriceSeries;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Identifies one retrieval request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl CacheKey {
    pub fn new(symbol: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            start,
            end,
        }
    }
}

/// An explicit, caller-controlled cache in front of any `MarketDataClient`.
///
/// Successful, non-empty responses are stored per `(symbol, start, end)` and served
/// until the caller invalidates them. Errors and empty series are never stored.
pub struct PriceCache<C> {
    inner: C,
    entries: Mutex<HashMap<CacheKey, PriceSeries>>,
}

impl<C: MarketDataClient> PriceCache<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<PriceSeries> {
        self.lock().get(key).cloned()
    }

    /// Drops one entry. Returns whether it was present.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.lock().remove(key).is_some()
    }

    /// Drops every entry for `symbol`, whatever its range. Returns how many were dropped.
    pub fn invalidate_symbol(&self, symbol: &str) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|key, _| key.symbol != symbol);
        before - entries.len()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    // The map holds plain data, so a poisoned lock is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, PriceSeries>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl<C: MarketDataClient> MarketDataClient for PriceCache<C> {
    async fn fetch_daily_prices(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, ApiError> {
        let key = CacheKey::new(symbol, start, end);
        if let Some(hit) = self.get(&key) {
            tracing::debug!(symbol, %start, %end, "Price cache hit.");
            return Ok(hit);
        }

        let series = self.inner.fetch_daily_prices(symbol, start, end).await?;
        if !series.is_empty() {
            self.lock().insert(key, series.clone());
        }
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::PricePoint;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls and serves a fixed one-point series, or fails for "FAIL".
    #[derive(Default)]
    struct CountingClient {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MarketDataClient for CountingClient {
        async fn fetch_daily_prices(
            &self,
            symbol: &str,
            start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<PriceSeries, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match symbol {
                "FAIL" => Err(ApiError::NoData(symbol.to_string())),
                "EMPTY" => Ok(PriceSeries::empty(symbol)),
                _ => Ok(PriceSeries::new(
                    symbol,
                    None,
                    vec![PricePoint::new(start, Decimal::ONE_HUNDRED, None)],
                )?),
            }
        }
    }

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn calls(cache: &PriceCache<CountingClient>) -> usize {
        cache.inner().calls.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn repeated_request_is_served_from_cache() {
        let cache = PriceCache::new(CountingClient::default());

        let first = cache.fetch_daily_prices("AAPL", date(1, 1), date(6, 30)).await.unwrap();
        let second = cache.fetch_daily_prices("AAPL", date(1, 1), date(6, 30)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(calls(&cache), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn different_range_is_a_different_entry() {
        let cache = PriceCache::new(CountingClient::default());

        cache.fetch_daily_prices("AAPL", date(1, 1), date(6, 30)).await.unwrap();
        cache.fetch_daily_prices("AAPL", date(2, 1), date(6, 30)).await.unwrap();

        assert_eq!(calls(&cache), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn invalidation_forces_refetch() {
        let cache = PriceCache::new(CountingClient::default());
        let key = CacheKey::new("MSFT", date(1, 1), date(3, 1));

        cache.fetch_daily_prices("MSFT", key.start, key.end).await.unwrap();
        assert!(cache.invalidate(&key));
        assert!(!cache.invalidate(&key));

        cache.fetch_daily_prices("MSFT", key.start, key.end).await.unwrap();
        assert_eq!(calls(&cache), 2);
    }

    #[tokio::test]
    async fn invalidate_symbol_drops_all_ranges() {
        let cache = PriceCache::new(CountingClient::default());
        cache.fetch_daily_prices("TSLA", date(1, 1), date(2, 1)).await.unwrap();
        cache.fetch_daily_prices("TSLA", date(1, 1), date(3, 1)).await.unwrap();
        cache.fetch_daily_prices("AAPL", date(1, 1), date(3, 1)).await.unwrap();

        assert_eq!(cache.invalidate_symbol("TSLA"), 2);
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn failures_and_empty_series_are_not_cached() {
        let cache = PriceCache::new(CountingClient::default());

        assert!(cache.fetch_daily_prices("FAIL", date(1, 1), date(2, 1)).await.is_err());
        assert!(cache.fetch_daily_prices("FAIL", date(1, 1), date(2, 1)).await.is_err());
        let empty = cache.fetch_daily_prices("EMPTY", date(1, 1), date(2, 1)).await.unwrap();

        assert!(empty.is_empty());
        assert!(cache.is_empty());
        assert_eq!(calls(&cache), 3);
    }
}
