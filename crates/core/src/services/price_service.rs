use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;

use crate::errors::CoreError;
use crate::models::price::{PriceCache, PriceSeries};
use crate::providers::steam_market::SteamMarketProvider;
use crate::providers::traits::PriceLookup;
use crate::utils::cancel::CancelSignal;
use crate::utils::rate_limiter::RateLimiter;

/// Price used whenever no real price can be determined.
pub const DEFAULT_PRICE: f64 = 0.01;

/// Where price series come from. The market provider is the production
/// source; tests plug in canned series.
#[async_trait]
pub trait PriceSeriesSource: Send + Sync {
    async fn fetch_price_series(&self, item: &str) -> Result<PriceSeries, CoreError>;
}

#[async_trait]
impl PriceSeriesSource for SteamMarketProvider {
    async fn fetch_price_series(&self, item: &str) -> Result<PriceSeries, CoreError> {
        SteamMarketProvider::fetch_price_series(self, item).await
    }
}

/// Historical container prices with lazy per-item caching.
///
/// Cache and limiter are shared handles so several services (one per run)
/// can reuse fetched series and keep a common market request pace.
///
/// Cache strategy:
/// - **First lookup of an item**: wait for the rate limiter, fetch the whole
///   series once, cache it for the TTL (24 h by default).
/// - **Later lookups**: served from the cache until the entry is found stale
///   on read.
/// - **Fetch failures** are not cached, the next lookup tries again. A series
///   that parsed but is empty is cached like any other.
pub struct PriceService {
    source: Arc<dyn PriceSeriesSource>,
    cache: Arc<PriceCache>,
    limiter: Arc<RateLimiter>,
    cancel: CancelSignal,
}

impl PriceService {
    pub fn new(
        source: Arc<dyn PriceSeriesSource>,
        cache: Arc<PriceCache>,
        limiter: Arc<RateLimiter>,
        cancel: CancelSignal,
    ) -> Self {
        Self {
            source,
            cache,
            limiter,
            cancel,
        }
    }

    pub fn cache(&self) -> &PriceCache {
        &self.cache
    }

    /// Cached series for `item`, fetching it on a miss.
    pub async fn series_for(&self, item: &str) -> Result<Arc<PriceSeries>, CoreError> {
        if let Some(series) = self.cache.get(item) {
            return Ok(series);
        }
        self.limiter.acquire(&self.cancel).await;
        let series = self.source.fetch_price_series(item).await?;
        tracing::debug!(item, points = series.len(), "fetched price series");
        Ok(self.cache.put(item, series))
    }

    /// Price of `item` on `date`, or the nearest known day.
    pub async fn lookup(&self, item: &str, date: NaiveDate) -> Result<Option<f64>, CoreError> {
        let series = self.series_for(item).await?;
        Ok(series.on_or_near(date).map(|(used, price)| {
            if used != date {
                tracing::info!(item, %date, used = %used, "using price from nearest date");
            }
            price
        }))
    }
}

#[async_trait]
impl PriceLookup for PriceService {
    async fn price_on_or_near(&self, item: &str, date: NaiveDate) -> f64 {
        match self.lookup(item, date).await {
            Ok(Some(price)) => price,
            Ok(None) => {
                tracing::warn!(item, %date, "no price data available on or near date");
                DEFAULT_PRICE
            }
            Err(e) => {
                tracing::error!(item, %date, error = %e, "price lookup failed, using default price");
                DEFAULT_PRICE
            }
        }
    }
}
