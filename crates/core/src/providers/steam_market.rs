use reqwest::Url;
use std::sync::Arc;

use crate::errors::CoreError;
use crate::models::price::PriceSeries;
use crate::parsing::market_markup;

use super::http::HttpFetcher;

/// Steam community market as a source of daily price history.
///
/// - **Endpoint**: `<base>/<url-encoded item name>` (the listing page).
/// - **Auth**: the history chart is only rendered for logged-in sessions, so
///   the user's cookie is forwarded.
/// - **Limits**: roughly 25 requests per minute before 429s start; callers
///   are expected to go through a `RateLimiter`.
pub struct SteamMarketProvider {
    fetcher: Arc<HttpFetcher>,
    base_url: String,
    cookie: String,
}

impl SteamMarketProvider {
    pub fn new(fetcher: Arc<HttpFetcher>, base_url: impl Into<String>, cookie: impl Into<String>) -> Self {
        Self {
            fetcher,
            base_url: base_url.into(),
            cookie: cookie.into(),
        }
    }

    /// Listing URL for an item; the name is percent-encoded as one path segment.
    pub fn listing_url(&self, item: &str) -> Result<String, CoreError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            CoreError::Configuration(format!("invalid market base URL '{}': {e}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                CoreError::Configuration(format!("market base URL '{}' cannot take a path", self.base_url))
            })?
            .pop_if_empty()
            .push(item);
        Ok(url.to_string())
    }

    /// Fetch and parse the full price history of one item.
    pub async fn fetch_price_series(&self, item: &str) -> Result<PriceSeries, CoreError> {
        let url = self.listing_url(item)?;
        let headers = vec![(
            "Cookie".to_string(),
            format!("{}; Steam_Language=english", self.cookie),
        )];
        let page = self.fetcher.get(&url, headers).await?;
        market_markup::parse_price_series(&page).map_err(|e| CoreError::PriceData {
            item: item.to_string(),
            message: e.to_string(),
        })
    }
}
