// ═══════════════════════════════════════════════════════════════════
// Price Tests: nearest-date lookup, default price, caching, pacing
// ═══════════════════════════════════════════════════════════════════

mod common;

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use case_history_core::errors::CoreError;
use case_history_core::models::price::{PriceCache, PricePoint, PriceSeries};
use case_history_core::providers::http::{HttpFetcher, RetryPolicy};
use case_history_core::providers::steam_market::SteamMarketProvider;
use case_history_core::providers::traits::PriceLookup;
use case_history_core::services::price_service::{PriceSeriesSource, PriceService, DEFAULT_PRICE};
use case_history_core::utils::cancel::CancelSignal;
use case_history_core::utils::rate_limiter::RateLimiter;

use common::{market_page, ok, status, ScriptedTransport};

// ═══════════════════════════════════════════════════════════════════
// Mock Source
// ═══════════════════════════════════════════════════════════════════

/// Serves fixed series per item; items listed in `failing` error out.
struct MockSource {
    series: HashMap<String, Vec<(NaiveDate, f64)>>,
    failing: Vec<String>,
    fetches: Mutex<Vec<(String, Instant)>>,
}

impl MockSource {
    fn new() -> Self {
        Self {
            series: HashMap::new(),
            failing: Vec::new(),
            fetches: Mutex::new(Vec::new()),
        }
    }

    fn with_series(mut self, item: &str, points: &[(NaiveDate, f64)]) -> Self {
        self.series.insert(item.to_string(), points.to_vec());
        self
    }

    fn failing(mut self, item: &str) -> Self {
        self.failing.push(item.to_string());
        self
    }

    fn fetch_count(&self, item: &str) -> usize {
        self.fetches.lock().unwrap().iter().filter(|(i, _)| i == item).count()
    }

    fn fetch_times(&self) -> Vec<Instant> {
        self.fetches.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }
}

#[async_trait]
impl PriceSeriesSource for MockSource {
    async fn fetch_price_series(&self, item: &str) -> Result<PriceSeries, CoreError> {
        self.fetches
            .lock()
            .unwrap()
            .push((item.to_string(), Instant::now()));
        if self.failing.iter().any(|f| f == item) {
            return Err(CoreError::PriceData {
                item: item.to_string(),
                message: "listing unavailable".into(),
            });
        }
        Ok(self
            .series
            .get(item)
            .map(|points| {
                points
                    .iter()
                    .map(|(date, price)| PricePoint { date: *date, price: *price })
                    .collect::<PriceSeries>()
            })
            .unwrap_or_default())
    }
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn service(source: Arc<MockSource>) -> PriceService {
    service_with(source, Duration::from_secs(24 * 60 * 60), Duration::ZERO)
}

fn service_with(source: Arc<MockSource>, ttl: Duration, interval: Duration) -> PriceService {
    PriceService::new(
        source,
        Arc::new(PriceCache::new(ttl)),
        Arc::new(RateLimiter::new(interval)),
        CancelSignal::never(),
    )
}

fn two_point_source() -> Arc<MockSource> {
    Arc::new(MockSource::new().with_series(
        "Recoil Case",
        &[(d(2023, 1, 1), 5.0), (d(2023, 1, 10), 7.0)],
    ))
}

// ── Nearest-date lookup ─────────────────────────────────────────────

mod nearest_date {
    use super::*;

    #[tokio::test]
    async fn exact_date_wins() {
        let prices = service(two_point_source());
        assert_eq!(prices.price_on_or_near("Recoil Case", d(2023, 1, 10)).await, 7.0);
        assert_eq!(prices.price_on_or_near("Recoil Case", d(2023, 1, 1)).await, 5.0);
    }

    #[tokio::test]
    async fn between_points_uses_the_floor() {
        let prices = service(two_point_source());
        assert_eq!(prices.price_on_or_near("Recoil Case", d(2023, 1, 5)).await, 5.0);
    }

    #[tokio::test]
    async fn after_last_point_uses_the_floor() {
        let prices = service(two_point_source());
        assert_eq!(prices.price_on_or_near("Recoil Case", d(2024, 6, 1)).await, 7.0);
    }

    #[tokio::test]
    async fn before_first_point_uses_the_ceiling() {
        let prices = service(two_point_source());
        assert_eq!(prices.price_on_or_near("Recoil Case", d(2022, 12, 31)).await, 5.0);
    }

    #[tokio::test]
    async fn lookup_reports_absence_without_default() {
        let source = Arc::new(MockSource::new());
        let prices = service(source);
        assert_eq!(prices.lookup("Unlisted Case", d(2023, 1, 1)).await.unwrap(), None);
    }
}

// ── Default price ───────────────────────────────────────────────────

mod default_price {
    use super::*;

    #[tokio::test]
    async fn empty_series_yields_default() {
        let prices = service(Arc::new(MockSource::new()));
        assert_eq!(prices.price_on_or_near("Unlisted Case", d(2023, 1, 1)).await, DEFAULT_PRICE);
        assert_eq!(DEFAULT_PRICE, 0.01);
    }

    #[tokio::test]
    async fn fetch_failure_yields_default() {
        let prices = service(Arc::new(MockSource::new().failing("Broken Case")));
        assert_eq!(prices.price_on_or_near("Broken Case", d(2023, 1, 1)).await, DEFAULT_PRICE);
    }
}

// ── Caching ─────────────────────────────────────────────────────────

mod caching {
    use super::*;

    #[tokio::test]
    async fn one_fetch_per_item_while_fresh() {
        let source = two_point_source();
        let prices = service(source.clone());
        for day in 1..=10 {
            prices.price_on_or_near("Recoil Case", d(2023, 1, day)).await;
        }
        assert_eq!(source.fetch_count("Recoil Case"), 1);
        assert_eq!(prices.cache().len(), 1);
    }

    #[tokio::test]
    async fn empty_series_is_cached() {
        let source = Arc::new(MockSource::new());
        let prices = service(source.clone());
        prices.price_on_or_near("Unlisted Case", d(2023, 1, 1)).await;
        prices.price_on_or_near("Unlisted Case", d(2023, 2, 1)).await;
        assert_eq!(source.fetch_count("Unlisted Case"), 1);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let source = Arc::new(MockSource::new().failing("Broken Case"));
        let prices = service(source.clone());
        prices.price_on_or_near("Broken Case", d(2023, 1, 1)).await;
        prices.price_on_or_near("Broken Case", d(2023, 1, 1)).await;
        assert_eq!(source.fetch_count("Broken Case"), 2);
        assert!(prices.cache().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_entries_are_refetched() {
        let source = two_point_source();
        let prices = service_with(source.clone(), Duration::from_secs(60), Duration::ZERO);

        prices.price_on_or_near("Recoil Case", d(2023, 1, 1)).await;
        tokio::time::advance(Duration::from_secs(59)).await;
        prices.price_on_or_near("Recoil Case", d(2023, 1, 1)).await;
        assert_eq!(source.fetch_count("Recoil Case"), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        prices.price_on_or_near("Recoil Case", d(2023, 1, 1)).await;
        assert_eq!(source.fetch_count("Recoil Case"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cache_expires_on_read_only() {
        let cache = PriceCache::new(Duration::from_secs(10));
        cache.put("Recoil Case", PriceSeries::new());
        tokio::time::advance(Duration::from_secs(11)).await;

        assert_eq!(cache.len(), 1);
        assert!(cache.get("Recoil Case").is_none());
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn huge_ttl_keeps_entries_fresh() {
        let cache = PriceCache::new(Duration::MAX);
        cache.put("Recoil Case", PriceSeries::new());
        tokio::time::advance(Duration::from_secs(365 * 24 * 60 * 60)).await;
        assert!(cache.get("Recoil Case").is_some());
    }
}

// ── Rate limiting ───────────────────────────────────────────────────

mod pacing {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn market_fetches_are_spaced_by_the_interval() {
        let source = Arc::new(
            MockSource::new()
                .with_series("A Case", &[(d(2023, 1, 1), 1.0)])
                .with_series("B Case", &[(d(2023, 1, 1), 2.0)])
                .with_series("C Case", &[(d(2023, 1, 1), 3.0)]),
        );
        let prices = service_with(source.clone(), Duration::from_secs(3600), Duration::from_millis(2400));

        for item in ["A Case", "B Case", "C Case", "A Case"] {
            prices.price_on_or_near(item, d(2023, 1, 1)).await;
        }

        let times = source.fetch_times();
        assert_eq!(times.len(), 3);
        assert_eq!(times[1] - times[0], Duration::from_millis(2400));
        assert_eq!(times[2] - times[1], Duration::from_millis(2400));
    }
}

// ── Market provider over HTTP ───────────────────────────────────────

mod market_provider {
    use super::*;

    fn provider(transport: Arc<ScriptedTransport>) -> SteamMarketProvider {
        let fetcher = Arc::new(HttpFetcher::new(transport, RetryPolicy::default(), CancelSignal::never()));
        SteamMarketProvider::new(
            fetcher,
            "https://steamcommunity.com/market/listings/730/",
            "sessionid=abc",
        )
    }

    #[test]
    fn listing_url_encodes_the_item_name() {
        let market = provider(ScriptedTransport::new(Vec::new()));
        assert_eq!(
            market.listing_url("Operation Breakout Weapon Case").unwrap(),
            "https://steamcommunity.com/market/listings/730/Operation%20Breakout%20Weapon%20Case"
        );
    }

    #[tokio::test]
    async fn parses_series_from_listing_page() {
        let page = market_page(
            r#"[["Jan 01 2023 01: +0",5.0,"10"],["Jan 01 2023 13: +0",5.5,"3"],["Jan 10 2023 01: +0",7.0,"8"]]"#,
        );
        let transport = ScriptedTransport::new(vec![Ok(ok(&page))]);
        let series = provider(transport.clone())
            .fetch_price_series("Recoil Case")
            .await
            .unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.get(d(2023, 1, 1)), Some(5.5));
        assert_eq!(series.get(d(2023, 1, 10)), Some(7.0));
        assert!(transport.urls()[0].ends_with("/Recoil%20Case"));
    }

    #[tokio::test]
    async fn page_without_chart_is_an_empty_series() {
        let transport = ScriptedTransport::new(vec![Ok(ok("<html>There are no listings</html>"))]);
        let series = provider(transport).fetch_price_series("Ghost Case").await.unwrap();
        assert!(series.is_empty());
    }

    #[tokio::test]
    async fn http_failure_propagates() {
        let transport = ScriptedTransport::new(vec![Ok(status(404))]);
        let err = provider(transport).fetch_price_series("Ghost Case").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }
}
