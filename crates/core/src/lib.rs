pub mod errors;
pub mod models;
pub mod parsing;
pub mod providers;
pub mod services;
pub mod storage;
pub mod utils;

use std::sync::Arc;

use models::{event::CaseOpeningEvent, price::PriceCache, settings::Settings, summary::CaseOpeningSummary};
use providers::{
    http::{HttpFetcher, ReqwestTransport, RetryPolicy},
    inventory_history::{account_id_from_profile, history_base_url, HistoryRequestBuilder},
    steam_market::SteamMarketProvider,
    traits::HttpTransport,
};
use services::{
    extraction_service::CaseOpeningExtractor,
    pagination_service::{PaginationService, StopReason},
    price_service::PriceService,
    summary_service::SummaryService,
};
use storage::{
    merge::{merge, newest_timestamp},
    results_store::{ResultsStore, SavedFiles},
};
use utils::{cancel::CancelSignal, rate_limiter::RateLimiter};

use errors::CoreError;

/// Whether to stop at the newest cached event or walk the whole history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// Only fetch events newer than the newest cached one.
    #[default]
    Incremental,
    /// Ignore the cache when paginating (it is still merged afterwards).
    Full,
}

/// Inputs for one run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Profile URL, e.g. `https://steamcommunity.com/id/<name>/`
    pub profile_url: String,

    /// Raw `Cookie` header value of a logged-in session (must carry `sessionid`)
    pub cookie: String,

    pub mode: FetchMode,
}

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub account_id: String,
    pub summary: CaseOpeningSummary,

    /// Cached and fresh events merged, cached order first.
    pub events: Vec<CaseOpeningEvent>,

    /// Events returned by this run's pagination, before merging.
    pub fetched_count: usize,

    pub pages_fetched: usize,
    pub stop_reason: StopReason,

    /// `None` when writing the results failed (the failure is logged).
    pub saved: Option<SavedFiles>,
}

#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// Nothing cached and nothing fetched.
    NoEvents,
    Completed(RunReport),
}

/// Main entry point for the case history core library.
///
/// Owns the shared HTTP transport, the price cache and the market rate
/// limiter; each `run` wires a fresh pipeline on top of them.
#[must_use]
pub struct CaseHistoryTracker {
    settings: Settings,
    transport: Arc<dyn HttpTransport>,
    price_cache: Arc<PriceCache>,
    market_limiter: Arc<RateLimiter>,
    store: ResultsStore,
    summary_service: SummaryService,
    cancel: CancelSignal,
}

impl std::fmt::Debug for CaseHistoryTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaseHistoryTracker")
            .field("settings", &self.settings)
            .field("cached_series", &self.price_cache.len())
            .field("results_dir", &self.store.dir())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl CaseHistoryTracker {
    /// Tracker over a pooled `reqwest` client built from `settings`.
    pub fn new(settings: Settings, cancel: CancelSignal) -> Result<Self, CoreError> {
        settings.validate()?;
        let transport = Arc::new(ReqwestTransport::new(&settings)?);
        Self::with_transport(settings, transport, cancel)
    }

    /// Tracker over a caller-supplied transport.
    pub fn with_transport(
        settings: Settings,
        transport: Arc<dyn HttpTransport>,
        cancel: CancelSignal,
    ) -> Result<Self, CoreError> {
        settings.validate()?;
        Ok(Self {
            price_cache: Arc::new(PriceCache::new(settings.price_cache_ttl())),
            market_limiter: Arc::new(RateLimiter::new(settings.market_request_interval())),
            store: ResultsStore::new(settings.results_dir.clone()),
            summary_service: SummaryService::new(settings.key_price),
            transport,
            cancel,
            settings,
        })
    }

    /// Fetch, enrich, merge, summarize and save the history of one profile.
    ///
    /// Only bad input (empty URL or cookie, no `sessionid` in the cookie)
    /// is returned as an error. Network trouble, malformed pages or a
    /// cancellation end pagination early and the run carries on with what
    /// it has; an unreadable cache is treated as empty and a failed save is
    /// logged.
    pub async fn run(&self, request: &RunRequest) -> Result<RunOutcome, CoreError> {
        let profile_url = request.profile_url.trim();
        if profile_url.is_empty() {
            return Err(CoreError::Configuration("profile URL must not be empty".into()));
        }
        let cookie = request.cookie.trim();
        if cookie.is_empty() {
            return Err(CoreError::Configuration("cookie must not be empty".into()));
        }

        let requests = HistoryRequestBuilder::new(
            &history_base_url(profile_url),
            cookie,
            &self.settings.user_agent,
        )?;
        let account_id = account_id_from_profile(profile_url);
        tracing::info!(account = %account_id, mode = ?request.mode, "starting run");

        let cached = match self.store.load(&account_id).await {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(account = %account_id, error = %e, "ignoring unreadable cache");
                Vec::new()
            }
        };
        let cutoff = match request.mode {
            FetchMode::Incremental => newest_timestamp(&cached),
            FetchMode::Full => None,
        };
        if let Some(cutoff) = cutoff {
            tracing::info!(%cutoff, "fetching events newer than the newest cached one");
        }

        let fetcher = Arc::new(HttpFetcher::new(
            Arc::clone(&self.transport),
            RetryPolicy::from(self.settings.retry),
            self.cancel.clone(),
        ));
        let market = SteamMarketProvider::new(
            Arc::clone(&fetcher),
            self.settings.market_base_url.clone(),
            cookie,
        );
        let prices = PriceService::new(
            Arc::new(market),
            Arc::clone(&self.price_cache),
            Arc::clone(&self.market_limiter),
            self.cancel.clone(),
        );
        let extractor = CaseOpeningExtractor::new(Arc::new(prices));
        let pagination = PaginationService::new(
            fetcher,
            requests,
            Arc::new(extractor),
            self.settings.history_request_delay(),
        );

        let fetched = pagination.fetch_history(cutoff).await;
        let fetched_count = fetched.events.len();
        let events = merge(cached, fetched.events);
        if events.is_empty() {
            tracing::info!(account = %account_id, "no case openings found");
            return Ok(RunOutcome::NoEvents);
        }

        let summary = self.summary_service.summarize(&events);
        let saved = match self.store.save(&account_id, &events, &summary).await {
            Ok(files) => Some(files),
            Err(e) => {
                tracing::error!(account = %account_id, error = %e, "failed to save results");
                None
            }
        };

        Ok(RunOutcome::Completed(RunReport {
            account_id,
            summary,
            events,
            fetched_count,
            pages_fetched: fetched.pages_fetched,
            stop_reason: fetched.stop_reason,
            saved,
        }))
    }
}
