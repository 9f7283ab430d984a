use chrono::NaiveDateTime;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::event::CaseOpeningEvent;
use crate::models::history::Cursor;
use crate::providers::http::HttpFetcher;
use crate::providers::inventory_history::{decode_page, extract_cursor, HistoryRequestBuilder};
use crate::providers::traits::EventExtractor;

/// Why pagination ended. Every reason still hands back what was collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The last page carried no cursor.
    EndOfHistory,
    /// An event at or before the cutoff showed up.
    CutoffReached,
    /// A page could not be fetched (retries exhausted or non-retryable status).
    FetchFailed,
    /// A page was not the expected JSON shape.
    MalformedPage,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaginationResult {
    /// Events in arrival order (newest first for a well-behaved feed).
    pub events: Vec<CaseOpeningEvent>,
    pub pages_fetched: usize,
    pub stop_reason: StopReason,
}

enum PageState {
    Fetching,
    Extracting {
        body: String,
    },
    Advancing {
        body: String,
        batch: Vec<CaseOpeningEvent>,
        cutoff_reached: bool,
    },
    Stopped(StopReason),
}

/// Keep events strictly newer than `cutoff`, stopping at the first one that
/// isn't. The feed is newest-first, so everything after that point is older
/// and the whole run can stop. Returns the kept events and whether the
/// cutoff was hit.
pub fn apply_cutoff(
    events: Vec<CaseOpeningEvent>,
    cutoff: Option<NaiveDateTime>,
) -> (Vec<CaseOpeningEvent>, bool) {
    let Some(cutoff) = cutoff else {
        return (events, false);
    };
    let mut kept = Vec::with_capacity(events.len());
    for event in events {
        if event.timestamp > cutoff {
            kept.push(event);
        } else {
            return (kept, true);
        }
    }
    (kept, false)
}

/// Walks the cursor-paginated history of one profile, one page at a time.
///
/// A failed fetch, a malformed page or a cancellation all end the walk
/// early; the events collected up to that point are returned, never an error.
pub struct PaginationService {
    fetcher: Arc<HttpFetcher>,
    requests: HistoryRequestBuilder,
    extractor: Arc<dyn EventExtractor>,
    page_delay: Duration,
}

impl PaginationService {
    pub fn new(
        fetcher: Arc<HttpFetcher>,
        requests: HistoryRequestBuilder,
        extractor: Arc<dyn EventExtractor>,
        page_delay: Duration,
    ) -> Self {
        Self {
            fetcher,
            requests,
            extractor,
            page_delay,
        }
    }

    /// Fetch every event newer than `cutoff` (all events when `None`).
    pub async fn fetch_history(&self, cutoff: Option<NaiveDateTime>) -> PaginationResult {
        let cancel = self.fetcher.cancel_signal().clone();
        let mut cursor: Option<Cursor> = None;
        let mut page = 1usize;
        let mut pages_fetched = 0usize;
        let mut events = Vec::new();
        let mut state = PageState::Fetching;

        let stop_reason = loop {
            state = match state {
                PageState::Fetching if cancel.is_cancelled() => PageState::Stopped(StopReason::Cancelled),
                PageState::Fetching => {
                    let url = self.requests.url(cursor.as_ref());
                    match self.fetcher.get(&url, self.requests.headers()).await {
                        Ok(body) => {
                            pages_fetched += 1;
                            PageState::Extracting { body }
                        }
                        Err(CoreError::Cancelled) => {
                            tracing::warn!(page, "history fetch cancelled");
                            PageState::Stopped(StopReason::Cancelled)
                        }
                        Err(e) => {
                            tracing::error!(page, error = %e, "error during inventory history retrieval");
                            PageState::Stopped(StopReason::FetchFailed)
                        }
                    }
                }
                PageState::Extracting { body } => match decode_page(&body) {
                    Ok(decoded) => {
                        let extracted = self.extractor.extract(&decoded).await;
                        let (batch, cutoff_reached) = apply_cutoff(extracted, cutoff);
                        PageState::Advancing {
                            body,
                            batch,
                            cutoff_reached,
                        }
                    }
                    Err(e) => {
                        tracing::warn!(page, error = %e, "invalid history page, stopping pagination");
                        tracing::debug!(page, body = %body, "rejected page content");
                        PageState::Stopped(StopReason::MalformedPage)
                    }
                },
                PageState::Advancing {
                    body,
                    batch,
                    cutoff_reached,
                } => {
                    tracing::info!(page, items = batch.len(), "processed history page");
                    events.extend(batch);
                    if cutoff_reached {
                        tracing::info!(page, "reached previously cached events");
                        PageState::Stopped(StopReason::CutoffReached)
                    } else {
                        match extract_cursor(&body) {
                            None => PageState::Stopped(StopReason::EndOfHistory),
                            Some(next) => match cancel.sleep(self.page_delay).await {
                                Ok(()) => {
                                    cursor = Some(next);
                                    page += 1;
                                    PageState::Fetching
                                }
                                Err(_) => {
                                    tracing::warn!(page, "interrupted between history pages");
                                    PageState::Stopped(StopReason::Cancelled)
                                }
                            },
                        }
                    }
                }
                PageState::Stopped(reason) => break reason,
            };
        };

        tracing::info!(
            events = events.len(),
            pages = pages_fetched,
            reason = ?stop_reason,
            "finished fetching inventory history"
        );
        PaginationResult {
            events,
            pages_fetched,
            stop_reason,
        }
    }
}
