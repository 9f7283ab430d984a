// ═══════════════════════════════════════════════════════════════════
// Shared fixtures: scripted transports, history markup, events
// ═══════════════════════════════════════════════════════════════════
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

use case_history_core::errors::CoreError;
use case_history_core::models::event::{CaseOpeningEvent, Rarity};
use case_history_core::providers::traits::{HttpRequest, HttpResponse, HttpTransport};

// ── Transports ──────────────────────────────────────────────────────

/// Replays canned responses in order and records when each call arrived.
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, CoreError>>>,
    calls: Mutex<Vec<(String, Instant)>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<Result<HttpResponse, CoreError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn urls(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(url, _)| url.clone()).collect()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, CoreError> {
        self.calls
            .lock()
            .unwrap()
            .push((request.url.clone(), Instant::now()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(transport_error("script exhausted")))
    }
}

/// Answers history requests from a page script and market requests from a
/// fixed listing page.
pub struct SteamTransport {
    pages: Mutex<VecDeque<Result<HttpResponse, CoreError>>>,
    market_page: String,
    requests: Mutex<Vec<HttpRequest>>,
}

impl SteamTransport {
    pub fn new(pages: Vec<Result<HttpResponse, CoreError>>, market_page: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            pages: Mutex::new(pages.into()),
            market_page: market_page.into(),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn history_requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url.contains("/inventoryhistory/"))
            .cloned()
            .collect()
    }

    pub fn market_requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url.contains("/market/listings/"))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl HttpTransport for SteamTransport {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, CoreError> {
        self.requests.lock().unwrap().push(request.clone());
        if request.url.contains("/market/listings/") {
            return Ok(ok(&self.market_page));
        }
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(transport_error("no more history pages")))
    }
}

pub fn ok(body: &str) -> HttpResponse {
    HttpResponse {
        status: 200,
        body: body.to_string(),
    }
}

pub fn status(code: u16) -> HttpResponse {
    HttpResponse {
        status: code,
        body: String::new(),
    }
}

pub fn transport_error(message: &str) -> CoreError {
    CoreError::RequestFailed {
        url: "mock://transport".into(),
        status: None,
        message: message.into(),
    }
}

// ── History markup ──────────────────────────────────────────────────

/// Item received from an opening: name plus class/instance ids.
pub struct Received<'a> {
    pub name: &'a str,
    pub class_id: &'a str,
    pub instance_id: &'a str,
}

/// One `tradehistoryrow` as the history endpoint renders it.
pub fn opening_row(
    date: &str,
    time: &str,
    container: &str,
    key: Option<&str>,
    received: Option<Received>,
    rental: bool,
) -> String {
    let description = if rental {
        "Unlocked a container for rental"
    } else {
        "Unlocked a container"
    };
    let key = key
        .map(|k| format!(r#"<span class="history_item"><span class="history_item_name">{k}</span></span>"#))
        .unwrap_or_default();
    let gained = received
        .map(|item| {
            format!(
                r#"<div class="tradehistory_items">
                    <div class="tradehistory_items_plusminus">+</div>
                    <div class="tradehistory_items_group">
                        <a class="history_item" data-classid="{}" data-instanceid="{}">
                            <span class="history_item_name">{}</span>
                        </a>
                    </div>
                </div>"#,
                item.class_id, item.instance_id, item.name
            )
        })
        .unwrap_or_default();

    format!(
        r#"<div class="tradehistoryrow">
            <div class="tradehistory_date">{date}<div class="tradehistory_timestamp">{time}</div></div>
            <div class="tradehistory_content">
                <div class="tradehistory_event_description">{description}</div>
                <div class="tradehistory_items">
                    <div class="tradehistory_items_plusminus">-</div>
                    <div class="tradehistory_items_group">
                        <span class="history_item"><span class="history_item_name">{container}</span></span>
                        {key}
                    </div>
                </div>
                {gained}
            </div>
        </div>"#
    )
}

/// A row for some other kind of inventory event.
pub fn trade_row(date: &str, time: &str) -> String {
    format!(
        r#"<div class="tradehistoryrow">
            <div class="tradehistory_date">{date}<div class="tradehistory_timestamp">{time}</div></div>
            <div class="tradehistory_content">
                <div class="tradehistory_event_description">You traded with someone</div>
            </div>
        </div>"#
    )
}

/// Raw JSON body of a history page. The cursor is written out by hand so it
/// matches the field order the endpoint uses.
pub fn history_page(rows: &[String], descriptions: &str, cursor: Option<(u64, u64, &str)>) -> String {
    let html = serde_json::to_string(&rows.concat()).unwrap();
    let cursor = cursor
        .map(|(time, frac, s)| {
            format!(r#","cursor":{{"time":{time},"time_frac":{frac},"s":"{s}"}}"#)
        })
        .unwrap_or_default();
    format!(r#"{{"success":true,"html":{html},"descriptions":{descriptions}{cursor}}}"#)
}

/// Market listing page with an inline `line1` price array.
pub fn market_page(line1: &str) -> String {
    format!(
        "<html><script type=\"text/javascript\">\n\t\t\tvar line1={line1};\n\t\t\tvar g_timePriceHistoryEarliest = new Date();\n</script></html>"
    )
}

// ── Events ──────────────────────────────────────────────────────────

pub fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

pub fn event(timestamp: &str, container: &str, item: &str, price: f64) -> CaseOpeningEvent {
    CaseOpeningEvent {
        timestamp: ts(timestamp),
        container: container.to_string(),
        key: format!("{container} Key"),
        item: item.to_string(),
        rarity: Rarity::MilSpec,
        container_price: price,
        rental: false,
    }
}
