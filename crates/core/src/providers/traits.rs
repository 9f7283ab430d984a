use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::CoreError;
use crate::models::event::CaseOpeningEvent;
use crate::models::history::HistoryResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
        }
    }
}

/// A self-contained request; nothing is shared between two requests except
/// the transport's connection pool.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers: Vec::new(),
            body: Some(body.into()),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// One round trip over the wire, no retries.
///
/// Only transport failures (connect, TLS, body read) are errors; any HTTP
/// status, 5xx included, comes back as an `HttpResponse`.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, CoreError>;
}

/// Historical price lookup used to enrich events.
///
/// Never fails: implementations degrade to a default price and log why.
#[async_trait]
pub trait PriceLookup: Send + Sync {
    async fn price_on_or_near(&self, item: &str, date: NaiveDate) -> f64;
}

/// Turns one decoded history page into the container openings it contains,
/// in page order.
#[async_trait]
pub trait EventExtractor: Send + Sync {
    async fn extract(&self, page: &HistoryResponse) -> Vec<CaseOpeningEvent>;
}
