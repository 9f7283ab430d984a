use thiserror::Error;

/// Unified error type for the entire case-history-core library.
/// Every public fallible function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Network ─────────────────────────────────────────────────────
    #[error("HTTP request to {url} failed{}: {message}", status_suffix(.status))]
    RequestFailed {
        url: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Operation cancelled")]
    Cancelled,

    // ── Payloads ────────────────────────────────────────────────────
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Price data error ({item}): {message}")]
    PriceData { item: String, message: String },

    // ── Configuration ───────────────────────────────────────────────
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ── Storage / File ──────────────────────────────────────────────
    #[error("File I/O error: {0}")]
    FileIO(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl CoreError {
    /// HTTP status carried by a `RequestFailed`, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            CoreError::RequestFailed { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether this error is fatal for a run (bad input), as opposed to
    /// something the pipeline recovers from locally.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CoreError::Configuration(_))
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status
        .map(|code| format!(" with status {code}"))
        .unwrap_or_default()
}

/// Strip the query string from a URL before it ends up in a log line or an
/// error message. History URLs carry the session token as a query parameter.
pub fn redact_query(url: &str) -> String {
    match url.find('?') {
        Some(idx) => format!("{}?<query redacted>", &url[..idx]),
        None => url.to_string(),
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest errors embed the full URL, session token included.
        let url = e
            .url()
            .map(|u| redact_query(u.as_str()))
            .unwrap_or_else(|| "<unknown>".to_string());
        let status = e.status().map(|s| s.as_u16());
        let message = redact_query(&e.to_string());
        CoreError::RequestFailed {
            url,
            status,
            message,
        }
    }
}
