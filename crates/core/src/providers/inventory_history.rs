use regex::Regex;
use std::sync::LazyLock;

use crate::errors::CoreError;
use crate::models::history::{Cursor, HistoryResponse};

/// Account id used when the profile URL carries no `/id/<name>` segment.
pub const DEFAULT_ACCOUNT_ID: &str = "default_account";

static CURSOR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""cursor":\{"time":(\d+),"time_frac":(\d+),"s":"(\d+)"\}"#)
        .expect("valid cursor regex")
});

/// Value of `key` in a raw `a=1; b=2` cookie string.
pub fn cookie_value<'a>(cookie: &'a str, key: &str) -> Option<&'a str> {
    cookie
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix(key)?.strip_prefix('='))
}

/// Session token required by the history endpoint. Its absence is a
/// configuration error caught before any request goes out.
pub fn extract_session_id(cookie: &str) -> Result<String, CoreError> {
    match cookie_value(cookie, "sessionid") {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => {
            tracing::error!("sessionid not found in cookie");
            Err(CoreError::Configuration(
                "sessionid not found in cookie".into(),
            ))
        }
    }
}

/// Vanity name following `/id/` in a profile URL, or `DEFAULT_ACCOUNT_ID`.
pub fn account_id_from_profile(profile_url: &str) -> String {
    profile_url
        .split_once("/id/")
        .and_then(|(_, rest)| rest.split(['/', '?', '#']).next())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| DEFAULT_ACCOUNT_ID.to_string())
}

/// Inventory history page URL for a profile URL.
pub fn history_base_url(profile_url: &str) -> String {
    format!("{}/inventoryhistory/", profile_url.trim().trim_end_matches('/'))
}

/// First cursor triple embedded anywhere in a raw response body.
pub fn extract_cursor(body: &str) -> Option<Cursor> {
    let caps = CURSOR_PATTERN.captures(body)?;
    let time = caps.get(1)?.as_str().parse().ok()?;
    let time_frac = caps.get(2)?.as_str().parse().ok()?;
    let s = caps.get(3)?.as_str().to_string();
    tracing::debug!(time, time_frac, s = %s, "extracted cursor");
    Some(Cursor { time, time_frac, s })
}

/// Decode a raw page body. A page that is not JSON or has no `html` field
/// is malformed.
pub fn decode_page(body: &str) -> Result<HistoryResponse, CoreError> {
    let page: HistoryResponse = serde_json::from_str(body)
        .map_err(|e| CoreError::MalformedPayload(format!("history page is not valid JSON: {e}")))?;
    if page.html.is_none() {
        return Err(CoreError::MalformedPayload(
            "history page has no 'html' field".into(),
        ));
    }
    Ok(page)
}

/// Builds requests against one profile's AJAX inventory history.
#[derive(Debug, Clone)]
pub struct HistoryRequestBuilder {
    base_url: String,
    cookie: String,
    session_id: String,
    user_agent: String,
}

impl HistoryRequestBuilder {
    /// Fails if the cookie carries no `sessionid`.
    pub fn new(base_url: &str, cookie: &str, user_agent: &str) -> Result<Self, CoreError> {
        let session_id = extract_session_id(cookie)?;
        Ok(Self {
            base_url: base_url.to_string(),
            cookie: cookie.to_string(),
            session_id,
            user_agent: user_agent.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, cursor: Option<&Cursor>) -> String {
        let mut url = format!("{}?ajax=1", self.base_url);
        if let Some(cursor) = cursor {
            url.push_str(&format!(
                "&cursor%5Btime%5D={}&cursor%5Btime_frac%5D={}&cursor%5Bs%5D={}",
                cursor.time, cursor.time_frac, cursor.s
            ));
        }
        url.push_str(&format!("&sessionid={}&l=english", self.session_id));
        url
    }

    pub fn headers(&self) -> Vec<(String, String)> {
        vec![
            ("Accept".into(), "*/*".into()),
            ("Accept-Language".into(), "en-US,en;q=0.9".into()),
            ("Cookie".into(), format!("{}; Steam_Language=english", self.cookie)),
            ("Referer".into(), self.base_url.clone()),
            ("User-Agent".into(), self.user_agent.clone()),
            ("X-Requested-With".into(), "XMLHttpRequest".into()),
        ]
    }
}
