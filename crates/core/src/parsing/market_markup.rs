//! Price history embedded in a market listing page.
//!
//! The listing page renders its chart from an inline script of the form
//! `var line1=[["Jan 05 2023 01: +0",0.52,"1234"], ...];`.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

use crate::errors::CoreError;
use crate::models::price::{PricePoint, PriceSeries};

static LINE1_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)var line1=(\[.*?\]);").expect("valid line1 regex"));

/// Parse the `MMM dd yyyy` prefix of a market date label.
pub fn parse_date_label(label: &str) -> Option<NaiveDate> {
    let mut parts = label.split_whitespace();
    let date = format!("{} {} {}", parts.next()?, parts.next()?, parts.next()?);
    NaiveDate::parse_from_str(&date, "%b %d %Y").ok()
}

/// Extract every `[label, price, volume]` triple from a listing page.
///
/// A page without the inline series yields an empty list (unlisted item or a
/// login wall). Individual entries that don't parse are skipped.
pub fn extract_price_points(page: &str) -> Result<Vec<PricePoint>, CoreError> {
    let Some(caps) = LINE1_PATTERN.captures(page) else {
        return Ok(Vec::new());
    };
    let raw = caps.get(1).map(|m| m.as_str()).unwrap_or("[]");
    let entries: Vec<Vec<serde_json::Value>> = serde_json::from_str(raw).map_err(|e| {
        CoreError::MalformedPayload(format!("price history array is not valid JSON: {e}"))
    })?;

    let points = entries
        .iter()
        .filter_map(|entry| {
            let point = parse_entry(entry);
            if point.is_none() {
                tracing::warn!(?entry, "skipping unparseable price history entry");
            }
            point
        })
        .collect();
    Ok(points)
}

fn parse_entry(entry: &[serde_json::Value]) -> Option<PricePoint> {
    let date = parse_date_label(entry.first()?.as_str()?)?;
    let price = entry.get(1)?.as_f64()?;
    if !price.is_finite() || price < 0.0 {
        return None;
    }
    Some(PricePoint { date, price })
}

/// Build a date-keyed series from a listing page. Several samples on one
/// day collapse to the last one.
pub fn parse_price_series(page: &str) -> Result<PriceSeries, CoreError> {
    Ok(extract_price_points(page)?.into_iter().collect())
}
