//! Container openings in the inventory history markup.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

use crate::models::event::{Rarity, RENTAL_ITEM, UNKNOWN_KEY};
use crate::models::history::HistoryResponse;

/// Item name recorded when a non-rental row shows no received item.
pub const UNKNOWN_ITEM: &str = "Unknown Item";

const OPENING_MARKER: &str = "Unlocked a container";
const RENTAL_MARKER: &str = "Unlocked a container for rental";

static ROW_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.tradehistoryrow").expect("valid row selector"));
static DESCRIPTION_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.tradehistory_event_description").expect("valid description selector")
});
static DATE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.tradehistory_date").expect("valid date selector"));
static TIME_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.tradehistory_timestamp").expect("valid timestamp selector")
});
static PLUSMINUS_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.tradehistory_items_plusminus").expect("valid plusminus selector")
});
static LOST_ITEM_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.history_item").expect("valid lost item selector"));
static GAINED_ITEM_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.history_item").expect("valid gained item selector"));
static ITEM_NAME_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.history_item_name").expect("valid item name selector"));

/// A container opening read from markup, before price enrichment.
#[derive(Debug, Clone, PartialEq)]
pub struct OpeningCandidate {
    pub timestamp: NaiveDateTime,
    pub container: String,
    pub key: String,
    pub item: String,
    pub rarity: Rarity,
    pub rental: bool,
}

/// Collapse runs of whitespace and trim.
fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(element: ElementRef) -> String {
    normalize(&element.text().collect::<String>())
}

/// Text nodes directly under `element`, ignoring nested elements.
fn own_text(element: ElementRef) -> String {
    let text: String = element
        .children()
        .filter_map(|child| child.value().as_text().map(|t| t.to_string()))
        .collect();
    normalize(&text)
}

/// Parse `"5 Jan, 2023"` + `"1:23pm"`.
pub fn parse_row_datetime(date: &str, time: &str) -> Option<NaiveDateTime> {
    let combined = format!("{} {}", date.trim(), time.trim().to_uppercase());
    NaiveDateTime::parse_from_str(&combined, "%d %b, %Y %I:%M%p")
        .ok()
        .or_else(|| parse_row_datetime_manually(date, time))
}

fn month_number(name: &str) -> Option<u32> {
    let month = match name.get(..3)?.to_ascii_uppercase().as_str() {
        "JAN" => 1,
        "FEB" => 2,
        "MAR" => 3,
        "APR" => 4,
        "MAY" => 5,
        "JUN" => 6,
        "JUL" => 7,
        "AUG" => 8,
        "SEP" => 9,
        "OCT" => 10,
        "NOV" => 11,
        "DEC" => 12,
        _ => return None,
    };
    Some(month)
}

fn parse_row_datetime_manually(date: &str, time: &str) -> Option<NaiveDateTime> {
    let (day_month, year) = date.split_once(',')?;
    let mut day_month = day_month.split_whitespace();
    let day: u32 = day_month.next()?.parse().ok()?;
    let month = month_number(day_month.next()?)?;
    let year: i32 = year.trim().parse().ok()?;

    let lower = time.trim().to_lowercase();
    let pm = lower.ends_with("pm");
    let am = lower.ends_with("am");
    let clock = lower.trim_end_matches("pm").trim_end_matches("am").trim();
    let (hour, minute) = clock.split_once(':')?;
    let mut hour: u32 = hour.trim().parse().ok()?;
    let minute: u32 = minute.trim().parse().ok()?;
    if (pm || am) && !(1..=12).contains(&hour) {
        return None;
    }
    if pm && hour != 12 {
        hour += 12;
    }
    if am && hour == 12 {
        hour = 0;
    }

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    Some(date.and_time(time))
}

/// The `tradehistory_items_group` right after the `+`/`-` marker, if any.
fn item_group<'a>(row: ElementRef<'a>, marker: char) -> Option<ElementRef<'a>> {
    row.select(&PLUSMINUS_SELECTOR)
        .filter(|sign| collect_text(*sign).contains(marker))
        .find_map(|sign| {
            sign.next_siblings()
                .find_map(ElementRef::wrap)
                .filter(|sibling| {
                    sibling
                        .value()
                        .classes()
                        .any(|class| class == "tradehistory_items_group")
                })
        })
}

fn item_name(item: ElementRef) -> String {
    item.select(&ITEM_NAME_SELECTOR)
        .next()
        .map(collect_text)
        .unwrap_or_default()
}

fn row_timestamp(row: ElementRef) -> Option<NaiveDateTime> {
    let date = row.select(&DATE_SELECTOR).next()?;
    let time = row.select(&TIME_SELECTOR).next()?;
    parse_row_datetime(&own_text(date), &collect_text(time))
}

fn parse_row(row: ElementRef, page: &HistoryResponse) -> Option<OpeningCandidate> {
    let Some(timestamp) = row_timestamp(row) else {
        tracing::error!("failed to extract date and time from history row, dropping it");
        return None;
    };

    let lost: Vec<ElementRef> = item_group(row, '-')
        .map(|group| group.select(&LOST_ITEM_SELECTOR).collect())
        .unwrap_or_default();
    let container = lost.first().map(|item| item_name(*item))?;
    if !container.to_lowercase().contains("case") {
        tracing::debug!(container = %container, "skipping non-case container");
        return None;
    }
    let key = lost
        .get(1)
        .map(|item| item_name(*item))
        .unwrap_or_else(|| UNKNOWN_KEY.to_string());

    let rental = collect_text(row).contains(RENTAL_MARKER);
    let (item, rarity) = if rental {
        (RENTAL_ITEM.to_string(), Rarity::Rental)
    } else {
        let gained = item_group(row, '+').and_then(|group| group.select(&GAINED_ITEM_SELECTOR).next());
        match gained {
            Some(gained) => {
                let class_id = gained.value().attr("data-classid").unwrap_or_default();
                let instance_id = gained.value().attr("data-instanceid").unwrap_or_default();
                (item_name(gained), page.rarity_of(class_id, instance_id))
            }
            None => (UNKNOWN_ITEM.to_string(), Rarity::Unknown),
        }
    };

    Some(OpeningCandidate {
        timestamp,
        container,
        key,
        item,
        rarity,
        rental,
    })
}

/// Every case opening on a page, in the order the rows appear.
pub fn parse_openings(page: &HistoryResponse) -> Vec<OpeningCandidate> {
    let Some(html) = page.html.as_deref() else {
        return Vec::new();
    };
    let document = Html::parse_fragment(html);
    let rows: Vec<ElementRef> = document
        .select(&ROW_SELECTOR)
        .filter(|row| {
            row.select(&DESCRIPTION_SELECTOR)
                .any(|desc| collect_text(desc).contains(OPENING_MARKER))
        })
        .collect();
    tracing::info!(rows = rows.len(), "extracting case openings");

    let openings: Vec<OpeningCandidate> = rows
        .into_iter()
        .filter_map(|row| parse_row(row, page))
        .collect();
    tracing::info!(openings = openings.len(), "extracted case openings");
    openings
}
