use std::collections::HashMap;

use crate::models::event::{CaseOpeningEvent, EventIdentity};

/// Merge freshly fetched events into the cached list.
///
/// Cached events keep their order and fresh ones are appended in arrival
/// order. An event whose identity is already present replaces the stored
/// copy in place, so `merge(merge(a, b), b) == merge(a, b)`.
pub fn merge(cached: Vec<CaseOpeningEvent>, fresh: Vec<CaseOpeningEvent>) -> Vec<CaseOpeningEvent> {
    let mut merged: Vec<CaseOpeningEvent> = Vec::with_capacity(cached.len() + fresh.len());
    let mut index: HashMap<EventIdentity, usize> = HashMap::with_capacity(cached.len() + fresh.len());

    for event in cached.into_iter().chain(fresh) {
        match index.get(&event.identity()) {
            Some(&slot) => merged[slot] = event,
            None => {
                index.insert(event.identity(), merged.len());
                merged.push(event);
            }
        }
    }
    merged
}

/// Newest timestamp in `events`, the cutoff for an incremental fetch.
pub fn newest_timestamp(events: &[CaseOpeningEvent]) -> Option<chrono::NaiveDateTime> {
    events.iter().map(|e| e.timestamp).max()
}
