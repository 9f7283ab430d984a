use crate::models::event::CaseOpeningEvent;
use crate::models::summary::CaseOpeningSummary;

/// Aggregates case openings into counts and costs.
///
/// The result only depends on the multiset of events, not on their order.
pub struct SummaryService {
    key_price: f64,
}

impl SummaryService {
    pub fn new(key_price: f64) -> Self {
        Self { key_price }
    }

    /// Single pass over `events`.
    ///
    /// Every event counts as one opened case. A price that is negative or not
    /// finite adds nothing to the container cost.
    pub fn summarize(&self, events: &[CaseOpeningEvent]) -> CaseOpeningSummary {
        let mut summary = CaseOpeningSummary::default();

        for event in events {
            *summary.case_counts.entry(event.container.clone()).or_insert(0) += 1;
            *summary.item_counts.entry(event.item.clone()).or_insert(0) += 1;
            *summary
                .rarity_counts
                .entry(event.rarity.to_string())
                .or_insert(0) += 1;

            if event.container_price.is_finite() && event.container_price >= 0.0 {
                summary.total_case_cost += event.container_price;
            } else {
                tracing::warn!(
                    container = %event.container,
                    timestamp = %event.timestamp,
                    price = event.container_price,
                    "ignoring invalid container price in totals"
                );
            }
        }

        summary.total_cases = events.len();
        summary.total_key_cost = events.len() as f64 * self.key_price;
        summary
    }
}

impl Default for SummaryService {
    fn default() -> Self {
        Self::new(crate::models::settings::DEFAULT_KEY_PRICE)
    }
}
