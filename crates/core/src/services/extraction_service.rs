use async_trait::async_trait;
use std::sync::Arc;

use crate::models::event::CaseOpeningEvent;
use crate::models::history::HistoryResponse;
use crate::parsing::history_markup;
use crate::providers::traits::{EventExtractor, PriceLookup};

/// Extracts case openings from a history page and prices each container at
/// the opening date.
///
/// Markup is parsed fully before the first price lookup, so no parsed
/// document is held across an await.
pub struct CaseOpeningExtractor {
    prices: Arc<dyn PriceLookup>,
}

impl CaseOpeningExtractor {
    pub fn new(prices: Arc<dyn PriceLookup>) -> Self {
        Self { prices }
    }
}

#[async_trait]
impl EventExtractor for CaseOpeningExtractor {
    async fn extract(&self, page: &HistoryResponse) -> Vec<CaseOpeningEvent> {
        let candidates = history_markup::parse_openings(page);

        let mut events = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let container_price = self
                .prices
                .price_on_or_near(&candidate.container, candidate.timestamp.date())
                .await;
            events.push(CaseOpeningEvent {
                timestamp: candidate.timestamp,
                container: candidate.container,
                key: candidate.key,
                item: candidate.item,
                rarity: candidate.rarity,
                container_price,
                rental: candidate.rental,
            });
        }
        events
    }
}
