use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate over a set of case openings. Derived on every run, never persisted
/// on its own (the text report embeds its rendering).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseOpeningSummary {
    /// Openings per container name
    pub case_counts: BTreeMap<String, usize>,

    /// Openings per received item name
    pub item_counts: BTreeMap<String, usize>,

    /// Openings per rarity label
    pub rarity_counts: BTreeMap<String, usize>,

    /// Always equal to the number of summarized events
    pub total_cases: usize,

    /// total_cases × key unit price
    pub total_key_cost: f64,

    /// Sum of the containers' market prices
    pub total_case_cost: f64,
}

impl CaseOpeningSummary {
    pub fn total_cost(&self) -> f64 {
        self.total_key_cost + self.total_case_cost
    }

    /// Share of each container in percent. Empty when nothing was opened.
    pub fn case_percentages(&self) -> BTreeMap<String, f64> {
        percentages(&self.case_counts, self.total_cases)
    }

    /// Share of each rarity in percent. Empty when nothing was opened.
    pub fn rarity_percentages(&self) -> BTreeMap<String, f64> {
        percentages(&self.rarity_counts, self.total_cases)
    }
}

fn percentages(counts: &BTreeMap<String, usize>, total: usize) -> BTreeMap<String, f64> {
    if total == 0 {
        return BTreeMap::new();
    }
    counts
        .iter()
        .map(|(name, count)| (name.clone(), *count as f64 / total as f64 * 100.0))
        .collect()
}

impl std::fmt::Display for CaseOpeningSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Case Opening Summary:")?;
        writeln!(f)?;
        writeln!(f, "Total cases opened: {}", self.total_cases)?;
        writeln!(f, "Total cost for keys: {:.2}€", self.total_key_cost)?;
        writeln!(f, "Total cost for cases: {:.2}€", self.total_case_cost)?;
        writeln!(f, "Total cost: {:.2}€", self.total_cost())?;
        writeln!(f)?;

        writeln!(f, "Cases Opened:")?;
        for (name, pct) in self.case_percentages() {
            let count = self.case_counts.get(&name).copied().unwrap_or(0);
            writeln!(f, "{name}: {count} ({pct:.2}%)")?;
        }

        writeln!(f)?;
        writeln!(f, "Items Received by Rarity:")?;
        for (rarity, pct) in self.rarity_percentages() {
            let count = self.rarity_counts.get(&rarity).copied().unwrap_or(0);
            writeln!(f, "{rarity}: {count} ({pct:.2}%)")?;
        }
        Ok(())
    }
}
