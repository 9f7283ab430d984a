use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Upper bound on an entry's lifetime, keeps `now + ttl` representable.
const MAX_TTL: Duration = Duration::from_secs(86_400 * 365 * 30);

/// A single price data point (date → price).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// Daily price history of one market item, ordered by date.
///
/// Market history is sparse (one sample per day the item traded), so lookups
/// fall back to the nearest known date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    points: BTreeMap<NaiveDate, f64>,
}

impl PriceSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the price for a date.
    pub fn insert(&mut self, date: NaiveDate, price: f64) {
        self.points.insert(date, price);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Exact price for `date`, if the item traded that day.
    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.points.get(&date).copied()
    }

    /// Price on `date`, else the latest earlier sample, else the earliest
    /// later one. Returns the date actually used alongside the price.
    pub fn on_or_near(&self, date: NaiveDate) -> Option<(NaiveDate, f64)> {
        if let Some(price) = self.get(date) {
            return Some((date, price));
        }
        let floor = self
            .points
            .range((Bound::Unbounded, Bound::Included(date)))
            .next_back();
        let ceiling = || {
            self.points
                .range((Bound::Included(date), Bound::Unbounded))
                .next()
        };
        floor.or_else(ceiling).map(|(d, p)| (*d, *p))
    }
}

impl FromIterator<PricePoint> for PriceSeries {
    fn from_iter<I: IntoIterator<Item = PricePoint>>(iter: I) -> Self {
        let mut series = Self::new();
        for point in iter {
            series.insert(point.date, point.price);
        }
        series
    }
}

struct CacheEntry {
    series: Arc<PriceSeries>,
    expires_at: Instant,
}

/// In-memory cache of price series keyed by item name.
///
/// Entries expire `ttl` after insertion. Expiry is checked on read only; a
/// stale entry is dropped by the `get` that finds it, nothing sweeps in the
/// background.
pub struct PriceCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl PriceCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: ttl.min(MAX_TTL),
        }
    }

    /// Fresh series for `item`, evicting it first if it has expired.
    pub fn get(&self, item: &str) -> Option<Arc<PriceSeries>> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(item) {
            Some(entry) if Instant::now() < entry.expires_at => {
                tracing::debug!(item, "price cache hit");
                Some(Arc::clone(&entry.series))
            }
            Some(_) => {
                tracing::debug!(item, "price cache entry expired");
                entries.remove(item);
                None
            }
            None => {
                tracing::debug!(item, "price cache miss");
                None
            }
        }
    }

    /// Store (or replace) the series for `item`, restarting its freshness window.
    pub fn put(&self, item: &str, series: PriceSeries) -> Arc<PriceSeries> {
        let series = Arc::new(series);
        let entry = CacheEntry {
            series: Arc::clone(&series),
            expires_at: Instant::now() + self.ttl,
        };
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(item.to_string(), entry);
        series
    }

    /// Number of stored entries, stale ones included until they are read.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
