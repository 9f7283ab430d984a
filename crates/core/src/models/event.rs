use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Classification of a received item, derived from the colour of its
/// `Rarity` tag in the item metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rarity {
    ConsumerGrade,
    IndustrialGrade,
    MilSpec,
    Restricted,
    Classified,
    Covert,
    RareSpecial,
    /// Rental openings never reveal the item.
    Rental,
    /// No metadata for the received item.
    Unknown,
    /// A rarity tag was present but its colour is not in the palette.
    Unrecognized(String),
}

impl Rarity {
    /// Map a tag colour (hex, no leading `#`) onto the palette.
    pub fn from_color(color: &str) -> Self {
        match color.trim().trim_start_matches('#').to_ascii_lowercase().as_str() {
            "b0c3d9" => Rarity::ConsumerGrade,
            "5e98d9" => Rarity::IndustrialGrade,
            "4b69ff" => Rarity::MilSpec,
            "8847ff" => Rarity::Restricted,
            "d32ce6" => Rarity::Classified,
            "eb4b4b" => Rarity::Covert,
            "e4ae39" => Rarity::RareSpecial,
            _ => Rarity::Unrecognized(color.to_string()),
        }
    }
}

impl std::fmt::Display for Rarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rarity::ConsumerGrade => write!(f, "Consumer Grade (White)"),
            Rarity::IndustrialGrade => write!(f, "Industrial Grade (Light Blue)"),
            Rarity::MilSpec => write!(f, "Mil-Spec (Blue)"),
            Rarity::Restricted => write!(f, "Restricted (Purple)"),
            Rarity::Classified => write!(f, "Classified (Pink)"),
            Rarity::Covert => write!(f, "Covert (Red)"),
            Rarity::RareSpecial => write!(f, "Rare Special Item (Gold)"),
            Rarity::Rental => write!(f, "Rental"),
            Rarity::Unknown => write!(f, "Unknown"),
            Rarity::Unrecognized(color) => write!(f, "Unknown ({color})"),
        }
    }
}

/// Item name recorded for rental openings.
pub const RENTAL_ITEM: &str = "Rental Item";

/// Key name recorded when the history row lists only the container.
pub const UNKNOWN_KEY: &str = "Unknown Key";

/// A single container opening taken from the inventory history.
///
/// Built once during extraction and never mutated afterwards; the cache
/// snapshot stores it verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseOpeningEvent {
    /// When the container was opened, in the history page's local time.
    pub timestamp: NaiveDateTime,

    /// Name of the container that was unlocked
    pub container: String,

    /// Name of the key spent on it
    pub key: String,

    /// Name of the received item (`RENTAL_ITEM` for rentals)
    pub item: String,

    pub rarity: Rarity,

    /// Market price of the container around the opening date
    pub container_price: f64,

    pub rental: bool,
}

/// Structural dedup identity of an event: every field, compared by value.
///
/// Prices are compared by bit pattern so the identity can be hashed; `-0.0`
/// is folded into `0.0` first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventIdentity {
    timestamp: NaiveDateTime,
    container: String,
    key: String,
    item: String,
    rarity: Rarity,
    price_bits: u64,
    rental: bool,
}

impl CaseOpeningEvent {
    pub fn identity(&self) -> EventIdentity {
        let price = if self.container_price == 0.0 {
            0.0
        } else {
            self.container_price
        };
        EventIdentity {
            timestamp: self.timestamp,
            container: self.container.clone(),
            key: self.key.clone(),
            item: self.item.clone(),
            rarity: self.rarity.clone(),
            price_bits: price.to_bits(),
            rental: self.rental,
        }
    }
}

impl std::fmt::Display for CaseOpeningEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let item = if self.rental { RENTAL_ITEM } else { &self.item };
        write!(
            f,
            "{} - {} ({:.2}€): {} ({})",
            self.timestamp.format("%d.%m.%Y %H:%M:%S"),
            self.container,
            self.container_price,
            item,
            self.rarity,
        )?;
        if self.rental {
            write!(f, " [RENTAL]")?;
        }
        Ok(())
    }
}
