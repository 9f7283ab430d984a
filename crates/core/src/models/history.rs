use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

use super::event::Rarity;

/// App id under which CS2 item descriptions are keyed.
pub const CS2_APP_ID: &str = "730";

/// Position in the remote history listing, issued by each page and sent
/// back verbatim to get the next one. Lives for one run only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub time: u64,
    pub time_frac: u64,
    pub s: String,
}

/// One page of the AJAX inventory history response.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryResponse {
    /// Rendered history rows. Absent on error pages.
    pub html: Option<String>,

    /// appId → "classid_instanceid" → metadata of items on this page.
    /// Steam sends `[]` instead of `{}` when empty. Entries that don't have
    /// the expected shape are dropped one by one, so only those items lose
    /// their metadata.
    #[serde(default, deserialize_with = "lenient_descriptions")]
    pub descriptions: HashMap<String, HashMap<String, ItemDescription>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemDescription {
    #[serde(default)]
    pub tags: Vec<ItemTag>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemTag {
    pub category: Option<String>,
    pub color: Option<String>,
}

impl HistoryResponse {
    /// Rarity of the CS2 item with the given class/instance ids, `Unknown`
    /// when any level of the metadata is missing.
    pub fn rarity_of(&self, class_id: &str, instance_id: &str) -> Rarity {
        let key = format!("{class_id}_{instance_id}");
        self.descriptions
            .get(CS2_APP_ID)
            .and_then(|items| items.get(&key))
            .and_then(|desc| {
                desc.tags
                    .iter()
                    .find(|tag| tag.category.as_deref() == Some("Rarity"))
            })
            .map(|tag| match tag.color.as_deref() {
                Some(color) => Rarity::from_color(color),
                None => Rarity::Unknown,
            })
            .unwrap_or(Rarity::Unknown)
    }
}

fn lenient_descriptions<'de, D>(
    deserializer: D,
) -> Result<HashMap<String, HashMap<String, ItemDescription>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let serde_json::Value::Object(apps) = value else {
        return Ok(HashMap::new());
    };

    let mut descriptions = HashMap::with_capacity(apps.len());
    for (app_id, items) in apps {
        let serde_json::Value::Object(items) = items else {
            tracing::debug!(app_id = %app_id, "ignoring non-map item descriptions");
            continue;
        };
        let parsed: HashMap<String, ItemDescription> = items
            .into_iter()
            .filter_map(|(key, raw)| match serde_json::from_value(raw) {
                Ok(desc) => Some((key, desc)),
                Err(e) => {
                    tracing::debug!(app_id = %app_id, item = %key, error = %e, "ignoring malformed item description");
                    None
                }
            })
            .collect();
        descriptions.insert(app_id, parsed);
    }
    Ok(descriptions)
}
