//! Item names for drop tips, read from the engine's `item_index.json`.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

const INDEX_JSON: &str = "item_index.json";

/// Items a stage can never drop (double chips, permits, vouchers, ...)
const EXCLUDED_DROPS: [&str; 28] = [
    "3213", "3223", "3233", "3243", "3253", "3263", "3273", "3283", "7001", "7002", "7003",
    "7004", "4004", "4005", "3105", "3131", "3132", "3133", "6001", "3141", "4002", "32001",
    "30115", "30125", "30135", "30145", "30155", "30165",
];

#[derive(Debug, Clone, Deserialize)]
pub struct ItemInfo {
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(rename = "classifyType", default)]
    pub classify_type: Option<String>,
    #[serde(rename = "sortId", default)]
    pub sort_id: i64,
}

#[derive(Debug, Clone, Default)]
pub struct ItemIndex {
    items: HashMap<String, ItemInfo>,
}

impl ItemIndex {
    /// Load `item_index.json` from the resource directory.
    /// A missing or corrupt file gives an empty index.
    pub fn load_from_dir(resource_dir: &Path) -> Self {
        let path = resource_dir.join(INDEX_JSON);
        if !path.is_file() {
            debug!(path = %path.display(), "No item index");
            return Self::default();
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => Self::from_json(&text),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read item index");
                Self::default()
            }
        }
    }

    pub fn from_json(text: &str) -> Self {
        match serde_json::from_str::<HashMap<String, ItemInfo>>(text) {
            Ok(items) => {
                debug!(count = items.len(), "Item index loaded");
                Self { items }
            }
            Err(e) => {
                warn!(error = %e, "Failed to parse item index");
                Self::default()
            }
        }
    }

    pub fn name(&self, id: &str) -> Option<&str> {
        self.items.get(id).map(|item| item.name.as_str())
    }

    /// Numeric item ids a stage can drop, in id order
    pub fn drop_items(&self) -> Vec<(&str, &ItemInfo)> {
        let mut drops: Vec<_> = self
            .items
            .iter()
            .filter(|(id, _)| id.bytes().all(|b| b.is_ascii_digit()))
            .filter(|(id, _)| !EXCLUDED_DROPS.contains(&id.as_str()))
            .map(|(id, item)| (id.as_str(), item))
            .collect();
        drops.sort_by(|a, b| a.0.cmp(b.0));
        drops
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
