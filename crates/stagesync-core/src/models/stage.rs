//! Domain models for stages and mini games.
//!
//! These are the catalog's own types, decoupled from the activity document
//! wire format in `activity`.

use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

use super::activity::{ActivityStageRaw, MiniGameEntry};
use super::window::{parse_bound, ActivityWindow};
use crate::catalog::VersionGate;

/// A time-boxed stage published by the activity document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityStage {
    pub display: String,
    pub code: String,
    pub drop: Option<String>,
    pub window: Option<ActivityWindow>,
    /// Side-story group the stage was published under
    pub group: String,
}

impl ActivityStage {
    pub fn from_raw(raw: &ActivityStageRaw, window: Option<ActivityWindow>, group: &str) -> Self {
        Self {
            display: raw.display.clone(),
            code: raw.value.clone(),
            drop: raw.drop.clone().filter(|d| !d.is_empty()),
            window,
            group: group.to_string(),
        }
    }

    /// Available while its window is open, or always when it has none
    pub fn is_available(&self, now: DateTime<Utc>) -> bool {
        self.window.as_ref().map_or(true, |w| w.is_open(now))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiniGame {
    pub display: String,
    /// Task code handed to the automation engine
    pub value: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub tip: Option<String>,
    pub tip_key: Option<String>,
    pub is_unsupported: bool,
}

impl MiniGame {
    /// Build from a document entry. An entry the current engine is too old
    /// for is kept, flagged, and its tip replaced with a notice. A missing
    /// bound reads as the epoch, so an undated entry is never open.
    pub fn from_entry(entry: &MiniGameEntry, gate: &VersionGate) -> Self {
        let display = [&entry.display, &entry.display_key, &entry.value]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
            .cloned()
            .unwrap_or_default();
        let value = entry.value.clone().unwrap_or_else(|| display.clone());

        let required = entry
            .minimum_required
            .as_deref()
            .filter(|r| !r.trim().is_empty());
        let is_unsupported = required.is_some_and(|r| !gate.meets(Some(r)));
        let (tip, tip_key) = match required {
            Some(r) if is_unsupported => (Some(format!("Version too low\nMinimum required: {}", r)), None),
            _ => (entry.tip.clone(), entry.tip_key.clone()),
        };

        Self {
            display,
            value,
            start: Some(
                parse_bound(entry.utc_start_time.as_deref(), entry.time_zone)
                    .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            ),
            end: Some(
                parse_bound(entry.utc_expire_time.as_deref(), entry.time_zone)
                    .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            ),
            tip,
            tip_key,
            is_unsupported,
        }
    }

    /// `None` bounds only come from the built-in defaults and are
    /// open-ended on that side.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.start.map_or(true, |start| start <= now) && self.end.map_or(true, |end| now < end)
    }
}

/// One entry of the merged catalog, keyed by stage code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedStageEntry {
    pub code: String,
    pub display_name: String,
    /// Empty means open every day
    pub open_days: Vec<Weekday>,
    pub window: Option<ActivityWindow>,
    pub drop: Option<String>,
    pub drop_groups: Vec<Vec<String>>,
    pub tip: String,
}

impl MergedStageEntry {
    /// Entry for a code nothing else is known about
    pub fn bare(code: &str) -> Self {
        Self {
            code: code.to_string(),
            display_name: code.to_string(),
            open_days: Vec::new(),
            window: None,
            drop: None,
            drop_groups: Vec::new(),
            tip: String::new(),
        }
    }

    pub fn is_open(&self, weekday: Weekday, now: DateTime<Utc>) -> bool {
        if let Some(window) = &self.window {
            if window.is_open(now) {
                return true;
            }
            if !window.is_resource_collection {
                return false;
            }
        }
        self.open_days.is_empty() || self.open_days.contains(&weekday)
    }
}

/// Stage row as presented to the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct StageItem {
    pub code: String,
    pub display_name: String,
    pub is_activity_stage: bool,
    pub is_open_today: bool,
    pub drop: Option<String>,
    pub drop_groups: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct StageGroup {
    pub title: String,
    pub stages: Vec<StageItem>,
    pub days_left_text: Option<String>,
}
