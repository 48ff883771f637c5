use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::activity::{ActivityInfo, ResourceCollectionInfo};

/// Timestamp format used throughout the activity document
pub const ACTIVITY_TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Display name of the resource-collection window
pub const RESOURCE_COLLECTION_NAME: &str = "Resource Collection";

/// Parse a published timestamp in the given UTC offset (hours).
///
/// Returns `None` for a missing or blank value. A value that is present but
/// unparseable maps to the Unix epoch, which reads as "long expired".
pub fn parse_bound(value: Option<&str>, time_zone: i32) -> Option<DateTime<Utc>> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;
    Some(parse_instant(value, time_zone).unwrap_or(DateTime::<Utc>::UNIX_EPOCH))
}

fn parse_instant(value: &str, time_zone: i32) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(value, ACTIVITY_TIME_FORMAT).ok()?;
    let offset = FixedOffset::east_opt(time_zone.checked_mul(3600)?)?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|at| at.with_timezone(&Utc))
}

/// A published time-boxed window. Open on `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityWindow {
    pub name: String,
    pub tip: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub is_resource_collection: bool,
}

impl ActivityWindow {
    /// Window of a side-story group or stage. Missing bounds read as epoch.
    pub fn from_activity_info(group_key: &str, info: &ActivityInfo) -> Self {
        Self {
            name: info
                .stage_name
                .clone()
                .unwrap_or_else(|| group_key.to_string()),
            tip: info.tip.clone().unwrap_or_default(),
            start: parse_bound(info.utc_start_time.as_deref(), info.time_zone)
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            end: parse_bound(info.utc_expire_time.as_deref(), info.time_zone)
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            is_resource_collection: false,
        }
    }

    pub fn from_resource_collection(info: &ResourceCollectionInfo) -> Self {
        Self {
            name: RESOURCE_COLLECTION_NAME.to_string(),
            tip: info.tip.clone().unwrap_or_default(),
            start: parse_bound(info.utc_start_time.as_deref(), info.time_zone)
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            end: parse_bound(info.utc_expire_time.as_deref(), info.time_zone)
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            is_resource_collection: true,
        }
    }

    /// Empty window that was never open, used for stages known by code only
    pub fn closed(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tip: String::new(),
            start: DateTime::<Utc>::UNIX_EPOCH,
            end: DateTime::<Utc>::UNIX_EPOCH,
            is_resource_collection: false,
        }
    }

    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.start <= now && now < self.end
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.end
    }

    pub fn is_pending(&self, now: DateTime<Utc>) -> bool {
        now < self.start
    }

    /// Whole days until the window closes, truncated
    pub fn days_left(&self, now: DateTime<Utc>) -> i64 {
        (self.end - now).num_days()
    }

    /// "3d", or "<1d" on the last day
    pub fn days_left_text(&self, now: DateTime<Utc>) -> String {
        match self.days_left(now) {
            days if days > 0 => format!("{}d", days),
            _ => "<1d".to_string(),
        }
    }
}
