//! Wire format of the published activity schedule (`StageActivityV2.json`).
//!
//! The document root maps a client name (`Official`, `YoStarEN`, ...) to one
//! section; every section has the same shape. Keys are PascalCase except for
//! the three section fields.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::region::DEFAULT_CLIENT;

/// Default time zone of published timestamps (hours east of UTC)
fn default_time_zone() -> i32 {
    8
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageActivityDocument {
    pub clients: HashMap<String, ClientStageActivity>,
}

impl StageActivityDocument {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Section for `client`, falling back to the default client's section.
    pub fn section(&self, client: &str) -> Option<&ClientStageActivity> {
        self.clients
            .get(client)
            .or_else(|| self.clients.get(DEFAULT_CLIENT))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientStageActivity {
    /// Keyed by activity code. Ordered so groups list deterministically.
    #[serde(rename = "sideStoryStage", default)]
    pub side_story_stage: Option<BTreeMap<String, SideStoryStageEntry>>,
    #[serde(rename = "resourceCollection", default)]
    pub resource_collection: Option<ResourceCollectionInfo>,
    #[serde(rename = "miniGame", default)]
    pub mini_game: Option<Vec<MiniGameEntry>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SideStoryStageEntry {
    #[serde(rename = "MinimumRequired", default)]
    pub minimum_required: Option<String>,
    #[serde(rename = "Activity", default)]
    pub activity: Option<ActivityInfo>,
    #[serde(rename = "Stages", default)]
    pub stages: Option<Vec<ActivityStageRaw>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityInfo {
    #[serde(rename = "Tip", default)]
    pub tip: Option<String>,
    #[serde(rename = "StageName", default)]
    pub stage_name: Option<String>,
    #[serde(rename = "UtcStartTime", default)]
    pub utc_start_time: Option<String>,
    #[serde(rename = "UtcExpireTime", default)]
    pub utc_expire_time: Option<String>,
    #[serde(rename = "TimeZone", default = "default_time_zone")]
    pub time_zone: i32,
}

/// One stage inside a side-story group. `MinimumRequired` and `Activity`
/// override the group's values when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityStageRaw {
    #[serde(rename = "Display")]
    pub display: String,
    #[serde(rename = "Value")]
    pub value: String,
    #[serde(rename = "Drop", default)]
    pub drop: Option<String>,
    #[serde(rename = "MinimumRequired", default)]
    pub minimum_required: Option<String>,
    #[serde(rename = "Activity", default)]
    pub activity: Option<ActivityInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceCollectionInfo {
    #[serde(rename = "Tip", default)]
    pub tip: Option<String>,
    #[serde(rename = "UtcStartTime", default)]
    pub utc_start_time: Option<String>,
    #[serde(rename = "UtcExpireTime", default)]
    pub utc_expire_time: Option<String>,
    #[serde(rename = "TimeZone", default = "default_time_zone")]
    pub time_zone: i32,
    #[serde(rename = "IsResourceCollection", default)]
    pub is_resource_collection: bool,
}

/// Mini game entry. Either `Display` or `DisplayKey` is set, likewise `Tip`
/// or `TipKey`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MiniGameEntry {
    #[serde(rename = "MinimumRequired", default)]
    pub minimum_required: Option<String>,
    #[serde(rename = "Display", default)]
    pub display: Option<String>,
    #[serde(rename = "DisplayKey", default)]
    pub display_key: Option<String>,
    #[serde(rename = "Value", default)]
    pub value: Option<String>,
    #[serde(rename = "Tip", default)]
    pub tip: Option<String>,
    #[serde(rename = "TipKey", default)]
    pub tip_key: Option<String>,
    #[serde(rename = "UtcStartTime", default)]
    pub utc_start_time: Option<String>,
    #[serde(rename = "UtcExpireTime", default)]
    pub utc_expire_time: Option<String>,
    #[serde(rename = "TimeZone", default = "default_time_zone")]
    pub time_zone: i32,
}
