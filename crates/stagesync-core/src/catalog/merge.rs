//! Merges the published activity schedule with the permanent catalog.
//!
//! A `StageCatalog` is built in one go from the activity document text and
//! is read-only afterwards (apart from `register_unopened_stage`). Merged
//! entries keep insertion order: activity stages first, then permanent
//! stages, so projections like `tips` are deterministic.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::items::ItemIndex;
use super::minigames;
use super::permanent::{self, PERMANENT_STAGES};
use super::version::VersionGate;
use crate::models::{
    ActivityStage, ActivityWindow, ClientStageActivity, MergedStageEntry, MiniGame,
    StageActivityDocument, StageGroup, StageItem,
};
use crate::schedule::server_weekday;

/// Title of the permanent stage group
pub const PERMANENT_GROUP_TITLE: &str = "Permanent";

/// Placeholder heading the permanent group: run whatever stage is current
/// or was used last
pub const CURRENT_OR_LAST_DISPLAY: &str = "Current/Last";

#[derive(Debug, Clone, Default)]
pub struct StageCatalog {
    activity_stages: Vec<ActivityStage>,
    mini_games: Vec<MiniGame>,
    resource_collection: Option<ActivityWindow>,
    entries: Vec<MergedStageEntry>,
    index: HashMap<String, usize>,
    items: Arc<ItemIndex>,
}

impl StageCatalog {
    /// Catalog holding only the permanent stages and default mini games
    pub fn permanent_only(items: Arc<ItemIndex>, now: DateTime<Utc>) -> Self {
        Self::build(None, "", &VersionGate::default(), items, now)
    }

    /// Build the catalog for `client` from the activity document text.
    /// A missing or malformed document degrades to the permanent catalog.
    pub fn build(
        document: Option<&str>,
        client: &str,
        gate: &VersionGate,
        items: Arc<ItemIndex>,
        now: DateTime<Utc>,
    ) -> Self {
        let parsed = document.and_then(|text| match StageActivityDocument::parse(text) {
            Ok(doc) => Some(doc),
            Err(e) => {
                warn!(error = %e, "Failed to parse activity document");
                None
            }
        });
        let section = parsed.as_ref().and_then(|doc| {
            let section = doc.section(client);
            if section.is_none() {
                warn!(client = client, "Activity document has no usable section");
            }
            section
        });

        let activity_stages = section
            .map(|s| build_activity_stages(s, gate))
            .unwrap_or_default();
        let published_games = section
            .and_then(|s| s.mini_game.as_ref())
            .map(|entries| {
                entries
                    .iter()
                    .map(|entry| MiniGame::from_entry(entry, gate))
                    .filter(|game| game.is_open(now))
                    .collect()
            })
            .unwrap_or_default();
        let resource_collection = section
            .and_then(|s| s.resource_collection.as_ref())
            .map(ActivityWindow::from_resource_collection);

        let mut catalog = Self {
            activity_stages,
            mini_games: minigames::with_defaults(published_games),
            resource_collection,
            entries: Vec::new(),
            index: HashMap::new(),
            items,
        };
        catalog.merge();
        catalog.prune_expired(now);

        debug!(
            activity_stages = catalog.activity_stages.len(),
            mini_games = catalog.mini_games.len(),
            merged = catalog.entries.len(),
            "Stage catalog built"
        );
        catalog
    }

    fn upsert(&mut self, entry: MergedStageEntry) {
        match self.index.get(&entry.code) {
            Some(&i) => self.entries[i] = entry,
            None => {
                self.index.insert(entry.code.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    fn merge(&mut self) {
        let activity: Vec<MergedStageEntry> = self
            .activity_stages
            .iter()
            .map(|stage| MergedStageEntry {
                code: stage.code.clone(),
                display_name: stage.display.clone(),
                window: stage.window.clone(),
                drop: stage.drop.clone(),
                ..MergedStageEntry::bare(&stage.code)
            })
            .collect();
        for entry in activity {
            self.upsert(entry);
        }

        for stage in PERMANENT_STAGES {
            match self.index.get(stage.code) {
                // Activity metadata wins, weekday data only exists here.
                // The activity's drop line replaces the permanent tip.
                Some(&i) => {
                    let entry = &mut self.entries[i];
                    entry.open_days = stage.open_days.to_vec();
                    entry.drop_groups = stage.drop_groups_owned();
                }
                None => {
                    let window = if permanent::is_resource_stage(stage.code) {
                        self.resource_collection.clone()
                    } else {
                        None
                    };
                    self.upsert(MergedStageEntry {
                        code: stage.code.to_string(),
                        display_name: stage.display_name().to_string(),
                        open_days: stage.open_days.to_vec(),
                        window,
                        drop: None,
                        drop_groups: stage.drop_groups_owned(),
                        tip: stage.tip.to_string(),
                    });
                }
            }
        }
    }

    fn prune_expired(&mut self, now: DateTime<Utc>) {
        let before = self.entries.len();
        self.entries.retain(|entry| {
            let expired = entry
                .window
                .as_ref()
                .is_some_and(|w| w.is_expired(now) && !w.is_resource_collection);
            !(expired && permanent::is_activity_code(&entry.code))
        });
        if self.entries.len() != before {
            debug!(pruned = before - self.entries.len(), "Expired activity stages removed");
            self.reindex();
        }
    }

    fn reindex(&mut self) {
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.code.clone(), i))
            .collect();
    }

    // ========================================================================
    // Read projections
    // ========================================================================

    /// Never fails: unknown codes synthesize an entry named after the code.
    /// Activity-shaped codes get a closed window so they read as not open.
    pub fn get_merged_stage(&self, code: &str) -> MergedStageEntry {
        if let Some(&i) = self.index.get(code) {
            return self.entries[i].clone();
        }
        if !code.is_empty() && permanent::is_activity_code(code) {
            return MergedStageEntry {
                window: Some(ActivityWindow::closed(code)),
                ..MergedStageEntry::bare(code)
            };
        }
        MergedStageEntry::bare(code)
    }

    pub fn contains_stage(&self, code: &str) -> bool {
        self.index.contains_key(code)
    }

    /// Record a stage the user selected that is not open yet
    pub fn register_unopened_stage(&mut self, code: &str) {
        self.upsert(MergedStageEntry {
            window: Some(ActivityWindow::closed(code)),
            ..MergedStageEntry::bare(code)
        });
    }

    pub fn entries(&self) -> &[MergedStageEntry] {
        &self.entries
    }

    pub fn activity_stages(&self) -> &[ActivityStage] {
        &self.activity_stages
    }

    pub fn available_stages(&self, now: DateTime<Utc>) -> Vec<ActivityStage> {
        self.activity_stages
            .iter()
            .filter(|stage| stage.is_available(now))
            .cloned()
            .collect()
    }

    /// Open activities first, one group each, then the permanent group.
    pub fn stage_groups(&self, today_only: bool, now: DateTime<Utc>) -> Vec<StageGroup> {
        let weekday = server_weekday(now);
        let mut groups: Vec<StageGroup> = Vec::new();
        let mut group_index: HashMap<&str, usize> = HashMap::new();

        for stage in self.activity_stages.iter().filter(|s| s.is_available(now)) {
            let i = *group_index.entry(stage.group.as_str()).or_insert_with(|| {
                let title = stage
                    .window
                    .as_ref()
                    .map(|w| w.tip.clone())
                    .filter(|tip| !tip.is_empty())
                    .unwrap_or_else(|| stage.group.clone());
                groups.push(StageGroup {
                    title,
                    stages: Vec::new(),
                    days_left_text: stage.window.as_ref().map(|w| w.days_left_text(now)),
                });
                groups.len() - 1
            });
            groups[i].stages.push(StageItem {
                code: stage.code.clone(),
                display_name: stage.display.clone(),
                is_activity_stage: true,
                is_open_today: true,
                drop: stage.drop.clone(),
                drop_groups: Vec::new(),
            });
        }

        let placeholder = StageItem {
            code: String::new(),
            display_name: CURRENT_OR_LAST_DISPLAY.to_string(),
            is_activity_stage: false,
            is_open_today: true,
            drop: None,
            drop_groups: Vec::new(),
        };
        let permanent: Vec<StageItem> = std::iter::once(placeholder)
            .chain(PERMANENT_STAGES.iter().map(|stage| {
                let is_open_today = match self.index.get(stage.code) {
                    Some(&i) => self.entries[i].is_open(weekday, now),
                    None => stage.is_open_on(weekday),
                };
                StageItem {
                    code: stage.code.to_string(),
                    display_name: stage.display_name().to_string(),
                    is_activity_stage: false,
                    is_open_today,
                    drop: None,
                    drop_groups: stage.drop_groups_owned(),
                }
            }))
            .filter(|item| !today_only || item.is_open_today)
            .collect();

        groups.push(StageGroup {
            title: PERMANENT_GROUP_TITLE.to_string(),
            stages: permanent,
            days_left_text: None,
        });
        groups
    }

    pub fn stage_list(&self, today_only: bool, now: DateTime<Utc>) -> Vec<StageItem> {
        self.stage_groups(today_only, now)
            .into_iter()
            .flat_map(|group| group.stages)
            .collect()
    }

    /// Tip lines for the current server day. The resource-collection line,
    /// if any, comes first.
    pub fn tips(&self, now: DateTime<Utc>) -> Vec<String> {
        let weekday = server_weekday(now);
        let mut lines = Vec::new();
        let mut resource_line: Option<String> = None;
        let mut side_stories: Vec<&str> = Vec::new();

        for entry in self.entries.iter().filter(|e| e.is_open(weekday, now)) {
            if let Some(window) = &entry.window {
                if window.is_resource_collection {
                    if resource_line.is_none() && window.is_open(now) {
                        resource_line = Some(format!(
                            "[{}] {} left",
                            window.tip,
                            window.days_left_text(now)
                        ));
                    }
                } else if !window.name.is_empty() && !side_stories.contains(&window.name.as_str()) {
                    side_stories.push(&window.name);
                    lines.push(format!("[{}] {} left", window.name, window.days_left_text(now)));
                }
            }

            if let Some(drop) = entry.drop.as_deref().filter(|d| !d.is_empty()) {
                let item = self.items.name(drop).unwrap_or(drop);
                lines.push(format!("{}: {}", entry.code, item));
            }

            if !entry.tip.is_empty() {
                lines.push(entry.tip.clone());
            }
        }

        if let Some(line) = resource_line {
            lines.insert(0, line);
        }
        lines
    }

    pub fn resource_collection(&self) -> Option<&ActivityWindow> {
        self.resource_collection.as_ref()
    }

    pub fn is_resource_collection_active(&self, now: DateTime<Utc>) -> bool {
        self.resource_collection
            .as_ref()
            .is_some_and(|w| w.is_open(now))
    }

    pub fn mini_games(&self, only_open: bool, now: DateTime<Utc>) -> Vec<MiniGame> {
        self.mini_games
            .iter()
            .filter(|game| !only_open || game.is_open(now))
            .cloned()
            .collect()
    }
}

fn build_activity_stages(section: &ClientStageActivity, gate: &VersionGate) -> Vec<ActivityStage> {
    let mut stages = Vec::new();
    let Some(groups) = &section.side_story_stage else {
        return stages;
    };

    for (key, group) in groups {
        if !gate.meets(group.minimum_required.as_deref()) {
            debug!(group = %key, required = ?group.minimum_required, "Skipping group, version too low");
            continue;
        }
        let group_window = group
            .activity
            .as_ref()
            .map(|info| ActivityWindow::from_activity_info(key, info));

        for raw in group.stages.iter().flatten() {
            if !gate.meets(raw.minimum_required.as_deref()) {
                debug!(stage = %raw.value, required = ?raw.minimum_required, "Skipping stage, version too low");
                continue;
            }
            let window = raw
                .activity
                .as_ref()
                .map(|info| ActivityWindow::from_activity_info(key, info))
                .or_else(|| group_window.clone());
            stages.push(ActivityStage::from_raw(raw, window, key));
        }
    }
    stages
}
