//! Sync pass driver and owner of the published catalog snapshot.
//!
//! `refresh` fetches the activity document and the task documents
//! concurrently, rebuilds a `StageCatalog` and swaps it in whole. Readers
//! clone the current `Arc` and never observe a half-built catalog.

use std::sync::{Arc, RwLock};

use chrono::Utc;
use futures::future::join_all;
use tracing::{debug, info, warn};

use super::items::ItemIndex;
use super::merge::StageCatalog;
use super::version::VersionGate;
use crate::models::{ActivityStage, MergedStageEntry, MiniGame, StageGroup, StageItem};
use crate::region::Namespace;
use crate::sync::DocumentSource;

/// What a sync pass managed to load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub activity_loaded: bool,
    pub tasks_loaded: usize,
    pub tasks_missing: Vec<String>,
    pub merged_stages: usize,
}

pub struct MergeEngine<S: DocumentSource> {
    source: S,
    gate: VersionGate,
    items: Arc<ItemIndex>,
    snapshot: RwLock<Arc<StageCatalog>>,
}

impl<S: DocumentSource> MergeEngine<S> {
    /// Starts with the permanent-only catalog until the first refresh.
    pub fn new(source: S, gate: VersionGate, items: ItemIndex) -> Self {
        let items = Arc::new(items);
        let initial = StageCatalog::permanent_only(Arc::clone(&items), Utc::now());
        Self {
            source,
            gate,
            items,
            snapshot: RwLock::new(Arc::new(initial)),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run one sync pass for `namespace` and publish the new catalog.
    pub async fn refresh(&self, namespace: &Namespace) -> RefreshReport {
        let activity = self.source.fetch_document(&namespace.activity_path);
        let tasks = join_all(
            namespace
                .task_paths
                .iter()
                .map(|path| self.source.fetch_document(path)),
        );
        let (activity, tasks) = tokio::join!(activity, tasks);

        let mut tasks_missing = Vec::new();
        for (path, body) in namespace.task_paths.iter().zip(&tasks) {
            if body.is_none() {
                warn!(path = %path, "Task document unavailable");
                tasks_missing.push(path.clone());
            }
        }
        if activity.is_none() {
            warn!(path = %namespace.activity_path, "Activity document unavailable, using permanent stages only");
        }

        let catalog = StageCatalog::build(
            activity.as_deref(),
            &namespace.client,
            &self.gate,
            Arc::clone(&self.items),
            Utc::now(),
        );
        let report = RefreshReport {
            activity_loaded: activity.is_some(),
            tasks_loaded: tasks.len() - tasks_missing.len(),
            tasks_missing,
            merged_stages: catalog.entries().len(),
        };
        self.publish(catalog);

        info!(
            client = %namespace.client,
            merged = report.merged_stages,
            tasks = report.tasks_loaded,
            "Sync pass complete"
        );
        report
    }

    fn publish(&self, catalog: StageCatalog) {
        *self.snapshot.write().unwrap_or_else(|e| e.into_inner()) = Arc::new(catalog);
    }

    /// The current catalog. Cheap; the snapshot is shared.
    pub fn snapshot(&self) -> Arc<StageCatalog> {
        let guard = self.snapshot.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&*guard)
    }

    pub fn get_merged_stage(&self, code: &str) -> MergedStageEntry {
        self.snapshot().get_merged_stage(code)
    }

    pub fn contains_stage(&self, code: &str) -> bool {
        self.snapshot().contains_stage(code)
    }

    /// Copy-on-write insert into the published catalog
    pub fn register_unopened_stage(&self, code: &str) {
        let mut guard = self.snapshot.write().unwrap_or_else(|e| e.into_inner());
        let mut next = StageCatalog::clone(&**guard);
        next.register_unopened_stage(code);
        *guard = Arc::new(next);
        debug!(code = code, "Registered unopened stage");
    }

    pub fn available_activity_stages(&self) -> Vec<ActivityStage> {
        self.snapshot().available_stages(Utc::now())
    }

    pub fn stage_groups(&self, today_only: bool) -> Vec<StageGroup> {
        self.snapshot().stage_groups(today_only, Utc::now())
    }

    pub fn list_available_stages(&self, today_only: bool) -> Vec<StageItem> {
        self.snapshot().stage_list(today_only, Utc::now())
    }

    pub fn get_today_tips(&self) -> Vec<String> {
        self.snapshot().tips(Utc::now())
    }

    pub fn is_resource_collection_active(&self) -> bool {
        self.snapshot().is_resource_collection_active(Utc::now())
    }

    pub fn mini_games(&self, only_open: bool) -> Vec<MiniGame> {
        self.snapshot().mini_games(only_open, Utc::now())
    }
}
