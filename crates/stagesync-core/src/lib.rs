//! stagesync core - keeps the published game documents in sync with a set of
//! mirrors and merges the activity schedule into a time-aware stage catalog.
//!
//! Layers, bottom up:
//! - `cache`: validator store and layered body cache
//! - `api`: conditional GET transport and the error taxonomy
//! - `sync`: the mirror-by-mirror orchestrator with offline fallback
//! - `catalog`: permanent stages, activity merge and the engine that
//!   publishes snapshots

pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod models;
pub mod region;
pub mod schedule;
pub mod sync;

pub use api::{FetchClient, HttpTransport, SyncError};
pub use cache::{LayeredCache, ValidatorStore};
pub use catalog::{ItemIndex, MergeEngine, RefreshReport, StageCatalog, VersionGate};
pub use config::SyncConfig;
pub use region::{namespace_for, Namespace};
pub use sync::{DocumentSource, Fetched, ResourceSync, Source};
