//! Stage catalog: the permanent stage table, the activity merge and the
//! engine that publishes merged snapshots.
//!
//! - `MergeEngine`: runs a sync pass and owns the current snapshot
//! - `StageCatalog`: one immutable merge result with its read projections
//! - `VersionGate`: minimum-version checks for published content
//! - `ItemIndex`: item names used in drop tips

pub mod engine;
pub mod items;
pub mod merge;
pub mod minigames;
pub mod permanent;
pub mod version;

pub use engine::{MergeEngine, RefreshReport};
pub use items::ItemIndex;
pub use merge::StageCatalog;
pub use permanent::{PermanentStage, StageCategory, PERMANENT_STAGES};
pub use version::VersionGate;
