//! Data models for the activity schedule and the merged stage catalog.
//!
//! - `activity`: wire format of `StageActivityV2.json`
//! - `window`: time-boxed windows and timestamp parsing
//! - `stage`: `ActivityStage`, `MiniGame`, `MergedStageEntry` and the UI rows

pub mod activity;
pub mod stage;
pub mod window;

pub use activity::{
    ActivityInfo, ActivityStageRaw, ClientStageActivity, MiniGameEntry, ResourceCollectionInfo,
    SideStoryStageEntry, StageActivityDocument,
};
pub use stage::{ActivityStage, MergedStageEntry, MiniGame, StageGroup, StageItem};
pub use window::ActivityWindow;
