//! Resource synchronization across the document mirrors.

pub mod orchestrator;
pub mod source;

pub use orchestrator::{Fetched, ResourceSync, Source};
pub use source::DocumentSource;
