//! Local caching module for offline document access.
//!
//! Two independent stores live here:
//! - `ValidatorStore`: ETag / Last-Modified per exact request URL, used to
//!   make the next request conditional
//! - `LayeredCache`: last good document body per mirror-independent key,
//!   memory first with a file per key behind it
//!
//! Both are reset together by the explicit "clear cache" action.

pub mod layered;
pub mod validators;

pub use layered::LayeredCache;
pub use validators::{ValidatorRecord, ValidatorStore};
