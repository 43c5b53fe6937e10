//! A bounded registry of open collection trees.
//!
//! [`TreeCache`] hands out shared handles to persistent trees keyed by their
//! [`TreeRoot`]. At most one handle per root is reachable through the cache,
//! even when many sessions create, load, or remove trees at once.

pub use tree_nub::common::errors::TreeError;
pub use tree_nub::common::id::TreeRoot;
pub use tree_nub::tree::{TreeFile, TreeHandle, TreeStorage};
pub use tree_nub::{Result, ResultExt};

pub mod cache;
pub mod options;
pub mod store;

pub use cache::TreeCache;
pub use options::TreeCacheOptions;
pub use store::StoreKind;
