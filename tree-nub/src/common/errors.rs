use crate::common::id::TreeRoot;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TreeError {
  #[error("NotFound: No tree rooted at `{0}`.")]
  NotFound(TreeRoot),
  #[error("Corrupt: Unable to read the tree rooted at `{0}`.")]
  Corrupt(TreeRoot),
  #[error("IOError: Tree storage failed.")]
  Io,
  #[error("RootCollision: Freshly created root `{0}` is already registered.")]
  RootCollision(TreeRoot),
}

impl TreeError {
  /// The failure came from opening a tree that is missing or unreadable.
  pub fn is_open_failure(&self) -> bool {
    matches!(self, TreeError::NotFound(_) | TreeError::Corrupt(_))
  }
}
