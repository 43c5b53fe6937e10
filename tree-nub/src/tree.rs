use crate::common::errors::TreeError;
use crate::common::id::TreeRoot;
use std::fmt::{Display, Formatter};

pub const DEFAULT_TREE_NAME: &str = "ridset";
pub const DEFAULT_TREE_EXTENSION: &str = ".rbt";

/// The logical file a category of collection trees is stored in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, getset::Getters)]
#[getset(get = "pub")]
pub struct TreeFile {
  name: String,
  extension: String,
}

impl TreeFile {
  pub fn new<N: Into<String>, E: Into<String>>(name: N, extension: E) -> TreeFile {
    TreeFile {
      name: name.into(),
      extension: extension.into(),
    }
  }

  pub fn file_name(&self) -> String {
    format!("{}{}", self.name, self.extension)
  }
}

impl Default for TreeFile {
  fn default() -> Self {
    TreeFile::new(DEFAULT_TREE_NAME, DEFAULT_TREE_EXTENSION)
  }
}

impl Display for TreeFile {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}{}", self.name, self.extension)
  }
}

/// An open, in-memory connection to one persistent collection tree.
///
/// Handles are shared behind an `Arc`. Neither disposal method consumes the
/// handle since other clones may still be alive.
pub trait TreeHandle: Send + Sync + 'static {
  /// The root this tree was created at or opened from.
  fn root(&self) -> TreeRoot;

  /// Release in-memory resources. On-disk data is untouched.
  #[inline]
  fn close(&self) {}

  /// Reclaim the tree's on-disk allocation.
  fn delete(&self) -> crate::Result<(), TreeError>;
}

/// A storage context able to allocate and open collection trees.
///
/// Both methods may block on I/O.
pub trait TreeStorage {
  type Tree: TreeHandle;

  /// Allocate a fresh root in `file` and return the new tree.
  fn create_tree(&self, file: &TreeFile) -> crate::Result<Self::Tree, TreeError>;

  /// Open the existing tree rooted at `root`.
  fn open_tree(&self, file: &TreeFile, root: TreeRoot) -> crate::Result<Self::Tree, TreeError>;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_tree_file() {
    let file = TreeFile::default();
    assert_eq!("ridset", file.name());
    assert_eq!(".rbt", file.extension());
    assert_eq!("ridset.rbt", file.file_name());
    assert_eq!(file.file_name(), file.to_string());
  }
}
