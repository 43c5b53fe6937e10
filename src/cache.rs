use crate::options::TreeCacheOptions;
use crate::store::{HandleStore, Store, StoreKind};
use error_stack::{Report, ResultExt};
use std::fmt::{Debug, Formatter};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{debug, error, trace};
use tree_nub::common::errors::TreeError;
use tree_nub::common::id::TreeRoot;
use tree_nub::tree::{TreeFile, TreeHandle, TreeStorage};

/// Registry of open collection trees.
///
/// The storage context is passed to every operation that may touch disk.
/// No store lock is held while the storage creates, opens, closes, or
/// deletes a tree.
pub struct TreeCache<T> {
  tree_file: TreeFile,
  store: Store<T>,
}

impl<T: TreeHandle> Debug for TreeCache<T> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TreeCache")
      .field("tree_file", &self.tree_file)
      .field("store", &self.store.kind())
      .field("capacity", &self.store.capacity())
      .field("len", &self.store.len())
      .finish()
  }
}

impl<T: TreeHandle> Default for TreeCache<T> {
  fn default() -> Self {
    TreeCache::new(TreeCacheOptions::default())
  }
}

impl<T: TreeHandle> TreeCache<T> {
  pub fn new(options: TreeCacheOptions) -> TreeCache<T> {
    TreeCache {
      store: Store::new(options.store(), options.capacity()),
      tree_file: options.tree_file().clone(),
    }
  }

  pub fn with_capacity(capacity: NonZeroUsize) -> TreeCache<T> {
    TreeCache::new(TreeCacheOptions::builder().capacity(capacity).build())
  }

  /// Create a brand-new tree in `storage` and register it.
  ///
  /// A fresh root that is already registered means the storage handed out
  /// the same root twice. The registered tree stays the only one reachable,
  /// the new tree is closed, and [`TreeError::RootCollision`] is returned.
  pub fn create<S>(&self, storage: &S) -> crate::Result<Arc<T>, TreeError>
  where
    S: TreeStorage<Tree = T>,
  {
    let tree = storage
      .create_tree(&self.tree_file)
      .attach_printable_lazy(|| format!("creating a tree in `{}`", self.tree_file))?;
    let tree = Arc::new(tree);
    let root = tree.root();
    let registered = self.store.put_if_absent(root, tree.clone());
    if !Arc::ptr_eq(&registered, &tree) {
      tree.close();
      error!(%root, "created tree collides with a registered tree");
      return Err(Report::new(TreeError::RootCollision(root)));
    }
    debug!(%root, "created tree");
    Ok(tree)
  }

  /// Return the registered tree for `root`, opening it from `storage` on a
  /// miss.
  ///
  /// Concurrent loads of the same unregistered root may each open a handle.
  /// Only the first one registered is returned to any of them; the others
  /// are closed.
  pub fn load<S>(&self, storage: &S, root: TreeRoot) -> crate::Result<Arc<T>, TreeError>
  where
    S: TreeStorage<Tree = T>,
  {
    if let Some(tree) = self.store.get(root) {
      trace!(%root, "tree cache hit");
      return Ok(tree);
    }

    let opened = storage
      .open_tree(&self.tree_file, root)
      .attach_printable_lazy(|| format!("loading tree `{root}`"))?;
    debug_assert_eq!(root, opened.root());
    let opened = Arc::new(opened);
    debug!(%root, "opened tree on cache miss");

    let registered = self.store.put_if_absent(root, opened.clone());
    if !Arc::ptr_eq(&registered, &opened) {
      debug!(%root, "closing duplicate handle of a concurrently loaded tree");
      opened.close();
    }
    Ok(registered)
  }

  /// Unregister `root` and delete its tree. Unknown roots are ignored.
  pub fn remove(&self, root: TreeRoot) -> crate::Result<(), TreeError> {
    match self.store.remove(root) {
      Some(tree) => {
        debug!(%root, "removing tree");
        tree
          .delete()
          .attach_printable_lazy(|| format!("removing tree `{root}`"))
      }
      None => Ok(()),
    }
  }

  /// Forget every registered tree. Nothing is closed or deleted, so handles
  /// already given out stay usable.
  pub fn shutdown(&self) {
    self.store.clear();
    debug!(tree_file = %self.tree_file, "tree cache shut down");
  }

  /// Registered tree for `root`, without ever touching storage.
  pub fn get(&self, root: TreeRoot) -> Option<Arc<T>> {
    self.store.get(root)
  }

  pub fn contains(&self, root: TreeRoot) -> bool {
    self.store.contains(root)
  }

  pub fn len(&self) -> usize {
    self.store.len()
  }

  pub fn is_empty(&self) -> bool {
    self.store.is_empty()
  }

  pub fn capacity(&self) -> NonZeroUsize {
    self.store.capacity()
  }

  pub fn store_kind(&self) -> StoreKind {
    self.store.kind()
  }

  pub fn tree_file(&self) -> &TreeFile {
    &self.tree_file
  }
}
