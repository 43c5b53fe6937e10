use crate::store::HandleStore;
use lru::LruCache;
use parking_lot::Mutex;
use std::fmt::{Debug, Formatter};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::trace;
use tree_nub::common::id::TreeRoot;
use tree_nub::tree::TreeHandle;

/// Exact LRU store. Every operation takes the lock once and never calls
/// into a tree handle while holding it.
pub struct LruStore<T> {
  capacity: NonZeroUsize,
  cache: Mutex<LruCache<TreeRoot, Arc<T>>>,
}

impl<T> Debug for LruStore<T> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("LruStore")
      .field("capacity", &self.capacity)
      .field("len", &self.cache.lock().len())
      .finish()
  }
}

impl<T: TreeHandle> LruStore<T> {
  pub fn new(capacity: NonZeroUsize) -> LruStore<T> {
    LruStore {
      capacity,
      cache: Mutex::new(LruCache::new(capacity)),
    }
  }

  /// Resident roots, most recently used first.
  pub fn roots(&self) -> Vec<TreeRoot> {
    self.cache.lock().iter().map(|(root, _)| *root).collect()
  }

  fn evicted(&self, evicted: Option<(TreeRoot, Arc<T>)>) {
    if let Some((root, _)) = evicted {
      trace!(%root, "evicted tree handle");
    }
  }
}

impl<T: TreeHandle> HandleStore<T> for LruStore<T> {
  fn get(&self, root: TreeRoot) -> Option<Arc<T>> {
    self.cache.lock().get(&root).cloned()
  }

  fn put_if_absent(&self, root: TreeRoot, handle: Arc<T>) -> Arc<T> {
    let evicted = {
      let mut cache = self.cache.lock();
      if let Some(resident) = cache.get(&root) {
        return resident.clone();
      }
      cache.push(root, handle.clone())
    };
    self.evicted(evicted);
    handle
  }

  fn put(&self, root: TreeRoot, handle: Arc<T>) -> Option<Arc<T>> {
    let pushed_out = self.cache.lock().push(root, handle);
    match pushed_out {
      Some((pushed_root, previous)) if pushed_root == root => Some(previous),
      evicted => {
        self.evicted(evicted);
        None
      }
    }
  }

  fn remove(&self, root: TreeRoot) -> Option<Arc<T>> {
    self.cache.lock().pop(&root)
  }

  fn clear(&self) {
    let cleared = {
      let mut cache = self.cache.lock();
      std::mem::replace(&mut *cache, LruCache::new(self.capacity))
    };
    trace!(count = cleared.len(), "cleared tree handles");
  }

  fn contains(&self, root: TreeRoot) -> bool {
    self.cache.lock().contains(&root)
  }

  fn len(&self) -> usize {
    self.cache.lock().len()
  }

  #[inline]
  fn capacity(&self) -> NonZeroUsize {
    self.capacity
  }
}
