use crate::store::HandleStore;
use moka::notification::RemovalCause;
use moka::ops::compute::Op;
use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use std::fmt::{Debug, Formatter};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::trace;
use tree_nub::common::id::TreeRoot;
use tree_nub::tree::TreeHandle;

/// Store on top of a moka cache using the LRU eviction policy.
///
/// Lookups never take a lock. Evictions happen during moka's housekeeping,
/// so the entry count can sit above capacity until pending tasks run.
pub struct MokaStore<T> {
  capacity: NonZeroUsize,
  cache: Cache<TreeRoot, Arc<T>>,
}

impl<T> Debug for MokaStore<T> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("MokaStore")
      .field("capacity", &self.capacity)
      .field("entry_count", &self.cache.entry_count())
      .finish()
  }
}

impl<T: TreeHandle> MokaStore<T> {
  pub fn new(capacity: NonZeroUsize) -> MokaStore<T> {
    let cache: Cache<TreeRoot, Arc<T>> = Cache::builder()
      .max_capacity(capacity.get() as u64)
      .eviction_policy(EvictionPolicy::lru())
      .eviction_listener(|root: Arc<TreeRoot>, _: Arc<T>, cause| {
        if cause == RemovalCause::Size {
          trace!(root = %root, "evicted tree handle");
        }
      })
      .build();
    MokaStore { capacity, cache }
  }

  /// Run moka's pending maintenance, applying any outstanding evictions.
  pub fn run_pending_tasks(&self) {
    self.cache.run_pending_tasks();
  }
}

impl<T: TreeHandle> HandleStore<T> for MokaStore<T> {
  #[inline]
  fn get(&self, root: TreeRoot) -> Option<Arc<T>> {
    self.cache.get(&root)
  }

  fn put_if_absent(&self, root: TreeRoot, handle: Arc<T>) -> Arc<T> {
    self.cache.entry(root).or_insert(handle).into_value()
  }

  fn put(&self, root: TreeRoot, handle: Arc<T>) -> Option<Arc<T>> {
    let mut previous = None;
    let _ = self.cache.entry(root).and_compute_with(|entry| {
      previous = entry.map(|entry| entry.into_value());
      Op::Put(handle)
    });
    previous
  }

  fn remove(&self, root: TreeRoot) -> Option<Arc<T>> {
    self.cache.remove(&root)
  }

  fn clear(&self) {
    self.cache.invalidate_all();
    self.cache.run_pending_tasks();
  }

  #[inline]
  fn contains(&self, root: TreeRoot) -> bool {
    self.cache.contains_key(&root)
  }

  fn len(&self) -> usize {
    self.cache.run_pending_tasks();
    self.cache.entry_count() as usize
  }

  #[inline]
  fn capacity(&self) -> NonZeroUsize {
    self.capacity
  }
}
