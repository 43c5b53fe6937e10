use crate::store::lru_store::LruStore;
use crate::store::moka_store::MokaStore;
use delegate::delegate;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tree_nub::common::id::TreeRoot;
use tree_nub::tree::TreeHandle;

pub mod lru_store;
pub mod moka_store;

/// A bounded, thread-safe map from tree roots to shared tree handles.
///
/// Entries pushed out by the capacity bound are dropped without being closed
/// or deleted. Callers still holding the handle keep it alive.
pub trait HandleStore<T: TreeHandle> {
  /// Look up `root`, marking it as most recently used.
  fn get(&self, root: TreeRoot) -> Option<Arc<T>>;

  /// Insert `handle` unless `root` is already present. Returns whichever
  /// handle is resident afterward.
  fn put_if_absent(&self, root: TreeRoot, handle: Arc<T>) -> Arc<T>;

  /// Insert or replace, returning the replaced handle.
  fn put(&self, root: TreeRoot, handle: Arc<T>) -> Option<Arc<T>>;

  fn remove(&self, root: TreeRoot) -> Option<Arc<T>>;

  fn clear(&self);

  /// Presence check that leaves the recency order alone.
  fn contains(&self, root: TreeRoot) -> bool;

  fn len(&self) -> usize;

  #[inline]
  fn is_empty(&self) -> bool {
    self.len() == 0
  }

  fn capacity(&self) -> NonZeroUsize;
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum StoreKind {
  /// Exact LRU order and bound, one short lock per operation.
  #[default]
  Exact,
  /// Lock-free reads. The bound is enforced by background housekeeping and
  /// may be briefly exceeded.
  Concurrent,
}

pub enum Store<T> {
  Exact(LruStore<T>),
  Concurrent(MokaStore<T>),
}

impl<T: TreeHandle> Store<T> {
  pub fn new(kind: StoreKind, capacity: NonZeroUsize) -> Store<T> {
    match kind {
      StoreKind::Exact => Store::Exact(LruStore::new(capacity)),
      StoreKind::Concurrent => Store::Concurrent(MokaStore::new(capacity)),
    }
  }

  pub fn kind(&self) -> StoreKind {
    match self {
      Store::Exact(_) => StoreKind::Exact,
      Store::Concurrent(_) => StoreKind::Concurrent,
    }
  }
}

impl<T: TreeHandle> HandleStore<T> for Store<T> {
  delegate! {
    to match self {
      Store::Exact(store) => store,
      Store::Concurrent(store) => store,
    } {
      fn get(&self, root: TreeRoot) -> Option<Arc<T>>;
      fn put_if_absent(&self, root: TreeRoot, handle: Arc<T>) -> Arc<T>;
      fn put(&self, root: TreeRoot, handle: Arc<T>) -> Option<Arc<T>>;
      fn remove(&self, root: TreeRoot) -> Option<Arc<T>>;
      fn clear(&self);
      fn contains(&self, root: TreeRoot) -> bool;
      fn len(&self) -> usize;
      fn capacity(&self) -> NonZeroUsize;
    }
  }
}
