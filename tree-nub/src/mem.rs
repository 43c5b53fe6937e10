//! An in-memory [`TreeStorage`] that only tracks which roots are allocated.
//!
//! Tree contents are not modelled. Every operation is counted, which makes
//! it the storage of choice for exercising registries and their disposal
//! rules.

use crate::common::errors::TreeError;
use crate::common::id::{BucketPageId, FileId, TreeRoot};
use crate::tree::{TreeFile, TreeHandle, TreeStorage};
use dashmap::DashMap;
use error_stack::Report;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use tracing::trace;

pub const PAGE_SIZE: u32 = 64 * 1024;
pub const BUCKET_SIZE: u32 = 1024;
const BUCKETS_PER_PAGE: u64 = (PAGE_SIZE / BUCKET_SIZE) as u64;

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct MemStats {
  pub creates: usize,
  pub opens: usize,
  pub closes: usize,
  pub deletes: usize,
}

#[derive(Default)]
struct Counters {
  creates: AtomicUsize,
  opens: AtomicUsize,
  closes: AtomicUsize,
  deletes: AtomicUsize,
}

struct TreeState {
  file_name: String,
  corrupt: bool,
}

struct InnerMemStorage {
  file_id: FileId,
  next_bucket: AtomicU64,
  trees: DashMap<TreeRoot, TreeState>,
  counters: Counters,
}

impl InnerMemStorage {
  fn allocate_root(&self) -> TreeRoot {
    let bucket = self.next_bucket.fetch_add(1, Ordering::Relaxed);
    let page_id = BucketPageId(bucket / BUCKETS_PER_PAGE);
    let offset = (bucket % BUCKETS_PER_PAGE) as u32 * BUCKET_SIZE;
    TreeRoot::new(self.file_id, page_id, offset)
  }
}

#[derive(Clone)]
pub struct MemTreeStorage {
  inner: Arc<InnerMemStorage>,
}

impl Debug for MemTreeStorage {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("MemTreeStorage")
      .field("file_id", &self.inner.file_id)
      .field("trees", &self.inner.trees.len())
      .field("stats", &self.stats())
      .finish()
  }
}

impl MemTreeStorage {
  pub fn new(file_id: FileId) -> MemTreeStorage {
    let inner = InnerMemStorage {
      file_id,
      next_bucket: AtomicU64::new(0),
      trees: DashMap::new(),
      counters: Counters::default(),
    };
    MemTreeStorage {
      inner: Arc::new(inner),
    }
  }

  pub fn file_id(&self) -> FileId {
    self.inner.file_id
  }

  pub fn stats(&self) -> MemStats {
    let counters = &self.inner.counters;
    MemStats {
      creates: counters.creates.load(Ordering::Acquire),
      opens: counters.opens.load(Ordering::Acquire),
      closes: counters.closes.load(Ordering::Acquire),
      deletes: counters.deletes.load(Ordering::Acquire),
    }
  }

  /// Number of allocated, not yet deleted trees.
  pub fn tree_count(&self) -> usize {
    self.inner.trees.len()
  }

  pub fn contains_tree(&self, root: TreeRoot) -> bool {
    self.inner.trees.contains_key(&root)
  }

  /// Make every later open of `root` fail with [`TreeError::Corrupt`].
  pub fn corrupt(&self, root: TreeRoot) -> bool {
    match self.inner.trees.get_mut(&root) {
      Some(mut state) => {
        state.corrupt = true;
        true
      }
      None => false,
    }
  }

  fn tree(&self, root: TreeRoot) -> MemTree {
    MemTree {
      root,
      storage: self.inner.clone(),
      closed: AtomicBool::new(false),
    }
  }
}

impl TreeStorage for MemTreeStorage {
  type Tree = MemTree;

  fn create_tree(&self, file: &TreeFile) -> crate::Result<MemTree, TreeError> {
    self.inner.counters.creates.fetch_add(1, Ordering::AcqRel);
    let root = self.inner.allocate_root();
    let state = TreeState {
      file_name: file.file_name(),
      corrupt: false,
    };
    if self.inner.trees.insert(root, state).is_some() {
      return Err(Report::new(TreeError::RootCollision(root)));
    }
    trace!(%root, file = %file, "allocated tree");
    Ok(self.tree(root))
  }

  fn open_tree(&self, file: &TreeFile, root: TreeRoot) -> crate::Result<MemTree, TreeError> {
    self.inner.counters.opens.fetch_add(1, Ordering::AcqRel);
    if root.file_id() != self.inner.file_id {
      return Err(
        Report::new(TreeError::NotFound(root))
          .attach_printable(format!("storage holds file {:?}", self.inner.file_id)),
      );
    }
    match self.inner.trees.get(&root) {
      None => Err(Report::new(TreeError::NotFound(root))),
      Some(state) if state.corrupt => Err(Report::new(TreeError::Corrupt(root))),
      Some(state) if state.file_name != file.file_name() => Err(
        Report::new(TreeError::Corrupt(root))
          .attach_printable(format!("tree belongs to `{}`", state.file_name)),
      ),
      Some(_) => Ok(self.tree(root)),
    }
  }
}

pub struct MemTree {
  root: TreeRoot,
  storage: Arc<InnerMemStorage>,
  closed: AtomicBool,
}

impl Debug for MemTree {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("MemTree")
      .field("root", &self.root)
      .field("closed", &self.is_closed())
      .finish()
  }
}

impl MemTree {
  pub fn is_closed(&self) -> bool {
    self.closed.load(Ordering::Acquire)
  }
}

impl TreeHandle for MemTree {
  #[inline]
  fn root(&self) -> TreeRoot {
    self.root
  }

  // Every call is counted so double closes show up in the stats
  fn close(&self) {
    self.closed.store(true, Ordering::Release);
    self.storage.counters.closes.fetch_add(1, Ordering::AcqRel);
  }

  fn delete(&self) -> crate::Result<(), TreeError> {
    self.storage.counters.deletes.fetch_add(1, Ordering::AcqRel);
    match self.storage.trees.remove(&self.root) {
      Some(_) => Ok(()),
      None => Err(Report::new(TreeError::NotFound(self.root))),
    }
  }
}
