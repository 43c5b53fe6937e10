use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use tree_nub::common::id::FileId;
use tree_nub::mem::{MemTree, MemTreeStorage};
use tree_registry::{
  StoreKind, TreeCache, TreeCacheOptions, TreeError, TreeFile, TreeHandle, TreeRoot, TreeStorage,
};

const THREADS: usize = 16;

/// Holds every open long enough for concurrent loads to all miss.
struct SlowOpen {
  inner: MemTreeStorage,
  delay: Duration,
}

impl TreeStorage for SlowOpen {
  type Tree = MemTree;

  fn create_tree(&self, file: &TreeFile) -> tree_registry::Result<MemTree, TreeError> {
    self.inner.create_tree(file)
  }

  fn open_tree(&self, file: &TreeFile, root: TreeRoot) -> tree_registry::Result<MemTree, TreeError> {
    thread::sleep(self.delay);
    self.inner.open_tree(file, root)
  }
}

fn slow_storage() -> SlowOpen {
  SlowOpen {
    inner: MemTreeStorage::new(FileId(7)),
    delay: Duration::from_millis(20),
  }
}

fn cache(kind: StoreKind, capacity: usize) -> TreeCache<MemTree> {
  let options = TreeCacheOptions::builder()
    .capacity(NonZeroUsize::new(capacity).unwrap())
    .store(kind)
    .build();
  TreeCache::new(options)
}

fn race_cold_loads(kind: StoreKind) {
  let storage = slow_storage();
  let root = storage.inner.create_tree(&TreeFile::default()).unwrap().root();
  let cache = cache(kind, 64);
  let barrier = Barrier::new(THREADS);

  let loaded: Vec<Arc<MemTree>> = thread::scope(|s| {
    let workers: Vec<_> = (0..THREADS)
      .map(|_| {
        s.spawn(|| {
          barrier.wait();
          cache.load(&storage, root).unwrap()
        })
      })
      .collect();
    workers.into_iter().map(|w| w.join().unwrap()).collect()
  });

  let canonical = cache.get(root).unwrap();
  assert!(loaded.iter().all(|tree| Arc::ptr_eq(tree, &canonical)));
  assert!(!canonical.is_closed());

  let stats = storage.inner.stats();
  assert!(stats.opens >= 1);
  assert_eq!(stats.opens - 1, stats.closes);
  assert_eq!(0, stats.deletes);
}

#[test]
fn cold_loads_agree_on_one_handle() {
  race_cold_loads(StoreKind::Exact);
}

#[test]
fn cold_loads_agree_on_one_handle_concurrent_store() {
  race_cold_loads(StoreKind::Concurrent);
}

#[test]
fn concurrent_creates_never_collide() {
  let storage = MemTreeStorage::new(FileId(1));
  let cache = cache(StoreKind::Exact, THREADS * 8);
  let barrier = Barrier::new(THREADS);

  let roots: Vec<TreeRoot> = thread::scope(|s| {
    let workers: Vec<_> = (0..THREADS)
      .map(|_| {
        s.spawn(|| {
          barrier.wait();
          (0..8)
            .map(|_| cache.create(&storage).unwrap().root())
            .collect::<Vec<_>>()
        })
      })
      .collect();
    workers
      .into_iter()
      .flat_map(|w| w.join().unwrap())
      .collect()
  });

  let distinct: HashSet<TreeRoot> = roots.iter().copied().collect();
  assert_eq!(THREADS * 8, distinct.len());
  assert_eq!(THREADS * 8, cache.len());
}

#[test]
fn bound_holds_under_contention() {
  let storage = MemTreeStorage::new(FileId(1));
  let roots: Vec<TreeRoot> = (0..64)
    .map(|_| storage.create_tree(&TreeFile::default()).unwrap().root())
    .collect();
  let cache = cache(StoreKind::Exact, 8);

  thread::scope(|s| {
    for chunk in roots.chunks(8) {
      let cache = &cache;
      let storage = &storage;
      s.spawn(move || {
        for _ in 0..4 {
          for root in chunk {
            let tree = cache.load(storage, *root).unwrap();
            assert_eq!(*root, tree.root());
            assert!(cache.len() <= 8);
          }
        }
      });
    }
  });

  assert_eq!(8, cache.len());
  assert_eq!(0, storage.stats().deletes);
}

#[test]
fn removals_race_with_loads() {
  let storage = MemTreeStorage::new(FileId(1));
  let cache = cache(StoreKind::Exact, 32);
  let trees: Vec<_> = (0..16).map(|_| cache.create(&storage).unwrap()).collect();
  let barrier = Barrier::new(2);

  thread::scope(|s| {
    s.spawn(|| {
      barrier.wait();
      for tree in &trees {
        cache.remove(tree.root()).unwrap();
      }
    });
    s.spawn(|| {
      barrier.wait();
      for tree in &trees {
        // Either the registered handle or a not-found report once removed
        if let Err(report) = cache.load(&storage, tree.root()) {
          assert!(matches!(report.current_context(), TreeError::NotFound(_)));
        }
      }
    });
  });

  assert_eq!(16, storage.stats().deletes);
  assert_eq!(0, storage.tree_count());

  // A load that opened a tree just before its delete registers a stale
  // handle. It is never the removed one, and removing it again reports the
  // tree as gone.
  for tree in &trees {
    if let Some(stale) = cache.get(tree.root()) {
      assert!(!Arc::ptr_eq(&stale, tree));
      let report = cache.remove(tree.root()).unwrap_err();
      assert!(matches!(report.current_context(), TreeError::NotFound(_)));
      assert!(!cache.contains(tree.root()));
    }
  }
  assert!(cache.is_empty());
}
