use crate::store::StoreKind;
use bon::Builder;
use std::num::NonZeroUsize;
use tree_nub::tree::TreeFile;

pub const DEFAULT_CACHE_SIZE: NonZeroUsize = match NonZeroUsize::new(10_000) {
  Some(size) => size,
  None => unreachable!(),
};

/// Construction-time settings of a [`TreeCache`](crate::cache::TreeCache).
#[derive(Debug, Clone, PartialEq, Eq, Builder, getset::Getters, getset::CopyGetters)]
pub struct TreeCacheOptions {
  /// Maximum number of resident tree handles
  #[builder(default = DEFAULT_CACHE_SIZE)]
  #[getset(get_copy = "pub")]
  capacity: NonZeroUsize,
  #[builder(default)]
  #[getset(get_copy = "pub")]
  store: StoreKind,
  /// File new trees are created in and existing trees are opened from
  #[builder(default)]
  #[getset(get = "pub")]
  tree_file: TreeFile,
}

impl Default for TreeCacheOptions {
  fn default() -> Self {
    TreeCacheOptions::builder().build()
  }
}
