use bytemuck::{Pod, Zeroable};
use std::fmt::{Display, Formatter};
use std::ops::Deref;

pub trait DbId {
  fn of(id: u64) -> Self;
}

macro_rules! db_id {
    (
    $(#[$meta:meta])*
    $x:ident, $t:ty
  ) => {
    $(#[$meta])*
    #[repr(C)]
    #[derive(Default, Debug, Copy, Clone, PartialOrd, PartialEq, Ord, Eq, Hash, Pod, Zeroable)]
    pub struct $x(pub $t);

    impl Deref for $x {
      type Target = $t;
      fn deref(&self) -> &Self::Target {
        &self.0
      }
    }

    impl DbId for $x {
      fn of(id: u64) -> Self {
        Self(id as $t)
      }
    }
  }
}

db_id!(
  /// Storage-assigned id of the file holding a tree
  FileId, u32
);

db_id!(
  /// Index of the page holding a tree's root bucket
  BucketPageId, u64
);

/// `TreeRoot` locates the root bucket of a persistent collection tree.
///
/// It is the registry key: two roots are equal iff they name the same
/// bucket in the same file.
#[repr(C)]
#[derive(
  Default,
  Debug,
  Copy,
  Clone,
  PartialOrd,
  PartialEq,
  Ord,
  Eq,
  Hash,
  Pod,
  Zeroable,
  getset::CopyGetters,
)]
#[getset(get_copy = "pub")]
pub struct TreeRoot {
  /// Page of the root bucket
  page_id: BucketPageId,
  /// Byte offset of the root bucket inside its page
  offset: u32,
  file_id: FileId,
}

impl TreeRoot {
  pub const fn new(file_id: FileId, page_id: BucketPageId, offset: u32) -> TreeRoot {
    TreeRoot {
      page_id,
      offset,
      file_id,
    }
  }
}

impl Display for TreeRoot {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "#{}:{}/{}", self.file_id.0, self.page_id.0, self.offset)
  }
}
