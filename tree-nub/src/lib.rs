pub use error_stack::{Report, Result, ResultExt};

pub mod common;
pub mod mem;
pub mod tree;
