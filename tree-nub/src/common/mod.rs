pub mod errors;
pub mod id;
