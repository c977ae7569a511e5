pub mod content_hash;
pub mod domain;

pub use content_hash::*;
pub use domain::*;
