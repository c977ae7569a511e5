pub mod discovered_url;
pub mod osint;

pub use discovered_url::*;
pub use osint::*;
