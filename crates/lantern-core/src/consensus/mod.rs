pub mod committee_cache;
pub mod sync_committee;

pub use committee_cache::*;
pub use sync_committee::*;
