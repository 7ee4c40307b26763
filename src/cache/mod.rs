pub mod clock;
pub mod fallback;
pub mod repository_cache;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use fallback::FallbackDataset;
pub use repository_cache::RepositoryCache;
pub use store::{CacheEntry, CacheStore};
