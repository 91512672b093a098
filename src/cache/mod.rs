//! Process-local query cache for the knowledge base.
//!
//! Entries are keyed by [`CacheKey`] and expire under an [`ExpiryPolicy`]
//! chosen from the key's operation: sliding expiry resets on every hit up to
//! an absolute cap measured from insertion. Capacity is bounded by LRU.
//!
//! ```toml
//! [cache]
//! enabled = true
//! capacity = 1024
//! ```

mod clock;
mod config;
mod keys;
mod lock;
mod policy;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use keys::CacheKey;
pub use policy::ExpiryPolicy;
pub use store::{CachedValue, QueryCache};
