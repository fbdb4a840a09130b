//! Public event calendar feed for the Vana site.
//!
//! Fetches the Luma calendar, keeps public events, splits them into upcoming
//! and past lists and caches the result for a few minutes.

pub mod cache;
pub mod client;
pub mod clock;
pub mod error;
pub mod feed;
pub mod format;
pub mod loader;
pub mod retry;
pub mod store;
pub mod types;

pub use cache::{CacheEntry, EventCache, CACHE_KEY, DEFAULT_TTL};
pub use client::LumaClient;
pub use clock::{Clock, SystemClock};
pub use error::EventsError;
pub use loader::{EventLoader, LoaderOptions};
pub use retry::RetryPolicy;
pub use store::{CacheStore, MemoryStore, SqliteStore};
pub use types::{EventFeed, EventView};
