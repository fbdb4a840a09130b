//! Time-limited cache of the last fetched feed.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::store::CacheStore;
use crate::types::EventFeed;

/// Key the feed is stored under.
pub const CACHE_KEY: &str = "lumaEvents";

/// Default freshness window.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Serialized form: `{ "timestamp": <epoch-millis>, "events": EventFeed }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub timestamp: i64,
    pub events: EventFeed,
}

/// Reads and writes the feed entry, applying the TTL.
pub struct EventCache {
    store: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl EventCache {
    pub fn new(store: Arc<dyn CacheStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self { store, clock, ttl }
    }

    /// The cached feed, if an entry exists and is younger than the TTL.
    ///
    /// Stale entries are left in place; the next write replaces them. A store
    /// failure or an unreadable entry counts as a miss.
    pub fn read(&self) -> Option<EventFeed> {
        let raw = match self.store.get(CACHE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Event cache read failed: {:#}", e);
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Ignoring unreadable event cache entry: {}", e);
                return None;
            }
        };

        let age_ms = self.clock.now().timestamp_millis() - entry.timestamp;
        let ttl_ms = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        if age_ms >= ttl_ms {
            tracing::debug!(age_ms, "Event cache entry is stale");
            return None;
        }

        Some(entry.events)
    }

    /// Replace the stored entry with `feed`, stamped with the current time.
    pub fn write(&self, feed: &EventFeed) -> anyhow::Result<()> {
        let entry = CacheEntry {
            timestamp: self.clock.now().timestamp_millis(),
            events: feed.clone(),
        };
        let raw = serde_json::to_string(&entry)?;
        self.store.set(CACHE_KEY, &raw)
    }
}
