//! Cached event feed retrieval.

use std::sync::Arc;
use std::time::Duration;

use chrono_tz::Tz;
use tokio::sync::Mutex;
use tracing::instrument;

use crate::cache::{EventCache, DEFAULT_TTL};
use crate::client::LumaClient;
use crate::clock::{Clock, SystemClock};
use crate::error::EventsError;
use crate::feed::{parse_events, partition};
use crate::store::CacheStore;
use crate::types::EventFeed;

#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// How long a fetched feed is served from cache
    pub ttl: Duration,
    /// Timezone for display dates and times
    pub timezone: Tz,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            timezone: Tz::UTC,
        }
    }
}

/// Serves the event feed from cache, fetching from Luma on a miss.
///
/// Concurrent misses share one upstream fetch: the first caller refreshes
/// while the others wait and then read the refreshed entry. If the refresh
/// fails, each waiter runs its own fetch in turn.
pub struct EventLoader {
    client: LumaClient,
    cache: EventCache,
    clock: Arc<dyn Clock>,
    timezone: Tz,
    refresh: Mutex<()>,
}

impl EventLoader {
    pub fn new(client: LumaClient, store: Arc<dyn CacheStore>) -> Self {
        Self::with_options(client, store, Arc::new(SystemClock), LoaderOptions::default())
    }

    pub fn with_options(
        client: LumaClient,
        store: Arc<dyn CacheStore>,
        clock: Arc<dyn Clock>,
        options: LoaderOptions,
    ) -> Self {
        Self {
            client,
            cache: EventCache::new(store, clock.clone(), options.ttl),
            clock,
            timezone: options.timezone,
            refresh: Mutex::new(()),
        }
    }

    /// Upcoming and past public events.
    ///
    /// A fresh cache entry is returned as-is with no network call. Otherwise
    /// the feed is fetched, rebuilt from scratch and written back to the cache.
    #[instrument(skip(self), level = "info")]
    pub async fn get_events(&self) -> Result<EventFeed, EventsError> {
        if let Some(feed) = self.cache.read() {
            tracing::debug!("Serving events from cache");
            return Ok(feed);
        }

        let _refresh = self.refresh.lock().await;
        if let Some(feed) = self.cache.read() {
            tracing::debug!("Events refreshed by a concurrent caller");
            return Ok(feed);
        }

        let feed = match self.fetch_events().await {
            Ok(feed) => feed,
            Err(e) => {
                if e.is_rate_limited() {
                    tracing::error!("Rate limit exceeded. Please try again later.");
                } else {
                    tracing::error!("Error fetching events: {}", e);
                }
                return Err(e);
            }
        };

        if let Err(e) = self.cache.write(&feed) {
            tracing::error!("Failed to cache events: {:#}", e);
            return Err(EventsError::Cache(e));
        }

        tracing::info!(
            upcoming = feed.upcoming.len(),
            past = feed.past.len(),
            "Fetched events"
        );
        Ok(feed)
    }

    async fn fetch_events(&self) -> Result<EventFeed, EventsError> {
        let body = self.client.list_events().await?;
        let now = self.clock.now();
        let records = parse_events(&body, now, self.timezone)?;
        Ok(partition(records, self.timezone))
    }
}
