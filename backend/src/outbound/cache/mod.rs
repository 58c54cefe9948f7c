//! In-memory search result cache.
//!
//! Entries are immutable snapshots keyed by the trimmed query; a `put`
//! replaces the whole entry and expired entries are dropped lazily on read
//! and swept on write.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;

use crate::domain::ports::{SearchCache, SearchCacheError};
use crate::domain::{Candidate, SearchQuery};

/// Default time-to-live of a cached result set.
pub const DEFAULT_SEARCH_CACHE_TTL: Duration = Duration::from_secs(300);

struct Entry {
    results: Arc<[Candidate]>,
    expires_at: DateTime<Utc>,
}

/// Process-local TTL cache.
pub struct InMemorySearchCache {
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemorySearchCache {
    /// Cache whose entries live for `ttl` as measured by `clock`.
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Number of stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.lock().map_or(0, |entries| entries.len())
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Entry>>, SearchCacheError> {
        self.entries
            .lock()
            .map_err(|_| SearchCacheError::backend("search cache lock poisoned"))
    }
}

#[async_trait]
impl SearchCache for InMemorySearchCache {
    async fn get(&self, query: &SearchQuery) -> Result<Option<Vec<Candidate>>, SearchCacheError> {
        let now = self.clock.utc();
        let key = query.cache_key();
        let mut entries = self.lock()?;
        match entries.get(&key) {
            Some(entry) if entry.expires_at > now => Ok(Some(entry.results.to_vec())),
            Some(_) => {
                entries.remove(&key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(
        &self,
        query: &SearchQuery,
        results: Vec<Candidate>,
    ) -> Result<(), SearchCacheError> {
        let now = self.clock.utc();
        let expires_at = now.checked_add_signed(self.ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);
        let mut entries = self.lock()?;
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            query.cache_key(),
            Entry {
                results: results.into(),
                expires_at,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    use super::*;
    use crate::test_support::{MutableClock, candidate};

    #[fixture]
    fn clock() -> Arc<MutableClock> {
        Arc::new(MutableClock::new(
            Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0)
                .single()
                .expect("valid timestamp"),
        ))
    }

    fn cache(clock: &Arc<MutableClock>) -> InMemorySearchCache {
        let clock: Arc<dyn Clock> = clock.clone();
        InMemorySearchCache::new(DEFAULT_SEARCH_CACHE_TTL, clock)
    }

    fn query(raw: &str) -> SearchQuery {
        SearchQuery::parse(raw).expect("valid query")
    }

    #[rstest]
    #[tokio::test]
    async fn returns_stored_results_before_expiry(clock: Arc<MutableClock>) {
        let cache = cache(&clock);
        let results = vec![candidate("dQw4w9WgXcQ")];
        cache.put(&query("song"), results.clone()).await.expect("put");

        clock.advance(Duration::from_secs(299));

        assert_eq!(cache.get(&query("  song ")).await.expect("get"), Some(results));
    }

    #[rstest]
    #[tokio::test]
    async fn expires_after_ttl(clock: Arc<MutableClock>) {
        let cache = cache(&clock);
        cache
            .put(&query("song"), vec![candidate("dQw4w9WgXcQ")])
            .await
            .expect("put");

        clock.advance(Duration::from_secs(300));

        assert_eq!(cache.get(&query("song")).await.expect("get"), None);
        assert!(cache.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn put_replaces_and_sweeps(clock: Arc<MutableClock>) {
        let cache = cache(&clock);
        cache.put(&query("old"), vec![candidate("OXm4-3Er8po")]).await.expect("put");
        cache.put(&query("song"), vec![candidate("OXm4-3Er8po")]).await.expect("put");

        clock.advance(Duration::from_secs(301));
        let fresh = vec![candidate("dQw4w9WgXcQ")];
        cache.put(&query("song"), fresh.clone()).await.expect("put");

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&query("song")).await.expect("get"), Some(fresh));
    }

    #[rstest]
    #[tokio::test]
    async fn distinct_queries_do_not_collide(clock: Arc<MutableClock>) {
        let cache = cache(&clock);
        cache.put(&query("a"), vec![candidate("dQw4w9WgXcQ")]).await.expect("put");

        assert_eq!(cache.get(&query("b")).await.expect("get"), None);
    }
}
