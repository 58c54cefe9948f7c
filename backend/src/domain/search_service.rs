//! Cached search.
//!
//! Results are memoised per trimmed query. Cache failures degrade to a
//! fresh search; empty result sets are never cached so a transient upstream
//! hiccup cannot pin "no results" for the whole TTL.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::ports::{MediaSearch, MediaSearchError, SearchCache};
use crate::domain::{Candidate, SearchQuery};

/// Search service shared by the search and stream routes.
#[derive(Clone)]
pub struct SearchService {
    search: Arc<dyn MediaSearch>,
    cache: Arc<dyn SearchCache>,
    limit: usize,
}

impl SearchService {
    /// Create a service returning at most `limit` candidates per query.
    pub fn new(search: Arc<dyn MediaSearch>, cache: Arc<dyn SearchCache>, limit: usize) -> Self {
        Self {
            search,
            cache,
            limit: limit.max(1),
        }
    }

    /// Candidates for `query`, best match first.
    ///
    /// # Errors
    /// Returns the search backend error when the cache misses and the
    /// backend fails.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<Candidate>, MediaSearchError> {
        match self.cache.get(query).await {
            Ok(Some(mut cached)) => {
                debug!(query = %query, hits = cached.len(), "search cache hit");
                cached.truncate(self.limit);
                return Ok(cached);
            }
            Ok(None) => {}
            Err(error) => warn!(query = %query, error = %error, "search cache read failed"),
        }

        let mut results = self.search.search(query, self.limit).await?;
        results.truncate(self.limit);
        if !results.is_empty() {
            if let Err(error) = self.cache.put(query, results.clone()).await {
                warn!(query = %query, error = %error, "search cache write failed");
            }
        }
        Ok(results)
    }

    /// Best candidate for `query`, if any.
    ///
    /// # Errors
    /// Same as [`SearchService::search`].
    pub async fn first_candidate(
        &self,
        query: &SearchQuery,
    ) -> Result<Option<Candidate>, MediaSearchError> {
        Ok(self.search(query).await?.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use rstest::rstest;

    use super::*;
    use crate::domain::ports::{DisabledSearchCache, MockMediaSearch, SearchCacheError};
    use crate::test_support::{StubSearch, candidate};

    struct BrokenCache;

    #[async_trait]
    impl SearchCache for BrokenCache {
        async fn get(
            &self,
            _query: &SearchQuery,
        ) -> Result<Option<Vec<Candidate>>, SearchCacheError> {
            Err(SearchCacheError::backend("down"))
        }

        async fn put(
            &self,
            _query: &SearchQuery,
            _results: Vec<Candidate>,
        ) -> Result<(), SearchCacheError> {
            Err(SearchCacheError::backend("down"))
        }
    }

    struct PrimedCache(Vec<Candidate>);

    #[async_trait]
    impl SearchCache for PrimedCache {
        async fn get(
            &self,
            _query: &SearchQuery,
        ) -> Result<Option<Vec<Candidate>>, SearchCacheError> {
            Ok(Some(self.0.clone()))
        }

        async fn put(
            &self,
            _query: &SearchQuery,
            _results: Vec<Candidate>,
        ) -> Result<(), SearchCacheError> {
            panic!("primed cache must not be written");
        }
    }

    fn query(raw: &str) -> SearchQuery {
        SearchQuery::parse(raw).expect("valid query")
    }

    #[rstest]
    #[tokio::test]
    async fn results_are_capped_at_limit() {
        let backend = Arc::new(StubSearch::returning(
            (0..8).map(|n| candidate(&format!("id{n:0>9}"))).collect(),
        ));
        let service = SearchService::new(backend, Arc::new(DisabledSearchCache), 5);

        let results = service.search(&query("song")).await.expect("search");

        assert_eq!(results.len(), 5);
    }

    #[rstest]
    #[tokio::test]
    async fn cache_hit_skips_backend() {
        let mut backend = MockMediaSearch::new();
        backend.expect_search().never();
        let cached = vec![candidate("dQw4w9WgXcQ")];
        let service =
            SearchService::new(Arc::new(backend), Arc::new(PrimedCache(cached.clone())), 5);

        assert_eq!(service.search(&query("song")).await.expect("search"), cached);
    }

    #[rstest]
    #[tokio::test]
    async fn broken_cache_falls_back_to_backend() {
        let backend = Arc::new(StubSearch::returning(vec![candidate("dQw4w9WgXcQ")]));
        let service = SearchService::new(backend.clone(), Arc::new(BrokenCache), 5);

        let results = service.search(&query("song")).await.expect("search");

        assert_eq!(results.len(), 1);
        assert_eq!(backend.calls(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn backend_error_propagates() {
        let mut backend = MockMediaSearch::new();
        backend
            .expect_search()
            .times(1)
            .returning(|_, _| Err(MediaSearchError::backend("exit status 1")));
        let service = SearchService::new(Arc::new(backend), Arc::new(DisabledSearchCache), 5);

        let err = service.search(&query("song")).await.expect_err("fails");

        assert_eq!(err, MediaSearchError::backend("exit status 1"));
    }

    #[rstest]
    #[tokio::test]
    async fn first_candidate_is_none_for_empty_results() {
        let backend = Arc::new(StubSearch::returning(Vec::new()));
        let service = SearchService::new(backend, Arc::new(DisabledSearchCache), 5);

        assert_eq!(
            service.first_candidate(&query("nothing")).await.expect("search"),
            None
        );
    }
}
