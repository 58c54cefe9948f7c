//! Port interface for memoising search results.
use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{Candidate, SearchQuery};

define_port_error! {
    /// Errors surfaced by the caching adapter.
    pub enum SearchCacheError {
        /// Cache backend is unavailable.
        Backend => "search cache backend failure",
    }
}

/// Time-bounded store of search results keyed by the trimmed query.
///
/// Callers treat every error as a miss; a broken cache never fails a request.
#[async_trait]
pub trait SearchCache: Send + Sync {
    /// Read unexpired results for `query`.
    async fn get(&self, query: &SearchQuery) -> Result<Option<Vec<Candidate>>, SearchCacheError>;

    /// Store results for `query`, replacing any previous entry.
    async fn put(&self, query: &SearchQuery, results: Vec<Candidate>)
    -> Result<(), SearchCacheError>;
}

/// Cache that never stores anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSearchCache;

#[async_trait]
impl SearchCache for DisabledSearchCache {
    async fn get(&self, _query: &SearchQuery) -> Result<Option<Vec<Candidate>>, SearchCacheError> {
        Ok(None)
    }

    async fn put(
        &self,
        _query: &SearchQuery,
        _results: Vec<Candidate>,
    ) -> Result<(), SearchCacheError> {
        Ok(())
    }
}
