//! Driven port mapping a free-text query to ranked candidates.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{Candidate, SearchQuery};

define_port_error! {
    /// Errors surfaced by the search adapter.
    pub enum MediaSearchError {
        /// The search backend could not be run or reached.
        Backend => "search backend failed",
        /// The search backend answered with an undecodable payload.
        Decode => "search response decode failed",
    }
}

/// Search capability.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaSearch: Send + Sync {
    /// Return at most `limit` candidates for `query`, best match first.
    async fn search(
        &self,
        query: &SearchQuery,
        limit: usize,
    ) -> Result<Vec<Candidate>, MediaSearchError>;
}
