//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain services and remain testable without spawning
//! subprocesses.

use std::sync::Arc;

use crate::domain::ports::RequestProfile;
use crate::domain::{AudioStreamService, SearchService, StreamRoute, VideoId};

/// Hint returned by the alternate route when metadata cannot be fetched.
pub const ALTERNATE_FAILURE_HINT: &str =
    "upstream refused the request; try again later or use a different video";

/// Route parameters for the three stream endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRoutes {
    /// `GET /stream`.
    pub standard: StreamRoute,
    /// `GET /stream-alt`.
    pub alternate: StreamRoute,
    /// `GET /stream-fixed`.
    pub fixed: StreamRoute,
}

impl StreamRoutes {
    /// Default route set with `fixed` pinned to `fixed_video`.
    pub fn new(fixed_video: VideoId) -> Self {
        Self {
            standard: StreamRoute::new("stream", RequestProfile::browser()),
            alternate: StreamRoute::new("stream-alt", RequestProfile::browser_with_client_hints())
                .with_failure_hint(ALTERNATE_FAILURE_HINT),
            fixed: StreamRoute::new("stream-fixed", RequestProfile::browser())
                .pinned_to(fixed_video),
        }
    }
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub search: SearchService,
    pub streams: AudioStreamService,
    pub routes: Arc<StreamRoutes>,
}

impl HttpState {
    /// Bundle the use cases with their route parameters.
    pub fn new(search: SearchService, streams: AudioStreamService, routes: StreamRoutes) -> Self {
        Self {
            search,
            streams,
            routes: Arc::new(routes),
        }
    }
}
