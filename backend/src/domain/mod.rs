//! Domain types, ports and use cases of the audio proxy.
//!
//! Purpose: keep the streaming flow transport agnostic. Inbound adapters
//! translate HTTP requests into [`StreamRequest`]s and search queries;
//! outbound adapters implement the [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: structured failure payload.
//! - Retrier / RetryPolicy: bounded exponential backoff.
//! - StreamPipeline / PipelineState: source to transcoder to body wiring.
//! - SearchService / AudioStreamService: the use cases.

pub mod audio_stream_service;
pub mod error;
pub mod media;
pub mod pipeline;
pub mod ports;
pub mod retry;
pub mod search_service;
pub mod trace_id;

pub use self::audio_stream_service::{
    AudioStreamService, DEFAULT_FALLBACK_TITLE, StreamRequest, StreamRoute,
};
pub use self::error::{Error, ErrorCode};
pub use self::media::{
    AudioLocator, Candidate, MediaInfo, SearchQuery, SearchQueryValidationError, VideoId,
    VideoIdValidationError, format_timestamp, sanitize_filename,
};
pub use self::pipeline::{
    AudioResponse, PipelineAborted, PipelineFailure, PipelineState, ResponseFraming,
    StreamPipeline,
};
pub use self::retry::{Retrier, RetryPolicy, RetrySleeper, TokioSleeper};
pub use self::search_service::SearchService;
pub use self::trace_id::TraceId;

/// HTTP header carrying the request trace identifier.
pub const TRACE_ID_HEADER: &str = "trace-id";

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use audio_proxy::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::invalid_request("missing q query param"))
/// }
/// assert!(handler().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
