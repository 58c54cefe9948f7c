//! OpenAPI schema definitions for domain types.
//!
//! Domain types remain framework-agnostic by not deriving `ToSchema`; the
//! wrappers here mirror their serialised shape for utoipa.

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The identifier or query is missing or malformed.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// The query resolved to zero candidates.
    #[schema(rename = "not_found")]
    NotFound,
    /// Search or metadata extraction failed.
    #[schema(rename = "upstream_fetch_failed")]
    UpstreamFetchFailed,
    /// The upstream audio download failed before streaming began.
    #[schema(rename = "upstream_stream_failed")]
    UpstreamStreamFailed,
    /// The transcoder failed before streaming began.
    #[schema(rename = "transcode_failed")]
    TranscodeFailed,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Error)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "upstream_fetch_failed")]
    code: ErrorCodeSchema,
    /// Human-readable summary.
    #[schema(example = "failed to get video info from upstream")]
    error: String,
    /// Underlying cause.
    #[schema(example = "media unavailable: HTTP Error 429")]
    detail: Option<String>,
    /// Correlation identifier, equal to the `trace-id` response header.
    #[schema(rename = "traceId", example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
}

/// OpenAPI schema for [`crate::domain::Candidate`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Candidate)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct CandidateSchema {
    /// Media identifier.
    #[schema(example = "dQw4w9WgXcQ")]
    id: String,
    /// Display title.
    title: String,
    /// Channel or uploader name.
    author: Option<String>,
    /// Duration in whole seconds.
    #[schema(example = 213)]
    seconds: Option<u64>,
    /// Duration rendered as `m:ss` or `h:mm:ss`.
    #[schema(example = "3:33")]
    timestamp: Option<String>,
    /// Watch page URL.
    url: String,
    /// Thumbnail image URL.
    thumbnail: Option<String>,
}
