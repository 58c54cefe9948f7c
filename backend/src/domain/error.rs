//! Domain-level error types.
//!
//! These errors are transport agnostic. The HTTP adapter maps each
//! [`ErrorCode`] onto a status code and serialises the payload as the JSON
//! error body clients receive when no audio bytes have been sent yet.

use serde::{Deserialize, Serialize};

use super::TraceId;

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The identifier or query is missing or malformed.
    InvalidRequest,
    /// The query resolved to zero candidates.
    NotFound,
    /// The search or extraction layer failed before streaming began.
    UpstreamFetchFailed,
    /// The upstream audio stream broke.
    UpstreamStreamFailed,
    /// The transcoding stage failed.
    TranscodeFailed,
    /// Anything unanticipated.
    InternalError,
}

/// Structured error payload.
///
/// Serialises as `{ "code", "error", "detail"?, "traceId"? }` where `error`
/// is the summary and `detail` the underlying cause.
///
/// # Examples
/// ```
/// use audio_proxy::domain::{Error, ErrorCode};
///
/// let err = Error::upstream_fetch_failed("failed to get video info")
///     .with_detail("status 429");
/// assert_eq!(err.code(), ErrorCode::UpstreamFetchFailed);
/// assert_eq!(err.detail(), Some("status 429"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Error {
    code: ErrorCode,
    #[serde(rename = "error")]
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    trace_id: Option<String>,
}

impl Error {
    /// Create a new error, capturing the in-scope trace identifier.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            detail: None,
            trace_id: TraceId::current().map(|id| id.to_string()),
        }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable summary.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Underlying cause, when known.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Correlation identifier of the request that produced the error.
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// Attach the underlying cause.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Override the correlation identifier.
    #[must_use]
    pub fn with_trace_id(mut self, id: impl Into<String>) -> Self {
        self.trace_id = Some(id.into());
        self
    }

    /// Convenience constructor for [`ErrorCode::InvalidRequest`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Convenience constructor for [`ErrorCode::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Convenience constructor for [`ErrorCode::UpstreamFetchFailed`].
    pub fn upstream_fetch_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UpstreamFetchFailed, message)
    }

    /// Convenience constructor for [`ErrorCode::UpstreamStreamFailed`].
    pub fn upstream_stream_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UpstreamStreamFailed, message)
    }

    /// Convenience constructor for [`ErrorCode::TranscodeFailed`].
    pub fn transcode_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::TranscodeFailed, message)
    }

    /// Convenience constructor for [`ErrorCode::InternalError`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{}: {detail}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for Error {}
