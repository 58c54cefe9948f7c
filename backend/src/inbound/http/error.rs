//! HTTP adapter mapping for domain errors.
//!
//! Purpose: keep the domain error type HTTP-agnostic while allowing Actix
//! handlers to turn domain failures into consistent JSON responses and status
//! codes. Only used before a response commits to a streaming body.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use tracing::error;

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};

pub use crate::domain::ApiResult;

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::UpstreamFetchFailed | ErrorCode::UpstreamStreamFailed => {
            StatusCode::BAD_GATEWAY
        }
        ErrorCode::TranscodeFailed | ErrorCode::InternalError => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Internal errors raised without a summary get a fixed one; the raw message
/// moves to `detail`.
fn normalise(error: &Error) -> Error {
    if matches!(error.code(), ErrorCode::InternalError) && error.detail().is_none() {
        let mut normalised =
            Error::internal("internal server error").with_detail(error.message());
        if let Some(id) = error.trace_id() {
            normalised = normalised.with_trace_id(id.to_owned());
        }
        normalised
    } else {
        error.clone()
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if let Some(id) = self.trace_id() {
            builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }

        builder.json(normalise(self))
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        error!(error = %err, "actix error promoted to domain error");
        Self::internal("internal server error").with_detail(err.to_string())
    }
}

#[cfg(test)]
mod tests;
