//! Tests for HTTP error mapping.

use actix_web::ResponseError;
use actix_web::body::to_bytes;
use actix_web::http::StatusCode;
use rstest::rstest;
use serde_json::Value;

use super::*;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

async fn body_json(error: &Error) -> (StatusCode, Option<String>, Value) {
    let response = ResponseError::error_response(error);
    let status = response.status();
    let header = response
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let bytes = to_bytes(response.into_body())
        .await
        .expect("reading response body succeeds");
    let json = serde_json::from_slice(&bytes).expect("error body is JSON");
    (status, header, json)
}

#[rstest]
#[case(Error::invalid_request("missing id or q param"), StatusCode::BAD_REQUEST)]
#[case(Error::not_found("no video found for query"), StatusCode::NOT_FOUND)]
#[case(Error::upstream_fetch_failed("failed to get video info"), StatusCode::BAD_GATEWAY)]
#[case(Error::upstream_stream_failed("error fetching media"), StatusCode::BAD_GATEWAY)]
#[case(Error::transcode_failed("transcoding failed"), StatusCode::INTERNAL_SERVER_ERROR)]
#[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
fn status_code_matches_error_code(#[case] error: Error, #[case] status: StatusCode) {
    assert_eq!(ResponseError::status_code(&error), status);
}

#[rstest]
#[actix_web::test]
async fn gateway_failure_carries_detail_and_trace_id() {
    let error = Error::upstream_fetch_failed("failed to get video info from upstream")
        .with_detail("media unavailable: HTTP 429")
        .with_trace_id(TRACE_ID);

    let (status, header, json) = body_json(&error).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(header.as_deref(), Some(TRACE_ID));
    assert_eq!(json["code"], "upstream_fetch_failed");
    assert_eq!(json["error"], "failed to get video info from upstream");
    assert_eq!(json["detail"], "media unavailable: HTTP 429");
    assert_eq!(json["traceId"], TRACE_ID);
}

#[rstest]
#[actix_web::test]
async fn internal_error_summary_is_fixed_and_cause_kept() {
    let error = Error::internal("pool exhausted").with_trace_id(TRACE_ID);

    let (status, _, json) = body_json(&error).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "internal server error");
    assert_eq!(json["detail"], "pool exhausted");
}

#[rstest]
#[actix_web::test]
async fn internal_error_with_detail_keeps_its_summary() {
    let error = Error::internal("search failed").with_detail("search backend failed: exit 1");

    let (status, _, json) = body_json(&error).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "internal_error");
    assert_eq!(json["error"], "search failed");
    assert_eq!(json["detail"], "search backend failed: exit 1");
}

#[rstest]
#[actix_web::test]
async fn no_trace_header_without_trace_id() {
    let error = Error::invalid_request("invalid video id");

    let (_, header, json) = body_json(&error).await;

    assert!(header.is_none());
    assert!(json.get("traceId").is_none());
    assert!(json.get("detail").is_none());
}
