//! Stream API handlers.
//!
//! ```text
//! GET /stream?id=<id>|q=<query>      Browser header profile
//! GET /stream-alt?id=<id>|q=<query>  Browser and client-hint headers
//! GET /stream-fixed                  Pinned video
//! ```
//!
//! All three share one flow; only the [`StreamRoute`] differs. Errors before
//! the first audio byte produce a JSON error body. Once the `200` head is
//! committed, a failure aborts the connection instead.

use actix_web::http::header;
use actix_web::{HttpResponse, get, web};
use serde::Deserialize;

use crate::domain::{StreamRequest, StreamRoute};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Query parameters for the parametrised stream routes.
#[derive(Debug, Default, Deserialize)]
pub struct StreamParams {
    pub id: Option<String>,
    pub q: Option<String>,
}

impl From<StreamParams> for StreamRequest {
    fn from(params: StreamParams) -> Self {
        Self {
            id: params.id,
            q: params.q,
        }
    }
}

async fn respond(
    state: &HttpState,
    route: &StreamRoute,
    request: StreamRequest,
) -> ApiResult<HttpResponse> {
    let response = state.streams.stream(route, request).await?;
    let framing = response.framing().clone();

    Ok(HttpResponse::Ok()
        .content_type(framing.content_type)
        .insert_header((header::CONTENT_DISPOSITION, framing.content_disposition()))
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .streaming(response.into_body()))
}

/// Stream a video's audio as MP3.
#[utoipa::path(
    get,
    path = "/stream",
    params(
        ("id" = Option<String>, Query, description = "Video identifier; takes precedence over q"),
        ("q" = Option<String>, Query, description = "Search query; the best match is streamed")
    ),
    responses(
        (status = 200, description = "MP3 audio stream", body = Vec<u8>, content_type = "audio/mpeg"),
        (status = 400, description = "Missing or invalid parameters", body = ErrorSchema),
        (status = 404, description = "No video matched the query", body = ErrorSchema),
        (status = 500, description = "Transcoding failed", body = ErrorSchema),
        (status = 502, description = "Upstream failure", body = ErrorSchema)
    ),
    tags = ["stream"],
    operation_id = "stream"
)]
#[get("/stream")]
pub async fn stream(
    state: web::Data<HttpState>,
    params: web::Query<StreamParams>,
) -> ApiResult<HttpResponse> {
    respond(&state, &state.routes.standard, params.into_inner().into()).await
}

/// Stream a video's audio using the alternate upstream header profile.
///
/// Metadata failures report a fixed hint in `detail` rather than the raw
/// upstream cause.
#[utoipa::path(
    get,
    path = "/stream-alt",
    params(
        ("id" = Option<String>, Query, description = "Video identifier; takes precedence over q"),
        ("q" = Option<String>, Query, description = "Search query; the best match is streamed")
    ),
    responses(
        (status = 200, description = "MP3 audio stream", body = Vec<u8>, content_type = "audio/mpeg"),
        (status = 400, description = "Missing or invalid parameters", body = ErrorSchema),
        (status = 404, description = "No video matched the query", body = ErrorSchema),
        (status = 500, description = "Transcoding failed", body = ErrorSchema),
        (status = 502, description = "Upstream failure", body = ErrorSchema)
    ),
    tags = ["stream"],
    operation_id = "streamAlt"
)]
#[get("/stream-alt")]
pub async fn stream_alt(
    state: web::Data<HttpState>,
    params: web::Query<StreamParams>,
) -> ApiResult<HttpResponse> {
    respond(&state, &state.routes.alternate, params.into_inner().into()).await
}

/// Stream the configured fixed video.
#[utoipa::path(
    get,
    path = "/stream-fixed",
    responses(
        (status = 200, description = "MP3 audio stream", body = Vec<u8>, content_type = "audio/mpeg"),
        (status = 500, description = "Transcoding failed", body = ErrorSchema),
        (status = 502, description = "Upstream failure", body = ErrorSchema)
    ),
    tags = ["stream"],
    operation_id = "streamFixed"
)]
#[get("/stream-fixed")]
pub async fn stream_fixed(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    respond(&state, &state.routes.fixed, StreamRequest::default()).await
}
