//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every HTTP endpoint of the inbound layer and the
//! schema wrappers ([`ErrorSchema`], [`ErrorCodeSchema`], [`CandidateSchema`])
//! that describe domain types without coupling them to utoipa. Swagger UI
//! serves the document in debug builds.

use utoipa::OpenApi;

use crate::inbound::http::health::HealthReport;
use crate::inbound::http::schemas::{CandidateSchema, ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::search::SearchResponse;

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Audio proxy API",
        description = "Search videos and stream their audio transcoded to MP3."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::search::search,
        crate::inbound::http::stream::stream,
        crate::inbound::http::stream::stream_alt,
        crate::inbound::http::stream::stream_fixed,
        crate::inbound::http::health::health,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        CandidateSchema,
        SearchResponse,
        HealthReport
    )),
    tags(
        (name = "search", description = "Catalogue search"),
        (name = "stream", description = "Transcoded audio streams"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
