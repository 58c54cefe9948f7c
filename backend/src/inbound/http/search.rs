//! Search API handler.
//!
//! ```text
//! GET /search?q=<query>  Up to five candidates, best match first
//! ```

use actix_web::{get, web};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use crate::domain::{Candidate, Error, SearchQuery};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{CandidateSchema, ErrorSchema};
use crate::inbound::http::state::HttpState;

/// Query parameters for `GET /search`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

/// Search response payload.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SearchResponse {
    /// The trimmed query that was searched.
    pub q: String,
    /// Candidates, best match first.
    #[schema(value_type = Vec<CandidateSchema>)]
    pub results: Vec<Candidate>,
}

/// Search the upstream catalogue.
#[utoipa::path(
    get,
    path = "/search",
    params(
        ("q" = String, Query, description = "Free-text search query")
    ),
    responses(
        (status = 200, description = "Search results", body = SearchResponse),
        (status = 400, description = "Missing or blank query", body = ErrorSchema),
        (status = 500, description = "Search backend failed", body = ErrorSchema)
    ),
    tags = ["search"],
    operation_id = "search"
)]
#[get("/search")]
pub async fn search(
    state: web::Data<HttpState>,
    params: web::Query<SearchParams>,
) -> ApiResult<web::Json<SearchResponse>> {
    let raw = params.into_inner().q.unwrap_or_default();
    let query = SearchQuery::parse(&raw)
        .map_err(|_| Error::invalid_request("missing q query param"))?;

    let results = state.search.search(&query).await.map_err(|err| {
        warn!(query = %query, error = %err, "search failed");
        Error::internal("search failed").with_detail(err.to_string())
    })?;

    Ok(web::Json(SearchResponse {
        q: query.as_str().to_owned(),
        results,
    }))
}
