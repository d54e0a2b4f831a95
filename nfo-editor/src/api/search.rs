//! Search endpoint

use std::path::PathBuf;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use super::{blocking, guard_path};
use crate::error::{ApiError, ApiResult};
use crate::services::search::{self, SearchOutcome};
use crate::AppState;

const DEFAULT_MAX_DEPTH: usize = 5;
const DEFAULT_MAX_RESULTS: usize = 50;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub path: Option<PathBuf>,
    pub max_depth: Option<usize>,
    pub max_results: Option<usize>,
}

/// GET /api/search?q=&path=&max_depth=&max_results=
///
/// `path` falls back to the browse root when omitted.
pub async fn search_files(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<SearchOutcome>> {
    let base = query
        .path
        .or_else(|| state.browse_root.clone())
        .ok_or_else(|| ApiError::BadRequest("Search path is required".to_string()))?;
    guard_path(&state, &base)?;

    let max_depth = query.max_depth.unwrap_or(DEFAULT_MAX_DEPTH);
    let max_results = query.max_results.unwrap_or(DEFAULT_MAX_RESULTS);
    let outcome =
        blocking(move || Ok(search::search(&base, &query.q, max_depth, max_results)?)).await?;
    Ok(Json(outcome))
}

pub fn search_routes() -> Router<AppState> {
    Router::new().route("/api/search", get(search_files))
}
