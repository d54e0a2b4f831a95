//! Single-document endpoints
//!
//! - POST /api/nfo/parse: XML text → record
//! - POST /api/nfo/serialize: record → XML text
//! - POST /api/nfo/validate: record → validation report
//! - GET  /api/nfo?path=: load a file
//! - GET  /api/nfo/kind?path=: detect a file's kind
//! - PUT  /api/nfo: validate and save a record

use std::path::PathBuf;

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{blocking, guard_path};
use crate::codec;
use crate::error::ApiResult;
use crate::models::{Kind, Record};
use crate::validation::{self, ValidationReport};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct RecordRequest {
    pub record: Record,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ContentResponse {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct PathQuery {
    pub path: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct KindResponse {
    pub nfo_type: Kind,
}

#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    pub path: PathBuf,
    pub record: Record,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveResponse {
    pub saved: bool,
    pub path: PathBuf,
}

/// POST /api/nfo/parse
pub async fn parse_document(Json(request): Json<ParseRequest>) -> ApiResult<Json<Record>> {
    Ok(Json(codec::parse(&request.content)?))
}

/// POST /api/nfo/serialize
pub async fn serialize_record(Json(request): Json<RecordRequest>) -> Json<ContentResponse> {
    Json(ContentResponse {
        content: codec::serialize(&request.record),
    })
}

/// POST /api/nfo/validate
pub async fn validate_record(Json(request): Json<RecordRequest>) -> Json<ValidationReport> {
    Json(validation::validate_record(&request.record))
}

/// GET /api/nfo?path=
pub async fn load_document(
    State(state): State<AppState>,
    Query(query): Query<PathQuery>,
) -> ApiResult<Json<Record>> {
    guard_path(&state, &query.path)?;
    let record = blocking(move || Ok(codec::load_file(&query.path)?)).await?;
    Ok(Json(record))
}

/// GET /api/nfo/kind?path=
pub async fn detect_kind(
    State(state): State<AppState>,
    Query(query): Query<PathQuery>,
) -> ApiResult<Json<KindResponse>> {
    guard_path(&state, &query.path)?;
    let nfo_type = blocking(move || Ok(codec::detect_kind_from_file(&query.path)?)).await?;
    Ok(Json(KindResponse { nfo_type }))
}

/// PUT /api/nfo
pub async fn save_document(
    State(state): State<AppState>,
    Json(request): Json<SaveRequest>,
) -> ApiResult<Json<SaveResponse>> {
    guard_path(&state, &request.path)?;
    validation::ensure_valid(&request.record)?;

    let path = request.path.clone();
    blocking(move || Ok(codec::save_file(&request.record, &request.path)?)).await?;
    info!(path = %path.display(), "Saved document");

    Ok(Json(SaveResponse { saved: true, path }))
}

/// Build single-document routes
pub fn nfo_routes() -> Router<AppState> {
    Router::new()
        .route("/api/nfo", get(load_document).put(save_document))
        .route("/api/nfo/kind", get(detect_kind))
        .route("/api/nfo/parse", post(parse_document))
        .route("/api/nfo/serialize", post(serialize_record))
        .route("/api/nfo/validate", post(validate_record))
}
