//! Catalog lookup mapping endpoint
//!
//! The client fetches details from the catalog itself and posts the payload
//! here to get a record back.

use axum::{extract::Path, routing::post, Json, Router};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::models::Record;
use crate::services::lookup_mapper::{self, EpisodeDetails, MovieDetails, TvShowDetails};
use crate::AppState;

fn details<T: DeserializeOwned>(payload: Value) -> ApiResult<T> {
    serde_json::from_value(payload)
        .map_err(|e| ApiError::BadRequest(format!("Invalid details payload: {}", e)))
}

/// POST /api/lookup/:media_type
pub async fn map_details(
    Path(media_type): Path<String>,
    Json(payload): Json<Value>,
) -> ApiResult<Json<Record>> {
    let record = match media_type.as_str() {
        "movie" => lookup_mapper::map_movie(&details::<MovieDetails>(payload)?),
        "tv" | "tvshow" => lookup_mapper::map_tv_show(&details::<TvShowDetails>(payload)?),
        "episode" => lookup_mapper::map_episode(&details::<EpisodeDetails>(payload)?),
        other => {
            return Err(ApiError::BadRequest(format!(
                "Unknown media type '{}', expected movie, tv or episode",
                other
            )))
        }
    };
    Ok(Json(record))
}

pub fn lookup_routes() -> Router<AppState> {
    Router::new().route("/api/lookup/:media_type", post(map_details))
}
