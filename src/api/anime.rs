use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};
use tracing::info;

use crate::api::{ApiError, AppState};
use crate::auth::Identity;
use crate::catalog::{Anime, AnimeInput};

fn require_title(input: &AnimeInput) -> Result<(), ApiError> {
    if input.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Title is required".to_string()));
    }
    Ok(())
}

/// List every anime with its average rating
pub async fn list_anime(State(state): State<AppState>) -> Result<Json<Vec<Anime>>, ApiError> {
    Ok(Json(state.catalog.list_anime()?))
}

pub async fn get_anime(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Anime>, ApiError> {
    state
        .catalog
        .get_anime(id)?
        .map(Json)
        .ok_or(ApiError::NotFound(format!("Anime {} not found", id)))
}

/// Admin only
pub async fn create_anime(
    State(state): State<AppState>,
    identity: Identity,
    Json(input): Json<AnimeInput>,
) -> Result<(StatusCode, Json<Anime>), ApiError> {
    require_title(&input)?;

    let anime = state.catalog.create_anime(&input, identity.user_id)?;
    info!(anime_id = anime.id, admin_id = identity.user_id, "Anime created");

    Ok((StatusCode::CREATED, Json(anime)))
}

/// Admin only
pub async fn update_anime(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<AnimeInput>,
) -> Result<Json<Anime>, ApiError> {
    require_title(&input)?;

    state
        .catalog
        .update_anime(id, &input)?
        .map(Json)
        .ok_or(ApiError::NotFound(format!("Anime {} not found", id)))
}

/// Admin only. Reviews and favourites go with it.
pub async fn delete_anime(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    identity: Identity,
) -> Result<Json<Value>, ApiError> {
    if !state.catalog.delete_anime(id)? {
        return Err(ApiError::NotFound(format!("Anime {} not found", id)));
    }
    info!(anime_id = id, admin_id = identity.user_id, "Anime deleted");

    Ok(Json(json!({ "message": "Anime deleted successfully" })))
}
