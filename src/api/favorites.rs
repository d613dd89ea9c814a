use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};

use crate::api::{ApiError, AppState};
use crate::auth::Identity;
use crate::catalog::{Favorite, FavoriteOutcome, FavoriteWithAnime};

pub async fn add_favorite(
    State(state): State<AppState>,
    Path(anime_id): Path<i64>,
    identity: Identity,
) -> Result<(StatusCode, Json<Favorite>), ApiError> {
    match state.catalog.add_favorite(identity.user_id, anime_id)? {
        FavoriteOutcome::Added(favorite) => Ok((StatusCode::CREATED, Json(favorite))),
        FavoriteOutcome::AnimeNotFound => {
            Err(ApiError::NotFound(format!("Anime {} not found", anime_id)))
        }
        FavoriteOutcome::UserNotFound => Err(ApiError::NotFound("User not found".to_string())),
        FavoriteOutcome::AlreadyFavorite => Err(ApiError::Conflict(
            "Anime is already in favorites".to_string(),
        )),
    }
}

pub async fn list_favorites(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<FavoriteWithAnime>>, ApiError> {
    Ok(Json(state.catalog.favorites_for_user(identity.user_id)?))
}

/// Someone else's favourite looks the same as a missing one.
pub async fn delete_favorite(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    identity: Identity,
) -> Result<StatusCode, ApiError> {
    if !state.catalog.delete_favorite(id, identity.user_id)? {
        return Err(ApiError::NotFound(format!("Favorite {} not found", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}
