use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};

use crate::api::{ApiError, AppState};
use crate::auth::Identity;
use crate::catalog::{Review, ReviewInput, ReviewOutcome};

fn validate(input: &ReviewInput, require_content: bool) -> Result<(), ApiError> {
    if !input.rating_in_range() {
        return Err(ApiError::BadRequest(format!(
            "Rating must be between {} and {}",
            ReviewInput::MIN_RATING,
            ReviewInput::MAX_RATING
        )));
    }
    if require_content && input.content.trim().is_empty() {
        return Err(ApiError::BadRequest("Content is required".to_string()));
    }
    Ok(())
}

/// Load a review the caller may change: its author, or any admin.
fn owned_review(state: &AppState, id: i64, identity: &Identity) -> Result<Review, ApiError> {
    let review = state
        .catalog
        .get_review(id)?
        .ok_or(ApiError::NotFound(format!("Review {} not found", id)))?;

    if review.user_id != identity.user_id && !identity.is_admin() {
        return Err(ApiError::Forbidden(
            "You can only modify your own reviews".to_string(),
        ));
    }
    Ok(review)
}

pub async fn reviews_for_anime(
    State(state): State<AppState>,
    Path(anime_id): Path<i64>,
) -> Result<Json<Vec<Review>>, ApiError> {
    Ok(Json(state.catalog.reviews_for_anime(anime_id)?))
}

/// Serialises to `null` when the user has not reviewed the anime.
pub async fn user_review(
    State(state): State<AppState>,
    Path((anime_id, user_id)): Path<(i64, i64)>,
) -> Result<Json<Option<Review>>, ApiError> {
    Ok(Json(state.catalog.user_review(anime_id, user_id)?))
}

pub async fn add_review(
    State(state): State<AppState>,
    Path(anime_id): Path<i64>,
    identity: Identity,
    Json(input): Json<ReviewInput>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    validate(&input, false)?;

    match state.catalog.add_review(anime_id, identity.user_id, &input)? {
        ReviewOutcome::Added(review) => Ok((StatusCode::CREATED, Json(review))),
        ReviewOutcome::AnimeNotFound => {
            Err(ApiError::NotFound(format!("Anime {} not found", anime_id)))
        }
        ReviewOutcome::UserNotFound => Err(ApiError::NotFound("User not found".to_string())),
    }
}

pub async fn update_review(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    identity: Identity,
    Json(input): Json<ReviewInput>,
) -> Result<Json<Review>, ApiError> {
    validate(&input, true)?;
    owned_review(&state, id, &identity)?;

    state
        .catalog
        .update_review(id, &input)?
        .map(Json)
        .ok_or(ApiError::NotFound(format!("Review {} not found", id)))
}

pub async fn delete_review(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    identity: Identity,
) -> Result<StatusCode, ApiError> {
    owned_review(&state, id, &identity)?;

    if !state.catalog.delete_review(id)? {
        return Err(ApiError::NotFound(format!("Review {} not found", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}
