use anyhow::Context;
use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;

use crate::api::{anime, favorites, reviews, AppState};
use crate::auth::{api as user_api, auth_middleware, require_role, RequiredRole, ADMIN_ROLE};
use crate::middleware::request_logging;

/// CORS policy for the browser front end
///
/// Credentials are allowed, so the origin must be a concrete one; `*` is
/// refused here rather than at router construction.
pub fn cors_layer(origin: &str) -> anyhow::Result<CorsLayer> {
    if origin.trim() == "*" {
        anyhow::bail!("CORS origin cannot be \"*\" when credentials are allowed");
    }

    let origin = origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin: {}", origin))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true))
}

/// Create the API router
///
/// Three groups share the same paths where needed: public reads, routes that
/// need a session, and admin routes. Route layers run bottom-up, so on the
/// admin group authentication happens before the role check.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let gate = state.auth_gate();

    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/user/register", post(user_api::register))
        .route("/user/login", post(user_api::login))
        .route("/anime", get(anime::list_anime))
        .route("/anime/:id", get(anime::get_anime))
        .route("/review/anime/:anime_id", get(reviews::reviews_for_anime))
        .route(
            "/review/anime/:anime_id/user/:user_id",
            get(reviews::user_review),
        );

    let protected_routes = Router::new()
        .route("/user/logout", post(user_api::logout))
        .route(
            "/user/profile",
            get(user_api::get_profile).put(user_api::update_profile),
        )
        .route("/user/reviews", get(user_api::get_user_reviews))
        .route("/review/anime/:anime_id", post(reviews::add_review))
        .route(
            "/review/:id",
            put(reviews::update_review).delete(reviews::delete_review),
        )
        .route("/favorite", get(favorites::list_favorites))
        .route("/favorite/anime/:anime_id", post(favorites::add_favorite))
        .route("/favorite/:id", delete(favorites::delete_favorite))
        .route_layer(middleware::from_fn_with_state(
            gate.clone(),
            auth_middleware,
        ));

    let admin_routes = Router::new()
        .route("/anime", post(anime::create_anime))
        .route(
            "/anime/:id",
            put(anime::update_anime).delete(anime::delete_anime),
        )
        .route_layer(middleware::from_fn_with_state(
            RequiredRole(ADMIN_ROLE),
            require_role,
        ))
        .route_layer(middleware::from_fn_with_state(gate, auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .layer(middleware::from_fn(request_logging))
        .layer(cors)
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
