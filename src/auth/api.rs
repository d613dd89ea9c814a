//! Authentication API Endpoints
//! Mission: Registration, login/logout and the caller's own profile

use crate::api::AppState;
use crate::auth::{
    middleware::token_from_headers,
    models::{
        Identity, LoginRequest, LoginResponse, RegisterRequest, SessionUser,
        UpdateProfileRequest, UserResponse, UserRole,
    },
    user_store::CreateUserOutcome,
};
use crate::catalog::ReviewWithAnime;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Profile with the reviews the user has written
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub reviews: Vec<ReviewWithAnime>,
}

fn validate_registration(payload: &RegisterRequest) -> Result<(), AuthApiError> {
    if payload.username.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.password.is_empty()
    {
        return Err(AuthApiError::MissingFields);
    }
    if !payload.email.contains('@') {
        return Err(AuthApiError::InvalidEmail);
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthApiError::WeakPassword);
    }
    Ok(())
}

/// Register endpoint - POST /user/register
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AuthApiError> {
    validate_registration(&payload)?;

    let outcome = state
        .users
        .create_user(
            payload.username.trim(),
            payload.email.trim(),
            &payload.password,
            UserRole::User,
        )
        .map_err(AuthApiError::internal)?;

    match outcome {
        CreateUserOutcome::Created(user) => Ok((
            StatusCode::CREATED,
            Json(json!({
                "message": "User registered successfully",
                "user": UserResponse::from_user(&user),
            })),
        )),
        CreateUserOutcome::EmailTaken => Err(AuthApiError::UserAlreadyExists),
    }
}

/// Login endpoint - POST /user/login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthApiError> {
    let user = state
        .users
        .verify_credentials(payload.email.trim(), &payload.password)
        .map_err(AuthApiError::internal)?
        .ok_or_else(|| {
            warn!("❌ Failed login attempt");
            AuthApiError::InvalidCredentials
        })?;

    let issued = state
        .tokens
        .issue(user.id, user.role.as_str())
        .map_err(AuthApiError::internal)?;

    info!(user_id = user.id, role = user.role.as_str(), "✅ Login successful");

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token: issued.token,
        expires_in: issued.expires_in,
        user: SessionUser {
            id: user.id,
            email: user.email,
            role: user.role,
        },
    }))
}

/// Logout endpoint - POST /user/logout
///
/// Revokes exactly the token that authenticated this request. The header is
/// read through the same normalisation the auth middleware uses.
pub async fn logout(
    State(state): State<AppState>,
    identity: Identity,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AuthApiError> {
    let token = token_from_headers(&headers).map_err(|_| AuthApiError::Unauthorized)?;
    state.blacklist.revoke(token, identity.expires_at);

    info!(user_id = identity.user_id, "👋 Logged out");

    Ok(Json(json!({ "message": "Logged out successfully" })))
}

/// Profile endpoint - GET /user/profile
pub async fn get_profile(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<ProfileResponse>, AuthApiError> {
    let user = state
        .users
        .get_user_by_id(identity.user_id)
        .map_err(AuthApiError::internal)?
        .ok_or(AuthApiError::UserNotFound)?;

    let reviews = state
        .catalog
        .reviews_by_user(user.id)
        .map_err(AuthApiError::internal)?;

    Ok(Json(ProfileResponse {
        user: UserResponse::from_user(&user),
        reviews,
    }))
}

/// Profile update endpoint - PUT /user/profile
pub async fn update_profile(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AuthApiError> {
    let username = payload.username.trim();
    if username.is_empty() {
        return Err(AuthApiError::UsernameRequired);
    }

    let user = state
        .users
        .update_profile(identity.user_id, username, payload.bio.trim())
        .map_err(AuthApiError::internal)?
        .ok_or(AuthApiError::UserNotFound)?;

    info!(user_id = user.id, "Profile updated");

    Ok(Json(UserResponse::from_user(&user)))
}

/// Reviews written by the caller - GET /user/reviews
pub async fn get_user_reviews(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<ReviewWithAnime>>, AuthApiError> {
    let reviews = state
        .catalog
        .reviews_by_user(identity.user_id)
        .map_err(AuthApiError::internal)?;
    Ok(Json(reviews))
}

/// API errors for the user endpoints
#[derive(Debug)]
pub enum AuthApiError {
    MissingFields,
    InvalidEmail,
    WeakPassword,
    UsernameRequired,
    InvalidCredentials,
    Unauthorized,
    UserNotFound,
    UserAlreadyExists,
    InternalError,
}

impl AuthApiError {
    fn internal(err: anyhow::Error) -> Self {
        error!("User store error: {:#}", err);
        AuthApiError::InternalError
    }
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthApiError::MissingFields => (
                StatusCode::BAD_REQUEST,
                "Username, email and password are required",
            ),
            AuthApiError::InvalidEmail => (StatusCode::BAD_REQUEST, "Invalid email address"),
            AuthApiError::WeakPassword => (
                StatusCode::BAD_REQUEST,
                "Password must be at least 8 characters",
            ),
            AuthApiError::UsernameRequired => (StatusCode::BAD_REQUEST, "Username is required"),
            AuthApiError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid email or password")
            }
            AuthApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Authentication required"),
            AuthApiError::UserNotFound => (StatusCode::NOT_FOUND, "User not found"),
            AuthApiError::UserAlreadyExists => (StatusCode::CONFLICT, "Email already registered"),
            AuthApiError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(username: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_registration_validation() {
        assert!(validate_registration(&registration("mika", "mika@example.com", "password1")).is_ok());

        assert!(matches!(
            validate_registration(&registration("", "mika@example.com", "password1")),
            Err(AuthApiError::MissingFields)
        ));
        assert!(matches!(
            validate_registration(&registration("mika", "mika.example.com", "password1")),
            Err(AuthApiError::InvalidEmail)
        ));
        assert!(matches!(
            validate_registration(&registration("mika", "mika@example.com", "short")),
            Err(AuthApiError::WeakPassword)
        ));
    }

    #[test]
    fn test_auth_api_error_responses() {
        let invalid_creds = AuthApiError::InvalidCredentials.into_response();
        assert_eq!(invalid_creds.status(), StatusCode::UNAUTHORIZED);

        let bad_request = AuthApiError::WeakPassword.into_response();
        assert_eq!(bad_request.status(), StatusCode::BAD_REQUEST);

        let not_found = AuthApiError::UserNotFound.into_response();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let conflict = AuthApiError::UserAlreadyExists.into_response();
        assert_eq!(conflict.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_profile_response_flattens_user() {
        let profile = ProfileResponse {
            user: UserResponse {
                id: 3,
                username: "mika".to_string(),
                email: "mika@example.com".to_string(),
                role: UserRole::User,
                bio: String::new(),
                created_at: "2025-01-01T00:00:00Z".to_string(),
            },
            reviews: Vec::new(),
        };

        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["id"], 3);
        assert_eq!(value["email"], "mika@example.com");
        assert!(value["reviews"].as_array().unwrap().is_empty());
        assert!(value.get("password_hash").is_none());
    }
}
