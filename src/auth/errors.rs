//! Authentication Errors
//! Mission: Keep rejection reasons distinct internally, generic on the wire

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Why a request was refused by the auth chain.
///
/// The four token failures collapse to the same 401 body so a client cannot
/// tell a bad signature from a revoked token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("no Authorization header presented")]
    MissingCredential,
    #[error("token could not be parsed")]
    Malformed,
    #[error("token signature does not verify")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token has been revoked")]
    Revoked,
    #[error("role does not grant access")]
    Forbidden,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Message sent to the client.
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "Authorization header required",
            AuthError::Malformed
            | AuthError::InvalidSignature
            | AuthError::Expired
            | AuthError::Revoked => "Invalid or expired token",
            AuthError::Forbidden => "Forbidden: insufficient role",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.public_message() }))).into_response()
    }
}
