//! Authentication Middleware
//! Mission: Protect API endpoints with JWT validation and role checks

use crate::auth::{
    blacklist::TokenBlacklist,
    errors::AuthError,
    jwt::TokenService,
    models::Identity,
};
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Canonical form of a presented credential.
///
/// Both verification and revocation go through here so a token is always
/// blacklisted under the same key it is later looked up with. The `Bearer `
/// prefix is optional.
pub fn bearer_token(header_value: &str) -> &str {
    let value = header_value.trim();
    value.strip_prefix("Bearer ").unwrap_or(value).trim()
}

/// Raw `Authorization` value, `None` when absent or blank.
fn authorization_value(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| AuthError::Malformed)?;
    if value.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(value))
}

/// Extract the canonical token from request headers.
pub fn token_from_headers(headers: &HeaderMap) -> Result<&str, AuthError> {
    authorization_value(headers)?
        .map(bearer_token)
        .ok_or(AuthError::MissingCredential)
}

/// Everything the auth middleware needs, injected at router construction.
#[derive(Clone)]
pub struct AuthGate {
    pub tokens: Arc<TokenService>,
    pub blacklist: Arc<TokenBlacklist>,
}

impl AuthGate {
    pub fn new(tokens: Arc<TokenService>, blacklist: Arc<TokenBlacklist>) -> Self {
        Self { tokens, blacklist }
    }

    /// Decide whether `headers` carry a live session.
    ///
    /// Signature and expiry are checked before the blacklist; a revoked token
    /// is refused even while its signature is still good.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, AuthError> {
        let token = token_from_headers(headers)?;
        let claims = self.tokens.verify(token)?;

        if self.blacklist.contains(token) {
            return Err(AuthError::Revoked);
        }

        Ok(Identity::from(claims))
    }
}

/// Auth middleware that validates JWT tokens
pub async fn auth_middleware(
    State(gate): State<AuthGate>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let identity = match gate.authenticate(req.headers()) {
        Ok(identity) => identity,
        Err(reason) => {
            warn!(
                %reason,
                path = %req.uri().path(),
                "Rejected unauthenticated request"
            );
            return Err(reason);
        }
    };

    debug!(user_id = identity.user_id, role = %identity.role, "Authenticated request");

    // Add identity to request extensions so handlers can access it
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

/// Role a route requires; exact string match, no hierarchy.
#[derive(Debug, Clone, Copy)]
pub struct RequiredRole(pub &'static str);

/// Role middleware. Must be layered inside [`auth_middleware`].
pub async fn require_role(
    State(RequiredRole(required)): State<RequiredRole>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let Some(identity) = Identity::lookup(req.extensions()) else {
        warn!(
            required,
            path = %req.uri().path(),
            "Role check ran without an authenticated identity"
        );
        return Err(AuthError::Forbidden);
    };

    if identity.role != required {
        warn!(
            user_id = identity.user_id,
            role = %identity.role,
            required,
            "Permission denied"
        );
        return Err(AuthError::Forbidden);
    }

    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Identity::lookup(&parts.extensions)
            .cloned()
            .ok_or(AuthError::MissingCredential)
    }
}
