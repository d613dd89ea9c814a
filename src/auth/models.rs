//! Authentication Models
//! Mission: Define user accounts, session claims and request identity

use serde::{Deserialize, Serialize};

/// Role granting access to catalogue administration.
pub const ADMIN_ROLE: &str = "admin";
/// Role given to every self-registered account.
pub const USER_ROLE: &str = "user";

/// User account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt hash - never serialize
    pub role: UserRole,
    pub bio: String,
    pub created_at: String,
}

/// User roles
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UserRole {
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "user")]
    User,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => ADMIN_ROLE,
            UserRole::User => USER_ROLE,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            ADMIN_ROLE => Some(UserRole::Admin),
            USER_ROLE => Some(UserRole::User),
            _ => None,
        }
    }
}

/// JWT Claims payload
///
/// Only [`crate::auth::jwt::TokenService`] signs these; anything else holding
/// one got it from a verified token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub user_id: i64,
    pub role: String,
    pub iss: String,
    pub exp: i64, // expiration timestamp
}

/// Verified caller bound to a single request.
///
/// Inserted into the request extensions by the auth middleware and never
/// modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
    pub role: String,
    pub expires_at: i64,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }

    /// Explicit presence check; `None` means the auth middleware never ran.
    pub fn lookup(extensions: &axum::http::Extensions) -> Option<&Identity> {
        extensions.get::<Identity>()
    }
}

impl From<SessionClaims> for Identity {
    fn from(claims: SessionClaims) -> Self {
        Self {
            user_id: claims.user_id,
            role: claims.role,
            expires_at: claims.exp,
        }
    }
}

/// Registration request body
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Profile update body
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub bio: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub expires_in: i64, // seconds until expiration
    pub user: SessionUser,
}

/// Minimal user view returned at login
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: i64,
    pub email: String,
    pub role: UserRole,
}

/// User response (sanitized)
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub bio: String,
    pub created_at: String,
}

impl UserResponse {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            bio: user.bio.clone(),
            created_at: user.created_at.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_role_serialization() {
        let admin = UserRole::Admin;
        let json = serde_json::to_string(&admin).unwrap();
        assert_eq!(json, r#""admin""#);

        let user: UserRole = serde_json::from_str(r#""user""#).unwrap();
        assert_eq!(user, UserRole::User);
    }

    #[test]
    fn test_user_role_string_conversion() {
        assert_eq!(UserRole::Admin.as_str(), "admin");
        assert_eq!(UserRole::User.as_str(), "user");

        assert_eq!(UserRole::from_str("admin"), Some(UserRole::Admin));
        // exact match only, no case folding
        assert_eq!(UserRole::from_str("ADMIN"), None);
        assert_eq!(UserRole::from_str("moderator"), None);
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let user = User {
            id: 1,
            username: "sakura".to_string(),
            email: "sakura@example.com".to_string(),
            password_hash: "$2b$12$secret".to_string(),
            role: UserRole::User,
            bio: String::new(),
            created_at: "2025-01-01T00:00:00Z".to_string(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("secret"));
    }

    #[test]
    fn test_identity_from_claims() {
        let identity = Identity::from(SessionClaims {
            user_id: 7,
            role: "admin".to_string(),
            iss: "Nyanime".to_string(),
            exp: 1_900_000_000,
        });

        assert_eq!(identity.user_id, 7);
        assert!(identity.is_admin());
        assert_eq!(identity.expires_at, 1_900_000_000);
    }
}
