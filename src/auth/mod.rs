//! Authentication Module
//! Mission: Stateless JWT sessions with logout revocation and role gating

pub mod api;
pub mod blacklist;
pub mod errors;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod user_store;

pub use blacklist::TokenBlacklist;
pub use errors::AuthError;
pub use jwt::{IssuedToken, TokenService, TokenSettings};
pub use middleware::{auth_middleware, bearer_token, require_role, AuthGate, RequiredRole};
pub use models::{Identity, SessionClaims, UserRole, ADMIN_ROLE, USER_ROLE};
pub use user_store::UserStore;
