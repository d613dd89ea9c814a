//! HTTP API: shared state, catalogue handlers and the router.

pub mod anime;
pub mod error;
pub mod favorites;
pub mod reviews;
pub mod routes;

use crate::auth::{AuthGate, TokenBlacklist, TokenService, UserStore};
use crate::catalog::CatalogStore;
use std::sync::Arc;

pub use error::ApiError;
pub use routes::{build_router, cors_layer};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserStore>,
    pub catalog: Arc<CatalogStore>,
    pub tokens: Arc<TokenService>,
    pub blacklist: Arc<TokenBlacklist>,
}

impl AppState {
    /// Dependencies of the auth middleware.
    pub fn auth_gate(&self) -> AuthGate {
        AuthGate::new(self.tokens.clone(), self.blacklist.clone())
    }
}
