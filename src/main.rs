//! Nyanime - anime review API server
//! Mission: Serve the catalogue, reviews and favourites behind JWT sessions

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nyanime_backend::{
    api::{build_router, cors_layer, AppState},
    auth::{TokenBlacklist, TokenService, UserStore},
    catalog::CatalogStore,
    config::Config,
    db::Database,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment and logging
    load_env();
    init_tracing();

    let config = Config::parse();

    info!("🚀 Nyanime API starting");

    let db = Database::open(&config.database_path)?;
    info!("💾 Database ready at: {}", config.database_path);

    let tokens = Arc::new(
        TokenService::new(&config.jwt_secret, config.token_settings())
            .context("Invalid token configuration")?,
    );
    let users = Arc::new(UserStore::new(db.clone()));
    let catalog = Arc::new(CatalogStore::new(db));
    let blacklist = Arc::new(TokenBlacklist::new());

    match config.admin_bootstrap() {
        Some((username, email, password)) => users.ensure_admin(username, email, password)?,
        None if users.count_admins()? == 0 => {
            warn!("⚠️  No admin account exists; set ADMIN_EMAIL and ADMIN_PASSWORD to create one");
        }
        None => {}
    }

    if let Some(every) = config.sweep_interval() {
        blacklist.clone().spawn_sweeper(every);
        info!("🧹 Blacklist sweeper running every {:?}", every);
    }

    let state = AppState {
        users,
        catalog,
        tokens,
        blacklist,
    };
    let app = build_router(state, cors_layer(&config.cors_origin)?);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("🎯 API server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Initialize tracing with an env-overridable filter
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nyanime_backend=debug,nyanime=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    // 1) Standard dotenv search (cwd + parents)
    let _ = dotenv();

    // 2) Also try the crate's own .env when launched from elsewhere
    let manifest_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if manifest_env.exists() {
        let _ = dotenv::from_path(&manifest_env);
    }
}
