mod authentication;
pub mod config;
pub mod data_formats;
pub mod db_helpers;
pub mod errors;
pub mod feed;
pub mod follow;
mod handlers;
pub mod models;
pub mod page_cache;
pub mod pagination;
pub mod telemetry;

use std::{str::FromStr, time::Duration};

use anyhow::Context;
pub use anyhow::Result;
pub use authentication::TokenSigner;
use axum::http::StatusCode;
use axum::{routing::*, Json, Router};
use bytes::Bytes;
use handlers::*;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

use crate::{config::Settings, page_cache::PageCache};

pub type JsonResponse<T> = (StatusCode, Json<T>);

/// How long a writer waits for the write lock before giving up.
const DB_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub tokens: TokenSigner,
    /// Rendered index pages, keyed by page number. Clearing it only affects
    /// this process; a running server cannot be told to drop it.
    pub index_cache: PageCache<Bytes>,
    pub index_ttl: Duration,
}

impl AppState {
    pub fn new(pool: SqlitePool, tokens: TokenSigner, index_ttl: Duration) -> Self {
        Self {
            pool,
            tokens,
            index_cache: PageCache::new(),
            index_ttl,
        }
    }
}

pub async fn run_app(settings: &Settings) -> Result<()> {
    let secret = settings
        .auth
        .jwt_secret
        .as_deref()
        .filter(|secret| !secret.is_empty())
        .context("auth.jwt_secret (or JWT_SECRET) must be set to serve")?;

    let pool = connect_db(&settings.database.url, settings.database.max_connections).await?;
    let mut state = AppState::new(
        pool,
        TokenSigner::new(secret, settings.auth.token_ttl_days),
        settings.cache.index_ttl(),
    );
    state.index_cache = PageCache::with_capacity(settings.cache.index_max_entries);

    let address = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    tracing::info!(address = %listener.local_addr()?, "server started");

    axum::serve(listener, make_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server stopped unexpectedly")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "could not listen for shutdown signal");
        return;
    }
    tracing::info!("shutting down");
}

/// Opens the database, creating it if needed, and runs pending migrations.
pub async fn connect_db(url: &str, max_connections: u32) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)
        .with_context(|| format!("Invalid database url {url}"))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(DB_BUSY_TIMEOUT);

    // in-memory databases live only as long as a connection does
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open database {url}"))?;

    tracing::debug!("running migrations");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!(url, "database ready");
    Ok(pool)
}

pub fn make_router(state: AppState) -> Router {
    Router::new()
        .route("/check_health", get(alive))
        .route("/users/login", post(login_user))
        .route("/users", post(register_user))
        .route("/user", delete(delete_current_user))
        .route("/", get(index))
        .route("/groups", get(list_groups))
        .route("/group/{slug}", get(group_posts))
        .route("/profile/{username}", get(profile))
        .route("/profile/{username}/follow", post(profile_follow))
        .route("/profile/{username}/unfollow", post(profile_unfollow))
        .route("/follow", get(follow_index))
        .route("/create", post(create_post))
        .route("/posts/{post_id}", get(post_detail))
        .route("/posts/{post_id}/edit", put(edit_post))
        .route("/posts/{post_id}/comment", post(add_comment))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
