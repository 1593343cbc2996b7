//! REST backend for polls: create a poll, list and fetch polls, cast votes and
//! close a poll. Polls live in MongoDB (or an in-memory store for local runs)
//! as single documents with their options and votes embedded.
//!
//! # Routes
//! All routes are nested under `/api/polls`.
//!
//! | Method | Path | Result |
//! |---|---|---|
//! | `GET` | `/` | every poll |
//! | `GET` | `/:pollId` | one poll |
//! | `POST` | `/` | create a poll |
//! | `POST` | `/:pollId/vote/:optionId` | cast a vote |
//! | `PATCH` | `/:pollId/close` | close a poll |
//!
//! # Environment
//! - `PORT` (default `3001`)
//! - `MONGODB_URI` (default `mongodb://localhost:27017/polls`)
//! - `DB_NAME` (defaults to the database in the URI)
//! - `CORS_ORIGIN` (any origin when unset)
//! - `POLL_STORE`, `mongodb` or `memory`
//! - `RUST_LOG`, a `tracing-subscriber` filter
use std::sync::Arc;

use axum::{http::HeaderValue, Router};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

pub mod config;
pub mod controllers;
pub mod db;
pub mod models;
pub mod routes;
pub mod state;
pub mod utils;

use config::{Config, StoreKind};
use db::{InMemoryPollRepository, MongoPollRepository, PollRepository};
use state::AppState;
use utils::error::{AppError, AppResult};

pub fn app(state: AppState) -> Router {
    Router::new().nest("/api/polls", routes::poll_routes::poll_routes(state))
}

fn cors_layer(config: &Config) -> AppResult<CorsLayer> {
    match &config.cors_origin {
        Some(origin) => {
            let origin = origin
                .parse::<HeaderValue>()
                .map_err(|_| AppError::InternalError(format!("Failed to parse CORS origin: {origin}")))?;
            Ok(CorsLayer::new()
                .allow_origin(origin)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any))
        }
        None => Ok(CorsLayer::permissive()),
    }
}

pub async fn start_server() -> AppResult<()> {
    let config = Config::load()?;

    info!("Initializing {} poll store...", config.store);
    let polls: Arc<dyn PollRepository> = match config.store {
        StoreKind::Mongo => {
            let database = db::connection::init_db(&config).await?;
            Arc::new(MongoPollRepository::new(&database))
        }
        StoreKind::Memory => {
            warn!("Polls are kept in memory and are lost on shutdown");
            Arc::new(InMemoryPollRepository::new())
        }
    };

    let app = app(AppState::new(polls)).layer(cors_layer(&config)?);

    let address = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to bind to address {address}: {e}")))?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::InternalError(format!("Server error: {e}")))?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
