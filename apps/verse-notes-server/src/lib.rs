//! Verse Notes Server Library
//!
//! Persistence service for verse highlights and notes, plus a Strong's
//! definition lookup. The binary in main.rs wires configuration, the
//! database and the lexicon client into [`app`].
//!
//! # Modules
//!
//! - `db`: SQLite schema and the highlight repository
//! - `lookup`: definition lookup trait and the Blue Letter Bible scraper
//! - `routes`: HTTP handlers

pub mod config;
pub mod db;
pub mod error;
pub mod lookup;
pub mod routes;
pub mod state;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the application router
pub fn app(state: AppState) -> Router {
    let static_dir = state.config().server.static_dir.clone();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .merge(routes::highlights::router())
        .merge(routes::definitions::router())
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
