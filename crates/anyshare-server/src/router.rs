use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use anyshare_registry::Registry;

use crate::config::ServerConfig;
use crate::handler;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: Registry,
    pub config: Arc<ServerConfig>,
}

/// Build the axum router with all anyShare endpoints mounted under
/// `base_path`.
pub fn build_router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/upload", post(handler::upload))
        .route("/download", get(handler::download))
        .route("/text", get(handler::share_text).post(handler::share_text))
        .route("/health", get(handler::health))
        .route("/info", get(handler::info));

    let base_path = state.config.base_path.clone();
    let app = if base_path == "/" {
        Router::new().merge(routes)
    } else {
        Router::new().nest(&base_path, routes)
    };

    app.layer(DefaultBodyLimit::max(state.config.body_limit()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
