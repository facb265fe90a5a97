use axum::Router;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::AppConfig;
use crate::routes::{feed_routes, system_routes};
use crate::state::AppState;

/// Build the complete Axum application:
/// - /api      (barrage and bulletin feeds)
/// - /system   (alive + version)
pub fn build_app(state: AppState, cfg: &AppConfig) -> Router {
    let storage_enabled = state.lists.storage_enabled();

    Router::new()
        // /api/{feed}
        .nest("/api", feed_routes::routes(state))

        // /system/*
        .nest(
            "/system",
            system_routes::routes(cfg.server_version.clone(), storage_enabled),
        )

        // Logging middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}
