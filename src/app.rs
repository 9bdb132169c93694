use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::AppConfig;
use crate::routes::system_routes::SystemInfo;
use crate::routes::{menu_routes, system_routes};
use crate::state::app::AppState;

/// Build the complete Axum application:
/// - /api/menu     (list, add, remove, stream)
/// - /system       (alive + version)
/// - everything else is served from `static_dir`, when configured
pub fn build_app(state: AppState, cfg: &AppConfig) -> Router {
    let router = Router::new()
        // /api/menu, /api/menu/stream
        .nest("/api", menu_routes::routes(state))

        // /system/*
        .nest("/system", system_routes::routes(SystemInfo::new(cfg.server_version.clone())));

    let router = match &cfg.static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    // Logging middleware
    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}
