/*****************************************************************************************
 *
 *  Friendsgiving – shared "who brings what" menu service
 *  -----------------------------------------------------
 *
 *  JSON-file backed menu + live event-stream updates
 *
 *****************************************************************************************/

use std::net::SocketAddr;
use std::sync::Arc;

use axum::serve;
use tokio::net::TcpListener;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::FmtSubscriber;

use friendsgiving::app;
use friendsgiving::config::{AppConfig, CONFIG_ENV};
use friendsgiving::persistence::MenuStore;
use friendsgiving::services::broadcast_service::Broadcaster;
use friendsgiving::state::app::AppState;

#[tokio::main]
async fn main() {
    //
    // ────────────────────────────────────────────────────────
    //  Locate and load config.json
    // ────────────────────────────────────────────────────────
    //
    let Some(config_path) = AppConfig::locate() else {
        let tried: Vec<String> = AppConfig::candidate_paths()
            .iter()
            .map(|p| format!("  {}", p.display()))
            .collect();
        eprintln!(
            "config.json not found in:\n{}\nCopy config.json to one of these paths or set {}.",
            tried.join("\n"),
            CONFIG_ENV
        );
        std::process::exit(1);
    };

    let cfg = match AppConfig::load_from_file(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    //
    // ────────────────────────────────────────────────────────
    //  Configure logging
    // ────────────────────────────────────────────────────────
    //
    let level = match cfg.log_level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info"  => LevelFilter::INFO,
        "warn"  => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => LevelFilter::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {e}");
    }

    tracing::info!("Loaded config.json from {}", config_path.display());
    tracing::info!("Loaded configuration: {:?}", cfg);

    if let Err(e) = run(cfg).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: AppConfig) -> std::io::Result<()> {
    //
    // ────────────────────────────────────────────────────────
    //  Menu store (seeded on first run) and broadcaster
    // ────────────────────────────────────────────────────────
    //
    let store = MenuStore::open(&cfg.menu_path);
    let broadcaster = Arc::new(Broadcaster::new(cfg.subscriber_buffer));
    let state = AppState::new(store, Arc::clone(&broadcaster));

    //
    // ────────────────────────────────────────────────────────
    //  Build Axum app and start listening
    // ────────────────────────────────────────────────────────
    //
    let app = app::build_app(state, &cfg);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Server starting on http://{}", addr);

    serve(listener, app)
        .with_graceful_shutdown(shutdown(broadcaster))
        .await
}

//
// ─────────────────────────────────────────────────────────────
//  Graceful shutdown handler
// ─────────────────────────────────────────────────────────────
//
async fn shutdown(broadcaster: Arc<Broadcaster>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }

    tracing::warn!("CTRL+C received, closing menu streams");
    broadcaster.close_all();
    tracing::info!("Goodbye.");
}
