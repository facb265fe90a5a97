/*****************************************************************************************
 *
 *  China News From Japan – Feed Service
 *  ------------------------------------
 *
 *  Barrage + bulletin feeds: bounded JSON lists stored as single blobs on R2/S3.
 *
 *****************************************************************************************/

use std::sync::Arc;

use axum::serve;
use tokio::net::TcpListener;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::FmtSubscriber;

use chinanews_feeds::app;
use chinanews_feeds::config::AppConfig;
use chinanews_feeds::state::blob::{Bounded, ObjectBlobStore};
use chinanews_feeds::state::AppState;

#[tokio::main]
async fn main() {
    //
    // ────────────────────────────────────────────────────────
    //  Load configuration (config.json is optional)
    // ────────────────────────────────────────────────────────
    //
    let cfg = match AppConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
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

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    tracing::info!("Starting feed service…");
    tracing::info!("Loaded configuration: {:?}", cfg);

    //
    // ────────────────────────────────────────────────────────
    //  Object storage (disabled when credentials are absent)
    // ────────────────────────────────────────────────────────
    //
    let blobs = Bounded::new(ObjectBlobStore::from_config(&cfg.storage), cfg.store_timeout());
    let state = AppState::new(Arc::new(blobs));

    //
    // ────────────────────────────────────────────────────────
    //  Build Axum app (feeds + system routes)
    // ────────────────────────────────────────────────────────
    //
    let app = app::build_app(state, &cfg);

    //
    // ────────────────────────────────────────────────────────
    //  Bind server and start listening
    // ────────────────────────────────────────────────────────
    //
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    tracing::info!("Listening on http://{}", addr);

    serve(listener, app)
        .with_graceful_shutdown(shutdown())
        .await
        .expect("Server error");
}

//
// ─────────────────────────────────────────────────────────────
//  Graceful shutdown handler
// ─────────────────────────────────────────────────────────────
//
async fn shutdown() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        return;
    }

    // Nothing buffered in memory: every write already reached the store.
    tracing::warn!("CTRL+C received, shutting down. Goodbye.");
}
