//! PDF Thumbnail Server
//!
//! Serves first-page PDF thumbnails for wiki pages, with an on-disk PNG cache.

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pdf_thumbnail_server::config::Config;
use pdf_thumbnail_server::rasterizer::default_rasterizer;
use pdf_thumbnail_server::routes;
use pdf_thumbnail_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdf_thumbnail_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        Config::default()
    });

    tracing::info!("Starting PDF Thumbnail Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Resolution: {} dpi", config.render.resolution);
    tracing::info!("Upload dir: {}", config.wiki.upload_dir.display());
    if config.render.cache_enabled {
        tracing::info!(
            "Cache: {} served at {}",
            config.render.cache_dir.display(),
            config.render.cache_url
        );
    } else {
        tracing::info!("Cache disabled, thumbnails are inlined");
    }

    let rasterizer = default_rasterizer();
    tracing::info!("Rasterizer: {}", rasterizer.name());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = routes::app(AppState::new(config, rasterizer));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("PDF Thumbnail Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
