//! MASS route server - route data, hotspot risk analysis and MCSSE bridge.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mass_server::config::{Config, DataSource, LogFormat};
use mass_server::state::AppState;
use mass_server::{api, loops};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();

    // Initialize tracing
    let (text_layer, json_layer) = match config.log_format {
        LogFormat::Text => (Some(tracing_subscriber::fmt::layer()), None),
        LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
    };
    tracing_subscriber::registry()
        .with(text_layer)
        .with(json_layer)
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("mass_server=debug".parse()?))
        .init();

    tracing::info!("Starting MASS route server...");

    let state = Arc::new(AppState::new(config.clone()));
    let (shutdown_tx, _) = broadcast::channel(1);

    // Only the fleet source needs background polling
    let poller = if config.data_source == DataSource::Fleet {
        Some(tokio::spawn(loops::route_poll_loop::run_route_poll_loop(
            state.clone(),
            Duration::from_secs(config.fleet_poll_interval_secs),
            shutdown_tx.subscribe(),
        )))
    } else {
        None
    };

    let app = api::routes()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.host, config.port))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    let _ = shutdown_tx.send(());
    if let Some(poller) = poller {
        let _ = poller.await;
    }

    Ok(())
}
