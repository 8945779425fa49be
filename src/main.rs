//! Shared Timer - a persisted, broadcast countdown timer service
//!
//! This is the main entry point for the shared-timer application.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::info;

use shared_timer::{
    api::create_router,
    config::Config,
    state::AppState,
    store::{MemoryStore, RedisStore, TimerStore},
    timer::TimerAuthority,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "shared_timer={},tower_http=info",
            config.log_level()
        ))
        .init();

    info!("Starting shared-timer server v0.4.0");
    info!(
        "Configuration: host={}, port={}, default_duration={}ms, tick={}ms",
        config.host, config.port, config.duration, config.tick_interval
    );

    // Pick the durable store: Redis when configured, in-process otherwise
    let store: Arc<dyn TimerStore> = match &config.redis_url {
        Some(url) => match RedisStore::connect(url).await {
            Ok(store) => Arc::new(store),
            Err(e) => {
                tracing::error!("Failed to connect to Redis: {}", e);
                std::process::exit(1);
            }
        },
        None => {
            info!("No Redis URL configured, timer state will not survive a restart");
            Arc::new(MemoryStore::new())
        }
    };

    // Create the timer authority and restore a run that was in flight when
    // the previous process exited
    let timer = Arc::new(TimerAuthority::new(
        store,
        config.duration,
        Duration::from_millis(config.tick_interval),
    ));
    if let Err(e) = timer.recover().await {
        tracing::error!("Timer recovery failed: {}", e);
    }

    // Create application state
    let state = Arc::new(AppState::new(
        Arc::clone(&timer),
        config.port,
        config.host.clone(),
    ));

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /timer/start - Start (or replace) the shared countdown");
    info!("  POST /timer/stop  - Stop the running countdown");
    info!("  POST /timer/reset - Clear the countdown unconditionally");
    info!("  GET  /timer/state - Current timer state");
    info!("  GET  /ws          - Observer WebSocket (events + commands)");
    info!("  GET  /status      - Server status");
    info!("  GET  /health      - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
