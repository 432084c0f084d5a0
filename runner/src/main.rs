//! Binary Runner Service - Main Entry Point
//!
//! Accepts script execution requests over HTTP and returns their classified result.

use anyhow::{Context, Result};
use binary_runner::{create_app, AppState, Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse_config();

    init_tracing(config.log_json);

    info!("Starting Binary Runner Service");
    info!("Configuration:");
    info!("  Bind address: {}", config.bind_addr);
    info!("  Process timeout: {} ms", config.process_timeout_ms);

    let state = AppState::new(&config);
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    info!("Binary Runner listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,binary_runner=debug,capsules_binary_exec=debug")
    });

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
