//! Researcher Agent - HTTP Server Entry Point
//!
//! Starts the HTTP server that serves the research page.

use researcher_agent::{api, config::Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "researcher_agent=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Loaded configuration: model={}, api_key_set={}",
        config.model,
        config.api_key.is_some()
    );

    info!("Starting server on {}", config.bind_addr());
    api::serve(config).await?;

    Ok(())
}
