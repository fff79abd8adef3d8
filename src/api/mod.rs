//! HTTP surface: the research page and a small JSON API.

mod research;
pub mod types;
pub mod ui;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::agent::Agent;
use crate::config::Config;
use crate::console::Console;
use crate::pipeline::Researcher;
use crate::pprint::PrintOptions;

pub use research::RunError;

/// Shared application state.
pub struct AppState {
    pub default_topic: String,
    pub researcher: Researcher,
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(research::index).post(research::run_form))
        .route("/api/research", post(research::run_json))
        .route("/api/health", get(research::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build the agent from `config` and serve until the process is stopped.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let agent = Agent::from_config(&config)?;
    info!(
        model = %agent.config().model,
        max_iterations = agent.config().max_iterations,
        "Research agent ready"
    );
    let print = PrintOptions {
        markdown: config.markdown,
        show_time: true,
    };
    let state = Arc::new(AppState {
        default_topic: config.default_topic.clone(),
        researcher: Researcher::new(Arc::new(agent), Arc::new(Console::stdout()), print),
    });

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, routes(state)).await?;
    Ok(())
}
