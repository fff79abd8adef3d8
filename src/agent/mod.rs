//! Agent module - the research agent and its run stream.
//!
//! The agent follows a "tools in a loop" pattern:
//! 1. Build context with system prompt and the user's topic
//! 2. Call LLM with the search and article tools
//! 3. If LLM requests tool call, execute it and feed result back
//! 4. Repeat until LLM produces final response or max iterations reached
//!
//! A run is exposed as a lazy stream of [`RunResponse`] fragments. Nothing is
//! sent to the model until the stream is polled, and the stream can only be
//! drained once.

mod agent_loop;
mod config;
mod events;
mod prompt;

use std::pin::Pin;

use futures::Stream;

pub use agent_loop::Agent;
pub use config::{AgentConfig, DEFAULT_DESCRIPTION, DEFAULT_INSTRUCTIONS};
pub use events::RunResponse;
pub use prompt::build_system_prompt;

/// Fragments of one agent run, in generation order.
pub type RunStream = Pin<Box<dyn Stream<Item = anyhow::Result<RunResponse>> + Send>>;

/// Anything that can research a topic as a stream of fragments.
pub trait ResearchAgent: Send + Sync {
    /// Start a streamed run for `topic`.
    fn run_stream(&self, topic: &str) -> RunStream;
}
