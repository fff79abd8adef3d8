//! # Researcher Agent
//!
//! A research assistant that writes Wall Street Journal style reports.
//!
//! This library provides:
//! - A tool-using agent loop that searches the web and reads articles
//! - A console pretty-printer and a capture layer that collects its output
//! - A sanitizer that turns captured console text into display text
//! - An HTTP page and JSON API for running the agent on a topic
//!
//! ## Pipeline
//!
//! 1. The agent streams its answer as [`agent::RunResponse`] fragments
//! 2. [`pprint::pprint_run_response`] draws them to a [`console::Console`]
//! 3. [`capture::capture_run`] redirects that console into a buffer for the run
//! 4. [`sanitize::clean`] strips panel glyphs and status noise
//! 5. The page renders the cleaned text as markdown
//!
//! ## Example
//!
//! ```rust,ignore
//! use researcher_agent::{agent::Agent, config::Config, pipeline::Researcher};
//!
//! let config = Config::from_env()?;
//! let agent = Agent::from_config(&config)?;
//! let researcher = Researcher::new(Arc::new(agent), Arc::new(Console::stdout()), PrintOptions::default());
//! let report = researcher.research("Oracle Group").await?;
//! ```

pub mod agent;
pub mod api;
pub mod capture;
pub mod config;
pub mod console;
pub mod llm;
pub mod pipeline;
pub mod pprint;
pub mod sanitize;
pub mod tools;

pub use config::Config;
