//! Research agent configuration.

use crate::config::Config;

/// Role description sent ahead of the instructions.
pub const DEFAULT_DESCRIPTION: &str =
    "You are a senior The Wall Street Journal researcher writing an article on a topic.";

/// Ordered research instructions.
pub const DEFAULT_INSTRUCTIONS: &[&str] = &[
    "For a given topic, search for the top 5 links.",
    "Then read each URL and extract the article text, if a URL isn't available, ignore it.",
    "Analyse and prepare an NYT worthy article based on the information.",
];

/// Configuration for the research agent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// The model to use (e.g., "gpt-4o")
    pub model: String,
    /// Role description
    pub description: String,
    /// Behavioral instructions, in order
    pub instructions: Vec<String>,
    /// Ask the model for markdown output
    pub markdown: bool,
    /// Include tool invocation records in the response
    pub show_tool_calls: bool,
    /// Append the current date/time to the instructions
    pub add_datetime_to_instructions: bool,
    /// Maximum number of model round trips
    pub max_iterations: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: crate::config::DEFAULT_MODEL.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            instructions: DEFAULT_INSTRUCTIONS.iter().map(|s| s.to_string()).collect(),
            markdown: true,
            show_tool_calls: true,
            add_datetime_to_instructions: true,
            max_iterations: 10,
        }
    }
}

impl AgentConfig {
    /// Create a new config with the specified model.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Research agent settings taken from the service configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.model.clone())
            .markdown(config.markdown)
            .show_tool_calls(config.show_tool_calls)
            .add_datetime_to_instructions(config.add_datetime)
            .max_iterations(config.max_iterations)
    }

    /// Set the role description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Replace the instruction list.
    pub fn instructions<I, S>(mut self, instructions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.instructions = instructions.into_iter().map(Into::into).collect();
        self
    }

    pub fn markdown(mut self, enabled: bool) -> Self {
        self.markdown = enabled;
        self
    }

    pub fn show_tool_calls(mut self, enabled: bool) -> Self {
        self.show_tool_calls = enabled;
        self
    }

    pub fn add_datetime_to_instructions(mut self, enabled: bool) -> Self {
        self.add_datetime_to_instructions = enabled;
        self
    }

    /// Set the maximum number of iterations.
    pub fn max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }
}
