//! Configuration management for the researcher agent.
//!
//! Configuration can be set via environment variables (a `.env` file in the
//! working directory is loaded first):
//! - `OPENAI_API_KEY` - API key for the model provider. Not checked at startup;
//!   a missing key surfaces on the first model call.
//! - `OPENAI_BASE_URL` - Optional. OpenAI-compatible API base. Defaults to `https://api.openai.com/v1`.
//! - `RESEARCH_MODEL` - Optional. Model identifier. Defaults to `gpt-4o`.
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `8501`.
//! - `DEFAULT_TOPIC` - Optional. Topic pre-filled in the UI. Defaults to `Oracle Group`.
//! - `MAX_ITERATIONS` - Optional. Maximum agent loop iterations. Defaults to `10`.
//! - `SEARCH_MAX_RESULTS` - Optional. Default number of search results. Defaults to `5`.
//! - `ARTICLE_MAX_CHARS` - Optional. Article text limit. Defaults to `20000`.
//! - `TOOL_TIMEOUT_SECS` - Optional. Per-request timeout for tool HTTP calls. Defaults to `30`.
//! - `SHOW_TOOL_CALLS`, `MARKDOWN`, `ADD_DATETIME` - Optional boolean flags. Default to `true`.

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TOPIC: &str = "Oracle Group";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Settings for the two research tools.
#[derive(Debug, Clone)]
pub struct ToolsConfig {
    /// Results returned by `web_search` when the model doesn't ask for a count
    pub search_max_results: usize,

    /// Article text is cut after this many characters
    pub article_max_chars: usize,

    /// Per-request timeout of the tool HTTP client
    pub timeout: Duration,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            search_max_results: 5,
            article_max_chars: 20_000,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Model provider API key
    pub api_key: Option<String>,

    /// OpenAI-compatible API base URL
    pub base_url: String,

    /// Model identifier used by the research agent
    pub model: String,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Topic shown in the input field before the user edits it
    pub default_topic: String,

    /// Maximum iterations for the agent loop
    pub max_iterations: usize,

    /// Include tool invocation records in the response
    pub show_tool_calls: bool,

    /// Ask for markdown output and render headings as panels
    pub markdown: bool,

    /// Append the current date/time to the instructions
    pub add_datetime: bool,

    /// Tool settings
    pub tools: ToolsConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a numeric or boolean variable
    /// can't be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        let base_url =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let model = std::env::var("RESEARCH_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = env_parse("PORT", 8501)?;

        let default_topic =
            std::env::var("DEFAULT_TOPIC").unwrap_or_else(|_| DEFAULT_TOPIC.to_string());

        let max_iterations = env_parse("MAX_ITERATIONS", 10)?;

        let tools = ToolsConfig {
            search_max_results: env_parse("SEARCH_MAX_RESULTS", 5)?,
            article_max_chars: env_parse("ARTICLE_MAX_CHARS", 20_000)?,
            timeout: Duration::from_secs(env_parse("TOOL_TIMEOUT_SECS", 30)?),
        };

        Ok(Self {
            api_key,
            base_url,
            model,
            host,
            port,
            default_topic,
            max_iterations,
            show_tool_calls: env_flag("SHOW_TOOL_CALLS", true)?,
            markdown: env_flag("MARKDOWN", true)?,
            add_datetime: env_flag("ADD_DATETIME", true)?,
            tools,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: Option<String>, model: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model,
            host: "127.0.0.1".to_string(),
            port: 8501,
            default_topic: DEFAULT_TOPIC.to_string(),
            max_iterations: 10,
            show_tool_calls: true,
            markdown: true,
            add_datetime: true,
            tools: ToolsConfig::default(),
        }
    }

    /// Address the HTTP server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_parse<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(v) => v
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

fn env_flag(name: &str, default: bool) -> Result<bool, ConfigError> {
    std::env::var(name)
        .ok()
        .map(|v| parse_bool(&v).map_err(|e| ConfigError::InvalidValue(name.to_string(), e)))
        .transpose()
        .map(|v| v.unwrap_or(default))
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
        other => Err(format!("expected boolean-like value, got: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bool_accepts_common_spellings() {
        assert_eq!(parse_bool("Yes"), Ok(true));
        assert_eq!(parse_bool(" off "), Ok(false));
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn new_config_uses_research_defaults() {
        let config = Config::new(None, DEFAULT_MODEL.to_string());
        assert_eq!(config.default_topic, "Oracle Group");
        assert_eq!(config.bind_addr(), "127.0.0.1:8501");
        assert!(config.show_tool_calls && config.markdown && config.add_datetime);
        assert_eq!(config.tools.search_max_results, 5);
    }

    #[test]
    fn env_parse_reports_variable_name() {
        std::env::set_var("RESEARCHER_TEST_BAD_NUMBER", "lots");
        let err = env_parse::<usize>("RESEARCHER_TEST_BAD_NUMBER", 1).unwrap_err();
        assert!(err.to_string().contains("RESEARCHER_TEST_BAD_NUMBER"));
        std::env::remove_var("RESEARCHER_TEST_BAD_NUMBER");
    }

    #[test]
    fn env_parse_falls_back_to_default() {
        assert_eq!(env_parse::<u16>("RESEARCHER_TEST_UNSET_PORT", 42).unwrap(), 42);
    }
}
