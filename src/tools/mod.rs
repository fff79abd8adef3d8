//! Research tools exposed to the agent: web search and article reading.

mod article;
mod web;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::config::ToolsConfig;
use crate::llm::ToolDefinition;

pub use article::ReadArticle;
pub use web::WebSearch;

/// Tool failures.
///
/// Argument mistakes and unknown tools are reported back to the model as tool
/// output. Transport failures abort the run.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Network request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ToolError {
    /// Whether the error should end the agent run instead of going back to the model.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ToolError::Transport(_))
    }
}

/// A capability the agent can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the arguments object.
    fn parameters_schema(&self) -> Value;

    async fn execute(&self, args: Value) -> Result<String, ToolError>;
}

/// Name and description of a registered tool.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

/// The set of tools available to an agent.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl ToolRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding exactly the two research tools.
    pub fn research_tools(config: &ToolsConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (compatible; ResearcherAgent/0.1)")
            .timeout(config.timeout)
            .build()?;

        let mut registry = Self::new();
        registry.register(Arc::new(WebSearch::new(http.clone(), config.search_max_results)));
        registry.register(Arc::new(ReadArticle::new(http, config.article_max_chars)));
        Ok(registry)
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_none() {
            self.order.push(name);
        }
    }

    /// Tools in registration order.
    pub fn list_tools(&self) -> Vec<ToolInfo> {
        self.ordered()
            .map(|t| ToolInfo {
                name: t.name().to_string(),
                description: t.description().to_string(),
            })
            .collect()
    }

    /// Function definitions to send to the model.
    pub fn get_tool_schemas(&self) -> Vec<ToolDefinition> {
        self.ordered()
            .map(|t| ToolDefinition::function(t.name(), t.description(), t.parameters_schema()))
            .collect()
    }

    pub async fn execute(&self, name: &str, args: Value) -> Result<String, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tool.execute(args).await
    }

    fn ordered(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.order.iter().filter_map(|n| self.tools.get(n))
    }
}

/// Read a required string argument.
fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    args[key]
        .as_str()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ToolError::InvalidArguments(format!("Missing '{}' argument", key)))
}

/// Remove tags from an HTML fragment, decode entities and collapse whitespace.
fn strip_tags(fragment: &str) -> String {
    use regex::Regex;
    use std::sync::LazyLock;

    static BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)</?(?:p|div|br|li|ul|ol|h[1-6]|tr|td|section|article|blockquote)\b[^>]*>")
            .unwrap()
    });
    static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

    let text = BLOCK_RE.replace_all(fragment, " ");
    let text = TAG_RE.replace_all(&text, "");
    html_decode(&text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Basic HTML entity decoding.
fn html_decode(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
}
