//! LLM client: chat message types and the streaming completion interface.

mod openai;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use openai::OpenAiClient;

/// Errors raised by the model provider client.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("OPENAI_API_KEY is not set; add it to the environment or .env file")]
    MissingApiKey,

    #[error("Request to model provider failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Model provider returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Model provider reported an error mid-stream: {0}")]
    Provider(String),

    #[error("Malformed stream chunk: {0}")]
    Malformed(String),
}

/// Message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One chat message in OpenAI wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    pub fn assistant_tool_calls(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content,
            tool_calls: Some(tool_calls),
            tool_call_id: None,
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

/// A complete tool call requested by the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_type")]
    pub kind: String,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded arguments, exactly as produced by the model.
    pub arguments: String,
}

fn function_type() -> String {
    "function".to_string()
}

/// Function tool advertised to the model.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDefinition {
    pub fn function(name: &str, description: &str, parameters: Value) -> Self {
        Self {
            kind: "function",
            function: FunctionDefinition {
                name: name.to_string(),
                description: description.to_string(),
                parameters,
            },
        }
    }
}

/// Incremental piece of a tool call, keyed by its position in the response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolCallDelta {
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub function: Option<FunctionDelta>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FunctionDelta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<String>,
}

/// One decoded chunk of a streamed completion.
#[derive(Debug, Clone, Default)]
pub struct StreamChunk {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCallDelta>,
    pub finish_reason: Option<String>,
}

/// Stream of completion chunks, in generation order.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, LlmError>> + Send>>;

/// A chat model that streams its completions.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Start a streamed chat completion.
    async fn chat_completion_stream(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<ChunkStream, LlmError>;
}

/// Highest number of parallel tool calls accepted in one response.
pub const MAX_TOOL_CALLS: usize = 64;

/// Assembles complete tool calls out of streamed deltas.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    calls: Vec<ToolCall>,
}

impl ToolCallAccumulator {
    /// Merge one delta. Indexes at or past [`MAX_TOOL_CALLS`] are rejected.
    pub fn push(&mut self, delta: &ToolCallDelta) -> Result<(), LlmError> {
        if delta.index >= MAX_TOOL_CALLS {
            return Err(LlmError::Malformed(format!(
                "tool call index {} exceeds limit of {}",
                delta.index, MAX_TOOL_CALLS
            )));
        }
        while self.calls.len() <= delta.index {
            self.calls.push(ToolCall {
                kind: function_type(),
                ..ToolCall::default()
            });
        }
        let call = &mut self.calls[delta.index];

        if let Some(id) = delta.id.as_deref().filter(|id| !id.is_empty()) {
            call.id = id.to_string();
        }
        if let Some(function) = &delta.function {
            if let Some(name) = function.name.as_deref() {
                if call.function.name.is_empty() {
                    call.function.name = name.to_string();
                }
            }
            if let Some(arguments) = function.arguments.as_deref() {
                call.function.arguments.push_str(arguments);
            }
        }
        Ok(())
    }

    /// Finished calls; slots that never received a function name are dropped.
    pub fn finish(self) -> Vec<ToolCall> {
        self.calls
            .into_iter()
            .enumerate()
            .filter(|(_, c)| !c.function.name.is_empty())
            .map(|(i, mut c)| {
                if c.id.is_empty() {
                    c.id = format!("call_{}", i);
                }
                c
            })
            .collect()
    }
}
