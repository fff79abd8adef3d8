//! Core agent loop implementation.

use std::sync::Arc;

use async_stream::try_stream;
use chrono::Local;
use futures::{Stream, StreamExt};
use serde_json::Value;

use crate::config::Config;
use crate::llm::{ChatMessage, LlmClient, OpenAiClient, ToolCallAccumulator};
use crate::tools::ToolRegistry;

use super::config::AgentConfig;
use super::events::RunResponse;
use super::prompt::build_system_prompt;
use super::{ResearchAgent, RunStream};

/// The research agent: a model plus its tools.
#[derive(Clone)]
pub struct Agent {
    config: Arc<AgentConfig>,
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
}

impl Agent {
    pub fn new(config: AgentConfig, llm: Arc<dyn LlmClient>, tools: ToolRegistry) -> Self {
        Self {
            config: Arc::new(config),
            llm,
            tools: Arc::new(tools),
        }
    }

    /// Build the research agent described by the service configuration.
    ///
    /// The API key is not checked here; a missing key fails the first run.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let llm = Arc::new(OpenAiClient::new(
            config.api_key.clone(),
            config.base_url.clone(),
        ));
        let tools = ToolRegistry::research_tools(&config.tools)?;
        Ok(Self::new(AgentConfig::from_config(config), llm, tools))
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }
}

impl ResearchAgent for Agent {
    fn run_stream(&self, topic: &str) -> RunStream {
        Box::pin(run_loop(
            Arc::clone(&self.config),
            Arc::clone(&self.llm),
            Arc::clone(&self.tools),
            topic.to_string(),
        ))
    }
}

/// Stream one run: call the model, execute requested tools, feed results
/// back, until the model answers without tool calls.
fn run_loop(
    config: Arc<AgentConfig>,
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
    topic: String,
) -> impl Stream<Item = anyhow::Result<RunResponse>> + Send {
    try_stream! {
        let now = config.add_datetime_to_instructions.then(Local::now);
        let system_prompt = build_system_prompt(&config, &tools, now);
        let mut messages = vec![ChatMessage::system(system_prompt), ChatMessage::user(topic)];
        let tool_schemas = tools.get_tool_schemas();

        for iteration in 0..config.max_iterations {
            tracing::debug!("Agent iteration {}", iteration + 1);

            let mut chunks = llm
                .chat_completion_stream(&config.model, &messages, Some(tool_schemas.as_slice()))
                .await?;

            let mut content = String::new();
            let mut accumulator = ToolCallAccumulator::default();
            while let Some(chunk) = chunks.next().await {
                let chunk = chunk?;
                for delta in &chunk.tool_calls {
                    accumulator.push(delta)?;
                }
                if let Some(text) = chunk.content {
                    content.push_str(&text);
                    yield RunResponse::content(text);
                }
            }

            let tool_calls = accumulator.finish();
            if tool_calls.is_empty() {
                tracing::debug!(iterations = iteration + 1, chars = content.len(), "Agent finished");
                return;
            }

            messages.push(ChatMessage::assistant_tool_calls(
                Some(content).filter(|c| !c.is_empty()),
                tool_calls.clone(),
            ));

            for call in &tool_calls {
                if config.show_tool_calls {
                    yield RunResponse::tool_call(&call.function.name, &call.function.arguments);
                }

                let args: Value = serde_json::from_str(&call.function.arguments).unwrap_or(Value::Null);
                let output = match tools.execute(&call.function.name, args).await {
                    Ok(output) => output,
                    Err(e) if !e.is_fatal() => {
                        tracing::debug!(tool = %call.function.name, error = %e, "Tool call rejected");
                        format!("Error: {}", e)
                    }
                    Err(e) => Err(e)?,
                };

                messages.push(ChatMessage::tool_result(call.id.clone(), output));
            }
        }

        Err::<(), _>(anyhow::anyhow!(
            "Max iterations ({}) reached without completion",
            config.max_iterations
        ))?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use futures::TryStreamExt;
    use serde_json::json;

    use crate::llm::{
        ChunkStream, FunctionCall, FunctionDelta, LlmError, Role, StreamChunk, ToolCall,
        ToolCallDelta, ToolDefinition,
    };
    use crate::tools::{Tool, ToolError};

    /// Replays scripted completions and records what it was sent.
    struct ScriptedLlm {
        replies: Mutex<VecDeque<Vec<StreamChunk>>>,
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedLlm {
        fn new(replies: Vec<Vec<StreamChunk>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn chat_completion_stream(
            &self,
            _model: &str,
            messages: &[ChatMessage],
            _tools: Option<&[ToolDefinition]>,
        ) -> Result<ChunkStream, LlmError> {
            self.seen.lock().unwrap().push(messages.to_vec());
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| LlmError::Provider("script exhausted".to_string()))?;
            Ok(Box::pin(futures::stream::iter(reply.into_iter().map(Ok::<_, LlmError>))))
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl LlmClient for FailingLlm {
        async fn chat_completion_stream(
            &self,
            _model: &str,
            _messages: &[ChatMessage],
            _tools: Option<&[ToolDefinition]>,
        ) -> Result<ChunkStream, LlmError> {
            Err(LlmError::MissingApiKey)
        }
    }

    struct FakeSearch;

    #[async_trait]
    impl Tool for FakeSearch {
        fn name(&self) -> &str {
            "web_search"
        }
        fn description(&self) -> &str {
            "fake search"
        }
        fn parameters_schema(&self) -> Value {
            json!({"type": "object"})
        }
        async fn execute(&self, args: Value) -> Result<String, ToolError> {
            Ok(format!("results for {}", args["query"].as_str().unwrap_or("?")))
        }
    }

    /// Fails like a dropped connection would.
    struct OfflineSearch;

    #[async_trait]
    impl Tool for OfflineSearch {
        fn name(&self) -> &str {
            "web_search"
        }
        fn description(&self) -> &str {
            "offline search"
        }
        fn parameters_schema(&self) -> Value {
            json!({"type": "object"})
        }
        async fn execute(&self, _args: Value) -> Result<String, ToolError> {
            let err = reqwest::Client::new()
                .get("not a url")
                .send()
                .await
                .unwrap_err();
            Err(ToolError::Transport(err))
        }
    }

    fn text(s: &str) -> StreamChunk {
        StreamChunk {
            content: Some(s.to_string()),
            ..StreamChunk::default()
        }
    }

    fn search_call(args: &str) -> StreamChunk {
        StreamChunk {
            tool_calls: vec![ToolCallDelta {
                index: 0,
                id: Some("call_1".to_string()),
                function: Some(FunctionDelta {
                    name: Some("web_search".to_string()),
                    arguments: Some(args.to_string()),
                }),
            }],
            finish_reason: Some("tool_calls".to_string()),
            ..StreamChunk::default()
        }
    }

    fn agent(llm: Arc<dyn LlmClient>, tool: Arc<dyn Tool>, config: AgentConfig) -> Agent {
        let mut tools = ToolRegistry::new();
        tools.register(tool);
        Agent::new(config, llm, tools)
    }

    #[tokio::test]
    async fn runs_tools_then_streams_answer() {
        let llm = ScriptedLlm::new(vec![
            vec![search_call(r#"{"query":"Oracle Group","max_results":5}"#)],
            vec![text("# Oracle"), text("\nCloud is growing.")],
        ]);
        let agent = agent(llm.clone(), Arc::new(FakeSearch), AgentConfig::default());

        let events: Vec<RunResponse> = agent.run_stream("Oracle Group").try_collect().await.unwrap();

        assert_eq!(
            events,
            vec![
                RunResponse::tool_call("web_search", r#"{"query":"Oracle Group","max_results":5}"#),
                RunResponse::content("# Oracle"),
                RunResponse::content("\nCloud is growing."),
            ]
        );

        let seen = llm.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0][0].role, Role::System);
        assert_eq!(seen[0][1].content.as_deref(), Some("Oracle Group"));
        let second = &seen[1];
        assert_eq!(
            second[2].tool_calls.as_deref(),
            Some(
                &[ToolCall {
                    id: "call_1".to_string(),
                    kind: "function".to_string(),
                    function: FunctionCall {
                        name: "web_search".to_string(),
                        arguments: r#"{"query":"Oracle Group","max_results":5}"#.to_string(),
                    },
                }][..]
            )
        );
        assert_eq!(second[3].content.as_deref(), Some("results for Oracle Group"));
    }

    #[tokio::test]
    async fn hides_tool_records_when_disabled() {
        let llm = ScriptedLlm::new(vec![vec![search_call("{}")], vec![text("done")]]);
        let config = AgentConfig::default().show_tool_calls(false);
        let agent = agent(llm, Arc::new(FakeSearch), config);

        let events: Vec<RunResponse> = agent.run_stream("x").try_collect().await.unwrap();
        assert_eq!(events, vec![RunResponse::content("done")]);
    }

    #[tokio::test]
    async fn unknown_tool_is_reported_to_the_model() {
        let llm = ScriptedLlm::new(vec![
            vec![StreamChunk {
                tool_calls: vec![ToolCallDelta {
                    index: 0,
                    id: Some("call_x".to_string()),
                    function: Some(FunctionDelta {
                        name: Some("delete_files".to_string()),
                        arguments: Some("{}".to_string()),
                    }),
                }],
                ..StreamChunk::default()
            }],
            vec![text("ok")],
        ]);
        let agent = agent(llm.clone(), Arc::new(FakeSearch), AgentConfig::default());

        let events: Vec<RunResponse> = agent.run_stream("x").try_collect().await.unwrap();
        assert_eq!(events.last(), Some(&RunResponse::content("ok")));
        let seen = llm.seen.lock().unwrap();
        assert_eq!(seen[1][3].content.as_deref(), Some("Error: Unknown tool: delete_files"));
    }

    #[tokio::test]
    async fn transport_failure_ends_the_run() {
        let llm = ScriptedLlm::new(vec![vec![search_call("{}")], vec![text("never")]]);
        let agent = agent(llm, Arc::new(OfflineSearch), AgentConfig::default());

        let result: anyhow::Result<Vec<RunResponse>> = agent.run_stream("x").try_collect().await;
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Network request failed"));
    }

    #[tokio::test]
    async fn runaway_tool_call_index_ends_the_run() {
        let llm = ScriptedLlm::new(vec![vec![StreamChunk {
            tool_calls: vec![ToolCallDelta {
                index: usize::MAX,
                id: Some("call_huge".to_string()),
                function: None,
            }],
            ..StreamChunk::default()
        }]]);
        let agent = agent(llm, Arc::new(FakeSearch), AgentConfig::default());

        let result: anyhow::Result<Vec<RunResponse>> = agent.run_stream("x").try_collect().await;
        assert!(result.unwrap_err().to_string().contains("exceeds limit"));
    }

    #[tokio::test]
    async fn model_errors_propagate() {
        let agent = agent(Arc::new(FailingLlm), Arc::new(FakeSearch), AgentConfig::default());
        let result: anyhow::Result<Vec<RunResponse>> = agent.run_stream("x").try_collect().await;
        assert!(result.unwrap_err().to_string().contains("OPENAI_API_KEY"));
    }

    #[tokio::test]
    async fn stops_after_max_iterations() {
        let llm = ScriptedLlm::new(vec![vec![search_call("{}")], vec![search_call("{}")]]);
        let config = AgentConfig::default().max_iterations(2);
        let agent = agent(llm, Arc::new(FakeSearch), config);

        let result: anyhow::Result<Vec<RunResponse>> = agent.run_stream("x").try_collect().await;
        assert!(result.unwrap_err().to_string().contains("Max iterations (2)"));
    }
}
