//! OpenAI-compatible chat completions client with streaming.

use async_trait::async_trait;
use bytes::Bytes;
use eventsource_stream::{EventStreamError, Eventsource};
use futures::{future, Stream, StreamExt};
use serde::{Deserialize, Serialize};

use super::{
    ChatMessage, ChunkStream, LlmClient, LlmError, StreamChunk, ToolCallDelta, ToolDefinition,
};

/// Client for `POST {base_url}/chat/completions`.
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url: base_url.into(),
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDefinition]>,
    stream: bool,
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn chat_completion_stream(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<ChunkStream, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;

        let request = ChatCompletionRequest {
            model,
            messages,
            tools: tools.filter(|t| !t.is_empty()),
            stream: true,
        };

        // No request timeout: reqwest would apply it to the whole streamed body.
        let response = self
            .http
            .post(self.completions_url())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        tracing::debug!(model = %model, messages = messages.len(), "Streaming chat completion");

        Ok(Box::pin(completion_chunks(response.bytes_stream())))
    }
}

/// Decode the SSE body of a streamed completion, ending at `data: [DONE]`.
fn completion_chunks<S>(body: S) -> impl Stream<Item = Result<StreamChunk, LlmError>> + Send
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
{
    body.eventsource()
        .take_while(|event| future::ready(!matches!(event, Ok(e) if e.data.trim() == "[DONE]")))
        .filter(|event| future::ready(!matches!(event, Ok(e) if e.data.trim().is_empty())))
        .map(|event| match event {
            Ok(event) => parse_chunk(&event.data),
            Err(EventStreamError::Transport(e)) => Err(LlmError::Transport(e)),
            Err(e) => Err(LlmError::Malformed(e.to_string())),
        })
}

#[derive(Deserialize)]
struct ChunkPayload {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCallDelta>>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Decode one `data:` payload of the completion stream.
fn parse_chunk(payload: &str) -> Result<StreamChunk, LlmError> {
    let parsed: ChunkPayload = serde_json::from_str(payload)
        .map_err(|e| LlmError::Malformed(format!("{}: {}", e, truncate(payload, 200))))?;

    if let Some(error) = parsed.error {
        return Err(LlmError::Provider(error.message));
    }

    let mut chunk = StreamChunk::default();
    if let Some(choice) = parsed.choices.into_iter().next() {
        chunk.content = choice.delta.content.filter(|c| !c.is_empty());
        chunk.tool_calls = choice.delta.tool_calls.unwrap_or_default();
        chunk.finish_reason = choice.finish_reason;
    }
    Ok(chunk)
}

/// Pull the human-readable message out of an error response body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| truncate(body.trim(), 500))
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(parts: &[&str]) -> impl Stream<Item = Result<Bytes, reqwest::Error>> + Send {
        let owned: Vec<Result<Bytes, reqwest::Error>> = parts
            .iter()
            .map(|p| Ok(Bytes::from(p.to_string())))
            .collect();
        futures::stream::iter(owned)
    }

    async fn contents(parts: &[&str]) -> Vec<Option<String>> {
        completion_chunks(body(parts))
            .map(|chunk| chunk.unwrap().content)
            .collect()
            .await
    }

    #[tokio::test]
    async fn multi_line_event_is_one_payload() {
        let chunks = contents(&[
            "data: {\"choices\":[{\"delta\":\n",
            "data: {\"content\":\"Hi\"}}]}\n\n",
        ])
        .await;
        assert_eq!(chunks, vec![Some("Hi".to_string())]);
    }

    #[tokio::test]
    async fn events_survive_split_chunks_and_comments() {
        let chunks = contents(&[
            ": keep-alive\n\ndata: {\"choices\":[{\"delta\":{\"cont",
            "ent\":\"Hel\"}}]}\r\n\r\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
        ])
        .await;
        assert_eq!(chunks, vec![Some("Hel".to_string()), Some("lo".to_string())]);
    }

    #[tokio::test]
    async fn done_marker_ends_the_stream() {
        let chunks = contents(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"one\"}}]}\n\n",
            "data: [DONE]\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"two\"}}]}\n\n",
        ])
        .await;
        assert_eq!(chunks, vec![Some("one".to_string())]);
    }

    #[tokio::test]
    async fn undecodable_event_is_malformed() {
        let results: Vec<Result<StreamChunk, LlmError>> =
            completion_chunks(body(&["data: {oops\n\n"])).collect().await;
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(LlmError::Malformed(_))));
    }

    #[test]
    fn parses_content_delta() {
        let chunk = parse_chunk(
            r#"{"id":"c1","choices":[{"index":0,"delta":{"role":"assistant","content":"Hel"},"finish_reason":null}]}"#,
        )
        .unwrap();
        assert_eq!(chunk.content.as_deref(), Some("Hel"));
        assert!(chunk.tool_calls.is_empty());
        assert!(chunk.finish_reason.is_none());
    }

    #[test]
    fn parses_tool_call_delta() {
        let chunk = parse_chunk(
            r#"{"choices":[{"delta":{"content":null,"tool_calls":[{"index":0,"id":"call_1","type":"function","function":{"name":"web_search","arguments":""}}]},"finish_reason":null}]}"#,
        )
        .unwrap();
        assert!(chunk.content.is_none());
        assert_eq!(chunk.tool_calls.len(), 1);
        assert_eq!(chunk.tool_calls[0].id.as_deref(), Some("call_1"));
    }

    #[test]
    fn usage_chunk_without_choices_is_empty() {
        let chunk = parse_chunk(r#"{"choices":[],"usage":{"total_tokens":12}}"#).unwrap();
        assert!(chunk.content.is_none());
        assert!(chunk.finish_reason.is_none());
    }

    #[test]
    fn in_stream_error_is_reported() {
        let err = parse_chunk(r#"{"error":{"message":"overloaded"}}"#).unwrap_err();
        assert!(matches!(err, LlmError::Provider(m) if m == "overloaded"));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(parse_chunk("not json"), Err(LlmError::Malformed(_))));
    }

    #[test]
    fn error_message_prefers_api_message() {
        assert_eq!(
            error_message(r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#),
            "Incorrect API key provided"
        );
        assert_eq!(error_message("  Bad Gateway  "), "Bad Gateway");
    }

    #[tokio::test]
    async fn missing_key_fails_on_first_call() {
        let client = OpenAiClient::new(None, "http://127.0.0.1:9");
        let result = client
            .chat_completion_stream("gpt-4o", &[ChatMessage::user("hi")], None)
            .await;
        assert!(matches!(result, Err(LlmError::MissingApiKey)));
    }

    #[test]
    fn completions_url_trims_trailing_slash() {
        let client = OpenAiClient::new(None, "https://api.openai.com/v1/");
        assert_eq!(client.completions_url(), "https://api.openai.com/v1/chat/completions");
    }
}
