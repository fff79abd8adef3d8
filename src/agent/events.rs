/// One fragment of a streamed agent run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunResponse {
    /// Text content being streamed.
    Content { content: String },
    /// Agent is calling a tool. Only produced when tool calls are shown.
    ToolCall { name: String, arguments: String },
}

impl RunResponse {
    pub fn content(text: impl Into<String>) -> Self {
        RunResponse::Content {
            content: text.into(),
        }
    }

    pub fn tool_call(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        RunResponse::ToolCall {
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}
