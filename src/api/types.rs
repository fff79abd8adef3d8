//! API request and response types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Form posted by the research page.
#[derive(Debug, Clone, Deserialize)]
pub struct TopicForm {
    #[serde(default)]
    pub topic: String,
}

/// Request to research a topic.
#[derive(Debug, Clone, Deserialize)]
pub struct ResearchRequest {
    /// Topic to research; falls back to the configured default when omitted
    pub topic: Option<String>,
}

/// Response after a successful run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchResponse {
    /// Unique run identifier, also present in the server logs
    pub run_id: Uuid,

    /// Topic that was researched
    pub topic: String,

    /// Sanitized agent output
    pub output: String,
}

/// Error body for failed runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}
