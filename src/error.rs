//! Error types shared across the service.
//!
//! Library-level failures are typed here; `main` wraps them in `anyhow`.

use thiserror::Error;

/// Configuration is missing or unusable.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting `{0}`")]
    Missing(&'static str),

    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Failure talking to the GitHub REST API.
#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("not found on GitHub: {0}")]
    NotFound(String),

    #[error("GitHub API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("'{0}' is not a file")]
    NotAFile(String),

    #[error("failed to decode file contents: {0}")]
    Decode(String),
}

/// Failure talking to the chat-completions API.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("cannot connect to model API at {0}")]
    Connect(String),

    #[error("failed to send request: {0}")]
    Request(#[source] reqwest::Error),

    #[error("model API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to parse model response: {0}")]
    Parse(String),

    #[error("model returned no choices")]
    EmptyResponse,
}

/// Failure executing a tool call. The message is shown to the model.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Missing required parameter: {0}")]
    MissingArgument(&'static str),

    #[error("Invalid parameter {name}: {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    GitHub(#[from] GitHubError),
}
