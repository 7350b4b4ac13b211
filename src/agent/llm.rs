//! Chat-completions client for OpenAI-compatible APIs.
//!
//! The agent talks to the model through the [`ChatBackend`] trait so the
//! loop can run against any provider (or a scripted backend in tests).

use crate::agent::tools::ToolDefinition;
use crate::config::LlmConfig;
use crate::error::{ConfigError, LlmError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// Message in the chat history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallMessage>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(Role::Assistant, content)
    }

    /// The result of one tool call, linked back to the call by id.
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallMessage {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default = "function_type")]
    pub call_type: String,
    pub function: ToolCallFunction,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallFunction {
    pub name: String,
    /// JSON-encoded arguments, as sent by the API.
    #[serde(default)]
    pub arguments: String,
}

impl ToolCallFunction {
    /// Parse the arguments; malformed JSON yields an empty object so the
    /// tool can report the missing parameters itself.
    pub fn parsed_arguments(&self) -> Value {
        match serde_json::from_str::<Value>(&self.arguments) {
            Ok(value @ Value::Object(_)) => value,
            _ => Value::Object(Default::default()),
        }
    }
}

/// The assistant's reply to one request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCallMessage>>,
}

impl AssistantMessage {
    pub fn tool_calls(&self) -> &[ToolCallMessage] {
        self.tool_calls.as_deref().unwrap_or(&[])
    }

    /// Convert into the history entry that records this reply.
    pub fn into_message(self) -> ChatMessage {
        let tool_calls = self.tool_calls.filter(|calls| !calls.is_empty());
        ChatMessage {
            role: Role::Assistant,
            content: self.content,
            tool_calls,
            tool_call_id: None,
        }
    }
}

/// A provider-independent completion request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolDefinition>,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

/// Anything that can answer a chat request.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<AssistantMessage, LlmError>;
}

/// Wire format of `POST /chat/completions`.
#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "no_tools")]
    tools: &'a [ToolDefinition],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

fn no_tools(tools: &&[ToolDefinition]) -> bool {
    tools.is_empty()
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

/// Client for an OpenAI-compatible chat-completions endpoint.
pub struct OpenAiClient {
    http_client: reqwest::Client,
    api_base_url: String,
    api_key: String,
    model: String,
    timeout_seconds: u64,
}

impl OpenAiClient {
    /// Create a client; fails when the API key is missing.
    pub fn new(config: &LlmConfig) -> Result<Self, ConfigError> {
        let api_key = config.api_key()?.to_string();

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ConfigError::Invalid {
                field: "llm",
                reason: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http_client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            timeout_seconds: config.timeout_seconds,
        })
    }
}

#[async_trait]
impl ChatBackend for OpenAiClient {
    async fn complete(&self, request: &ChatRequest) -> Result<AssistantMessage, LlmError> {
        let url = format!("{}/chat/completions", self.api_base_url);

        let body = CompletionBody {
            model: &self.model,
            messages: &request.messages,
            tools: &request.tools,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        debug!(
            "Sending chat request with {} messages and {} tools",
            request.messages.len(),
            request.tools.len()
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(self.timeout_seconds)
                } else if e.is_connect() {
                    LlmError::Connect(self.api_base_url.clone())
                } else {
                    LlmError::Request(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or(LlmError::EmptyResponse)
    }
}
