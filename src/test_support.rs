//! Shared helpers for unit tests.

use crate::agent::llm::{
    AssistantMessage, ChatBackend, ChatRequest, ToolCallFunction, ToolCallMessage,
};
use crate::agent::tools::Tool;
use crate::error::{LlmError, ToolError};
use async_trait::async_trait;
use axum::Router;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Chat backend that replays canned replies and records every request.
/// Running out of replies yields `LlmError::EmptyResponse`.
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<AssistantMessage>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedBackend {
    pub fn new(replies: Vec<AssistantMessage>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn text(content: &str) -> AssistantMessage {
        AssistantMessage {
            content: Some(content.to_string()),
            tool_calls: None,
        }
    }

    pub fn tool_calls(calls: Vec<(&str, &str, Value)>) -> AssistantMessage {
        AssistantMessage {
            content: None,
            tool_calls: Some(
                calls
                    .into_iter()
                    .map(|(id, name, args)| ToolCallMessage {
                        id: id.to_string(),
                        call_type: "function".to_string(),
                        function: ToolCallFunction {
                            name: name.to_string(),
                            arguments: args.to_string(),
                        },
                    })
                    .collect(),
            ),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn complete(&self, request: &ChatRequest) -> Result<AssistantMessage, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(LlmError::EmptyResponse)
    }
}

/// Tool that answers `echo: <text>`.
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn description(&self) -> &'static str {
        "Echo the given text."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"text": {"type": "string"}},
            "required": ["text"]
        })
    }

    async fn execute(&self, args: &Value) -> Result<String, ToolError> {
        let text = args
            .get("text")
            .and_then(Value::as_str)
            .ok_or(ToolError::MissingArgument("text"))?;
        Ok(format!("echo: {}", text))
    }
}
