//! Request and response bodies of the HTTP API.

use serde::{Deserialize, Serialize};

/// One earlier turn of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMessage {
    /// `user` or `assistant`; anything else is ignored by the agent.
    pub role: String,
    pub content: String,
}

/// Body of `POST /api/ask_repo`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentQuery {
    pub user_prompt: String,
    /// Repository in `owner/name` form.
    pub repo_name: String,
    #[serde(default)]
    pub chat_history: Vec<HistoryMessage>,
}

/// Successful answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentReply {
    pub user_prompt: String,
    pub agent_response: String,
}

/// Body of `GET /healthz`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub message: String,
}

impl HealthStatus {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            message: "Service is running".to_string(),
        }
    }
}

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_history_defaults_to_empty() {
        let query: AgentQuery =
            serde_json::from_str(r#"{"user_prompt": "Where is auth?", "repo_name": "octo/hello"}"#)
                .unwrap();
        assert!(query.chat_history.is_empty());
    }

    #[test]
    fn test_query_with_history() {
        let query: AgentQuery = serde_json::from_str(
            r#"{
                "user_prompt": "And the tests?",
                "repo_name": "octo/hello",
                "chat_history": [
                    {"role": "user", "content": "Where is auth?"},
                    {"role": "assistant", "content": "In lib/auth.ts"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(query.chat_history.len(), 2);
        assert_eq!(query.chat_history[1].role, "assistant");
    }

    #[test]
    fn test_health_status_body() {
        let value = serde_json::to_value(HealthStatus::ok()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"status": "ok", "message": "Service is running"})
        );
    }
}
