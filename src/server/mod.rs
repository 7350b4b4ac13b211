//! HTTP API.
//!
//! `POST /api/ask_repo` runs a fresh agent per request; the model client
//! and tool registry are built once at startup and shared read-only.

pub mod error;
pub mod handlers;
pub mod routes;

pub use routes::create_router;

use crate::agent::{AgentConfig, ChatBackend, OpenAiClient, RepoAgent, ToolRegistry};
use crate::config::Config;
use crate::error::ConfigError;
use crate::github::GitHubClient;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// Immutable parts shared by every request.
pub struct AppState {
    pub agent_config: AgentConfig,
    pub backend: Arc<dyn ChatBackend>,
    pub registry: Arc<ToolRegistry>,
}

impl AppState {
    pub fn new(
        agent_config: AgentConfig,
        backend: Arc<dyn ChatBackend>,
        registry: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            agent_config,
            backend,
            registry,
        }
    }

    /// Build the model client and GitHub tools from validated settings.
    pub fn from_config(config: &Config) -> std::result::Result<Self, ConfigError> {
        let backend = OpenAiClient::new(&config.llm)?;
        let github = GitHubClient::new(&config.github)?;
        let registry = ToolRegistry::github(github, &config.github, &config.tree);

        info!(
            "Using model {} with {} tools",
            config.llm.model,
            registry.len()
        );

        Ok(Self::new(
            AgentConfig::from(&config.llm),
            Arc::new(backend),
            Arc::new(registry),
        ))
    }

    pub fn new_agent(&self) -> RepoAgent {
        RepoAgent::new(
            self.agent_config.clone(),
            self.backend.clone(),
            self.registry.clone(),
        )
    }
}

/// Bind and serve until Ctrl+C.
pub async fn serve(config: &Config) -> Result<()> {
    let state = Arc::new(AppState::from_config(config).context("Failed to initialize agent")?);

    if config.server.cors_origins.is_empty() {
        info!("No CORS origins configured; cross-origin requests are refused");
    } else {
        info!("CORS origins: {}", config.server.cors_origins.join(", "));
    }
    let app = create_router(state, &config.server.cors_origins);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Binding to: {}", bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    info!("Ready to accept requests on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down"),
        Err(e) => {
            warn!("Cannot listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::llm::AssistantMessage;
    use crate::test_support::{spawn_stub, EchoTool, ScriptedBackend};
    use reqwest::StatusCode;
    use serde_json::{json, Value};

    async fn spawn_app(replies: Vec<AssistantMessage>, cors_origins: &[String]) -> String {
        let state = AppState::new(
            AgentConfig::default(),
            Arc::new(ScriptedBackend::new(replies)),
            Arc::new(ToolRegistry::new(vec![Arc::new(EchoTool)])),
        );
        spawn_stub(create_router(Arc::new(state), cors_origins)).await
    }

    async fn ask(base: &str, body: Value) -> (StatusCode, Value) {
        let response = reqwest::Client::new()
            .post(format!("{}/api/ask_repo", base))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = response.status();
        (status, response.json().await.unwrap())
    }

    #[tokio::test]
    async fn test_healthz() {
        let base = spawn_app(Vec::new(), &[]).await;
        let response = reqwest::get(format!("{}/healthz", base)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({"status": "ok", "message": "Service is running"}));
    }

    #[tokio::test]
    async fn test_ask_repo_answers() {
        let base = spawn_app(
            vec![
                ScriptedBackend::tool_calls(vec![("c1", "echo", json!({"text": "tree"}))]),
                ScriptedBackend::text("Auth lives in lib/auth.ts."),
            ],
            &[],
        )
        .await;

        let (status, body) = ask(
            &base,
            json!({
                "user_prompt": "Where is auth?",
                "repo_name": "octo/hello",
                "chat_history": [{"role": "user", "content": "hi"}]
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "user_prompt": "Where is auth?",
                "agent_response": "Auth lives in lib/auth.ts."
            })
        );
    }

    #[tokio::test]
    async fn test_ask_repo_summarizes_marker_text() {
        let base = spawn_app(
            vec![
                ScriptedBackend::text("Thinking completed."),
                ScriptedBackend::text("Summarized answer"),
            ],
            &[],
        )
        .await;

        let (status, body) = ask(
            &base,
            json!({"user_prompt": "What is this?", "repo_name": "octo/hello"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["agent_response"], "Summarized answer");
    }

    #[tokio::test]
    async fn test_ask_repo_validation() {
        let base = spawn_app(Vec::new(), &[]).await;

        let (status, body) = ask(
            &base,
            json!({"user_prompt": "   ", "repo_name": "octo/hello"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, body) = ask(
            &base,
            json!({"user_prompt": "Hi", "repo_name": "not a repo"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("owner/name"));

        let (status, body) = ask(&base, json!({"repo_name": "octo/hello"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_ask_repo_agent_failure() {
        // No scripted replies: the first model call fails.
        let base = spawn_app(Vec::new(), &[]).await;

        let (status, body) = ask(
            &base,
            json!({"user_prompt": "Hi", "repo_name": "octo/hello"}),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("An error occurred during agent execution: "));
    }

    #[tokio::test]
    async fn test_cors_allowed_origins() {
        let origins = vec!["https://app.example.com".to_string()];
        let base = spawn_app(Vec::new(), &origins).await;
        let client = reqwest::Client::new();

        let allowed = client
            .get(format!("{}/healthz", base))
            .header("Origin", "https://app.example.com")
            .send()
            .await
            .unwrap();
        assert_eq!(
            allowed
                .headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("https://app.example.com")
        );

        let refused = client
            .get(format!("{}/healthz", base))
            .header("Origin", "https://evil.example.com")
            .send()
            .await
            .unwrap();
        assert!(refused
            .headers()
            .get("access-control-allow-origin")
            .is_none());
    }

    #[tokio::test]
    async fn test_no_cors_headers_without_origins() {
        let base = spawn_app(Vec::new(), &[]).await;
        let response = reqwest::Client::new()
            .get(format!("{}/healthz", base))
            .header("Origin", "https://app.example.com")
            .send()
            .await
            .unwrap();
        assert!(response
            .headers()
            .get("access-control-allow-origin")
            .is_none());
    }
}
