use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::sync::Arc;
use tracing::{error, info};

use crate::github::RepoRef;
use crate::models::{AgentQuery, AgentReply, HealthStatus};
use crate::server::error::{ApiError, ApiResult};
use crate::server::AppState;

/// Run the agent on one question about one repository.
pub async fn ask_repo(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AgentQuery>, JsonRejection>,
) -> ApiResult<Json<AgentReply>> {
    let Json(query) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let question = query.user_prompt.trim();
    if question.is_empty() {
        return Err(ApiError::BadRequest(
            "user_prompt must not be empty".to_string(),
        ));
    }
    let repo = RepoRef::parse(&query.repo_name).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "repo_name must look like 'owner/name', got '{}'",
            query.repo_name
        ))
    })?;

    info!("Question about {}: {}", repo, question);

    let mut agent = state.new_agent();
    let answer = agent
        .answer(&repo.to_string(), question, &query.chat_history)
        .await
        .map_err(|e| {
            error!("Agent failed for {}: {}", repo, e);
            ApiError::from(e)
        })?;

    Ok(Json(AgentReply {
        user_prompt: query.user_prompt,
        agent_response: answer,
    }))
}

pub async fn healthz() -> Json<HealthStatus> {
    Json(HealthStatus::ok())
}
