//! Agent loop for tool-based repository exploration.
//!
//! The model is given the GitHub tools and called repeatedly; each round
//! either requests tool calls (executed in order, results appended as
//! `tool` messages) or returns text, which ends the loop. When the loop
//! ends without a real answer, a second call condenses the collected
//! observations into one.

use crate::agent::llm::{ChatBackend, ChatMessage, ChatRequest, Role};
use crate::agent::prompts::{
    self, NO_ACTION_TEXT, PRUNED_OBSERVATION, STEP_LIMIT_TEXT, SUMMARY_SYSTEM_PROMPT,
};
use crate::agent::tools::ToolRegistry;
use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::models::HistoryMessage;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Configuration for the agent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub temperature: f32,
    pub max_iterations: usize,
    /// Max tool results kept verbatim in context (sliding window)
    pub max_context_messages: usize,
    pub summary_max_tokens: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::from(&LlmConfig::default())
    }
}

impl From<&LlmConfig> for AgentConfig {
    fn from(config: &LlmConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_iterations: config.max_iterations,
            max_context_messages: config.max_context_messages,
            summary_max_tokens: config.summary_max_tokens,
        }
    }
}

/// The result of one tool call, as seen by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub tool: String,
    pub output: String,
}

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    pub text: String,
    pub observations: Vec<Observation>,
    /// Model round-trips used.
    pub steps: usize,
}

impl AgentOutcome {
    /// Observations as `[tool] output` blocks.
    pub fn transcript(&self) -> String {
        self.observations
            .iter()
            .map(|o| format!("[{}] {}", o.tool, o.output))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Tool-calling agent for one question about one repository.
pub struct RepoAgent {
    config: AgentConfig,
    backend: Arc<dyn ChatBackend>,
    registry: Arc<ToolRegistry>,
    messages: Vec<ChatMessage>,
}

impl RepoAgent {
    pub fn new(
        config: AgentConfig,
        backend: Arc<dyn ChatBackend>,
        registry: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            config,
            backend,
            registry,
            messages: Vec::new(),
        }
    }

    /// Run the loop and post-process its text into an answer.
    pub async fn answer(
        &mut self,
        repo: &str,
        question: &str,
        history: &[HistoryMessage],
    ) -> Result<String, LlmError> {
        let outcome = self.run(repo, question, history).await?;
        debug!(
            "Agent used {} steps and {} tool calls",
            outcome.steps,
            outcome.observations.len()
        );

        if !prompts::needs_summary(&outcome.text) {
            return Ok(outcome.text);
        }

        info!("Agent ended without an answer; summarizing observations");
        self.summarize(question, &outcome).await
    }

    /// Run the tool-calling loop.
    pub async fn run(
        &mut self,
        repo: &str,
        question: &str,
        history: &[HistoryMessage],
    ) -> Result<AgentOutcome, LlmError> {
        info!("Starting agent for {} ({} history messages)", repo, history.len());

        self.messages.clear();
        self.messages.push(ChatMessage::system(prompts::system_prompt(repo)));
        for message in history {
            match message.role.as_str() {
                "user" => self.messages.push(ChatMessage::user(&message.content)),
                "assistant" => self.messages.push(ChatMessage::assistant(&message.content)),
                other => debug!("Skipping history message with role {}", other),
            }
        }
        self.messages.push(ChatMessage::user(question));

        let tools = self.registry.definitions();
        let mut observations = Vec::new();

        for step in 1..=self.config.max_iterations {
            debug!("Agent iteration {}", step);

            let request = ChatRequest {
                messages: self.messages.clone(),
                tools: tools.clone(),
                temperature: self.config.temperature,
                max_tokens: None,
            };
            let reply = self.backend.complete(&request).await?;

            let calls = reply.tool_calls().to_vec();
            let content = reply.content.clone();
            self.messages.push(reply.into_message());

            if calls.is_empty() {
                let text = content
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .unwrap_or_else(|| NO_ACTION_TEXT.to_string());
                info!("Agent finished after {} steps", step);
                return Ok(AgentOutcome {
                    text,
                    observations,
                    steps: step,
                });
            }

            for call in calls {
                let name = &call.function.name;
                let args = call.function.parsed_arguments();
                let result = self.registry.execute(name, &args).await;
                if !result.success {
                    warn!("Tool {} failed: {}", name, result.error.as_deref().unwrap_or(""));
                }

                let output = result.observation();
                self.messages.push(ChatMessage::tool(&call.id, output.clone()));
                observations.push(Observation {
                    tool: name.clone(),
                    output,
                });
                info!("Tool {} executed", name);
            }

            // Sliding window: prune old tool output to save context
            self.prune_old_observations();
        }

        warn!(
            "Agent hit the step limit ({} iterations)",
            self.config.max_iterations
        );
        let mut outcome = AgentOutcome {
            text: String::new(),
            observations,
            steps: self.config.max_iterations,
        };
        let transcript = outcome.transcript();
        outcome.text = if transcript.is_empty() {
            STEP_LIMIT_TEXT.to_string()
        } else {
            format!("{}\n\n{}", transcript, STEP_LIMIT_TEXT)
        };
        Ok(outcome)
    }

    /// Ask the model to turn collected observations into an answer.
    async fn summarize(&self, question: &str, outcome: &AgentOutcome) -> Result<String, LlmError> {
        let observations = if outcome.observations.is_empty() {
            outcome.text.clone()
        } else {
            outcome.transcript()
        };

        let request = ChatRequest {
            messages: vec![
                ChatMessage::system(SUMMARY_SYSTEM_PROMPT),
                ChatMessage::user(prompts::summary_prompt(question, &observations)),
            ],
            tools: Vec::new(),
            temperature: 0.0,
            max_tokens: Some(self.config.summary_max_tokens),
        };

        let reply = self.backend.complete(&request).await?;
        Ok(reply
            .content
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| outcome.text.clone()))
    }

    /// Replace the content of all but the newest tool observations. The
    /// messages themselves stay so every tool call keeps its reply.
    fn prune_old_observations(&mut self) {
        let keep = self.config.max_context_messages;
        let mut seen = 0;
        let mut pruned = 0;

        for message in self.messages.iter_mut().rev() {
            if message.role != Role::Tool {
                continue;
            }
            seen += 1;
            if seen > keep && message.content.as_deref() != Some(PRUNED_OBSERVATION) {
                message.content = Some(PRUNED_OBSERVATION.to_string());
                pruned += 1;
            }
        }

        if pruned > 0 {
            debug!("Pruned {} old tool observations to save context", pruned);
        }
    }
}
