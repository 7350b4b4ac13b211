//! LLM agent modules for repository exploration.
//!
//! This module provides the chat client, the GitHub tools and the
//! tool-calling loop that ties them together.

pub mod agent_loop;
pub mod llm;
pub mod prompts;
pub mod tools;

pub use agent_loop::{AgentConfig, AgentOutcome, RepoAgent};
pub use llm::{ChatBackend, OpenAiClient};
pub use tools::ToolRegistry;
