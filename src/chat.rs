//! Interactive terminal chat about one repository.
//!
//! Uses the same agent as the HTTP API; the conversation history lives in
//! memory for the length of the session.

use crate::error::LlmError;
use crate::github::RepoRef;
use crate::models::HistoryMessage;
use crate::server::AppState;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error};

/// Whether the input ends the session.
pub fn is_exit(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "exit" | "quit")
}

pub struct ChatSession {
    state: AppState,
    repo: RepoRef,
    history: Vec<HistoryMessage>,
    show_spinner: bool,
}

impl ChatSession {
    pub fn new(state: AppState, repo: RepoRef, show_spinner: bool) -> Self {
        Self {
            state,
            repo,
            history: Vec::new(),
            show_spinner,
        }
    }

    pub fn history(&self) -> &[HistoryMessage] {
        &self.history
    }

    /// Answer one question. Only successful exchanges join the history.
    pub async fn ask(&mut self, question: &str) -> Result<String, LlmError> {
        let spinner = self.show_spinner.then(spinner);

        let mut agent = self.state.new_agent();
        let result = agent
            .answer(&self.repo.to_string(), question, &self.history)
            .await;

        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        let answer = result?;
        self.history.push(HistoryMessage {
            role: "user".to_string(),
            content: question.to_string(),
        });
        self.history.push(HistoryMessage {
            role: "assistant".to_string(),
            content: answer.clone(),
        });
        debug!("History now holds {} messages", self.history.len());

        Ok(answer)
    }

    /// Read questions from stdin until `exit`, `quit` or end of input.
    pub async fn run(mut self) -> Result<()> {
        println!("🤖 RepoScout: exploring {}", self.repo);
        println!("Try: \"Explain how this project handles authentication\"\n");
        println!("Type 'exit' to quit.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            print!("\nYou: ");
            std::io::stdout().flush().context("Failed to flush stdout")?;

            let Some(line) = lines.next_line().await.context("Failed to read input")? else {
                break;
            };
            let question = line.trim();
            if question.is_empty() {
                continue;
            }
            if is_exit(question) {
                break;
            }

            match self.ask(question).await {
                Ok(answer) => println!("\nAI: {}", answer),
                Err(e) => {
                    error!("Agent failed: {}", e);
                    println!("\n⚠️ Error: {}", e);
                }
            }
        }

        println!("Goodbye! 👋");
        Ok(())
    }
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message("Exploring the repository...");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
