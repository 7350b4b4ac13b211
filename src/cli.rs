//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation. Most settings can also come from the
//! environment or `.reposcout.toml`; flags win over both.

use clap::Parser;
use std::path::PathBuf;

/// RepoScout - ask questions about any GitHub repository
///
/// Runs an HTTP service where an LLM agent explores a repository through
/// the GitHub API (metadata, directory trees, file contents, code search)
/// and answers questions about it.
///
/// Examples:
///   reposcout
///   reposcout --port 9000 --cors-origins https://app.example.com
///   reposcout --chat --repo calcom/cal.com
///   reposcout --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Address to bind the HTTP server to
    #[arg(long, value_name = "HOST", env = "REPOSCOUT_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, value_name = "PORT", env = "REPOSCOUT_PORT")]
    pub port: Option<u16>,

    /// Origins allowed to call the API from a browser (comma-separated)
    #[arg(
        long,
        value_name = "ORIGINS",
        value_delimiter = ',',
        env = "ALLOWED_CORS_ORIGINS"
    )]
    pub cors_origins: Option<Vec<String>>,

    /// Chat model to use; it must support tool calling
    #[arg(short, long, env = "OPENAI_MODEL_NAME")]
    pub model: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, value_name = "URL", env = "OPENAI_API_BASE_URL")]
    pub openai_base_url: Option<String>,

    /// API key for the model provider
    #[arg(long, value_name = "KEY", env = "OPENAI_KEY", hide_env_values = true)]
    pub openai_key: Option<String>,

    /// GitHub personal access token
    #[arg(long, value_name = "TOKEN", env = "GITHUB_API_KEY", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Branch the tools read when the model does not name one
    #[arg(short, long, value_name = "BRANCH")]
    pub branch: Option<String>,

    /// Temperature for the tool-calling loop (0.0 - 2.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Model request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Maximum model round-trips per question
    #[arg(long, value_name = "COUNT")]
    pub max_iterations: Option<usize>,

    /// Cap children per directory in tree listings instead of a global line cap
    #[arg(long, value_name = "COUNT")]
    pub max_children_per_dir: Option<usize>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .reposcout.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Start an interactive terminal session instead of the HTTP server
    #[arg(long, requires = "repo")]
    pub chat: bool,

    /// Repository explored in chat mode (owner/name or GitHub URL)
    #[arg(short, long, value_name = "REPO")]
    pub repo: Option<String>,

    /// Generate a default .reposcout.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 2.0".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if self.max_iterations == Some(0) {
            return Err("Max iterations must be at least 1".to_string());
        }

        if let Some(ref url) = self.openai_base_url {
            if !url.is_empty() && !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Model API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.chat {
            let repo = self.repo.as_deref().unwrap_or("");
            if crate::github::RepoRef::parse(repo).is_none() {
                return Err(format!(
                    "Repository must look like 'owner/name' or a GitHub URL, got '{}'",
                    repo
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::{CommandFactory, FromArgMatches};

    /// Parse with every env fallback switched off, so the caller's shell
    /// cannot change the result.
    fn parse(argv: &[&str]) -> Result<Args, clap::Error> {
        let command = Args::command().mut_args(|arg| arg.env(None::<&'static str>));
        let matches = command.try_get_matches_from(argv)?;
        Args::from_arg_matches(&matches)
    }

    fn make_args() -> Args {
        parse(&["reposcout"]).unwrap()
    }

    #[test]
    fn test_defaults_without_flags() {
        let args = make_args();
        assert!(args.port.is_none());
        assert!(args.cors_origins.is_none());
        assert!(args.openai_key.is_none());
        assert!(args.openai_base_url.is_none());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_parse_flags() {
        let args = parse(&[
            "reposcout",
            "--port",
            "9000",
            "--cors-origins",
            "https://a.example,https://b.example",
            "--chat",
            "--repo",
            "rust-lang/rust",
        ])
        .unwrap();
        assert_eq!(args.port, Some(9000));
        assert_eq!(
            args.cors_origins,
            Some(vec![
                "https://a.example".to_string(),
                "https://b.example".to_string()
            ])
        );
        assert!(args.chat);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_chat_requires_repo() {
        assert!(parse(&["reposcout", "--chat"]).is_err());
    }

    #[test]
    fn test_validation_bad_repo() {
        let mut args = make_args();
        args.chat = true;
        args.repo = Some("not a repo".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_ranges() {
        let mut args = make_args();
        args.temperature = Some(2.5);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.max_iterations = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.openai_base_url = Some("localhost:8080".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
