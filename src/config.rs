//! Configuration file handling.
//!
//! This module handles loading `.reposcout.toml`, merging it with
//! command-line flags and environment variables, and validating the
//! result before any client is built.

use crate::error::ConfigError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".reposcout.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Chat model settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// GitHub API settings.
    #[serde(default)]
    pub github: GitHubConfig,

    /// Tree rendering limits.
    #[serde(default)]
    pub tree: TreeConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed to make cross-origin requests. Empty disables CORS.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Chat model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API.
    #[serde(default = "default_llm_url")]
    pub api_base_url: String,

    /// API key. Usually supplied through `OPENAI_KEY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model name; must support tool calling.
    #[serde(default = "default_model")]
    pub model: String,

    /// Temperature for the tool-calling loop.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_llm_timeout")]
    pub timeout_seconds: u64,

    /// Maximum model round-trips per question.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Tool observations kept verbatim in context; older ones are pruned.
    #[serde(default = "default_max_context_messages")]
    pub max_context_messages: usize,

    /// Token limit for the summary call.
    #[serde(default = "default_summary_max_tokens")]
    pub summary_max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_llm_url(),
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            timeout_seconds: default_llm_timeout(),
            max_iterations: default_max_iterations(),
            max_context_messages: default_max_context_messages(),
            summary_max_tokens: default_summary_max_tokens(),
        }
    }
}

fn default_llm_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_llm_timeout() -> u64 {
    120
}

fn default_max_iterations() -> usize {
    10
}

fn default_max_context_messages() -> usize {
    10
}

fn default_summary_max_tokens() -> u32 {
    500
}

/// GitHub API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// REST API root.
    #[serde(default = "default_github_url")]
    pub api_base_url: String,

    /// Personal access token. Usually supplied through `GITHUB_API_KEY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Branch used when a tool call does not name one.
    #[serde(default = "default_branch")]
    pub default_branch: String,

    /// User-Agent header (GitHub rejects requests without one).
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds.
    #[serde(default = "default_github_timeout")]
    pub timeout_seconds: u64,

    /// Results requested from code search.
    #[serde(default = "default_search_results")]
    pub search_results: u32,

    /// File previews are cut at this many characters.
    #[serde(default = "default_max_file_chars")]
    pub max_file_chars: usize,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_github_url(),
            token: None,
            default_branch: default_branch(),
            user_agent: default_user_agent(),
            timeout_seconds: default_github_timeout(),
            search_results: default_search_results(),
            max_file_chars: default_max_file_chars(),
        }
    }
}

fn default_github_url() -> String {
    "https://api.github.com".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_user_agent() -> String {
    format!("reposcout/{}", env!("CARGO_PKG_VERSION"))
}

fn default_github_timeout() -> u64 {
    30
}

fn default_search_results() -> u32 {
    10
}

fn default_max_file_chars() -> usize {
    8000
}

/// Tree rendering limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Global line cap for subdirectory listings.
    #[serde(default = "default_max_lines")]
    pub max_lines: usize,

    /// Per-directory child cap. When set, replaces the global line cap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_children_per_dir: Option<usize>,

    /// Subdirectories with more entries than this are refused.
    #[serde(default = "default_max_subdir_entries")]
    pub max_subdir_entries: usize,

    /// Root-level files listed in the top-level summary.
    #[serde(default = "default_key_files")]
    pub key_files: Vec<String>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_lines: default_max_lines(),
            max_children_per_dir: None,
            max_subdir_entries: default_max_subdir_entries(),
            key_files: default_key_files(),
        }
    }
}

fn default_max_lines() -> usize {
    crate::tree::DEFAULT_MAX_LINES
}

fn default_max_subdir_entries() -> usize {
    500
}

fn default_key_files() -> Vec<String> {
    vec![
        "README.md",
        "package.json",
        "pnpm-lock.yaml",
        "yarn.lock",
        "Cargo.toml",
        "pyproject.toml",
        "go.mod",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments and environment variables.
    ///
    /// Explicit values take precedence over the config file; empty
    /// environment variables are treated as unset.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        fn non_empty(value: &Option<String>) -> Option<String> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
        }

        // Server
        if let Some(host) = non_empty(&args.host) {
            self.server.host = host;
        }
        if let Some(port) = args.port {
            self.server.port = port;
        }
        if let Some(ref origins) = args.cors_origins {
            self.server.cors_origins = origins
                .iter()
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }

        // Model
        if let Some(url) = non_empty(&args.openai_base_url) {
            self.llm.api_base_url = url;
        }
        if let Some(key) = non_empty(&args.openai_key) {
            self.llm.api_key = Some(key);
        }
        if let Some(model) = non_empty(&args.model) {
            self.llm.model = model;
        }
        if let Some(temperature) = args.temperature {
            self.llm.temperature = temperature;
        }
        if let Some(timeout) = args.timeout {
            self.llm.timeout_seconds = timeout;
        }
        if let Some(max_iterations) = args.max_iterations {
            self.llm.max_iterations = max_iterations;
        }

        // GitHub
        if let Some(token) = non_empty(&args.github_token) {
            self.github.token = Some(token);
        }
        if let Some(branch) = non_empty(&args.branch) {
            self.github.default_branch = branch;
        }

        // Tree
        if args.max_children_per_dir.is_some() {
            self.tree.max_children_per_dir = args.max_children_per_dir;
        }
    }

    /// Check that every required setting is present and usable.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.llm.api_key()?;
        self.github.token()?;

        check_url("llm.api_base_url", &self.llm.api_base_url)?;
        check_url("github.api_base_url", &self.github.api_base_url)?;

        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::Missing("llm.model"));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::Invalid {
                field: "llm.temperature",
                reason: "must be between 0.0 and 2.0".to_string(),
            });
        }
        if self.llm.max_iterations == 0 {
            return Err(ConfigError::Invalid {
                field: "llm.max_iterations",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.llm.timeout_seconds == 0 || self.github.timeout_seconds == 0 {
            return Err(ConfigError::Invalid {
                field: "timeout_seconds",
                reason: "must be at least 1 second".to_string(),
            });
        }
        if self.github.default_branch.trim().is_empty() {
            return Err(ConfigError::Missing("github.default_branch"));
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

impl LlmConfig {
    /// The API key, or a typed failure when it was never supplied.
    pub fn api_key(&self) -> std::result::Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::Missing("llm.api_key (OPENAI_KEY)"))
    }
}

impl GitHubConfig {
    /// The access token, or a typed failure when it was never supplied.
    pub fn token(&self) -> std::result::Result<&str, ConfigError> {
        self.token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::Missing("github.token (GITHUB_API_KEY)"))
    }
}

fn check_url(field: &'static str, url: &str) -> std::result::Result<(), ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: "must start with 'http://' or 'https://'".to_string(),
        })
    }
}
