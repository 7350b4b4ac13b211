//! Tool definitions for the repository agent.
//!
//! Each tool wraps one GitHub API call and shapes its result for the
//! model. Tools are collected in an immutable [`ToolRegistry`] that the
//! agent loop dispatches into by name.

use crate::config::{GitHubConfig, TreeConfig};
use crate::error::ToolError;
use crate::github::GitHubClient;
use crate::tree::{self, TreeRenderOptions};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Tool definition in the chat-completions `tools` format.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Result of executing a tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolResult {
    pub success: bool,
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn success(output: String) -> Self {
        Self {
            success: true,
            output,
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(message),
        }
    }

    /// Text handed back to the model as the tool message.
    pub fn observation(&self) -> String {
        match self.error {
            Some(ref message) if !self.success => json!({ "error": message }).to_string(),
            _ => self.output.clone(),
        }
    }
}

/// A capability the model can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON schema of the arguments.
    fn parameters(&self) -> Value;

    async fn execute(&self, args: &Value) -> Result<String, ToolError>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: self.name().to_string(),
                description: self.description().to_string(),
                parameters: self.parameters(),
            },
        }
    }
}

/// Immutable name-to-tool map, shared between requests.
pub struct ToolRegistry {
    tools: HashMap<&'static str, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Self {
        let mut map = HashMap::new();
        for tool in tools {
            if map.insert(tool.name(), tool.clone()).is_some() {
                warn!("Tool {} registered twice; keeping the last one", tool.name());
            }
        }
        Self { tools: map }
    }

    /// The five GitHub tools, sharing one client.
    pub fn github(client: GitHubClient, github: &GitHubConfig, tree: &TreeConfig) -> Self {
        let settings = Arc::new(ToolSettings {
            default_branch: github.default_branch.clone(),
            search_results: github.search_results,
            max_file_chars: github.max_file_chars,
            tree: tree.clone(),
        });

        Self::new(vec![
            Arc::new(RepoInfoTool {
                client: client.clone(),
            }),
            Arc::new(RepoTreeTool {
                client: client.clone(),
                settings: settings.clone(),
            }),
            Arc::new(SubdirTreeTool {
                client: client.clone(),
                settings: settings.clone(),
            }),
            Arc::new(FileFetcherTool {
                client: client.clone(),
                settings: settings.clone(),
            }),
            Arc::new(CodeSearchTool { client, settings }),
        ])
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Definitions for every tool, sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions: Vec<ToolDefinition> =
            self.tools.values().map(|t| t.definition()).collect();
        definitions.sort_by(|a, b| a.function.name.cmp(&b.function.name));
        definitions
    }

    /// Execute a tool call and return the result.
    pub async fn execute(&self, name: &str, args: &Value) -> ToolResult {
        debug!("Executing tool: {} with args: {}", name, args);

        let Some(tool) = self.get(name) else {
            return ToolResult::error(ToolError::UnknownTool(name.to_string()).to_string());
        };

        match tool.execute(args).await {
            Ok(output) => ToolResult::success(output),
            Err(e) => {
                debug!("Tool {} failed: {}", name, e);
                ToolResult::error(e.to_string())
            }
        }
    }
}

/// Settings shared by the GitHub tools.
#[derive(Debug)]
struct ToolSettings {
    default_branch: String,
    search_results: u32,
    max_file_chars: usize,
    tree: TreeConfig,
}

impl ToolSettings {
    fn branch<'a>(&'a self, args: &'a Value) -> Result<&'a str, ToolError> {
        match optional_str(args, "branch") {
            Some(branch) => repo_path(branch, "branch"),
            None => Ok(&self.default_branch),
        }
    }
}

fn required_str<'a>(args: &'a Value, key: &'static str) -> Result<&'a str, ToolError> {
    optional_str(args, key).ok_or(ToolError::MissingArgument(key))
}

fn optional_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Owner and repo names are single path segments.
fn path_segment<'a>(args: &'a Value, key: &'static str) -> Result<&'a str, ToolError> {
    let value = required_str(args, key)?;
    if value.contains(['/', '\\']) || is_dot_segment(value) {
        return Err(ToolError::InvalidArgument {
            name: key,
            reason: format!("'{}' must be a single name", value),
        });
    }
    Ok(value)
}

/// File paths and branch names are spliced into API URLs, where dot
/// segments would be resolved and could leave the repository's endpoints.
fn repo_path<'a>(value: &'a str, key: &'static str) -> Result<&'a str, ToolError> {
    let escapes = value.split(['/', '\\']).any(is_dot_segment);
    if escapes || value.contains(['?', '#']) {
        return Err(ToolError::InvalidArgument {
            name: key,
            reason: format!("'{}' must stay inside the repository", value),
        });
    }
    Ok(value)
}

/// `.` or `..`, percent-encoded or not.
fn is_dot_segment(segment: &str) -> bool {
    let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
    decoded == "." || decoded == ".."
}

fn to_json<T: Serialize>(value: &T) -> Result<String, ToolError> {
    serde_json::to_string(value).map_err(|e| ToolError::Rejected(e.to_string()))
}

fn owner_repo_schema(extra: Value, required: &[&str]) -> Value {
    let mut properties = json!({
        "owner": {"type": "string", "description": "Repository owner (user or organisation)"},
        "repo": {"type": "string", "description": "Repository name"}
    });
    if let (Some(props), Some(extra)) = (properties.as_object_mut(), extra.as_object()) {
        props.extend(extra.clone());
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

fn branch_property() -> Value {
    json!({"branch": {"type": "string", "description": "Branch name (default: main)", "default": "main"}})
}

/// `github_repo_info`: repository metadata.
struct RepoInfoTool {
    client: GitHubClient,
}

#[async_trait]
impl Tool for RepoInfoTool {
    fn name(&self) -> &'static str {
        "github_repo_info"
    }

    fn description(&self) -> &'static str {
        "Get repo metadata (stars, description, language, default branch)."
    }

    fn parameters(&self) -> Value {
        owner_repo_schema(json!({}), &["owner", "repo"])
    }

    async fn execute(&self, args: &Value) -> Result<String, ToolError> {
        let owner = path_segment(args, "owner")?;
        let repo = path_segment(args, "repo")?;
        let info = self.client.repo_info(owner, repo).await?;
        to_json(&info)
    }
}

/// `github_repo_tree`: top-level folders and key files only.
struct RepoTreeTool {
    client: GitHubClient,
    settings: Arc<ToolSettings>,
}

#[async_trait]
impl Tool for RepoTreeTool {
    fn name(&self) -> &'static str {
        "github_repo_tree"
    }

    fn description(&self) -> &'static str {
        "Get top-level folders and key files only. Use github_subdir_tree to look deeper."
    }

    fn parameters(&self) -> Value {
        owner_repo_schema(branch_property(), &["owner", "repo"])
    }

    async fn execute(&self, args: &Value) -> Result<String, ToolError> {
        let owner = path_segment(args, "owner")?;
        let repo = path_segment(args, "repo")?;
        let branch = self.settings.branch(args)?;

        let entries = self.client.tree(owner, repo, branch).await?;
        let visual = tree::render_top_level(
            &entries,
            &self.settings.tree.key_files,
            self.settings.tree.max_lines,
        );
        Ok(format!(
            "Top-level structure of {}/{}:\n\n{}",
            owner, repo, visual
        ))
    }
}

/// `github_subdir_tree`: rendered tree of one subdirectory.
struct SubdirTreeTool {
    client: GitHubClient,
    settings: Arc<ToolSettings>,
}

#[async_trait]
impl Tool for SubdirTreeTool {
    fn name(&self) -> &'static str {
        "github_subdir_tree"
    }

    fn description(&self) -> &'static str {
        "Get tree for a subdirectory (e.g., 'apps/web')."
    }

    fn parameters(&self) -> Value {
        let mut extra = branch_property();
        if let Some(obj) = extra.as_object_mut() {
            obj.insert(
                "subdir".to_string(),
                json!({"type": "string", "description": "Directory path relative to the repository root"}),
            );
        }
        owner_repo_schema(extra, &["owner", "repo", "subdir"])
    }

    async fn execute(&self, args: &Value) -> Result<String, ToolError> {
        let owner = path_segment(args, "owner")?;
        let repo = path_segment(args, "repo")?;
        let subdir = required_str(args, "subdir")?.trim_matches('/');
        let branch = self.settings.branch(args)?;

        let entries = self.client.tree(owner, repo, branch).await?;

        let prefix = format!("{}/", subdir);
        let filtered: Vec<_> = entries
            .into_iter()
            .filter(|e| e.path == subdir || e.path.starts_with(&prefix))
            .collect();

        if filtered.is_empty() {
            return Err(ToolError::Rejected(format!(
                "Directory '{}' not found.",
                subdir
            )));
        }
        if filtered.len() > self.settings.tree.max_subdir_entries {
            return Err(ToolError::Rejected(format!(
                "Directory '{}' is too large. Please request a specific file instead.",
                subdir
            )));
        }

        let options = TreeRenderOptions::default()
            .with_base_path(subdir)
            .with_max_lines(self.settings.tree.max_lines)
            .with_max_children_per_dir(self.settings.tree.max_children_per_dir);
        let visual = tree::render(&filtered, &options);

        Ok(format!(
            "Contents of {}/{}/{}:\n\n{}",
            owner, repo, subdir, visual
        ))
    }
}

/// `github_file_fetcher`: file contents, cut to a preview.
struct FileFetcherTool {
    client: GitHubClient,
    settings: Arc<ToolSettings>,
}

#[async_trait]
impl Tool for FileFetcherTool {
    fn name(&self) -> &'static str {
        "github_file_fetcher"
    }

    fn description(&self) -> &'static str {
        "Fetch the contents of a specific file (long files are truncated)."
    }

    fn parameters(&self) -> Value {
        let mut extra = branch_property();
        if let Some(obj) = extra.as_object_mut() {
            obj.insert(
                "file_path".to_string(),
                json!({"type": "string", "description": "File path relative to the repository root"}),
            );
        }
        owner_repo_schema(extra, &["owner", "repo", "file_path"])
    }

    async fn execute(&self, args: &Value) -> Result<String, ToolError> {
        let owner = path_segment(args, "owner")?;
        let repo = path_segment(args, "repo")?;
        let file_path = repo_path(required_str(args, "file_path")?, "file_path")?;
        let branch = self.settings.branch(args)?;

        let file = self
            .client
            .file_content(owner, repo, file_path, branch)
            .await
            .map_err(|e| {
                debug!("File fetch failed: {}", e);
                ToolError::Rejected(format!("File '{}' not found.", file_path))
            })?;

        let preview = truncate_chars(&file.content, self.settings.max_file_chars);
        to_json(&json!({
            "path": file.path,
            "content_preview": preview,
        }))
    }
}

fn truncate_chars(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}\n... (truncated)", &content[..cut]),
        None => content.to_string(),
    }
}

/// `github_code_search`: code or filename search within one repository.
struct CodeSearchTool {
    client: GitHubClient,
    settings: Arc<ToolSettings>,
}

#[async_trait]
impl Tool for CodeSearchTool {
    fn name(&self) -> &'static str {
        "github_code_search"
    }

    fn description(&self) -> &'static str {
        "Search for code or filenames in a GitHub repository."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query (e.g., 'filename:DateRangeHeader.tsx')"
                },
                "repo": {"type": "string", "description": "Repo in 'owner/name' format"}
            },
            "required": ["query", "repo"]
        })
    }

    async fn execute(&self, args: &Value) -> Result<String, ToolError> {
        let query = required_str(args, "query")?;
        let repo = required_str(args, "repo")?;
        let repo = crate::github::RepoRef::parse(repo).ok_or(ToolError::InvalidArgument {
            name: "repo",
            reason: format!("expected 'owner/name', got '{}'", repo),
        })?;

        let hits = self
            .client
            .search_code(query, &repo.to_string(), self.settings.search_results)
            .await?;

        if hits.is_empty() {
            return Err(ToolError::Rejected("No matches found.".to_string()));
        }
        to_json(&json!({ "results": hits }))
    }
}
