//! HTTP client for the GitHub REST API.

use super::{CodeSearchHit, FileContent, RepoInfo};
use crate::config::GitHubConfig;
use crate::error::{ConfigError, GitHubError};
use crate::tree::TreeEntry;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct TreeResponse {
    #[serde(default)]
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<CodeSearchHit>,
}

/// Authenticated GitHub REST client. Cheap to clone.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    base_url: String,
}

impl GitHubClient {
    /// Build a client from validated settings.
    pub fn new(config: &GitHubConfig) -> Result<Self, ConfigError> {
        let token = config.token()?;

        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("token {}", token)).map_err(|_| {
            ConfigError::Invalid {
                field: "github.token",
                reason: "contains characters not allowed in a header".to_string(),
            }
        })?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github.v3+json"),
        );

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ConfigError::Invalid {
                field: "github",
                reason: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch repository metadata.
    pub async fn repo_info(&self, owner: &str, repo: &str) -> Result<RepoInfo, GitHubError> {
        self.get_json(&format!("/repos/{}/{}", owner, repo), &[])
            .await
    }

    /// Fetch the full recursive tree of a branch.
    pub async fn tree(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<Vec<TreeEntry>, GitHubError> {
        let response: TreeResponse = self
            .get_json(
                &format!("/repos/{}/{}/git/trees/{}", owner, repo, branch),
                &[("recursive", "1".to_string())],
            )
            .await?;

        if response.truncated {
            warn!(
                "GitHub truncated the tree for {}/{}@{}; listing is partial",
                owner, repo, branch
            );
        }
        debug!("Fetched {} tree entries", response.tree.len());

        Ok(response.tree)
    }

    /// Fetch and decode a single file.
    pub async fn file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        branch: &str,
    ) -> Result<FileContent, GitHubError> {
        let path = path.trim_start_matches('/');
        let value: Value = self
            .get_json(
                &format!("/repos/{}/{}/contents/{}", owner, repo, path),
                &[("ref", branch.to_string())],
            )
            .await?;

        // Directories come back as an array of entries.
        if value.is_array() {
            return Err(GitHubError::NotAFile(path.to_string()));
        }

        let response: ContentResponse = serde_json::from_value(value)
            .map_err(|e| GitHubError::Decode(e.to_string()))?;
        if response.kind != "file" {
            return Err(GitHubError::NotAFile(path.to_string()));
        }

        let encoded: String = response
            .content
            .unwrap_or_default()
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| GitHubError::Decode(e.to_string()))?;

        Ok(FileContent {
            path: path.to_string(),
            content: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }

    /// Search code within one repository (`repo` is `owner/name`).
    pub async fn search_code(
        &self,
        query: &str,
        repo: &str,
        per_page: u32,
    ) -> Result<Vec<CodeSearchHit>, GitHubError> {
        let response: SearchResponse = self
            .get_json(
                "/search/code",
                &[
                    ("q", format!("{} repo:{}", query, repo)),
                    ("per_page", per_page.to_string()),
                ],
            )
            .await?;
        Ok(response.items)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, GitHubError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self.http.get(&url).query(query).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(GitHubError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GitHubError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_stub;
    use axum::extract::{Path, Query};
    use axum::http::{HeaderMap as AxumHeaders, StatusCode as AxumStatus};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    fn client_for(base_url: String) -> GitHubClient {
        let config = GitHubConfig {
            api_base_url: base_url,
            token: Some("ghp_test".to_string()),
            ..GitHubConfig::default()
        };
        GitHubClient::new(&config).unwrap()
    }

    #[test]
    fn test_new_requires_token() {
        let err = GitHubClient::new(&GitHubConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[tokio::test]
    async fn test_repo_info_sends_token() {
        let router = Router::new().route(
            "/repos/{owner}/{repo}",
            get(|headers: AxumHeaders, Path((owner, repo)): Path<(String, String)>| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Json(json!({
                    "full_name": format!("{}/{}", owner, repo),
                    "description": auth,
                    "stargazers_count": 7,
                    "language": "Rust",
                    "html_url": "https://github.com/octo/hello"
                }))
            }),
        );
        let client = client_for(spawn_stub(router).await);

        let info = client.repo_info("octo", "hello").await.unwrap();
        assert_eq!(info.full_name, "octo/hello");
        assert_eq!(info.description.as_deref(), Some("token ghp_test"));
        assert_eq!(info.stars, 7);
        assert_eq!(info.forks, 0);
    }

    #[tokio::test]
    async fn test_tree_requests_recursive_listing() {
        let router = Router::new().route(
            "/repos/{owner}/{repo}/git/trees/{branch}",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                assert_eq!(params.get("recursive").map(String::as_str), Some("1"));
                Json(json!({
                    "sha": "abc",
                    "tree": [
                        {"path": "src", "type": "tree"},
                        {"path": "src/lib.rs", "type": "blob", "size": 10}
                    ],
                    "truncated": false
                }))
            }),
        );
        let client = client_for(spawn_stub(router).await);

        let entries = client.tree("octo", "hello", "main").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].kind.is_directory());
        assert_eq!(entries[1].size, Some(10));
    }

    #[tokio::test]
    async fn test_file_content_decodes_base64() {
        let router = Router::new().route(
            "/repos/{owner}/{repo}/contents/{*path}",
            get(|Path((_, _, path)): Path<(String, String, String)>| async move {
                if path == "src" {
                    return Json(json!([{"name": "lib.rs", "type": "file"}]));
                }
                // "fn main() {}\n" split across lines the way GitHub does it
                Json(json!({
                    "type": "file",
                    "path": path,
                    "encoding": "base64",
                    "content": "Zm4gbWFp\nbigpIHt9Cg==\n"
                }))
            }),
        );
        let client = client_for(spawn_stub(router).await);

        let file = client
            .file_content("octo", "hello", "src/main.rs", "main")
            .await
            .unwrap();
        assert_eq!(file.path, "src/main.rs");
        assert_eq!(file.content, "fn main() {}\n");

        let err = client
            .file_content("octo", "hello", "src", "main")
            .await
            .unwrap_err();
        assert!(matches!(err, GitHubError::NotAFile(_)));
    }

    #[tokio::test]
    async fn test_search_code_scopes_query_to_repo() {
        let router = Router::new().route(
            "/search/code",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                assert_eq!(params["q"], "filename:auth.ts repo:octo/hello");
                assert_eq!(params["per_page"], "10");
                Json(json!({
                    "total_count": 1,
                    "items": [{
                        "name": "auth.ts",
                        "path": "lib/auth.ts",
                        "html_url": "https://github.com/octo/hello/blob/main/lib/auth.ts"
                    }]
                }))
            }),
        );
        let client = client_for(spawn_stub(router).await);

        let hits = client
            .search_code("filename:auth.ts", "octo/hello", 10)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].path, "lib/auth.ts");
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let router = Router::new()
            .route(
                "/repos/{owner}/{repo}",
                get(|| async { (AxumStatus::FORBIDDEN, "rate limited") }),
            )
            .route(
                "/repos/{owner}/{repo}/git/trees/{branch}",
                get(|| async { AxumStatus::NOT_FOUND }),
            );
        let client = client_for(spawn_stub(router).await);

        match client.repo_info("octo", "hello").await.unwrap_err() {
            GitHubError::Status { status, body } => {
                assert_eq!(status, 403);
                assert_eq!(body, "rate limited");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let err = client.tree("octo", "hello", "nope").await.unwrap_err();
        assert!(matches!(err, GitHubError::NotFound(_)));
    }
}
