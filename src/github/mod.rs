//! GitHub REST API access.
//!
//! The client only covers the four read-only endpoints the agent's tools
//! need. Response types are trimmed to the fields the tools report.

mod client;

pub use client::GitHubClient;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Repository metadata reported to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoInfo {
    pub full_name: String,
    pub description: Option<String>,
    #[serde(rename(deserialize = "stargazers_count", serialize = "stars"), default)]
    pub stars: u64,
    #[serde(rename(deserialize = "forks_count", serialize = "forks"), default)]
    pub forks: u64,
    #[serde(rename(deserialize = "open_issues_count", serialize = "open_issues"), default)]
    pub open_issues: u64,
    pub language: Option<String>,
    #[serde(rename(deserialize = "html_url", serialize = "url"))]
    pub url: String,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub pushed_at: Option<DateTime<Utc>>,
}

/// Decoded contents of a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileContent {
    pub path: String,
    pub content: String,
}

/// One code search match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSearchHit {
    pub name: String,
    pub path: String,
    #[serde(rename(deserialize = "html_url", serialize = "url"))]
    pub url: String,
}

/// A repository identified by owner and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    /// Parse `owner/name`, `https://github.com/owner/name[.git]` or
    /// `git@github.com:owner/name[.git]`.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim().trim_end_matches('/');
        let input = input.strip_suffix(".git").unwrap_or(input);

        let rest = input
            .strip_prefix("https://github.com/")
            .or_else(|| input.strip_prefix("http://github.com/"))
            .or_else(|| input.strip_prefix("git@github.com:"))
            .unwrap_or(input);

        let mut parts = rest.split('/');
        let owner = parts.next()?;
        let name = parts.next()?;

        let valid = |s: &str| {
            !s.is_empty()
                && s
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        };
        if !valid(owner) || !valid(name) {
            return None;
        }

        // Plain `owner/name` must not carry extra segments; URLs may (`/tree/main`).
        if rest.len() == input.len() && parts.next().is_some() {
            return None;
        }

        Some(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
