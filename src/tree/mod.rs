//! Visual directory tree rendering for repository listings.
//!
//! GitHub's recursive tree endpoint returns a flat list of paths. This module
//! turns that list into an indented, `tree`-style listing that stays small
//! enough to hand to a language model.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

/// Default ceiling on rendered lines.
pub const DEFAULT_MAX_LINES: usize = 80;

/// Returned instead of an empty string when nothing is rendered.
pub const EMPTY_DIRECTORY: &str = "📁 (empty directory)";

/// Appended when the global line cap cuts the listing short.
pub const TRUNCATED_NOTICE: &str = "... (truncated to save context)";

/// Appended when the top-level summary is cut short.
pub const TOP_LEVEL_TRUNCATED_NOTICE: &str = "... (truncated)";

/// Nesting limit; repository paths are far shallower in practice.
const MAX_DEPTH: usize = 64;

const INDENT: &str = "│   ";
const MID_SIBLING: &str = "├── ";
const LAST_SIBLING: &str = "└── ";
const DIR_ICON: &str = "📁 ";
const FILE_ICON: &str = "📄 ";

/// Kind of a tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Directory,
    File,
}

impl EntryKind {
    /// Classify a type tag. GitHub uses `tree` and `blob`; anything
    /// unrecognised (submodule `commit`s included) is treated as a file.
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "tree" | "dir" | "directory" => EntryKind::Directory,
            _ => EntryKind::File,
        }
    }

    pub fn is_directory(self) -> bool {
        self == EntryKind::Directory
    }
}

impl<'de> Deserialize<'de> for EntryKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::from_tag(&tag))
    }
}

/// One file or directory record from a repository listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// Slash-separated path relative to the repository root.
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Size in bytes (GitHub only reports it for blobs).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl TreeEntry {
    pub fn file(path: impl Into<String>, size: Option<u64>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::File,
            size,
        }
    }

    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Directory,
            size: None,
        }
    }
}

/// Rendering limits and scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRenderOptions {
    /// Only render the subtree below this path, with the prefix stripped.
    pub base_path: Option<String>,
    /// Global cap on emitted lines. Ignored when `max_children_per_dir` is set.
    pub max_lines: usize,
    /// Per-directory cap on listed children, applied at every level.
    pub max_children_per_dir: Option<usize>,
}

impl Default for TreeRenderOptions {
    fn default() -> Self {
        Self {
            base_path: None,
            max_lines: DEFAULT_MAX_LINES,
            max_children_per_dir: None,
        }
    }
}

impl TreeRenderOptions {
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    pub fn with_max_lines(mut self, max_lines: usize) -> Self {
        self.max_lines = max_lines;
        self
    }

    pub fn with_max_children_per_dir(mut self, max_children: Option<usize>) -> Self {
        self.max_children_per_dir = max_children;
        self
    }
}

/// A child of some directory, as seen by the renderer.
#[derive(Debug, Clone, Copy)]
struct Node<'a> {
    name: &'a str,
    kind: EntryKind,
    size: Option<u64>,
}

/// A single rendered entry line.
#[derive(Debug, Clone, Copy)]
struct RenderedLine<'a> {
    depth: usize,
    name: &'a str,
    is_directory: bool,
    size: Option<u64>,
    is_last_sibling: bool,
}

impl fmt::Display for RenderedLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let connector = if self.is_last_sibling {
            LAST_SIBLING
        } else {
            MID_SIBLING
        };
        let icon = if self.is_directory { DIR_ICON } else { FILE_ICON };
        write!(
            f,
            "{}{}{}{}",
            INDENT.repeat(self.depth),
            connector,
            icon,
            self.name
        )?;
        match self.size {
            Some(size) if !self.is_directory => write!(f, " ({} bytes)", size),
            _ => Ok(()),
        }
    }
}

/// Split a path into its non-empty segments.
fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Render a flat entry list as an indented tree.
///
/// Directories sort before files, then names ascend. The output never
/// exceeds the configured caps and is never empty: an empty or fully
/// filtered listing yields [`EMPTY_DIRECTORY`].
pub fn render(entries: &[TreeEntry], options: &TreeRenderOptions) -> String {
    let base = options
        .base_path
        .as_deref()
        .map(segments)
        .unwrap_or_default();

    let mut children: HashMap<String, Vec<Node<'_>>> = HashMap::new();
    for entry in entries {
        let parts = segments(&entry.path);
        if !parts.starts_with(&base) {
            continue;
        }
        let Some((&name, parent)) = parts[base.len()..].split_last() else {
            continue;
        };
        children.entry(parent.join("/")).or_default().push(Node {
            name,
            kind: entry.kind,
            size: entry.size,
        });
    }

    for nodes in children.values_mut() {
        nodes.sort_by(|a, b| {
            b.kind
                .is_directory()
                .cmp(&a.kind.is_directory())
                .then_with(|| a.name.cmp(b.name))
        });
    }

    let mut lines = Vec::new();
    let mut visited = HashSet::new();
    render_dir(
        &children,
        "",
        0,
        options.max_children_per_dir,
        &mut visited,
        &mut lines,
    );

    if options.max_children_per_dir.is_none() && lines.len() > options.max_lines {
        lines.truncate(options.max_lines);
        lines.push(TRUNCATED_NOTICE.to_string());
    }

    if lines.is_empty() {
        EMPTY_DIRECTORY.to_string()
    } else {
        lines.join("\n")
    }
}

fn render_dir(
    children: &HashMap<String, Vec<Node<'_>>>,
    key: &str,
    depth: usize,
    max_children: Option<usize>,
    visited: &mut HashSet<String>,
    lines: &mut Vec<String>,
) {
    // Repeated directory entries would otherwise render the same subtree
    // once per duplicate, compounding at every level.
    if depth >= MAX_DEPTH || !visited.insert(key.to_string()) {
        return;
    }
    let Some(nodes) = children.get(key) else {
        return;
    };

    let (visible, hidden) = match max_children {
        Some(cap) if nodes.len() > cap => (&nodes[..cap], nodes.len() - cap),
        _ => (&nodes[..], 0),
    };

    for (i, node) in visible.iter().enumerate() {
        let line = RenderedLine {
            depth,
            name: node.name,
            is_directory: node.kind.is_directory(),
            size: node.size,
            is_last_sibling: i + 1 == visible.len() && hidden == 0,
        };
        lines.push(line.to_string());

        if node.kind.is_directory() {
            let child_key = if key.is_empty() {
                node.name.to_string()
            } else {
                format!("{}/{}", key, node.name)
            };
            render_dir(children, &child_key, depth + 1, max_children, visited, lines);
        }
    }

    if hidden > 0 {
        lines.push(format!(
            "{}{}... (+{} more files/dirs)",
            INDENT.repeat(depth),
            LAST_SIBLING,
            hidden
        ));
    }
}

/// Render only the root level: every top-level directory plus the
/// top-level files named in `key_files`.
pub fn render_top_level(entries: &[TreeEntry], key_files: &[String], max_lines: usize) -> String {
    let mut dirs = BTreeSet::new();
    let mut files = BTreeSet::new();

    for entry in entries {
        let parts = segments(&entry.path);
        let [name] = parts.as_slice() else {
            continue;
        };
        if entry.kind.is_directory() {
            dirs.insert(*name);
        } else if key_files.iter().any(|k| k == name) {
            files.insert(*name);
        }
    }

    let mut lines: Vec<String> = dirs
        .into_iter()
        .map(|d| format!("{}{}", DIR_ICON, d))
        .chain(files.into_iter().map(|f| format!("{}{}", FILE_ICON, f)))
        .collect();

    if lines.len() > max_lines {
        lines.truncate(max_lines);
        lines.push(TOP_LEVEL_TRUNCATED_NOTICE.to_string());
    }

    if lines.is_empty() {
        EMPTY_DIRECTORY.to_string()
    } else {
        lines.join("\n")
    }
}
