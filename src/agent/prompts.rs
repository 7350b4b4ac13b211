//! Prompt text used by the repository agent.

/// Final text when the model stops without saying anything.
pub const NO_ACTION_TEXT: &str = "Thinking completed. No action needed.";

/// Appended to the observation transcript when the step budget runs out.
pub const STEP_LIMIT_TEXT: &str = "Task finished: step limit reached.";

/// Replaces the content of tool observations that fell out of the window.
pub const PRUNED_OBSERVATION: &str = "(earlier tool output pruned to save context)";

/// Phrases that mean the loop ended without a real answer.
pub const COMPLETION_MARKERS: [&str; 3] = ["Thinking completed", "No action needed", "Task finished"];

/// System prompt of the summary call.
pub const SUMMARY_SYSTEM_PROMPT: &str =
    "You answer technical questions about codebases precisely and concisely.";

/// System prompt for the tool-calling loop.
pub fn system_prompt(repo: &str) -> String {
    format!(
        "You are an expert software engineer helping users understand GitHub repositories. \
         Prioritize correctness and efficiency. Avoid guessing file paths. \
         If a file isn't found, try a broader search or infer from nearby files.\n\n\
         ## Available Tools\n\n\
         - `github_repo_info` - Repository metadata\n\
         - `github_repo_tree` - Top-level folders and key files\n\
         - `github_subdir_tree` - Tree of one subdirectory\n\
         - `github_file_fetcher` - Contents of one file\n\
         - `github_code_search` - Search code and filenames\n\n\
         Start broad (top-level tree), then narrow down. \
         When you are finished, always respond with a summary or an answer to the user's question.\n\n\
         This is the repository you are exploring: {}",
        repo
    )
}

/// Whether the agent's text needs a second pass to become an answer.
pub fn needs_summary(text: &str) -> bool {
    COMPLETION_MARKERS.iter().any(|marker| text.contains(marker))
}

/// User message of the summary call.
pub fn summary_prompt(question: &str, observations: &str) -> String {
    format!(
        "You are an expert software engineer. Based on the following observations from GitHub tools, \
         provide a clear, concise answer to the user's question.\n\n\
         User question: {}\n\n\
         Tool observations:\n{}\n\n\
         Answer:",
        question, observations
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_summary() {
        assert!(needs_summary(NO_ACTION_TEXT));
        assert!(needs_summary("...\n\nTask finished: step limit reached."));
        assert!(needs_summary("No action needed"));
        assert!(!needs_summary("The auth logic lives in apps/web/lib/auth.ts."));
        // Case matters, as in the marker list.
        assert!(!needs_summary("task finished"));
    }

    #[test]
    fn test_system_prompt_names_repo() {
        let prompt = system_prompt("calcom/cal.com");
        assert!(prompt.ends_with("calcom/cal.com"));
        assert!(prompt.contains("github_subdir_tree"));
    }

    #[test]
    fn test_summary_prompt_layout() {
        let prompt = summary_prompt("Where is auth?", "[github_code_search] lib/auth.ts");
        assert!(prompt.contains("User question: Where is auth?\n\n"));
        assert!(prompt.contains("Tool observations:\n[github_code_search] lib/auth.ts"));
        assert!(prompt.ends_with("Answer:"));
    }
}
