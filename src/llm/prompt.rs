//! Prompt construction and response parsing for commit and PR generation.

/// Separates the PR title from the body in generated PR content.
pub const BODY_SEPARATOR: &str = "\n---BODY---\n";

pub fn commit_prompt(diff: &str, commit_type: &str, scope: &str) -> String {
    format!(
        r#"You are a commit message generator. Based on the following git diff, generate a concise commit message using conventional commits format.

The commit type is: {commit_type}
The scope is: {scope}

Format: {commit_type}({scope}): <description>

The description should be:
- Clear and concise (max 72 characters for the first line)
- In imperative mood (e.g., "add" not "added")
- Explain WHAT and WHY, not HOW

If the changes warrant it, you can add a body after a blank line with more details.

Git diff:
{diff}

Respond with ONLY the commit message, no explanations or markdown formatting."#
    )
}

pub fn pr_prompt(git_log: &str) -> String {
    format!(
        r#"You are a pull request generator. Based on the following git log from a branch, generate a clear and concise pull request title and body.

Git log:
{git_log}

Generate:
1. A clear, concise PR title (max 72 characters) that summarizes the changes
2. A detailed PR body that:
   - Summarizes the changes in bullet points
   - Explains the motivation and context
   - Notes any breaking changes or important details

Format your response as:
[PR Title]
---BODY---
[PR Body]

Respond with ONLY the title and body in this format, no explanations or markdown code blocks."#
    )
}

/// Split generated PR content into `(title, body)`.
///
/// Without a separator the whole text is the title and the body is empty.
pub fn parse_pr_content(content: &str) -> (String, String) {
    match content.split_once(BODY_SEPARATOR) {
        Some((title, body)) => (title.trim().to_string(), body.trim().to_string()),
        None => (content.trim().to_string(), String::new()),
    }
}

/// The conventional-commit header prefix shown during manual entry.
pub fn commit_header(commit_type: &str, scope: &str) -> String {
    format!("{}({}): ", commit_type, scope)
}
