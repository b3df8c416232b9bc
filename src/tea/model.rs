//! Session state for the commit workflow.
//!
//! The Session is pure state: no channels, no handles, no collaborators.

use crate::git::is_diff_too_large;
use crate::render::{next_version, RenderState};

use super::command::CallKind;

/// Conventional-commit type offered in the `type` phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommitType {
    #[default]
    Feat,
    Fix,
    Docs,
    Style,
    Refactor,
    Perf,
    Test,
    Build,
    Ci,
    Chore,
}

impl CommitType {
    pub const ALL: [CommitType; 10] = [
        CommitType::Feat,
        CommitType::Fix,
        CommitType::Docs,
        CommitType::Style,
        CommitType::Refactor,
        CommitType::Perf,
        CommitType::Test,
        CommitType::Build,
        CommitType::Ci,
        CommitType::Chore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommitType::Feat => "feat",
            CommitType::Fix => "fix",
            CommitType::Docs => "docs",
            CommitType::Style => "style",
            CommitType::Refactor => "refactor",
            CommitType::Perf => "perf",
            CommitType::Test => "test",
            CommitType::Build => "build",
            CommitType::Ci => "ci",
            CommitType::Chore => "chore",
        }
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|t| t == self).unwrap_or(0)
    }
}

impl std::fmt::Display for CommitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workflow phase. Each variant carries only what that phase needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    BranchWarning { cursor: usize },
    BranchInput { input: String },
    BranchCreating { name: String },
    Add { cursor: usize },
    Type { cursor: usize },
    Scope { input: String },
    Generating,
    CommitError { cursor: usize },
    ManualInput { message: String },
    Confirm { message: String, cursor: usize },
    Edit { message: String },
    PushPrompt { cursor: usize },
    UpstreamPrompt { cursor: usize },
    PrPrompt { cursor: usize },
    PrGenerating,
    PrError { cursor: usize },
    PrManualTitle { title: String },
    PrManualBody { title: String, body: String },
    PrCreating { title: String, body: String },
    Done,
    Exiting,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::BranchWarning { .. } => "branch_warning",
            Phase::BranchInput { .. } => "branch_input",
            Phase::BranchCreating { .. } => "branch_creating",
            Phase::Add { .. } => "add",
            Phase::Type { .. } => "type",
            Phase::Scope { .. } => "scope",
            Phase::Generating => "generating",
            Phase::CommitError { .. } => "commit_error",
            Phase::ManualInput { .. } => "manual_input",
            Phase::Confirm { .. } => "confirm",
            Phase::Edit { .. } => "edit",
            Phase::PushPrompt { .. } => "push_prompt",
            Phase::UpstreamPrompt { .. } => "upstream_prompt",
            Phase::PrPrompt { .. } => "pr_prompt",
            Phase::PrGenerating => "pr_generating",
            Phase::PrError { .. } => "pr_error",
            Phase::PrManualTitle { .. } => "pr_manual_title",
            Phase::PrManualBody { .. } => "pr_manual_body",
            Phase::PrCreating { .. } => "pr_creating",
            Phase::Done => "done",
            Phase::Exiting => "exiting",
        }
    }

    /// Free-text phases, where `q`, `j` and `k` are typed rather than interpreted.
    pub fn is_text_input(&self) -> bool {
        matches!(
            self,
            Phase::BranchInput { .. }
                | Phase::Scope { .. }
                | Phase::ManualInput { .. }
                | Phase::Edit { .. }
                | Phase::PrManualTitle { .. }
                | Phase::PrManualBody { .. }
        )
    }

    /// Text phases that accept multi-line input via `alt+enter`.
    pub fn is_multiline(&self) -> bool {
        matches!(
            self,
            Phase::ManualInput { .. } | Phase::Edit { .. } | Phase::PrManualBody { .. }
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::PrCreating { .. } | Phase::Done | Phase::Exiting)
    }

    pub(crate) fn cursor_mut(&mut self) -> Option<&mut usize> {
        match self {
            Phase::BranchWarning { cursor }
            | Phase::Add { cursor }
            | Phase::Type { cursor }
            | Phase::CommitError { cursor }
            | Phase::Confirm { cursor, .. }
            | Phase::PushPrompt { cursor }
            | Phase::UpstreamPrompt { cursor }
            | Phase::PrPrompt { cursor }
            | Phase::PrError { cursor } => Some(cursor),
            _ => None,
        }
    }

    /// The text buffer edited in a free-text phase.
    pub(crate) fn text_mut(&mut self) -> Option<&mut String> {
        match self {
            Phase::BranchInput { input } | Phase::Scope { input } => Some(input),
            Phase::ManualInput { message } | Phase::Edit { message } => Some(message),
            Phase::PrManualTitle { title } => Some(title),
            Phase::PrManualBody { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Actions completed during the session, reported in the exit summary.
///
/// Fields only ever move forward: counts are replaced, flags are only set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub staged_file_count: usize,
    pub did_commit: bool,
    pub did_push: bool,
    pub did_create_pr: bool,
    pub created_branch: Option<String>,
}

impl Completion {
    pub(crate) fn record_commit(&mut self, files: usize) {
        self.staged_file_count = files;
        self.did_commit = true;
    }

    pub(crate) fn record_push(&mut self) {
        self.did_push = true;
    }

    pub(crate) fn record_pr(&mut self) {
        self.did_create_pr = true;
    }

    pub(crate) fn record_branch(&mut self, name: &str) {
        self.created_branch = Some(name.to_string());
    }
}

/// One interactive commit workflow.
#[derive(Debug, Clone)]
pub struct Session {
    pub phase: Phase,
    pub diff: String,
    pub needs_staging: bool,
    pub branch: String,
    pub is_protected_branch: bool,
    pub commit_type: CommitType,
    pub scope: String,
    pub branch_suggestion: String,
    /// Retryable generation error shown by the error phases.
    pub last_error: Option<String>,
    /// Set when the session ends on a fatal error.
    pub fatal_error: Option<String>,
    pub completion: Completion,
    /// The single in-flight external call.
    pub pending: Option<CallKind>,
    pub pr_only: bool,
    pub dirty: bool,
}

impl Session {
    pub fn new(
        diff: String,
        needs_staging: bool,
        branch: String,
        is_protected_branch: bool,
        branch_suggestion: String,
    ) -> Self {
        let phase = if is_protected_branch {
            Phase::BranchWarning { cursor: 0 }
        } else if needs_staging {
            Phase::Add { cursor: 0 }
        } else {
            Phase::Type { cursor: 0 }
        };
        Self {
            phase,
            diff,
            needs_staging,
            branch,
            is_protected_branch,
            commit_type: CommitType::default(),
            scope: String::new(),
            branch_suggestion,
            last_error: None,
            fatal_error: None,
            completion: Completion::default(),
            pending: None,
            pr_only: false,
            dirty: true,
        }
    }

    /// PR-only session: generate and open a PR for commits already on `branch`.
    pub fn for_pull_request(branch: String) -> Self {
        Self {
            phase: Phase::PrGenerating,
            pr_only: true,
            ..Self::new(String::new(), false, branch, false, String::new())
        }
    }

    /// Labels for the current selection phase, in cursor order.
    pub fn choices(&self) -> Vec<String> {
        let fixed: &[&str] = match &self.phase {
            Phase::BranchWarning { .. } => {
                return vec![
                    "Yes, create a new branch".to_string(),
                    format!("No, continue on {}", self.branch),
                ];
            }
            Phase::Type { .. } => {
                return CommitType::ALL.iter().map(|t| t.to_string()).collect();
            }
            Phase::Add { .. } => &["Yes, add all changes", "No, exit"],
            Phase::CommitError { .. } => &["Retry", "Enter commit message manually"],
            Phase::Confirm { .. } => &["Yes, commit", "No, let me edit"],
            Phase::PushPrompt { .. } => &["Yes, push", "No, skip"],
            Phase::UpstreamPrompt { .. } => &["Yes, set upstream and push", "No, skip"],
            Phase::PrPrompt { .. } => &["Yes, create PR", "No, skip"],
            Phase::PrError { .. } => &[
                "Retry",
                "Enter PR details manually",
                "Skip PR creation",
            ],
            _ => &[],
        };
        fixed.iter().map(|s| s.to_string()).collect()
    }

    /// One-line description of what the session accomplished. Empty when nothing was committed.
    pub fn summary(&self) -> String {
        let done = &self.completion;
        if self.pr_only {
            return if done.did_create_pr {
                format!("Created PR on branch {}", self.branch)
            } else {
                String::new()
            };
        }
        if !done.did_commit {
            return String::new();
        }

        let files = done.staged_file_count;
        let mut parts = vec![format!(
            "Committed {} {}",
            files,
            if files == 1 { "file" } else { "files" }
        )];
        match &done.created_branch {
            Some(branch) => parts.push(format!("to new branch {}", branch)),
            None => parts.push(format!("to branch {}", self.branch)),
        }
        if done.did_push {
            parts.push("and pushed".to_string());
        }
        if done.did_create_pr {
            parts.push("and created PR".to_string());
        }
        parts.join(" ")
    }

    /// Immutable snapshot for the render thread.
    pub fn snapshot(&self) -> RenderState {
        RenderState {
            version: next_version(),
            phase: self.phase.clone(),
            choices: self.choices(),
            branch: self.branch.clone(),
            branch_suggestion: self.branch_suggestion.clone(),
            commit_type: self.commit_type,
            scope: self.scope.clone(),
            large_diff: is_diff_too_large(&self.diff),
            last_error: self.last_error.clone(),
            fatal_error: self.fatal_error.clone(),
            busy: self.pending.map(|kind| kind.progress_label()),
            summary: self.summary(),
        }
    }
}
