use std::sync::atomic::{AtomicU64, Ordering};

use crate::tea::{CommitType, Phase};

/// Coarse workflow step shown in the header progress line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Branch,
    Stage,
    Describe,
    Commit,
    Push,
    PullRequest,
}

impl Step {
    pub const ALL: [Step; 6] = [
        Step::Branch,
        Step::Stage,
        Step::Describe,
        Step::Commit,
        Step::Push,
        Step::PullRequest,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Step::Branch => "Branch",
            Step::Stage => "Stage",
            Step::Describe => "Describe",
            Step::Commit => "Commit",
            Step::Push => "Push",
            Step::PullRequest => "PR",
        }
    }

    /// The step a phase belongs to. Terminal phases have none.
    pub fn of(phase: &Phase) -> Option<Step> {
        Some(match phase {
            Phase::BranchWarning { .. }
            | Phase::BranchInput { .. }
            | Phase::BranchCreating { .. } => Step::Branch,
            Phase::Add { .. } => Step::Stage,
            Phase::Type { .. }
            | Phase::Scope { .. }
            | Phase::Generating
            | Phase::CommitError { .. }
            | Phase::ManualInput { .. } => Step::Describe,
            Phase::Confirm { .. } | Phase::Edit { .. } => Step::Commit,
            Phase::PushPrompt { .. } | Phase::UpstreamPrompt { .. } => Step::Push,
            Phase::PrPrompt { .. }
            | Phase::PrGenerating
            | Phase::PrError { .. }
            | Phase::PrManualTitle { .. }
            | Phase::PrManualBody { .. }
            | Phase::PrCreating { .. } => Step::PullRequest,
            Phase::Done | Phase::Exiting => return None,
        })
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).unwrap_or(0)
    }
}

static VERSION_COUNTER: AtomicU64 = AtomicU64::new(0);

pub fn next_version() -> u64 {
    VERSION_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Immutable view of a session, sent to the render thread.
#[derive(Debug, Clone)]
pub struct RenderState {
    pub version: u64,
    pub phase: Phase,
    pub choices: Vec<String>,
    pub branch: String,
    pub branch_suggestion: String,
    pub commit_type: CommitType,
    pub scope: String,
    /// The staged diff is over the generation limit.
    pub large_diff: bool,
    pub last_error: Option<String>,
    pub fatal_error: Option<String>,
    /// Progress label of the in-flight call, if any.
    pub busy: Option<&'static str>,
    pub summary: String,
}

impl RenderState {
    pub fn step(&self) -> Option<Step> {
        Step::of(&self.phase)
    }
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            version: 0,
            phase: Phase::Type { cursor: 0 },
            choices: Vec::new(),
            branch: String::new(),
            branch_suggestion: String::new(),
            commit_type: CommitType::default(),
            scope: String::new(),
            large_diff: false,
            last_error: None,
            fatal_error: None,
            busy: None,
            summary: String::new(),
        }
    }
}
