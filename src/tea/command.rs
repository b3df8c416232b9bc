//! Commands for the TEA (The Elm Architecture) pattern.
//!
//! Commands are outputs from the update function: side effects the runtime
//! executes. External calls report back as `Message::CallSucceeded` or
//! `Message::CallFailed`.

use super::model::CommitType;

/// An external call against git, the forge or the text generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateBranch {
        name: String,
    },
    /// Stage everything, then re-read the staged diff.
    StageAll,
    GenerateCommitMessage {
        diff: String,
        commit_type: CommitType,
        scope: String,
    },
    /// Count staged files, then commit.
    Commit {
        message: String,
    },
    Push,
    PushSetUpstream {
        branch: String,
    },
    /// Origin is a supported forge and `branch` has no open PR.
    CheckPrEligibility {
        branch: String,
    },
    GeneratePrContent {
        branch: String,
    },
    CreatePr {
        title: String,
        body: String,
    },
}

impl Call {
    pub fn kind(&self) -> CallKind {
        match self {
            Call::CreateBranch { .. } => CallKind::CreateBranch,
            Call::StageAll => CallKind::StageAll,
            Call::GenerateCommitMessage { .. } => CallKind::GenerateCommitMessage,
            Call::Commit { .. } => CallKind::Commit,
            Call::Push => CallKind::Push,
            Call::PushSetUpstream { .. } => CallKind::PushSetUpstream,
            Call::CheckPrEligibility { .. } => CallKind::CheckPrEligibility,
            Call::GeneratePrContent { .. } => CallKind::GeneratePrContent,
            Call::CreatePr { .. } => CallKind::CreatePr,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    CreateBranch,
    StageAll,
    GenerateCommitMessage,
    Commit,
    Push,
    PushSetUpstream,
    CheckPrEligibility,
    GeneratePrContent,
    CreatePr,
}

impl CallKind {
    /// Prefix for a fatal failure message, if the raw error needs context.
    pub fn failure_label(&self) -> Option<&'static str> {
        match self {
            CallKind::StageAll => Some("Error adding files"),
            CallKind::Commit => Some("Error committing"),
            CallKind::Push => Some("Error pushing"),
            CallKind::PushSetUpstream => Some("Error setting upstream"),
            CallKind::CreatePr => Some("Error creating PR"),
            CallKind::CreateBranch
            | CallKind::GenerateCommitMessage
            | CallKind::CheckPrEligibility
            | CallKind::GeneratePrContent => None,
        }
    }

    /// Status line shown while the call is in flight.
    pub fn progress_label(&self) -> &'static str {
        match self {
            CallKind::CreateBranch => "Creating branch...",
            CallKind::StageAll => "Staging changes...",
            CallKind::GenerateCommitMessage => "Generating commit message...",
            CallKind::Commit => "Committing...",
            CallKind::Push => "Pushing...",
            CallKind::PushSetUpstream => "Pushing with upstream...",
            CallKind::CheckPrEligibility => "Checking for existing pull requests...",
            CallKind::GeneratePrContent => "Generating PR title and body...",
            CallKind::CreatePr => "Creating pull request...",
        }
    }
}

/// Output commands from the update function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Call(Call),
    Quit,
}
