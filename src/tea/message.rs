//! Messages for the TEA (The Elm Architecture) pattern.
//!
//! Messages are inputs to the update function: key events from the terminal
//! and the outcomes of external calls.

use crossterm::event::KeyEvent;

use crate::error::Failure;

use super::command::CallKind;

/// Successful outcome of a [`Call`](super::Call).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallResult {
    BranchCreated(String),
    Staged { diff: String },
    CommitMessage(String),
    Committed { files: usize },
    Pushed { upstream: bool },
    PrEligibility(bool),
    PrContent(String),
    PrCreated,
}

impl CallResult {
    pub fn kind(&self) -> CallKind {
        match self {
            CallResult::BranchCreated(_) => CallKind::CreateBranch,
            CallResult::Staged { .. } => CallKind::StageAll,
            CallResult::CommitMessage(_) => CallKind::GenerateCommitMessage,
            CallResult::Committed { .. } => CallKind::Commit,
            CallResult::Pushed { upstream: false } => CallKind::Push,
            CallResult::Pushed { upstream: true } => CallKind::PushSetUpstream,
            CallResult::PrEligibility(_) => CallKind::CheckPrEligibility,
            CallResult::PrContent(_) => CallKind::GeneratePrContent,
            CallResult::PrCreated => CallKind::CreatePr,
        }
    }
}

/// Input messages to the update function.
#[derive(Debug, Clone)]
pub enum Message {
    Key(KeyEvent),
    Resize(u16, u16),
    CallSucceeded(CallResult),
    CallFailed(CallKind, Failure),
}
