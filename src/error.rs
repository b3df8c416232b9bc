use thiserror::Error;

use crate::llm::GenerationError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No home directory")]
    NoHomeDir,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    GitCommand(String),

    #[error("No upstream branch configured: {0}")]
    NoUpstream(String),

    #[error("{0}")]
    Forge(String),

    #[error("origin is not GitHub (found: {0}). Only GitHub repositories are supported for PR creation")]
    UnsupportedForge(String),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("{0} environment variable not set")]
    MissingApiKey(&'static str),

    #[error("Task join error: {0}")]
    TaskJoin(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// How the workflow reacts to a failed external call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Ends the session with the message shown as-is.
    Fatal,
    /// Offers retry, manual entry and (for PRs) skip.
    Retryable,
    /// Push was rejected because the branch has no upstream.
    MissingUpstream,
}

/// A classified error, ready to be carried back into the workflow engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Fatal,
            message: message.into(),
        }
    }

    pub fn retryable(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Retryable,
            message: message.into(),
        }
    }
}

impl Error {
    /// Single place deciding whether an error is fatal or recoverable.
    pub fn classify(&self) -> Failure {
        let kind = match self {
            Error::Generation(_) => FailureKind::Retryable,
            Error::NoUpstream(_) => FailureKind::MissingUpstream,
            _ => FailureKind::Fatal,
        };
        Failure {
            kind,
            message: self.to_string(),
        }
    }
}
