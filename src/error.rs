use thiserror::Error;

use crate::models::session::Phase;

/// Failures of the remote collaborators, translated at the service boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("exam content unavailable: {0}")]
    ContentUnavailable(String),
    #[error("remaining time unavailable: {0}")]
    TimeUnavailable(String),
    #[error("submission failed: {0}")]
    SubmissionFailed(String),
}

/// A UI command that cannot be applied in the current state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("session is {0}, not in progress")]
    NotInProgress(Phase),
    #[error("question {0} is not part of this exam")]
    UnknownQuestion(String),
    #[error("question {0} is not the one currently displayed")]
    NotCurrentQuestion(String),
    #[error("question index {index} is outside 0..{len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("nothing to retry while {0}")]
    NothingToRetry(Phase),
}
