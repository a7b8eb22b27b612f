#![forbid(unsafe_code)]

use thiserror::Error;

use swipekit_core::ConfigError;

use crate::delete::DeleteTicket;
use crate::model::RowId;
use crate::row::RowPhase;

pub type Result<T> = std::result::Result<T, SwipeError>;

#[derive(Debug, Error)]
pub enum SwipeError {
    #[error("unknown row: {0}")]
    UnknownRow(RowId),

    #[error("row {row} cannot {action} while {phase:?}")]
    InvalidTransition {
        row: RowId,
        phase: RowPhase,
        action: &'static str,
    },

    #[error("no delete confirmation is showing")]
    NoPrompt,

    #[error("delete confirmation already showing for row {0}")]
    PromptShowing(RowId),

    #[error("delete ticket {0} is not pending")]
    StaleTicket(DeleteTicket),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SwipeError {
    #[must_use]
    pub fn invalid(row: RowId, phase: RowPhase, action: &'static str) -> Self {
        Self::InvalidTransition { row, phase, action }
    }
}

/// Failure reported by the remote delete operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("remote delete failed: {message}")]
pub struct RemoteError {
    message: String,
}

impl RemoteError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Text shown to the user in the transient failure indication.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}
