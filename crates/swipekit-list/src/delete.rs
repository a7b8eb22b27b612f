#![forbid(unsafe_code)]

//! Delete pipeline types: confirmation prompt, tickets, and the remote seam.
//!
//! Deletion is optimistic. Confirming the prompt immediately starts the row's
//! exit and hands the host a [`DeleteRequest`]. The host runs the remote call
//! (usually through [`dispatch_delete`]) and reports back a
//! [`DeleteCompletion`] carrying the same ticket. The list then either
//! commits the removal or reverses the exit and reopens the row.
//!
//! # Failure Modes
//!
//! - A completion whose ticket is not pending (already resolved, or the row
//!   was refreshed away) is rejected with `SwipeError::StaleTicket`.
//! - A failed remote call never removes the row.

use std::fmt;

use async_trait::async_trait;
use chrono::NaiveDate;
use web_time::Instant;

use crate::error::RemoteError;
use crate::model::RowId;

/// Correlates a confirmed delete with its remote completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeleteTicket(pub(crate) u64);

impl fmt::Display for DeleteTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The modal confirmation currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletePrompt {
    pub row: RowId,
    pub shown_at: Instant,
}

/// A confirmed delete the host must send to the data API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteRequest {
    pub ticket: DeleteTicket,
    pub row: RowId,
}

/// Result of answering the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptResolution {
    /// The answer arrived inside the guard window and was dropped.
    Ignored,
    /// The prompt was dismissed; the row stays open.
    Cancelled,
    /// The row started its exit; run the request remotely.
    Confirmed(DeleteRequest),
}

/// Outcome of a remote delete, fed back to the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteCompletion {
    pub ticket: DeleteTicket,
    pub outcome: Result<(), RemoteError>,
}

impl DeleteCompletion {
    #[must_use]
    pub fn succeeded(ticket: DeleteTicket) -> Self {
        Self {
            ticket,
            outcome: Ok(()),
        }
    }

    #[must_use]
    pub fn failed(ticket: DeleteTicket, error: RemoteError) -> Self {
        Self {
            ticket,
            outcome: Err(error),
        }
    }
}

/// What the list did with a completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteResolution {
    /// Committed. The row (and `group_collapsed`, if its group emptied)
    /// leaves the rendered list at `removes_at`.
    Deleted {
        row: RowId,
        removes_at: Instant,
        group_collapsed: Option<NaiveDate>,
    },
    /// Reverted. The row is open again and still listed.
    RolledBack { row: RowId, error: RemoteError },
}

/// Identifies an animation for end-of-animation callbacks from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimationHandle {
    RowSnap(RowId),
    RowExit(RowId),
    GroupCollapse(NaiveDate),
}

/// Remote data API seam.
#[async_trait(?Send)]
pub trait RowRemote {
    async fn delete_row(&self, id: RowId) -> Result<(), RemoteError>;
}

/// Run a confirmed request against the remote and package the outcome.
pub async fn dispatch_delete<R: RowRemote + ?Sized>(
    remote: &R,
    request: DeleteRequest,
) -> DeleteCompletion {
    tracing::debug!(row = %request.row, ticket = %request.ticket, "dispatching remote delete");
    let outcome = remote.delete_row(request.row).await;
    if let Err(err) = &outcome {
        tracing::warn!(row = %request.row, error = %err, "remote delete failed");
    }
    DeleteCompletion {
        ticket: request.ticket,
        outcome,
    }
}

/// A delete awaiting its completion.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PendingDelete {
    pub(crate) row: RowId,
    pub(crate) issued_at: Instant,
}
