#![forbid(unsafe_code)]

//! Exclusivity coordination: at most one row open or mid-drag.
//!
//! The coordinator holds the exclusivity token. It never touches rows itself;
//! when a new row announces activity, the coordinator hands the previous
//! holder to a caller-supplied close callback and only then accepts the new
//! holder, so the handoff is ordered.
//!
//! # Invariants
//!
//! 1. The token names at most one row.
//! 2. `announce_active` runs the close callback for the previous holder, if it
//!    differs from the new one, strictly before the token changes.
//! 3. `announce_inactive` clears the token only for its current holder.

use crate::model::RowId;

#[derive(Debug, Default)]
pub struct ExclusivityCoordinator {
    token: Option<RowId>,
}

impl ExclusivityCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current token holder.
    #[inline]
    #[must_use]
    pub fn holder(&self) -> Option<RowId> {
        self.token
    }

    #[inline]
    #[must_use]
    pub fn is_holder(&self, row: RowId) -> bool {
        self.token == Some(row)
    }

    /// Give the token to `row`, force-closing the previous holder first.
    ///
    /// Returns `true` if the token changed hands.
    pub fn announce_active(&mut self, row: RowId, force_close: impl FnOnce(RowId)) -> bool {
        match self.token {
            Some(current) if current == row => false,
            Some(previous) => {
                tracing::debug!(previous = %previous, next = %row, "exclusivity handoff");
                force_close(previous);
                self.token = Some(row);
                true
            }
            None => {
                self.token = Some(row);
                true
            }
        }
    }

    /// Clear the token if `row` holds it. Returns `true` if it was cleared.
    pub fn announce_inactive(&mut self, row: RowId) -> bool {
        if self.token == Some(row) {
            self.token = None;
            true
        } else {
            false
        }
    }

    /// Drop the token regardless of holder (refresh and teardown).
    pub fn release(&mut self) -> Option<RowId> {
        self.token.take()
    }
}
