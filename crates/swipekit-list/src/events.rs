#![forbid(unsafe_code)]

//! One-way notifications for collaborators outside the interaction engine.
//!
//! Subscribers are plain callbacks registered on the list's [`EventBus`].
//! Delivery is synchronous, in registration order, on the caller's turn.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use web_time::Duration;

use crate::error::RemoteError;
use crate::model::{RowId, Transaction, TransactionKind};

/// Payload of a successful deletion, for aggregate displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedRow {
    pub id: RowId,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub category: String,
}

impl From<&Transaction> for DeletedRow {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: tx.id,
            kind: tx.kind,
            amount: tx.amount,
            date: tx.date,
            category: tx.category.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEvent {
    /// A row took the exclusivity token.
    RowActivated(RowId),
    /// A closed row was tapped (no drag).
    RowTapped(RowId),
    /// The delete confirmation was shown for a row.
    DeletePrompted(RowId),
    /// The remote delete succeeded. Emitted once per deletion.
    RowDeleted(DeletedRow),
    /// The remote delete failed; the row is open again.
    DeleteFailed { id: RowId, error: RemoteError },
    /// A date group lost its last row and started collapsing.
    GroupEmptied { date: NaiveDate, collapse: Duration },
    /// A row finished its exit and left the rendered list.
    RowRemoved(RowId),
    /// A group left the rendered list, after its collapse or at once when
    /// an unmount emptied it.
    GroupRemoved(NaiveDate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(&ListEvent)>;

/// Synchronous observer registry.
pub struct EventBus {
    subscribers: Vec<(SubscriptionId, Callback)>,
    next_id: u64,
    emitted: u64,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .field("emitted", &self.emitted)
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
            next_id: 1,
            emitted: 0,
        }
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&ListEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Remove a subscriber. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    pub fn emit(&mut self, event: ListEvent) {
        tracing::trace!(event = ?event, subscribers = self.subscribers.len(), "list event");
        self.emitted += 1;
        for (_, callback) in &mut self.subscribers {
            callback(&event);
        }
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Total events emitted since creation.
    #[must_use]
    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}
