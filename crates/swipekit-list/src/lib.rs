// Forbid unsafe in production; deny in tests.
#![cfg_attr(not(test), forbid(unsafe_code))]
#![cfg_attr(test, deny(unsafe_code))]

//! List-level interaction engine for swipe-to-delete transaction rows.
//!
//! # Role in swipekit
//! `swipekit-list` owns everything that spans more than one row: which row is
//! allowed to be open, whether the page may scroll, the delete confirmation
//! and its optimistic removal, and the date groups rows are rendered in.
//!
//! # Primary responsibilities
//! - **SwipeList**: routes touch input to rows and enforces the list-wide
//!   rules. The single entry point hosts talk to.
//! - **ExclusivityCoordinator**: at most one row open or mid-drag.
//! - **ScrollLockManager**: suspends ancestor scrolling during horizontal
//!   drags and while a row is open.
//! - **Delete pipeline**: prompt, optimistic exit, remote reconciliation and
//!   the synchronized collapse of emptied date groups.
//! - **EventBus**: one-way notifications for collaborators (totals, analytics).
//!
//! # Scheduling model
//! Single-threaded and host-driven. Every entry point takes the host clock
//! (`now`) and returns synchronously; the only asynchronous step is the remote
//! delete, which the host runs (see [`delete::dispatch_delete`]) and feeds
//! back through [`SwipeList::complete_delete`].

pub mod coordinator;
pub mod delete;
pub mod error;
pub mod events;
pub mod groups;
pub mod list;
pub mod model;
pub mod row;
pub mod scroll_lock;

pub use coordinator::ExclusivityCoordinator;
pub use delete::{
    AnimationHandle, DeleteCompletion, DeletePrompt, DeleteRequest, DeleteResolution,
    DeleteTicket, PromptResolution, RowRemote, dispatch_delete,
};
pub use error::{RemoteError, Result, SwipeError};
pub use events::{DeletedRow, EventBus, ListEvent, SubscriptionId};
pub use groups::{DateGroup, DateGroups};
pub use list::{
    IgnoredReason, MoveResponse, SwipeList, TickReport, TouchOutcome, TouchResponse,
};
pub use model::{RowId, Transaction, TransactionKind};
pub use row::{InteractionState, RowPhase, RowView, TouchTarget};
pub use scroll_lock::{ScrollContainer, ScrollFlag, ScrollLockManager};

pub use swipekit_core::{Point, SnapTarget, SwipeConfig};
