#![forbid(unsafe_code)]

//! The list-level interaction engine.
//!
//! [`SwipeList`] owns every row of a transaction list together with the
//! shared state that spans rows: the exclusivity token, the scroll lock, the
//! delete prompt and the pending remote deletes. Hosts forward raw touch
//! input per row and drive time with [`SwipeList::tick`]; the list answers
//! synchronously with what to do with the native event and what changed.
//!
//! # Invariants
//!
//! 1. At most one row is in `Dragging`, `Open` or `ConfirmingDelete`, and it
//!    is the exclusivity token holder.
//! 2. The scroll lock is engaged exactly while the token holder is mid
//!    horizontal swipe or revealed.
//! 3. A row leaves the rendered list only after its remote delete succeeded
//!    and its exit animation finished. An emptied date group leaves at the
//!    same instant as its last row.
//! 4. Each successful deletion emits exactly one `RowDeleted`; each failed one
//!    exactly one `DeleteFailed`.
//!
//! # Failure Modes
//!
//! - Touches on unknown rows are errors; touches the current state cannot
//!   accept (prompt showing, row deleting) are reported as ignored.
//! - Remote failures never surface as `Err`: they roll the row back.
//! - Dropping the list releases the scroll lock even if a row was mid-drag.

use ahash::{AHashMap, AHashSet};
use chrono::NaiveDate;
use web_time::{Duration, Instant};

use swipekit_core::{GestureAxis, Point, SnapTarget, SwipeConfig, Tween};

use crate::coordinator::ExclusivityCoordinator;
use crate::delete::{
    AnimationHandle, DeleteCompletion, DeletePrompt, DeleteRequest, DeleteResolution,
    DeleteTicket, PendingDelete, PromptResolution,
};
use crate::error::{Result, SwipeError};
use crate::events::{DeletedRow, EventBus, ListEvent, SubscriptionId};
use crate::groups::{DateGroup, DateGroups};
use crate::model::{RowId, Transaction};
use crate::row::{GestureEnd, InteractionState, RowPhase, RowView, SwipeRow, TouchTarget};
use crate::scroll_lock::{ScrollContainer, ScrollLockManager};

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Why a touch start was not tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoredReason {
    /// The delete confirmation is modal.
    PromptShowing,
    /// The row is deleting (or gone) and does not take input.
    RowBusy(RowPhase),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchResponse {
    Tracking,
    Ignored(IgnoredReason),
}

/// What the host should do with the native touch-move event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveResponse {
    /// Call `preventDefault()`: the list owns the gesture.
    PreventDefault,
    /// Let the platform scroll.
    Native,
}

/// Result of a finished (or cancelled) gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TouchOutcome {
    /// A horizontal swipe was released and the row is snapping.
    Snapped { target: SnapTarget, duration: Duration },
    /// A closed row was tapped.
    Tapped(RowId),
    /// The delete affordance of an open row was tapped.
    PromptShown(RowId),
    /// The body of an open row was tapped and it is closing.
    Closed { duration: Duration },
    /// A vertical scroll ended.
    ScrollEnded,
    Ignored,
}

/// Rows and groups that left the rendered list during a tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub removed_rows: Vec<RowId>,
    pub removed_groups: Vec<NaiveDate>,
}

impl TickReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.removed_rows.is_empty() && self.removed_groups.is_empty()
    }
}

// ---------------------------------------------------------------------------
// SwipeList
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct SwipeList {
    config: SwipeConfig,
    rows: AHashMap<RowId, SwipeRow>,
    /// Rendered rows in display order.
    order: Vec<RowId>,
    groups: DateGroups,
    coordinator: ExclusivityCoordinator,
    scroll: ScrollLockManager,
    events: EventBus,
    prompt: Option<DeletePrompt>,
    pending: AHashMap<DeleteTicket, PendingDelete>,
    next_ticket: u64,
}

impl SwipeList {
    /// Create an empty list. Fails if `config` does not validate.
    pub fn new(config: SwipeConfig) -> Result<Self> {
        Ok(Self::build(config.validated()?.effective()))
    }

    /// Create an empty list with the default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::build(SwipeConfig::default())
    }

    fn build(config: SwipeConfig) -> Self {
        Self {
            config,
            rows: AHashMap::new(),
            order: Vec::new(),
            groups: DateGroups::new(),
            coordinator: ExclusivityCoordinator::new(),
            scroll: ScrollLockManager::new(),
            events: EventBus::new(),
            prompt: None,
            pending: AHashMap::new(),
            next_ticket: 1,
        }
    }

    /// The applied configuration (after reduced motion).
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SwipeConfig {
        &self.config
    }

    pub fn attach_scroll_container(&mut self, container: Box<dyn ScrollContainer>) {
        self.scroll.attach(container);
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&ListEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    // -----------------------------------------------------------------------
    // Data
    // -----------------------------------------------------------------------

    /// Replace the list contents with freshly fetched transactions.
    ///
    /// Every row starts `Idle`; the token, the prompt and pending deletes are
    /// dropped and scrolling is restored. Later duplicates of an id win.
    pub fn refresh(&mut self, transactions: impl IntoIterator<Item = Transaction>) {
        if !self.pending.is_empty() {
            tracing::warn!(pending = self.pending.len(), "refresh dropped pending deletes");
        }
        let mut latest: AHashMap<RowId, Transaction> = AHashMap::new();
        for tx in transactions {
            latest.insert(tx.id, tx);
        }
        let mut sorted: Vec<Transaction> = latest.into_iter().map(|(_, tx)| tx).collect();
        sorted.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| b.id.cmp(&a.id))
        });

        self.prompt = None;
        self.pending.clear();
        self.coordinator.release();
        self.order = sorted.iter().map(|tx| tx.id).collect();
        self.groups.rebuild(&sorted);
        self.rows = sorted
            .into_iter()
            .map(|tx| (tx.id, SwipeRow::new(tx, &self.config)))
            .collect();
        self.scroll.unlock();
        tracing::debug!(rows = self.order.len(), groups = self.groups.len(), "list refreshed");
    }

    // -----------------------------------------------------------------------
    // Touch input
    // -----------------------------------------------------------------------

    /// A finger went down on row `id`.
    ///
    /// The row takes the exclusivity token before any axis is known, so a
    /// previously open row starts closing immediately.
    pub fn touch_start(
        &mut self,
        id: RowId,
        pos: Point,
        target: TouchTarget,
        now: Instant,
    ) -> Result<TouchResponse> {
        let phase = self.row(id)?.phase();
        if self.prompt.is_some() {
            return Ok(TouchResponse::Ignored(IgnoredReason::PromptShowing));
        }
        if !phase.accepts_touch() {
            tracing::debug!(row = %id, phase = ?phase, "touch ignored");
            return Ok(TouchResponse::Ignored(IgnoredReason::RowBusy(phase)));
        }

        self.activate(id, now);
        self.row_mut(id)?.begin_gesture(pos, target, now)?;
        self.sync_scroll_lock();
        Ok(TouchResponse::Tracking)
    }

    pub fn touch_move(&mut self, id: RowId, pos: Point, now: Instant) -> Result<MoveResponse> {
        let row = self.row_mut(id)?;
        let latched = row.track_move(pos, now);
        let phase = row.phase();
        match latched {
            Some(GestureAxis::Horizontal) => {
                self.scroll.lock();
            }
            Some(GestureAxis::Vertical) if phase == RowPhase::Idle => {
                self.coordinator.announce_inactive(id);
            }
            _ => {}
        }
        Ok(if self.scroll.prevents_default() {
            MoveResponse::PreventDefault
        } else {
            MoveResponse::Native
        })
    }

    pub fn touch_end(&mut self, id: RowId, pos: Point, now: Instant) -> Result<TouchOutcome> {
        self.finish_gesture(id, Some(pos), now)
    }

    /// The platform cancelled the touch. Treated as a release with zero
    /// velocity at the last sampled position.
    pub fn touch_cancel(&mut self, id: RowId, now: Instant) -> Result<TouchOutcome> {
        self.finish_gesture(id, None, now)
    }

    fn finish_gesture(
        &mut self,
        id: RowId,
        pos: Option<Point>,
        now: Instant,
    ) -> Result<TouchOutcome> {
        let row = self.row_mut(id)?;
        let end = row.end_gesture(pos, now);
        let phase = row.phase();

        let outcome = match end {
            GestureEnd::Snapped { target, duration } => {
                match target {
                    SnapTarget::Open => self.activate(id, now),
                    SnapTarget::Closed => {
                        self.coordinator.announce_inactive(id);
                    }
                }
                TouchOutcome::Snapped { target, duration }
            }
            GestureEnd::Tap(target) => match (phase, target) {
                (RowPhase::Open, TouchTarget::DeleteAction) => {
                    self.show_delete_prompt(id, now)?;
                    TouchOutcome::PromptShown(id)
                }
                (RowPhase::Open, TouchTarget::Body) => {
                    let duration = self.row_mut(id)?.force_close(now);
                    self.coordinator.announce_inactive(id);
                    TouchOutcome::Closed { duration }
                }
                _ => {
                    self.coordinator.announce_inactive(id);
                    self.events.emit(ListEvent::RowTapped(id));
                    TouchOutcome::Tapped(id)
                }
            },
            GestureEnd::ScrollEnded => {
                if phase == RowPhase::Idle {
                    self.coordinator.announce_inactive(id);
                }
                TouchOutcome::ScrollEnded
            }
            GestureEnd::Ignored => {
                if phase == RowPhase::Idle {
                    self.coordinator.announce_inactive(id);
                }
                TouchOutcome::Ignored
            }
        };
        self.sync_scroll_lock();
        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Delete pipeline
    // -----------------------------------------------------------------------

    /// Show the delete confirmation for an open row.
    pub fn show_delete_prompt(&mut self, id: RowId, now: Instant) -> Result<()> {
        if let Some(prompt) = self.prompt {
            if prompt.row == id {
                return Ok(());
            }
            return Err(SwipeError::PromptShowing(prompt.row));
        }
        self.row_mut(id)?.show_prompt()?;
        self.prompt = Some(DeletePrompt { row: id, shown_at: now });
        self.events.emit(ListEvent::DeletePrompted(id));
        tracing::debug!(row = %id, "delete prompt shown");
        Ok(())
    }

    /// Answers arriving before the guard window has passed belong to the
    /// gesture that opened the prompt.
    fn within_guard(&self, prompt: &DeletePrompt, now: Instant) -> bool {
        now.saturating_duration_since(prompt.shown_at) < self.config.delete.confirm_guard
    }

    /// Confirm the prompt: the row starts its exit at once and the returned
    /// request must be sent to the remote.
    pub fn confirm_delete(&mut self, now: Instant) -> Result<PromptResolution> {
        let prompt = self.prompt.ok_or(SwipeError::NoPrompt)?;
        if self.within_guard(&prompt, now) {
            tracing::debug!(row = %prompt.row, "confirmation inside guard window ignored");
            return Ok(PromptResolution::Ignored);
        }
        let delete = self.config.delete;
        self.row_mut(prompt.row)?
            .begin_exit(now, delete.exit_duration, delete.exit_easing)?;
        self.prompt = None;
        self.coordinator.announce_inactive(prompt.row);

        let ticket = DeleteTicket(self.next_ticket);
        self.next_ticket += 1;
        self.pending.insert(
            ticket,
            PendingDelete {
                row: prompt.row,
                issued_at: now,
            },
        );
        self.sync_scroll_lock();
        tracing::info!(row = %prompt.row, ticket = %ticket, "delete confirmed");
        Ok(PromptResolution::Confirmed(DeleteRequest {
            ticket,
            row: prompt.row,
        }))
    }

    /// Dismiss the prompt; the row stays open.
    pub fn cancel_delete(&mut self, now: Instant) -> Result<PromptResolution> {
        let prompt = self.prompt.ok_or(SwipeError::NoPrompt)?;
        if self.within_guard(&prompt, now) {
            return Ok(PromptResolution::Ignored);
        }
        self.row_mut(prompt.row)?.cancel_prompt()?;
        self.prompt = None;
        tracing::debug!(row = %prompt.row, "delete cancelled");
        Ok(PromptResolution::Cancelled)
    }

    /// Reconcile a remote delete with the optimistic exit.
    pub fn complete_delete(
        &mut self,
        completion: DeleteCompletion,
        now: Instant,
    ) -> Result<DeleteResolution> {
        let pending = self
            .pending
            .remove(&completion.ticket)
            .ok_or(SwipeError::StaleTicket(completion.ticket))?;
        let id = pending.row;
        let elapsed = now.saturating_duration_since(pending.issued_at);

        match completion.outcome {
            Ok(()) => {
                let row = self.row_mut(id)?;
                row.confirm_remote();
                let exit = row.exit_tween().copied();
                let removes_at = match exit {
                    Some(_) if row.is_ready_for_removal(now) => now,
                    Some(tween) => tween.ends_at(),
                    None => now,
                };
                let tx = row.transaction().clone();

                let mut group_collapsed = None;
                if self.groups.revoke(&tx) == Some(0) {
                    let anchor = self.latest_exit_in(tx.date, now).or(exit);
                    self.retire_group(tx.date, anchor);
                    group_collapsed = Some(tx.date);
                }
                tracing::info!(row = %id, elapsed = ?elapsed, "row deleted");
                self.events.emit(ListEvent::RowDeleted(DeletedRow::from(&tx)));
                Ok(DeleteResolution::Deleted {
                    row: id,
                    removes_at,
                    group_collapsed,
                })
            }
            Err(error) => {
                self.row_mut(id)?.roll_back(now)?;
                if let Some(prompt) = self.prompt.filter(|p| p.row != id) {
                    self.prompt = None;
                    self.row_mut(prompt.row)?.cancel_prompt()?;
                    tracing::debug!(row = %prompt.row, "delete prompt dismissed by rollback");
                }
                self.activate(id, now);
                self.sync_scroll_lock();
                tracing::warn!(row = %id, error = %error, elapsed = ?elapsed, "delete rolled back");
                self.events.emit(ListEvent::DeleteFailed {
                    id,
                    error: error.clone(),
                });
                Ok(DeleteResolution::RolledBack { row: id, error })
            }
        }
    }

    /// The exit that leaves the screen last among rendered rows of `date`.
    fn latest_exit_in(&self, date: NaiveDate, now: Instant) -> Option<Tween> {
        self.order
            .iter()
            .filter_map(|id| self.rows.get(id))
            .filter(|row| row.transaction().date == date && row.exit_in_flight(now))
            .filter_map(|row| row.exit_tween().copied())
            .max_by_key(Tween::ends_at)
    }

    /// Collapse an emptied group in step with `anchor`, or drop it at once
    /// when no exit is left to follow.
    fn retire_group(&mut self, date: NaiveDate, anchor: Option<Tween>) {
        match anchor {
            Some(exit) => {
                let collapse =
                    Tween::new(1.0, 0.0, exit.started_at(), exit.duration(), exit.easing());
                if self.groups.begin_collapse(date, collapse) {
                    tracing::info!(date = %date, ends_at = ?exit.ends_at(), "date group emptied");
                    self.events.emit(ListEvent::GroupEmptied {
                        date,
                        collapse: exit.duration(),
                    });
                }
            }
            None => {
                if self.groups.drop_empty(date) {
                    tracing::info!(date = %date, "date group removed");
                    self.events.emit(ListEvent::GroupRemoved(date));
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------------

    /// Settle finished animations and drop rows and groups whose exit has
    /// completed at `now`.
    pub fn tick(&mut self, now: Instant) -> TickReport {
        for row in self.rows.values_mut() {
            row.tick(now);
        }

        let mut report = TickReport::default();
        let ready: AHashSet<RowId> = self
            .order
            .iter()
            .copied()
            .filter(|id| self.rows.get(id).is_some_and(|r| r.is_ready_for_removal(now)))
            .collect();
        if !ready.is_empty() {
            self.order.retain(|id| !ready.contains(id));
            report.removed_rows = self.order_of(&ready);
            for id in &report.removed_rows {
                if let Some(row) = self.rows.get_mut(id) {
                    row.mark_removed();
                }
                tracing::info!(row = %id, "row removed");
                self.events.emit(ListEvent::RowRemoved(*id));
            }
        }

        report.removed_groups = self.groups.drop_collapsed(now);
        for date in &report.removed_groups {
            tracing::info!(date = %date, "date group removed");
            self.events.emit(ListEvent::GroupRemoved(*date));
        }
        report
    }

    /// Deterministic order for a set of removed ids.
    fn order_of(&self, ids: &AHashSet<RowId>) -> Vec<RowId> {
        let mut sorted: Vec<RowId> = ids.iter().copied().collect();
        sorted.sort_by_key(|id| {
            self.rows
                .get(id)
                .map(|r| std::cmp::Reverse((r.transaction().date, r.transaction().created_at, *id)))
        });
        sorted
    }

    /// The host's animation primitive reported that `handle` finished.
    pub fn animation_finished(
        &mut self,
        handle: AnimationHandle,
        now: Instant,
    ) -> Result<TickReport> {
        match handle {
            AnimationHandle::RowSnap(id) => {
                self.row_mut(id)?.finish_snap();
            }
            AnimationHandle::RowExit(id) => {
                self.row_mut(id)?.finish_exit();
            }
            AnimationHandle::GroupCollapse(date) => {
                self.groups.finish_collapse(date);
            }
        }
        Ok(self.tick(now))
    }

    // -----------------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------------

    /// The host unmounted row `id`. Releases whatever the row held,
    /// whatever its phase.
    pub fn unmount_row(&mut self, id: RowId, now: Instant) -> bool {
        let Some(mut row) = self.rows.remove(&id) else {
            return false;
        };
        row.abandon();
        self.order.retain(|other| *other != id);
        if row.phase() != RowPhase::Removed {
            let date = row.transaction().date;
            if self.groups.revoke(row.transaction()) == Some(0) {
                let anchor = self.latest_exit_in(date, now);
                self.retire_group(date, anchor);
            }
        }
        if self.prompt.is_some_and(|p| p.row == id) {
            self.prompt = None;
        }
        self.pending.retain(|_, p| p.row != id);
        if self.coordinator.announce_inactive(id) {
            tracing::warn!(row = %id, phase = ?row.phase(), "unmounted row released the token");
        }
        self.sync_scroll_lock();
        true
    }

    /// Release every shared resource. Called on drop.
    pub fn teardown(&mut self) {
        for row in self.rows.values_mut() {
            row.abandon();
        }
        self.prompt = None;
        self.pending.clear();
        if let Some(holder) = self.coordinator.release() {
            tracing::warn!(row = %holder, "teardown released the token");
        }
        self.scroll.release_on_teardown();
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn interaction(&self, id: RowId, now: Instant) -> Result<InteractionState> {
        Ok(self.row(id)?.interaction(now))
    }

    /// Rendered rows in display order, including rows mid-exit.
    #[must_use]
    pub fn rows(&self, now: Instant) -> Vec<RowView<'_>> {
        self.order
            .iter()
            .filter_map(|id| self.rows.get(id))
            .map(|row| Self::view(row, now))
            .collect()
    }

    /// Rendered rows of one date group.
    #[must_use]
    pub fn rows_in_group(&self, date: NaiveDate, now: Instant) -> Vec<RowView<'_>> {
        self.order
            .iter()
            .filter_map(|id| self.rows.get(id))
            .filter(|row| row.transaction().date == date)
            .map(|row| Self::view(row, now))
            .collect()
    }

    fn view(row: &SwipeRow, now: Instant) -> RowView<'_> {
        RowView {
            transaction: row.transaction(),
            interaction: row.interaction(now),
            visibility: row.visibility_at(now),
        }
    }

    /// Rendered date groups, newest first.
    pub fn groups(&self) -> impl Iterator<Item = &DateGroup> {
        self.groups.iter()
    }

    #[must_use]
    pub fn group(&self, date: NaiveDate) -> Option<&DateGroup> {
        self.groups.iter().find(|g| g.date() == date)
    }

    /// Current exclusivity token holder.
    #[inline]
    #[must_use]
    pub fn active_row(&self) -> Option<RowId> {
        self.coordinator.holder()
    }

    #[inline]
    #[must_use]
    pub fn is_scroll_locked(&self) -> bool {
        self.scroll.is_locked()
    }

    #[inline]
    #[must_use]
    pub fn prompt(&self) -> Option<&DeletePrompt> {
        self.prompt.as_ref()
    }

    /// Deletes awaiting their remote completion, oldest first.
    #[must_use]
    pub fn pending_deletes(&self) -> Vec<DeleteRequest> {
        let mut requests: Vec<DeleteRequest> = self
            .pending
            .iter()
            .map(|(ticket, p)| DeleteRequest {
                ticket: *ticket,
                row: p.row,
            })
            .collect();
        requests.sort_by_key(|r| r.ticket);
        requests
    }

    /// The exit (or restore) tween of a row, if one is running.
    #[must_use]
    pub fn row_exit(&self, id: RowId) -> Option<Tween> {
        self.rows.get(&id).and_then(|r| r.exit_tween().copied())
    }

    /// Number of rendered rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Whether `id` is still rendered.
    #[must_use]
    pub fn contains(&self, id: RowId) -> bool {
        self.order.contains(&id)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn row(&self, id: RowId) -> Result<&SwipeRow> {
        self.rows.get(&id).ok_or(SwipeError::UnknownRow(id))
    }

    fn row_mut(&mut self, id: RowId) -> Result<&mut SwipeRow> {
        self.rows.get_mut(&id).ok_or(SwipeError::UnknownRow(id))
    }

    /// Hand the token to `id`, force-closing the previous holder first.
    fn activate(&mut self, id: RowId, now: Instant) {
        let rows = &mut self.rows;
        let changed = self.coordinator.announce_active(id, |previous| {
            if let Some(row) = rows.get_mut(&previous) {
                row.force_close(now);
            }
        });
        if changed {
            self.events.emit(ListEvent::RowActivated(id));
        }
    }

    fn sync_scroll_lock(&mut self) {
        let held = self
            .coordinator
            .holder()
            .and_then(|id| self.rows.get(&id))
            .is_some_and(SwipeRow::holds_scroll);
        if held {
            self.scroll.lock();
        } else {
            self.scroll.unlock();
        }
    }
}

impl Drop for SwipeList {
    fn drop(&mut self) {
        self.teardown();
    }
}
