#![forbid(unsafe_code)]

//! Per-row interaction state machine.
//!
//! ```text
//!            H latch               release
//!   Idle ───────────► Dragging ─────────────► Open ──tap delete──► ConfirmingDelete
//!    ▲ ◄──────────────── │ ◄── H latch ────── │ ◄──────cancel──────── │
//!    │    release closed      force close     │                       │ confirm
//!    └────────────────────────────────────────┘                       ▼
//!                                             Open ◄──failure──── Deleting ──success──► Removed
//! ```
//!
//! A row owns its [`GestureTracker`] and [`DragController`]; list-wide rules
//! (exclusivity, scroll lock, the prompt) live in [`crate::list::SwipeList`].
//!
//! # Invariants
//!
//! 1. The offset is within `[-delete_threshold, 0]` in every phase.
//! 2. `ConfirmingDelete` is reachable only from `Open`.
//! 3. `Removed` is reachable only from `Deleting`, after the remote delete was
//!    confirmed and the exit animation finished.
//! 4. `Deleting` and `Removed` rows ignore touch input.

use web_time::{Duration, Instant};

use swipekit_core::{
    DragController, Easing, GestureAxis, GestureSignal, GestureTracker, Point, SnapTarget,
    SwipeConfig, TouchEvent, Tween,
};

use crate::error::{Result, SwipeError};
use crate::model::{RowId, Transaction};

/// Lifecycle phase of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RowPhase {
    #[default]
    Idle,
    Dragging,
    Open,
    ConfirmingDelete,
    Deleting,
    Removed,
}

impl RowPhase {
    /// Phases that hold the exclusivity token.
    #[inline]
    #[must_use]
    pub fn is_engaged(self) -> bool {
        matches!(self, Self::Dragging | Self::Open | Self::ConfirmingDelete)
    }

    /// Phases in which a new touch is accepted.
    #[inline]
    #[must_use]
    pub fn accepts_touch(self) -> bool {
        matches!(self, Self::Idle | Self::Dragging | Self::Open)
    }
}

/// Hit target of a touch within a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TouchTarget {
    /// The sliding row content.
    #[default]
    Body,
    /// The revealed delete affordance behind the content.
    DeleteAction,
}

/// Snapshot of a row's transient interaction state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionState {
    pub phase: RowPhase,
    pub offset_x: f32,
    pub is_animating: bool,
    pub gesture_axis: Option<GestureAxis>,
}

/// A row as the host should render it at some instant.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    pub transaction: &'a Transaction,
    pub interaction: InteractionState,
    /// Opacity/height factor of the exit animation, 1.0 when not exiting.
    pub visibility: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ExitMotion {
    Collapsing { tween: Tween, finished: bool },
    Restoring(Tween),
}

/// How a gesture ended, from the row's point of view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum GestureEnd {
    Snapped { target: SnapTarget, duration: Duration },
    Tap(TouchTarget),
    ScrollEnded,
    Ignored,
}

#[derive(Debug, Clone)]
pub(crate) struct SwipeRow {
    transaction: Transaction,
    phase: RowPhase,
    tracker: GestureTracker,
    drag: DragController,
    touch_target: TouchTarget,
    was_open: bool,
    exit: Option<ExitMotion>,
    remote_confirmed: bool,
}

impl SwipeRow {
    pub(crate) fn new(transaction: Transaction, config: &SwipeConfig) -> Self {
        Self {
            transaction,
            phase: RowPhase::Idle,
            tracker: GestureTracker::new(config.gesture),
            drag: DragController::new(config.drag),
            touch_target: TouchTarget::Body,
            was_open: false,
            exit: None,
            remote_confirmed: false,
        }
    }

    #[inline]
    pub(crate) fn id(&self) -> RowId {
        self.transaction.id
    }

    #[inline]
    pub(crate) fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    #[inline]
    pub(crate) fn phase(&self) -> RowPhase {
        self.phase
    }

    /// Whether this row requires the page scroll to be suspended.
    pub(crate) fn holds_scroll(&self) -> bool {
        self.tracker.is_swiping() || self.phase.is_engaged()
    }

    pub(crate) fn interaction(&self, now: Instant) -> InteractionState {
        InteractionState {
            phase: self.phase,
            offset_x: self.drag.offset_at(now),
            is_animating: self.drag.animation().is_some_and(|t| !t.is_complete_at(now))
                || self.exit_in_flight(now),
            gesture_axis: self.tracker.axis(),
        }
    }

    pub(crate) fn visibility_at(&self, now: Instant) -> f64 {
        match self.exit {
            Some(ExitMotion::Collapsing { finished: true, .. }) => 0.0,
            Some(ExitMotion::Collapsing { tween, .. }) | Some(ExitMotion::Restoring(tween)) => {
                tween.value_at(now).clamp(0.0, 1.0)
            }
            None if self.phase == RowPhase::Removed => 0.0,
            None => 1.0,
        }
    }

    /// The exit (or restore) tween currently driving visibility.
    pub(crate) fn exit_tween(&self) -> Option<&Tween> {
        match &self.exit {
            Some(ExitMotion::Collapsing { tween, .. }) | Some(ExitMotion::Restoring(tween)) => {
                Some(tween)
            }
            None => None,
        }
    }

    pub(crate) fn exit_in_flight(&self, now: Instant) -> bool {
        match self.exit {
            Some(ExitMotion::Collapsing { tween, finished }) => {
                !finished && !tween.is_complete_at(now)
            }
            Some(ExitMotion::Restoring(tween)) => !tween.is_complete_at(now),
            None => false,
        }
    }

    // -----------------------------------------------------------------------
    // Gesture
    // -----------------------------------------------------------------------

    /// Start tracking a touch. Interrupts any in-flight snap.
    pub(crate) fn begin_gesture(
        &mut self,
        pos: Point,
        target: TouchTarget,
        now: Instant,
    ) -> Result<()> {
        if !self.phase.accepts_touch() {
            return Err(SwipeError::invalid(self.id(), self.phase, "start a gesture"));
        }
        if self.drag.grab(now) {
            tracing::debug!(row = %self.id(), offset = self.drag.offset_at(now), "snap taken over");
        }
        if self.phase == RowPhase::Dragging {
            // A second touch restarts an unfinished swipe from where it is.
            self.phase = RowPhase::Idle;
        }
        self.was_open = self.phase == RowPhase::Open;
        self.touch_target = target;
        self.tracker.process(&TouchEvent::Start(pos), now);
        Ok(())
    }

    /// Feed a move sample. Returns the axis latched by this sample, if any.
    pub(crate) fn track_move(&mut self, pos: Point, now: Instant) -> Option<GestureAxis> {
        if !self.phase.accepts_touch() || !self.tracker.is_tracking() {
            return None;
        }
        let mut latched = None;
        for signal in self.tracker.process(&TouchEvent::Move(pos), now) {
            match signal {
                GestureSignal::Latched(axis) => {
                    if axis == GestureAxis::Horizontal {
                        self.phase = RowPhase::Dragging;
                    }
                    latched = Some(axis);
                }
                GestureSignal::Drag { delta_x, .. } => {
                    self.drag.drag_to(delta_x);
                }
                _ => {}
            }
        }
        latched
    }

    /// Finish the gesture. `pos` is `None` when the platform cancelled it.
    pub(crate) fn end_gesture(&mut self, pos: Option<Point>, now: Instant) -> GestureEnd {
        if !self.phase.accepts_touch() || !self.tracker.is_tracking() {
            return GestureEnd::Ignored;
        }
        let event = match pos {
            Some(pos) => TouchEvent::End(pos),
            None => TouchEvent::Cancel,
        };
        let signals = self.tracker.process(&event, now);
        for signal in signals {
            match signal {
                GestureSignal::Released(info) => {
                    let (target, duration) = self.drag.release(self.was_open, &info, now);
                    self.phase = match target {
                        SnapTarget::Open => RowPhase::Open,
                        SnapTarget::Closed => RowPhase::Idle,
                    };
                    return GestureEnd::Snapped { target, duration };
                }
                GestureSignal::ScrollEnded => {
                    self.resume_rest(now);
                    return GestureEnd::ScrollEnded;
                }
                GestureSignal::Tap { .. } => {
                    self.resume_rest(now);
                    return GestureEnd::Tap(self.touch_target);
                }
                _ => {}
            }
        }
        self.resume_rest(now);
        GestureEnd::Ignored
    }

    /// Re-animate to the phase's resting offset after a gesture that did
    /// not move the row (tap, scroll, undecided cancel) interrupted a snap.
    fn resume_rest(&mut self, now: Instant) -> Duration {
        let rest = match self.phase {
            RowPhase::Open | RowPhase::ConfirmingDelete => {
                SnapTarget::Open.offset(self.drag.delete_threshold())
            }
            _ => SnapTarget::Closed.offset(self.drag.delete_threshold()),
        };
        self.drag.animate_to(rest, now)
    }

    // -----------------------------------------------------------------------
    // Forced transitions
    // -----------------------------------------------------------------------

    /// Animate closed with the regular snap curve. No-op outside
    /// `Idle`/`Dragging`/`Open`.
    pub(crate) fn force_close(&mut self, now: Instant) -> Duration {
        if !self.phase.accepts_touch() {
            return Duration::ZERO;
        }
        self.tracker.reset();
        self.phase = RowPhase::Idle;
        let duration = self.drag.animate_to(0.0, now);
        tracing::debug!(row = %self.id(), duration = ?duration, "row force-closed");
        duration
    }

    pub(crate) fn show_prompt(&mut self) -> Result<()> {
        if self.phase != RowPhase::Open {
            return Err(SwipeError::invalid(self.id(), self.phase, "show the delete prompt"));
        }
        self.phase = RowPhase::ConfirmingDelete;
        Ok(())
    }

    /// Dismiss the prompt; the row stays revealed.
    pub(crate) fn cancel_prompt(&mut self) -> Result<()> {
        if self.phase != RowPhase::ConfirmingDelete {
            return Err(SwipeError::invalid(self.id(), self.phase, "cancel the delete prompt"));
        }
        self.phase = RowPhase::Open;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Delete
    // -----------------------------------------------------------------------

    /// Start the optimistic exit. Returns the exit tween (visibility 1 → 0).
    pub(crate) fn begin_exit(
        &mut self,
        now: Instant,
        duration: Duration,
        easing: Easing,
    ) -> Result<Tween> {
        if self.phase != RowPhase::ConfirmingDelete {
            return Err(SwipeError::invalid(self.id(), self.phase, "start deleting"));
        }
        self.phase = RowPhase::Deleting;
        self.tracker.reset();
        self.drag.jump_to(0.0);
        self.remote_confirmed = false;
        let tween = Tween::new(1.0, 0.0, now, duration, easing);
        self.exit = Some(ExitMotion::Collapsing {
            tween,
            finished: false,
        });
        Ok(tween)
    }

    pub(crate) fn confirm_remote(&mut self) {
        self.remote_confirmed = true;
    }

    /// Reverse the exit and reopen the row after a failed remote delete.
    pub(crate) fn roll_back(&mut self, now: Instant) -> Result<()> {
        if self.phase != RowPhase::Deleting {
            return Err(SwipeError::invalid(self.id(), self.phase, "roll back"));
        }
        self.exit = match self.exit {
            Some(ExitMotion::Collapsing {
                tween,
                finished: false,
            }) => Some(ExitMotion::Restoring(tween.reversed_at(now))),
            Some(ExitMotion::Collapsing { tween, .. }) => Some(ExitMotion::Restoring(Tween::new(
                0.0,
                1.0,
                now,
                tween.duration(),
                tween.easing(),
            ))),
            other => other,
        };
        self.phase = RowPhase::Open;
        self.remote_confirmed = false;
        self.drag
            .jump_to(SnapTarget::Open.offset(self.drag.delete_threshold()));
        Ok(())
    }

    /// Mark the exit animation as finished (animation-end callback).
    pub(crate) fn finish_exit(&mut self) -> bool {
        match &mut self.exit {
            Some(ExitMotion::Collapsing { finished, .. }) if !*finished => {
                *finished = true;
                true
            }
            _ => false,
        }
    }

    /// Complete the in-flight snap (animation-end callback).
    pub(crate) fn finish_snap(&mut self) -> bool {
        let was = self.drag.is_animating();
        self.drag.finish_animation();
        was
    }

    /// Advance clock-driven bookkeeping.
    pub(crate) fn tick(&mut self, now: Instant) {
        self.drag.settle(now);
        if let Some(ExitMotion::Restoring(tween)) = self.exit {
            if tween.is_complete_at(now) {
                self.exit = None;
            }
        }
    }

    pub(crate) fn is_ready_for_removal(&self, now: Instant) -> bool {
        self.phase == RowPhase::Deleting
            && self.remote_confirmed
            && matches!(
                self.exit,
                Some(ExitMotion::Collapsing { tween, finished })
                    if finished || tween.is_complete_at(now)
            )
    }

    pub(crate) fn mark_removed(&mut self) {
        self.phase = RowPhase::Removed;
        self.exit = None;
        self.tracker.reset();
    }

    /// Unconditional cleanup: drop gesture state and any animation.
    pub(crate) fn abandon(&mut self) {
        self.tracker.reset();
        self.drag.finish_animation();
    }
}
