#![forbid(unsafe_code)]

//! Gesture tracking: classifies a touch sequence as horizontal swipe or
//! vertical scroll.
//!
//! [`GestureTracker`] is a per-row stateful processor. It records the origin of
//! a touch, classifies the first significant movement, latches that decision
//! for the rest of the gesture, and reports release metrics when the finger
//! lifts.
//!
//! # Classification
//!
//! Evaluated on every move sample until an axis is latched:
//!
//! - **Vertical** when `|dy| > vertical_slop` and `|dy| > vertical_dominance * |dx|`.
//! - **Horizontal** when `|dx| > horizontal_slop` (and the sample is not vertical).
//! - Otherwise the gesture stays undecided.
//!
//! # Invariants
//!
//! 1. At most one [`GestureSignal::Latched`] is emitted per gesture.
//! 2. After a vertical latch, move samples produce no signals (native scroll
//!    owns the gesture).
//! 3. A gesture that ends undecided produces [`GestureSignal::Tap`] and never
//!    a drag.
//! 4. After `End`, `Cancel` or `reset()`, the tracker is idle and the latched
//!    axis is cleared.
//!
//! # Failure Modes
//!
//! - Move or end without a preceding start is ignored (no signals).
//! - Two samples with the same timestamp yield a release velocity of 0.

use serde::{Deserialize, Serialize};
use web_time::{Duration, Instant};

use crate::geometry::Point;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Slop thresholds for axis classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Horizontal travel (px) past which the gesture becomes a swipe (default: 5).
    pub horizontal_slop: f32,
    /// Vertical travel (px) past which the gesture may become a scroll (default: 10).
    pub vertical_slop: f32,
    /// How much larger `|dy|` must be than `|dx|` for a scroll (default: 1.5).
    pub vertical_dominance: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            horizontal_slop: 5.0,
            vertical_slop: 10.0,
            vertical_dominance: 1.5,
        }
    }
}

// ---------------------------------------------------------------------------
// Events and signals
// ---------------------------------------------------------------------------

/// Raw touch lifecycle input for one row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TouchEvent {
    Start(Point),
    Move(Point),
    End(Point),
    /// The platform aborted the gesture (e.g. system gesture took over).
    Cancel,
}

/// Axis latched for the current gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureAxis {
    Horizontal,
    Vertical,
}

/// Release metrics for a horizontal gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReleaseInfo {
    /// Net horizontal travel since the gesture started (positive = rightward).
    pub distance: f32,
    /// Horizontal velocity over the last sample interval, in px/s.
    pub velocity: f32,
    /// Time from touch start to the last sample.
    pub elapsed: Duration,
    /// The platform cancelled the gesture instead of the finger lifting.
    pub cancelled: bool,
}

impl ReleaseInfo {
    /// Whether the net movement was to the right.
    #[inline]
    #[must_use]
    pub fn is_rightward(&self) -> bool {
        self.distance > 0.0
    }
}

/// Signal produced by the tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureSignal {
    /// A touch started; the origin is recorded.
    Began { origin: Point },
    /// The gesture was classified. Emitted once.
    Latched(GestureAxis),
    /// Movement of a horizontal gesture, relative to the origin.
    Drag { delta_x: f32, delta_y: f32 },
    /// A horizontal gesture ended (or was cancelled).
    Released(ReleaseInfo),
    /// A vertical gesture ended. Nothing for the row to do.
    ScrollEnded,
    /// The gesture ended before any axis was latched.
    Tap { pos: Point },
}

// ---------------------------------------------------------------------------
// GestureTracker
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct Sample {
    pos: Point,
    time: Instant,
}

/// Per-row axis classifier and release-metric tracker.
#[derive(Debug, Clone)]
pub struct GestureTracker {
    config: GestureConfig,
    origin: Option<Sample>,
    previous: Option<Sample>,
    last: Option<Sample>,
    axis: Option<GestureAxis>,
}

impl GestureTracker {
    /// Create an idle tracker.
    #[must_use]
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            origin: None,
            previous: None,
            last: None,
            axis: None,
        }
    }

    /// Process one touch event, returning the signals it produced.
    pub fn process(&mut self, event: &TouchEvent, now: Instant) -> Vec<GestureSignal> {
        let mut out = Vec::with_capacity(2);
        match *event {
            TouchEvent::Start(pos) => {
                self.reset();
                let sample = Sample { pos, time: now };
                self.origin = Some(sample);
                self.last = Some(sample);
                out.push(GestureSignal::Began { origin: pos });
            }
            TouchEvent::Move(pos) => self.on_move(pos, now, &mut out),
            TouchEvent::End(pos) => self.on_end(pos, now, &mut out),
            TouchEvent::Cancel => self.on_cancel(&mut out),
        }
        out
    }

    /// Whether a touch is currently being tracked.
    #[inline]
    #[must_use]
    pub fn is_tracking(&self) -> bool {
        self.origin.is_some()
    }

    /// The latched axis of the current gesture, if any.
    #[inline]
    #[must_use]
    pub fn axis(&self) -> Option<GestureAxis> {
        self.axis
    }

    /// Whether the current gesture is a latched horizontal swipe.
    #[inline]
    #[must_use]
    pub fn is_swiping(&self) -> bool {
        self.axis == Some(GestureAxis::Horizontal)
    }

    /// Delta of the last sample relative to the origin.
    #[must_use]
    pub fn delta(&self) -> Option<(f32, f32)> {
        let origin = self.origin?;
        let last = self.last?;
        Some(last.pos.delta_from(origin.pos))
    }

    /// Drop all gesture state.
    pub fn reset(&mut self) {
        self.origin = None;
        self.previous = None;
        self.last = None;
        self.axis = None;
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: GestureConfig) {
        self.config = config;
    }

    /// Apply the classification rule to a delta.
    #[must_use]
    pub fn classify(config: &GestureConfig, delta_x: f32, delta_y: f32) -> Option<GestureAxis> {
        let (ax, ay) = (delta_x.abs(), delta_y.abs());
        if ay > config.vertical_slop && ay > config.vertical_dominance * ax {
            Some(GestureAxis::Vertical)
        } else if ax > config.horizontal_slop {
            Some(GestureAxis::Horizontal)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Internal event handlers
// ---------------------------------------------------------------------------

impl GestureTracker {
    fn push_sample(&mut self, pos: Point, now: Instant) {
        self.previous = self.last;
        self.last = Some(Sample { pos, time: now });
    }

    fn on_move(&mut self, pos: Point, now: Instant, out: &mut Vec<GestureSignal>) {
        let Some(origin) = self.origin else {
            return;
        };
        self.push_sample(pos, now);
        let (delta_x, delta_y) = pos.delta_from(origin.pos);

        match self.axis {
            None => match Self::classify(&self.config, delta_x, delta_y) {
                Some(GestureAxis::Horizontal) => {
                    tracing::debug!(delta_x, delta_y, "gesture latched horizontal");
                    self.axis = Some(GestureAxis::Horizontal);
                    out.push(GestureSignal::Latched(GestureAxis::Horizontal));
                    out.push(GestureSignal::Drag { delta_x, delta_y });
                }
                Some(GestureAxis::Vertical) => {
                    tracing::debug!(delta_x, delta_y, "gesture latched vertical");
                    self.axis = Some(GestureAxis::Vertical);
                    out.push(GestureSignal::Latched(GestureAxis::Vertical));
                }
                None => {}
            },
            Some(GestureAxis::Horizontal) => out.push(GestureSignal::Drag { delta_x, delta_y }),
            Some(GestureAxis::Vertical) => {}
        }
    }

    fn on_end(&mut self, pos: Point, now: Instant, out: &mut Vec<GestureSignal>) {
        if self.origin.is_none() {
            return;
        }
        // touchend usually repeats the last move position; only a new position
        // counts as a sample, otherwise the release velocity collapses to 0.
        if self.last.is_some_and(|last| last.pos != pos) {
            self.push_sample(pos, now);
        }
        match self.axis {
            Some(GestureAxis::Horizontal) => {
                out.push(GestureSignal::Released(self.release_info(false)));
            }
            Some(GestureAxis::Vertical) => out.push(GestureSignal::ScrollEnded),
            None => out.push(GestureSignal::Tap { pos }),
        }
        self.reset();
    }

    fn on_cancel(&mut self, out: &mut Vec<GestureSignal>) {
        match self.axis {
            Some(GestureAxis::Horizontal) => {
                out.push(GestureSignal::Released(self.release_info(true)));
            }
            Some(GestureAxis::Vertical) => out.push(GestureSignal::ScrollEnded),
            None => {}
        }
        self.reset();
    }

    fn release_info(&self, cancelled: bool) -> ReleaseInfo {
        let (Some(origin), Some(last)) = (self.origin, self.last) else {
            return ReleaseInfo {
                distance: 0.0,
                velocity: 0.0,
                elapsed: Duration::ZERO,
                cancelled,
            };
        };
        let velocity = match self.previous {
            Some(prev) if !cancelled => {
                let dt = last.time.saturating_duration_since(prev.time).as_secs_f32();
                if dt > 0.0 {
                    (last.pos.x - prev.pos.x) / dt
                } else {
                    0.0
                }
            }
            _ => 0.0,
        };
        ReleaseInfo {
            distance: last.pos.x - origin.pos.x,
            velocity,
            elapsed: last.time.saturating_duration_since(origin.time),
            cancelled,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
