#![forbid(unsafe_code)]

//! Drag position control: maps horizontal deltas to a clamped row offset and
//! snaps the row open or closed on release.
//!
//! [`DragController`] owns a row's horizontal offset. While the finger is down
//! the offset follows the finger relative to where it was grabbed; on release
//! the controller picks a [`SnapTarget`] and starts a [`Tween`] toward it whose
//! duration scales with the remaining distance.
//!
//! # Release decision
//!
//! With `t = delete_threshold`:
//!
//! - Row was open: close when the net movement was rightward or
//!   `offset > -t/2`, otherwise stay open.
//! - Row was closed: open when the net movement was not rightward and either
//!   `|offset| > t/2` or `velocity < fling_velocity`, otherwise close.
//!
//! # Invariants
//!
//! 1. The offset, sampled at any instant, is within `[-delete_threshold, 0]`.
//! 2. `grab()` cancels an in-flight snap and freezes the offset at its
//!    interpolated value; the finger then moves the row from there.
//! 3. Snap durations are within `[min_snap_duration, max_snap_duration]`,
//!    except zero-distance snaps which complete immediately.
//!
//! # Failure Modes
//!
//! - Non-positive `snap_speed` falls back to `max_snap_duration`.
//! - `min_snap_duration > max_snap_duration` resolves to `max_snap_duration`.

use serde::{Deserialize, Serialize};
use web_time::{Duration, Instant};

use crate::animation::{Easing, Tween};
use crate::gesture::ReleaseInfo;

/// Reveal width, fling and snap timing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Width (px) of the revealed delete action; also the drag range (default: 80).
    pub delete_threshold: f32,
    /// Release velocity (px/s) below which a closed row flings open (default: -500).
    pub fling_velocity: f32,
    /// Speed (px/s) used to derive snap durations from distance (default: 500).
    pub snap_speed: f32,
    /// Shortest snap (default: 150ms).
    #[serde(rename = "min_snap_ms", with = "crate::config::duration_ms")]
    pub min_snap_duration: Duration,
    /// Longest snap (default: 300ms).
    #[serde(rename = "max_snap_ms", with = "crate::config::duration_ms")]
    pub max_snap_duration: Duration,
    /// Curve shared by user snaps and forced closes.
    pub snap_easing: Easing,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            delete_threshold: 80.0,
            fling_velocity: -500.0,
            snap_speed: 500.0,
            min_snap_duration: Duration::from_millis(150),
            max_snap_duration: Duration::from_millis(300),
            snap_easing: Easing::EaseOut,
        }
    }
}

/// Where a released row settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapTarget {
    /// Offset 0; delete action hidden.
    Closed,
    /// Offset `-delete_threshold`; delete action revealed.
    Open,
}

impl SnapTarget {
    /// Offset this target corresponds to.
    #[inline]
    #[must_use]
    pub fn offset(self, delete_threshold: f32) -> f32 {
        match self {
            Self::Closed => 0.0,
            Self::Open => -delete_threshold,
        }
    }
}

/// Per-row horizontal offset owner.
#[derive(Debug, Clone)]
pub struct DragController {
    config: DragConfig,
    /// Offset under direct manipulation, or the last settled offset.
    offset: f32,
    /// Offset at the moment the current gesture grabbed the row.
    grab_offset: f32,
    animation: Option<Tween>,
}

impl DragController {
    /// Create a closed controller.
    #[must_use]
    pub fn new(config: DragConfig) -> Self {
        Self {
            config,
            offset: 0.0,
            grab_offset: 0.0,
            animation: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &DragConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn delete_threshold(&self) -> f32 {
        self.config.delete_threshold
    }

    /// Whether a snap is in flight.
    #[inline]
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// The in-flight snap, if any.
    #[inline]
    #[must_use]
    pub fn animation(&self) -> Option<&Tween> {
        self.animation.as_ref()
    }

    /// Offset sampled at `now` (interpolated while snapping).
    #[must_use]
    pub fn offset_at(&self, now: Instant) -> f32 {
        match &self.animation {
            Some(tween) => self.clamp(tween.value_at(now) as f32),
            None => self.offset,
        }
    }

    /// Offset the row is heading to: the snap target while animating,
    /// otherwise the current offset.
    #[must_use]
    pub fn resting_offset(&self) -> f32 {
        match &self.animation {
            Some(tween) => self.clamp(tween.to() as f32),
            None => self.offset,
        }
    }

    /// Take over the row at the start of a gesture.
    ///
    /// Returns `true` if an in-flight snap was interrupted.
    pub fn grab(&mut self, now: Instant) -> bool {
        let interrupted = match self.animation.take() {
            Some(tween) => {
                self.offset = self.clamp(tween.value_at(now) as f32);
                tracing::trace!(offset = self.offset, "snap interrupted by new gesture");
                true
            }
            None => false,
        };
        self.grab_offset = self.offset;
        interrupted
    }

    /// Follow the finger. `delta_x` is relative to the gesture origin.
    pub fn drag_to(&mut self, delta_x: f32) -> f32 {
        self.animation = None;
        self.offset = self.clamp(self.grab_offset + delta_x);
        self.offset
    }

    /// Decide and start the snap for a released gesture.
    ///
    /// `was_open` is whether the row was open when the gesture started.
    pub fn release(
        &mut self,
        was_open: bool,
        info: &ReleaseInfo,
        now: Instant,
    ) -> (SnapTarget, Duration) {
        let target = Self::snap_target(
            &self.config,
            self.offset,
            was_open,
            info.distance,
            info.velocity,
        );
        let duration = self.animate_to(target.offset(self.config.delete_threshold), now);
        tracing::debug!(
            offset = self.offset,
            distance = info.distance,
            velocity = info.velocity,
            was_open,
            target = ?target,
            duration = ?duration,
            "drag released"
        );
        (target, duration)
    }

    /// Pure release decision.
    #[must_use]
    pub fn snap_target(
        config: &DragConfig,
        offset: f32,
        was_open: bool,
        distance: f32,
        velocity: f32,
    ) -> SnapTarget {
        let half = config.delete_threshold / 2.0;
        let rightward = distance > 0.0;
        if was_open {
            if rightward || offset > -half {
                SnapTarget::Closed
            } else {
                SnapTarget::Open
            }
        } else if !rightward && (offset.abs() > half || velocity < config.fling_velocity) {
            SnapTarget::Open
        } else {
            SnapTarget::Closed
        }
    }

    /// Snap duration for a remaining distance:
    /// `clamp(distance / snap_speed, min_snap_duration, max_snap_duration)`.
    #[must_use]
    pub fn snap_duration(&self, distance: f32) -> Duration {
        let max = self.config.max_snap_duration;
        let min = self.config.min_snap_duration.min(max);
        if self.config.snap_speed <= 0.0 || !distance.is_finite() {
            return max;
        }
        let secs = f64::from(distance.abs()) / f64::from(self.config.snap_speed);
        if secs >= max.as_secs_f64() {
            return max;
        }
        Duration::from_secs_f64(secs).max(min)
    }

    /// Animate from the current offset to `target`.
    ///
    /// Returns the snap duration (zero if already there).
    pub fn animate_to(&mut self, target: f32, now: Instant) -> Duration {
        let current = self.offset_at(now);
        let target = self.clamp(target);
        let distance = (target - current).abs();
        let duration = if distance <= f32::EPSILON {
            Duration::ZERO
        } else {
            self.snap_duration(distance)
        };
        self.offset = current;
        if duration.is_zero() {
            self.animation = None;
            self.offset = target;
        } else {
            self.animation = Some(Tween::new(
                f64::from(current),
                f64::from(target),
                now,
                duration,
                self.config.snap_easing,
            ));
        }
        duration
    }

    /// Set the offset immediately, dropping any in-flight snap.
    pub fn jump_to(&mut self, offset: f32) {
        self.animation = None;
        self.offset = self.clamp(offset);
        self.grab_offset = self.offset;
    }

    /// Complete the in-flight snap if it has run its course at `now`.
    ///
    /// Returns `true` if a snap finished.
    pub fn settle(&mut self, now: Instant) -> bool {
        match self.animation {
            Some(tween) if tween.is_complete_at(now) => {
                self.finish_animation();
                true
            }
            _ => false,
        }
    }

    /// Complete the in-flight snap immediately (animation-end callback).
    pub fn finish_animation(&mut self) {
        if let Some(tween) = self.animation.take() {
            self.offset = self.clamp(tween.to() as f32);
        }
    }

    fn clamp(&self, offset: f32) -> f32 {
        if offset.is_nan() {
            return 0.0;
        }
        offset.clamp(-self.config.delete_threshold, 0.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
