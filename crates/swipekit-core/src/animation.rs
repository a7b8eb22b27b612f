#![forbid(unsafe_code)]

//! Easing curves and time-anchored tweens.
//!
//! The engine never runs a frame loop of its own. A [`Tween`] records where a
//! value starts, where it ends, when it started and how long it lasts; callers
//! sample it at whatever instant the host hands them. Two tweens built with the
//! same start instant and duration finish at the same wall-clock instant,
//! which is what synchronized row/group exits rely on.
//!
//! # Invariants
//!
//! 1. `progress_at()` is always in `[0.0, 1.0]`.
//! 2. `value_at()` equals `from` at or before the start instant and `to` at or
//!    after `ends_at()` (non-overshooting curves only).
//! 3. A zero-duration tween is complete at its start instant.
//!
//! # Failure Modes
//!
//! - Sampling before the start instant clamps to progress 0.0.
//! - Reversing a tween that already finished replays its full duration
//!   backwards.

use serde::{Deserialize, Serialize};
use web_time::{Duration, Instant};

/// Easing function applied to linear progress.
///
/// Same curve family as the modal transitions: cubic ease-in/ease-out and a
/// symmetric S-curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    /// Linear interpolation.
    Linear,
    /// Decelerating cubic. Used for snaps so the row settles under the finger.
    #[default]
    EaseOut,
    /// Accelerating cubic.
    EaseIn,
    /// Cubic S-curve. Used for row and group exits.
    EaseInOut,
}

impl Easing {
    /// Apply the easing function to a progress value (clamped to 0.0..=1.0).
    #[must_use]
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseOut => {
                let inv = 1.0 - t;
                1.0 - inv * inv * inv
            }
            Self::EaseIn => t * t * t,
            Self::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let inv = -2.0 * t + 2.0;
                    1.0 - inv * inv * inv / 2.0
                }
            }
        }
    }
}

/// A value transition anchored to a host-clock instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    from: f64,
    to: f64,
    started_at: Instant,
    duration: Duration,
    easing: Easing,
}

impl Tween {
    /// Create a tween from `from` to `to` starting at `started_at`.
    #[must_use]
    pub fn new(
        from: f64,
        to: f64,
        started_at: Instant,
        duration: Duration,
        easing: Easing,
    ) -> Self {
        Self {
            from,
            to,
            started_at,
            duration,
            easing,
        }
    }

    #[inline]
    #[must_use]
    pub fn from(&self) -> f64 {
        self.from
    }

    #[inline]
    #[must_use]
    pub fn to(&self) -> f64 {
        self.to
    }

    #[inline]
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    #[inline]
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    #[inline]
    #[must_use]
    pub fn easing(&self) -> Easing {
        self.easing
    }

    /// Instant at which the tween reaches its target.
    #[inline]
    #[must_use]
    pub fn ends_at(&self) -> Instant {
        self.started_at + self.duration
    }

    /// Linear progress at `now`, in `[0.0, 1.0]`.
    #[must_use]
    pub fn progress_at(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started_at);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    /// Interpolated value at `now`.
    #[must_use]
    pub fn value_at(&self, now: Instant) -> f64 {
        let eased = self.easing.apply(self.progress_at(now));
        self.from + (self.to - self.from) * eased
    }

    /// Whether the tween has reached its target at `now`.
    #[inline]
    #[must_use]
    pub fn is_complete_at(&self, now: Instant) -> bool {
        self.progress_at(now) >= 1.0
    }

    /// Build the tween that walks back from the value at `now` to `from`,
    /// taking as long as this one has been running (capped at its duration).
    #[must_use]
    pub fn reversed_at(&self, now: Instant) -> Tween {
        let elapsed = now
            .saturating_duration_since(self.started_at)
            .min(self.duration);
        Tween::new(self.value_at(now), self.from, now, elapsed, self.easing)
    }
}
