// Forbid unsafe in production; deny in tests.
#![cfg_attr(not(test), forbid(unsafe_code))]
#![cfg_attr(test, deny(unsafe_code))]

//! Core: touch gesture classification and horizontal drag motion for
//! swipeable list rows.
//!
//! # Role in swipekit
//! `swipekit-core` is the per-row input layer. It owns no list state: it turns
//! raw pointer samples into an axis decision and a clamped horizontal offset,
//! and decides where a released row should snap and how long the snap takes.
//!
//! # Primary responsibilities
//! - **GestureTracker**: latches the first significant movement as horizontal
//!   swipe or vertical scroll, and reports distance/velocity on release.
//! - **DragController**: maps tracked deltas to an offset in
//!   `[-delete_threshold, 0]`, picks the snap target, and drives the snap tween.
//! - **Animation**: easing curves and time-anchored tweens that can be frozen
//!   or reversed mid-flight.
//! - **SwipeConfig**: tunable thresholds and timings, loadable from files.
//!
//! # How it fits in the system
//! `swipekit-list` owns one tracker and one controller per row and layers the
//! list-wide concerns (exclusivity, scroll lock, deletion) on top.

pub mod animation;
pub mod config;
pub mod drag;
pub mod geometry;
pub mod gesture;

pub use animation::{Easing, Tween};
pub use config::{ConfigError, DeleteConfig, SwipeConfig};
pub use drag::{DragConfig, DragController, SnapTarget};
pub use geometry::Point;
pub use gesture::{
    GestureAxis, GestureConfig, GestureSignal, GestureTracker, ReleaseInfo, TouchEvent,
};
