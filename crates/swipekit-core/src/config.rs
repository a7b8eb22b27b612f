#![forbid(unsafe_code)]

//! Policy-as-data configuration for swipeable lists.
//!
//! [`SwipeConfig`] groups every tunable threshold and timing so hosts can ship
//! them in a file instead of recompiling.
//!
//! # Loading
//!
//! ```toml
//! reduced_motion = false
//!
//! [gesture]
//! horizontal_slop = 5.0
//! vertical_slop = 10.0
//!
//! [drag]
//! delete_threshold = 80.0
//! min_snap_ms = 150
//! max_snap_ms = 300
//!
//! [delete]
//! exit_ms = 250
//! confirm_guard_ms = 400
//! ```
//!
//! ```rust,ignore
//! let config = SwipeConfig::from_toml_file("swipe.toml")?;
//! let config = SwipeConfig::from_json_str(json)?;
//! ```
//!
//! Missing keys fall back to [`SwipeConfig::default()`]. Loaders reject
//! configs that fail [`SwipeConfig::validate`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use web_time::Duration;

use crate::animation::Easing;
use crate::drag::DragConfig;
use crate::gesture::GestureConfig;

/// Longest accepted row exit.
pub const MAX_EXIT_DURATION: Duration = Duration::from_millis(2_000);
/// Longest accepted confirmation guard. Zero would disable the guard.
pub const MAX_CONFIRM_GUARD: Duration = Duration::from_millis(5_000);

/// Timing of the delete confirmation and exit animation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeleteConfig {
    /// Row (and emptied group) exit animation length (default: 250ms).
    #[serde(rename = "exit_ms", with = "duration_ms")]
    pub exit_duration: Duration,
    /// Curve for the opacity/height collapse.
    pub exit_easing: Easing,
    /// After the prompt appears, responses are ignored for this long (default: 400ms).
    #[serde(rename = "confirm_guard_ms", with = "duration_ms")]
    pub confirm_guard: Duration,
}

impl Default for DeleteConfig {
    fn default() -> Self {
        Self {
            exit_duration: Duration::from_millis(250),
            exit_easing: Easing::EaseInOut,
            confirm_guard: Duration::from_millis(400),
        }
    }
}

/// Top-level configuration for a swipeable list.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SwipeConfig {
    /// Snap and exit instantly. Row and group exits stay synchronized.
    pub reduced_motion: bool,
    pub gesture: GestureConfig,
    pub drag: DragConfig,
    pub delete: DeleteConfig,
}

impl SwipeConfig {
    /// Configuration with all motion disabled.
    #[must_use]
    pub fn reduced_motion() -> Self {
        Self {
            reduced_motion: true,
            ..Self::default()
        }
    }

    /// The configuration actually applied: reduced motion zeroes every
    /// animation length but keeps thresholds and the confirmation guard.
    #[must_use]
    pub fn effective(&self) -> Self {
        if !self.reduced_motion {
            return *self;
        }
        let mut config = *self;
        config.drag.min_snap_duration = Duration::ZERO;
        config.drag.max_snap_duration = Duration::ZERO;
        config.delete.exit_duration = Duration::ZERO;
        config
    }

    /// Validate all parameters.
    ///
    /// Returns a list of problems. An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let g = &self.gesture;
        if !(g.horizontal_slop.is_finite() && g.horizontal_slop >= 0.0) {
            errors.push(format!(
                "gesture.horizontal_slop must be >= 0, got {}",
                g.horizontal_slop
            ));
        }
        if !(g.vertical_slop.is_finite() && g.vertical_slop >= 0.0) {
            errors.push(format!(
                "gesture.vertical_slop must be >= 0, got {}",
                g.vertical_slop
            ));
        }
        if !(g.vertical_dominance.is_finite() && g.vertical_dominance > 0.0) {
            errors.push(format!(
                "gesture.vertical_dominance must be > 0, got {}",
                g.vertical_dominance
            ));
        }

        let d = &self.drag;
        if !(d.delete_threshold.is_finite() && d.delete_threshold > 0.0) {
            errors.push(format!(
                "drag.delete_threshold must be > 0, got {}",
                d.delete_threshold
            ));
        }
        if !(d.fling_velocity.is_finite() && d.fling_velocity <= 0.0) {
            errors.push(format!(
                "drag.fling_velocity must be <= 0 (leftward), got {}",
                d.fling_velocity
            ));
        }
        if !(d.snap_speed.is_finite() && d.snap_speed > 0.0) {
            errors.push(format!("drag.snap_speed must be > 0, got {}", d.snap_speed));
        }
        if d.min_snap_duration > d.max_snap_duration {
            errors.push(format!(
                "drag.min_snap_ms ({}) must not exceed drag.max_snap_ms ({})",
                d.min_snap_duration.as_millis(),
                d.max_snap_duration.as_millis()
            ));
        }

        let del = &self.delete;
        if del.exit_duration > MAX_EXIT_DURATION {
            errors.push(format!(
                "delete.exit_ms must be <= {}, got {}",
                MAX_EXIT_DURATION.as_millis(),
                del.exit_duration.as_millis()
            ));
        }
        if del.confirm_guard.is_zero() || del.confirm_guard > MAX_CONFIRM_GUARD {
            errors.push(format!(
                "delete.confirm_guard_ms must be in 1..={}, got {}",
                MAX_CONFIRM_GUARD.as_millis(),
                del.confirm_guard.as_millis()
            ));
        }

        errors
    }

    /// Return `self` if valid, or the validation errors.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validated()
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validated()
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Serialize to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }
}

/// Errors from loading or validating a [`SwipeConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {}", .0.join("; "))]
    Validation(Vec<String>),
}

/// Serde adapter storing a [`Duration`] as whole milliseconds.
pub(crate) mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use web_time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
