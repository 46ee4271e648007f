// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which drag zones the presentation shell has enabled.
///
/// Both zones default to off, leaving plain scrollback scrolling.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Left two thirds of the surface emit arrow keys with auto-repeat.
    pub arrow_gesture_enabled: bool,
    /// Left third of the surface emits Page Up / Page Down every 5 lines.
    pub page_gesture_enabled: bool,
}

/// Timing and distance knobs shared by the filter and the gesture translator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Quiet period before accumulated output is flushed to the screen reader.
    pub debounce_ms: Option<u64>,
    /// Delay before a held arrow gesture starts repeating.
    pub repeat_initial_ms: Option<u64>,
    /// Repeat period for Up/Down.
    pub repeat_vertical_ms: Option<u64>,
    /// Repeat period for Left/Right.
    pub repeat_horizontal_ms: Option<u64>,
    /// Minimum drag distance in pixels before motion counts as intentional.
    pub touch_slop: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            debounce_ms: None,
            repeat_initial_ms: None,
            repeat_vertical_ms: None,
            repeat_horizontal_ms: None,
            touch_slop: DEFAULT_TOUCH_SLOP,
        }
    }
}

pub const DEFAULT_TOUCH_SLOP: f32 = 8.0;

macro_rules! duration_field {
    ($method:ident, $field:ident, $default:expr) => {
        pub fn $method(&self) -> Duration {
            Duration::from_millis(self.$field.unwrap_or($default))
        }
    };
}

impl Tuning {
    // -- Tuning knobs (field override → compiled default) ------------------

    duration_field!(debounce, debounce_ms, 1_000);
    duration_field!(repeat_initial, repeat_initial_ms, 400);
    duration_field!(repeat_vertical, repeat_vertical_ms, 150);
    duration_field!(repeat_horizontal, repeat_horizontal_ms, 75);

    /// Validate the tuning after deserialization.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.debounce().is_zero() {
            anyhow::bail!("debounce window must be non-zero");
        }
        if self.repeat_vertical().is_zero() || self.repeat_horizontal().is_zero() {
            anyhow::bail!("repeat periods must be non-zero");
        }
        if self.touch_slop.is_nan() || self.touch_slop <= 0.0 {
            anyhow::bail!("touch slop must be positive, got {}", self.touch_slop);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
