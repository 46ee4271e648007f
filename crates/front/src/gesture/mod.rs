// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Drag gestures turned into arrow keys, paging keys, or scrollback moves.
//!
//! Zones by horizontal pointer position, re-evaluated on every motion event:
//!
//! - arrow (left two thirds, when enabled): one key as soon as the drag
//!   leaves the dead zone, then auto-repeat until the pointer lifts;
//! - page (left third, when enabled and arrows are off): Page Up / Page Down
//!   every [`PAGE_LINES`] line heights of vertical travel;
//! - scroll (anywhere else): whole-line scrollback offset changes.
//!
//! Page and scroll both give up once the drag wanders sideways.

mod repeat;

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::{debug, trace};

use crate::config::{GestureConfig, Tuning};
use crate::event::TerminalKey;
use crate::screen::ScreenInput;

use self::repeat::KeyRepeat;

/// Line heights of vertical travel per page key.
pub const PAGE_LINES: f32 = 5.0;

const ARROW_ZONE_MAX: f32 = 2.0 / 3.0;
const PAGE_ZONE_MAX: f32 = 1.0 / 3.0;
const ARROW_SLOP_FACTOR: f32 = 3.0;
const WANDER_SLOP_FACTOR: f32 = 4.0;

/// Direction of a triggered arrow gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Pick the dominant axis of a pointer displacement (y grows downward).
    fn dominant(dx: f32, dy: f32) -> Self {
        if dy.abs() > dx.abs() {
            if dy > 0.0 {
                Self::Down
            } else {
                Self::Up
            }
        } else if dx > 0.0 {
            Self::Right
        } else {
            Self::Left
        }
    }

    pub fn key(self) -> TerminalKey {
        match self {
            Self::Up => TerminalKey::Up,
            Self::Down => TerminalKey::Down,
            Self::Left => TerminalKey::Left,
            Self::Right => TerminalKey::Right,
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }
}

/// Per-drag state, cleared on drag start and drag end.
#[derive(Debug, Default, Clone, PartialEq)]
struct GestureState {
    /// Total horizontal travel; never reset within a drag.
    accumulated_x: f32,
    accumulated_y: f32,
    /// Upward travel not yet turned into a page key or scroll delta.
    scroll_distance: f32,
    direction: Option<Direction>,
}

/// Stateful drag interpreter bound to one terminal surface.
pub struct GestureTranslator {
    config: GestureConfig,
    touch_slop: f32,
    repeat_initial: Duration,
    repeat_vertical: Duration,
    repeat_horizontal: Duration,
    line_height: f32,
    screen: Arc<dyn ScreenInput>,
    handle: Handle,
    state: GestureState,
    repeat: Option<KeyRepeat>,
}

impl std::fmt::Debug for GestureTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GestureTranslator")
            .field("config", &self.config)
            .field("line_height", &self.line_height)
            .field("state", &self.state)
            .field("repeat_armed", &self.repeat.is_some())
            .finish()
    }
}

impl GestureTranslator {
    /// `handle` runs the key-repeat timer.
    pub fn new(
        config: GestureConfig,
        tuning: &Tuning,
        line_height: f32,
        screen: Arc<dyn ScreenInput>,
        handle: Handle,
    ) -> Self {
        Self {
            config,
            touch_slop: tuning.touch_slop,
            repeat_initial: tuning.repeat_initial(),
            repeat_vertical: tuning.repeat_vertical(),
            repeat_horizontal: tuning.repeat_horizontal(),
            line_height,
            screen,
            handle,
            state: GestureState::default(),
            repeat: None,
        }
    }

    pub fn config(&self) -> GestureConfig {
        self.config
    }

    /// Takes effect from the next motion event.
    pub fn set_config(&mut self, config: GestureConfig) {
        self.config = config;
    }

    /// Update the line height after a font size change.
    pub fn set_line_height(&mut self, line_height: f32) {
        self.line_height = line_height;
    }

    /// The direction triggered during the current drag, if any.
    pub fn direction(&self) -> Option<Direction> {
        self.state.direction
    }

    pub fn is_repeating(&self) -> bool {
        self.repeat.is_some()
    }

    pub fn on_drag_start(&mut self) {
        self.reset();
    }

    /// Feed one motion event.
    ///
    /// `dx`/`dy` are the pointer displacement in pixels since the previous
    /// event and `x_fraction` the pointer position across the surface width.
    /// Returns whether the motion was consumed.
    pub fn on_drag(&mut self, dx: f32, dy: f32, x_fraction: f32) -> bool {
        self.state.accumulated_x += dx;
        self.state.accumulated_y += dy;

        if self.config.arrow_gesture_enabled && x_fraction <= ARROW_ZONE_MAX {
            self.arrow_motion();
            return true;
        }

        if self.state.accumulated_x.abs() >= self.touch_slop * WANDER_SLOP_FACTOR {
            return false;
        }

        // Upward drag moves towards newer output.
        self.state.scroll_distance -= dy;
        if self.config.page_gesture_enabled
            && !self.config.arrow_gesture_enabled
            && x_fraction <= PAGE_ZONE_MAX
        {
            self.page_motion();
        } else {
            self.scroll_motion();
        }
        true
    }

    /// Clear the drag state and stop any key repeat.
    pub fn on_drag_end(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        if let Some(repeat) = self.repeat.take() {
            repeat.disarm();
            trace!("gesture: repeat disarmed");
        }
        self.state = GestureState::default();
    }

    fn arrow_motion(&mut self) {
        if self.state.direction.is_some() {
            return;
        }
        let threshold = self.touch_slop * ARROW_SLOP_FACTOR;
        let GestureState { accumulated_x: x, accumulated_y: y, .. } = self.state;
        if x.abs() <= threshold && y.abs() <= threshold {
            return;
        }

        let direction = Direction::dominant(x, y);
        let key = direction.key();
        debug!("gesture: arrow {key} triggered");
        self.state.direction = Some(direction);
        self.screen.press(key);

        let period =
            if direction.is_vertical() { self.repeat_vertical } else { self.repeat_horizontal };
        self.repeat = Some(KeyRepeat::arm(
            &self.handle,
            Arc::clone(&self.screen),
            key,
            self.repeat_initial,
            period,
        ));
    }

    fn page_motion(&mut self) {
        if self.line_height <= 0.0 {
            return;
        }
        let lines = self.state.scroll_distance / self.line_height;
        let key = if lines >= PAGE_LINES {
            TerminalKey::PageDown
        } else if lines <= -PAGE_LINES {
            TerminalKey::PageUp
        } else {
            return;
        };
        debug!("gesture: {key}");
        self.screen.press(key);
        self.state.scroll_distance = 0.0;
    }

    fn scroll_motion(&mut self) {
        if self.line_height <= 0.0 {
            return;
        }
        let lines = (self.state.scroll_distance / self.line_height).trunc();
        if lines == 0.0 {
            return;
        }
        trace!("gesture: scroll {lines} lines");
        self.screen.scroll(lines as i32);
        self.state.scroll_distance = 0.0;
    }
}

impl Drop for GestureTranslator {
    fn drop(&mut self) {
        self.reset();
    }
}

#[cfg(test)]
#[path = "translator_tests.rs"]
mod tests;
