// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use tokio::time::sleep;

use super::*;
use crate::test_support::{Injected, RecordingScreen};

const LINE: f32 = 20.0;

const ARROWS: GestureConfig = GestureConfig { arrow_gesture_enabled: true, page_gesture_enabled: false };
const PAGES: GestureConfig = GestureConfig { arrow_gesture_enabled: false, page_gesture_enabled: true };
const SCROLL_ONLY: GestureConfig =
    GestureConfig { arrow_gesture_enabled: false, page_gesture_enabled: false };

fn translator(config: GestureConfig) -> (GestureTranslator, RecordingScreen) {
    let screen = RecordingScreen::new();
    let translator = GestureTranslator::new(
        config,
        &Tuning::default(),
        LINE,
        Arc::new(screen.clone()),
        Handle::current(),
    );
    (translator, screen)
}

// ===== arrow zone ============================================================

#[tokio::test(start_paused = true)]
async fn vertical_arrow_fires_then_repeats_until_release() {
    let (mut gestures, screen) = translator(ARROWS);
    gestures.on_drag_start();
    assert!(gestures.on_drag(0.0, 10.0, 0.5));
    assert!(screen.keys().is_empty(), "still inside the dead zone");

    assert!(gestures.on_drag(2.0, 20.0, 0.5));
    assert_eq!(screen.keys(), vec![TerminalKey::Down]);
    assert_eq!(gestures.direction(), Some(Direction::Down));
    assert!(gestures.is_repeating());

    sleep(Duration::from_millis(390)).await;
    assert_eq!(screen.keys().len(), 1);
    sleep(Duration::from_millis(20)).await;
    assert_eq!(screen.keys().len(), 2);
    sleep(Duration::from_millis(300)).await;
    assert_eq!(screen.keys(), vec![TerminalKey::Down; 4]);

    gestures.on_drag_end();
    assert!(!gestures.is_repeating());
    sleep(Duration::from_millis(1_000)).await;
    assert_eq!(screen.keys().len(), 4, "no key after drag end");
}

#[tokio::test(start_paused = true)]
async fn horizontal_arrow_repeats_faster() {
    let (mut gestures, screen) = translator(ARROWS);
    gestures.on_drag_start();
    gestures.on_drag(-30.0, 5.0, 0.2);
    assert_eq!(screen.keys(), vec![TerminalKey::Left]);

    // Repeats at 400, 475, 550, 625 and 700 ms.
    sleep(Duration::from_millis(710)).await;
    assert_eq!(screen.keys(), vec![TerminalKey::Left; 6]);
    gestures.on_drag_end();
}

#[yare::parameterized(
    up       = { 3.0, -25.0, Direction::Up },
    down     = { -3.0, 25.0, Direction::Down },
    left     = { -25.0, 3.0, Direction::Left },
    right    = { 25.0, -3.0, Direction::Right },
    tie_is_x = { 25.0, 25.0, Direction::Right },
)]
fn dominant_axis_picks_direction(dx: f32, dy: f32, expected: Direction) {
    assert_eq!(Direction::dominant(dx, dy), expected);
}

#[tokio::test(start_paused = true)]
async fn triggered_direction_is_kept_for_the_whole_drag() {
    let (mut gestures, screen) = translator(ARROWS);
    gestures.on_drag_start();
    gestures.on_drag(0.0, 30.0, 0.5);
    assert!(gestures.on_drag(0.0, -200.0, 0.5));
    assert!(gestures.on_drag(300.0, 0.0, 0.5));
    assert_eq!(screen.keys(), vec![TerminalKey::Down]);
    assert_eq!(gestures.direction(), Some(Direction::Down));
    gestures.on_drag_end();
}

#[tokio::test(start_paused = true)]
async fn arrow_zone_consumes_motion_before_triggering() {
    let (mut gestures, screen) = translator(ARROWS);
    gestures.on_drag_start();
    assert!(gestures.on_drag(1.0, -1.0, 0.6));
    assert!(screen.injected().is_empty());
    assert_eq!(gestures.direction(), None);
}

#[tokio::test(start_paused = true)]
async fn right_third_scrolls_with_arrows_enabled() {
    let (mut gestures, screen) = translator(ARROWS);
    gestures.on_drag_start();
    assert!(gestures.on_drag(0.0, -40.0, 0.9));
    assert_eq!(screen.injected(), vec![Injected::Scroll(2)]);
}

#[tokio::test(start_paused = true)]
async fn new_drag_starts_clean() {
    let (mut gestures, screen) = translator(ARROWS);
    gestures.on_drag_start();
    gestures.on_drag(0.0, 30.0, 0.5);
    gestures.on_drag_end();
    assert_eq!(gestures.direction(), None);

    gestures.on_drag_start();
    gestures.on_drag(0.0, -30.0, 0.5);
    assert_eq!(screen.keys(), vec![TerminalKey::Down, TerminalKey::Up]);
    gestures.on_drag_end();
}

#[tokio::test(start_paused = true)]
async fn dropping_translator_stops_repeat() {
    let (mut gestures, screen) = translator(ARROWS);
    gestures.on_drag_start();
    gestures.on_drag(30.0, 0.0, 0.5);
    drop(gestures);
    sleep(Duration::from_millis(1_000)).await;
    assert_eq!(screen.keys(), vec![TerminalKey::Right]);
}

// ===== page zone =============================================================

#[tokio::test(start_paused = true)]
async fn twelve_lines_of_paging_yield_two_keys() {
    let (mut gestures, screen) = translator(PAGES);
    gestures.on_drag_start();
    for _ in 0..12 {
        assert!(gestures.on_drag(0.0, -LINE, 0.1));
    }
    assert_eq!(screen.injected(), vec![Injected::Key(TerminalKey::PageDown); 2]);

    gestures.on_drag_start();
    for _ in 0..5 {
        gestures.on_drag(0.0, LINE, 0.1);
    }
    assert_eq!(screen.keys().last(), Some(&TerminalKey::PageUp));
    assert_eq!(screen.keys().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn page_accumulator_resets_instead_of_subtracting() {
    let (mut gestures, screen) = translator(PAGES);
    gestures.on_drag_start();
    // 5.5 lines: one key, the half line is discarded.
    gestures.on_drag(0.0, -5.5 * LINE, 0.2);
    assert_eq!(screen.keys(), vec![TerminalKey::PageDown]);
    gestures.on_drag(0.0, -4.6 * LINE, 0.2);
    assert_eq!(screen.keys().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn page_zone_yields_to_arrows() {
    let both = GestureConfig { arrow_gesture_enabled: true, page_gesture_enabled: true };
    let (mut gestures, screen) = translator(both);
    gestures.on_drag_start();
    gestures.on_drag(0.0, -6.0 * LINE, 0.1);
    assert_eq!(screen.keys(), vec![TerminalKey::Up]);
    gestures.on_drag_end();
}

#[tokio::test(start_paused = true)]
async fn page_zone_outside_left_third_scrolls() {
    let (mut gestures, screen) = translator(PAGES);
    gestures.on_drag_start();
    gestures.on_drag(0.0, -6.0 * LINE, 0.5);
    assert_eq!(screen.injected(), vec![Injected::Scroll(6)]);
}

// ===== scroll zone ===========================================================

#[tokio::test(start_paused = true)]
async fn scroll_emits_whole_lines_and_resets() {
    let (mut gestures, screen) = translator(SCROLL_ONLY);
    gestures.on_drag_start();
    assert!(gestures.on_drag(0.0, -10.0, 0.5));
    assert!(screen.injected().is_empty());
    assert!(gestures.on_drag(0.0, -20.0, 0.5));
    assert_eq!(screen.scrolls(), vec![1]);
    assert!(gestures.on_drag(0.0, 50.0, 0.5));
    assert_eq!(screen.scrolls(), vec![1, -2]);
}

#[tokio::test(start_paused = true)]
async fn sideways_wander_releases_the_drag() {
    let (mut gestures, screen) = translator(SCROLL_ONLY);
    gestures.on_drag_start();
    assert!(gestures.on_drag(20.0, -5.0, 0.5));
    assert!(!gestures.on_drag(20.0, -100.0, 0.5));
    // Horizontal wander is never forgiven within the drag.
    assert!(!gestures.on_drag(-5.0, -100.0, 0.5));
    assert!(screen.injected().is_empty());

    gestures.on_drag_start();
    assert!(gestures.on_drag(0.0, -LINE, 0.5));
    assert_eq!(screen.scrolls(), vec![1]);
}

#[tokio::test(start_paused = true)]
async fn zero_line_height_injects_nothing() {
    let (mut gestures, screen) = translator(SCROLL_ONLY);
    gestures.set_line_height(0.0);
    gestures.on_drag_start();
    assert!(gestures.on_drag(0.0, -500.0, 0.5));
    assert!(screen.injected().is_empty());

    gestures.set_line_height(10.0);
    gestures.on_drag_start();
    gestures.on_drag(0.0, -25.0, 0.5);
    assert_eq!(screen.scrolls(), vec![2]);
}

#[tokio::test(start_paused = true)]
async fn config_change_applies_to_next_event() {
    let (mut gestures, screen) = translator(SCROLL_ONLY);
    gestures.on_drag_start();
    gestures.on_drag(0.0, -LINE, 0.3);
    gestures.set_config(ARROWS);
    assert_eq!(gestures.config(), ARROWS);
    gestures.on_drag(0.0, -30.0, 0.3);
    assert_eq!(screen.injected(), vec![Injected::Scroll(1), Injected::Key(TerminalKey::Up)]);
    gestures.on_drag_end();
}
