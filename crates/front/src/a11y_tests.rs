// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use proptest::prelude::*;
use tokio::runtime::Handle;
use tokio::time::sleep;

use super::*;
use crate::test_support::RecordingSink;

// ===== clean_output ==========================================================

#[yare::parameterized(
    control_run          = { "A\x1b[K***m", "A " },
    colon_terminator     = { "x\x1b[K01:y", "x y" },
    non_overlapping      = { "\x1b[Kam\x1b[Kbm", "  " },
    backspace            = { "AB\x08\x1b[K", "A" },
    leading_backspace    = { "\x08\x1b[KAB", "AB" },
    repeated_backspace   = { "ABC\x08\x1b[K\x08\x1b[K", "A" },
    multibyte_erased     = { "a\u{f1}\x08\x1b[K", "a" },
    strip_before_erase   = { "AB\x08\x1b[Kxm", "AB\x08 " },
    plain_passthrough    = { "plain text\r\n", "plain text\r\n" },
    bare_erase_kept      = { "tail\x1b[K", "tail\x1b[K" },
)]
fn clean(raw: &str, expected: &str) {
    assert_eq!(clean_output(raw), expected);
}

#[test]
fn control_code_pattern_compiles() {
    assert!(CONTROL_CODES.is_some());
}

proptest! {
    #[test]
    fn clean_is_total_and_erases_every_backspace(raw in "[a-z\x08\x1b\\[Km:]{0,64}") {
        let cleaned = clean_output(&raw);
        prop_assert!(!cleaned.contains(BACKSPACE_CODE));
        prop_assert!(cleaned.len() <= raw.len());
    }

    #[test]
    fn text_without_escapes_is_untouched(raw in "[^\x08\x1b]{0,64}") {
        prop_assert_eq!(clean_output(&raw), raw);
    }
}

// ===== debounced task ========================================================

fn spawn_with_sink() -> (OutputTextFilter, RecordingSink) {
    let filter = OutputTextFilter::spawn(&Handle::current(), &Tuning::default());
    let sink = RecordingSink::new();
    filter.set_sink(Box::new(sink.clone()));
    (filter, sink)
}

#[tokio::test(start_paused = true)]
async fn appends_within_window_coalesce() {
    let (filter, sink) = spawn_with_sink();
    filter.append("hello ");
    sleep(Duration::from_millis(500)).await;
    filter.append("world");

    sleep(Duration::from_millis(900)).await;
    assert!(sink.batches().is_empty(), "flushed before the quiet period ended");

    sleep(Duration::from_millis(200)).await;
    assert_eq!(sink.batches(), vec!["hello world".to_owned()]);
}

#[tokio::test(start_paused = true)]
async fn separated_appends_flush_separately() {
    let (filter, sink) = spawn_with_sink();
    filter.append("one");
    sleep(Duration::from_millis(1100)).await;
    filter.append("two");
    sleep(Duration::from_millis(1100)).await;
    assert_eq!(sink.batches(), vec!["one".to_owned(), "two".to_owned()]);
}

#[tokio::test(start_paused = true)]
async fn flush_applies_cleaning() {
    let (filter, sink) = spawn_with_sink();
    filter.append("A\x1b[K");
    filter.append("***m");
    filter.append(" ok\x08\x1b[K");
    sleep(Duration::from_millis(1100)).await;
    assert_eq!(sink.batches(), vec!["A  o".to_owned()]);
}

#[tokio::test(start_paused = true)]
async fn fully_erased_text_emits_nothing() {
    let (filter, sink) = spawn_with_sink();
    filter.append("\x08\x1b[K");
    sleep(Duration::from_millis(1100)).await;
    assert!(sink.batches().is_empty());
}

#[tokio::test(start_paused = true)]
async fn shutdown_discards_pending_flush() {
    let (filter, sink) = spawn_with_sink();
    filter.append("never spoken");
    sleep(Duration::from_millis(10)).await;
    filter.shutdown();
    assert!(filter.is_shut_down());
    sleep(Duration::from_millis(2000)).await;
    assert!(sink.batches().is_empty());

    filter.append("after shutdown");
    sleep(Duration::from_millis(2000)).await;
    assert!(sink.batches().is_empty());
}

#[tokio::test(start_paused = true)]
async fn inactive_filter_drops_text() {
    let (filter, sink) = spawn_with_sink();
    filter.append("pending");
    filter.set_active(false);
    filter.append("ignored");
    sleep(Duration::from_millis(2000)).await;
    assert!(sink.batches().is_empty());

    filter.set_active(true);
    filter.append("spoken");
    sleep(Duration::from_millis(1100)).await;
    assert_eq!(sink.batches(), vec!["spoken".to_owned()]);
}

#[tokio::test(start_paused = true)]
async fn flush_now_skips_the_wait() {
    let (filter, sink) = spawn_with_sink();
    filter.append("abc");
    filter.flush_now();
    sleep(Duration::from_millis(1)).await;
    assert_eq!(sink.batches(), vec!["abc".to_owned()]);

    // The deadline was consumed by the explicit flush.
    sleep(Duration::from_millis(2000)).await;
    assert_eq!(sink.batches().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn batches_without_sink_are_dropped() {
    let filter = OutputTextFilter::spawn(&Handle::current(), &Tuning::default());
    filter.append("lost");
    sleep(Duration::from_millis(1100)).await;

    let sink = RecordingSink::new();
    filter.set_sink(Box::new(sink.clone()));
    filter.append("kept");
    sleep(Duration::from_millis(1100)).await;
    assert_eq!(sink.batches(), vec!["kept".to_owned()]);

    filter.clear_sink();
    filter.append("dropped again");
    sleep(Duration::from_millis(1100)).await;
    assert_eq!(sink.batches().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn channel_sink_receives_batches() {
    let filter = OutputTextFilter::spawn(&Handle::current(), &Tuning::default());
    let (tx, mut rx) = mpsc::unbounded_channel();
    filter.set_sink(Box::new(tx));
    filter.append("via channel");
    sleep(Duration::from_millis(1100)).await;
    assert_eq!(rx.try_recv().ok(), Some("via channel".to_owned()));
}

#[tokio::test(start_paused = true)]
async fn custom_debounce_window() {
    let tuning = Tuning { debounce_ms: Some(100), ..Tuning::default() };
    let filter = OutputTextFilter::spawn(&Handle::current(), &tuning);
    let sink = RecordingSink::new();
    filter.set_sink(Box::new(sink.clone()));
    filter.append("fast");
    sleep(Duration::from_millis(150)).await;
    assert_eq!(sink.batches(), vec!["fast".to_owned()]);
}
