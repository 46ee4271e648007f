// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: recording collaborators and assertion helpers.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::a11y::BatchSink;
use crate::event::TerminalKey;
use crate::prompt::{PromptListener, PromptRequest};
use crate::screen::ScreenInput;

/// What a [`RecordingScreen`] received, in call order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Injected {
    Key(TerminalKey),
    Scroll(i32),
}

/// Screen collaborator that records every injected key and scroll.
#[derive(Debug, Default, Clone)]
pub struct RecordingScreen {
    injected: Arc<Mutex<Vec<Injected>>>,
}

impl RecordingScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn injected(&self) -> Vec<Injected> {
        self.injected.lock().clone()
    }

    pub fn keys(&self) -> Vec<TerminalKey> {
        self.injected
            .lock()
            .iter()
            .filter_map(|i| match i {
                Injected::Key(k) => Some(*k),
                Injected::Scroll(_) => None,
            })
            .collect()
    }

    pub fn scrolls(&self) -> Vec<i32> {
        self.injected
            .lock()
            .iter()
            .filter_map(|i| match i {
                Injected::Scroll(n) => Some(*n),
                Injected::Key(_) => None,
            })
            .collect()
    }
}

impl ScreenInput for RecordingScreen {
    fn press(&self, key: TerminalKey) {
        self.injected.lock().push(Injected::Key(key));
    }

    fn scroll(&self, lines: i32) {
        self.injected.lock().push(Injected::Scroll(lines));
    }
}

/// Batch sink that stores every emitted batch.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    batches: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> Vec<String> {
        self.batches.lock().clone()
    }
}

impl BatchSink for RecordingSink {
    fn on_batch(&mut self, text: String) {
        self.batches.lock().push(text);
    }
}

/// Prompt listener that stores every notification it receives.
#[derive(Debug, Default, Clone)]
pub struct RecordingListener {
    seen: Arc<Mutex<Vec<PromptRequest>>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self) -> Vec<PromptRequest> {
        self.seen.lock().clone()
    }
}

impl PromptListener for RecordingListener {
    fn prompt_pending(&self, request: &PromptRequest) {
        self.seen.lock().push(request.clone());
    }
}

/// Install a test-writer tracing subscriber honoring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs.
pub fn init_test_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().try_init();
}

/// Assert that an expression evaluates to `Err` whose Display output
/// contains the given substring.
#[macro_export]
macro_rules! assert_err_contains {
    ($expr:expr, $substr:expr) => {{
        let result = $expr;
        let err = result.expect_err(concat!("expected Err for: ", stringify!($expr)));
        let msg = err.to_string();
        assert!(msg.contains($substr), "expected error containing {:?}, got: {msg:?}", $substr);
    }};
}
