// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Screen-reader text stream built from raw session output.
//!
//! Output arrives in bursts from the session thread. Rather than announcing
//! every chunk, the filter accumulates text and flushes one cleaned batch once
//! the stream has been quiet for the debounce window. The accumulator lives
//! inside a single task that owns it; the public handle only sends commands.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::config::Tuning;

/// Erase-line sequence followed by trailing attribute noise up to `m` or `:`.
static CONTROL_CODES: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new("\x1b\\[K[^m]+[m:]")
        .map_err(|e| warn!("a11y: control-code pattern rejected, runs will not be stripped: {e}"))
        .ok()
});

/// Backspace followed by erase-to-end-of-line: a visually erased character.
const BACKSPACE_CODE: &str = "\x08\x1b[K";

/// Receives cleaned batches on the filter task.
pub trait BatchSink: Send {
    fn on_batch(&mut self, text: String);
}

impl BatchSink for mpsc::UnboundedSender<String> {
    fn on_batch(&mut self, text: String) {
        let _ = self.send(text);
    }
}

/// Strip control runs and apply destructive backspaces.
///
/// Total over any input: text without a match passes through unchanged.
pub fn clean_output(raw: &str) -> String {
    let stripped = match &*CONTROL_CODES {
        Some(re) => re.replace_all(raw, " ").into_owned(),
        None => raw.to_owned(),
    };
    collapse_backspaces(stripped)
}

fn collapse_backspaces(mut text: String) -> String {
    while let Some(at) = text.find(BACKSPACE_CODE) {
        let start = text[..at].char_indices().next_back().map_or(0, |(i, _)| i);
        text.replace_range(start..at + BACKSPACE_CODE.len(), "");
    }
    text
}

enum Command {
    Append(String),
    SetSink(Box<dyn BatchSink>),
    ClearSink,
    SetActive(bool),
    FlushNow,
}

/// Handle to the debounced output filter of one session.
///
/// Dropping the handle (or calling [`OutputTextFilter::shutdown`]) stops the
/// task without flushing whatever is still pending.
#[derive(Debug)]
pub struct OutputTextFilter {
    tx: mpsc::UnboundedSender<Command>,
    shutdown: CancellationToken,
}

impl OutputTextFilter {
    /// Spawn the filter task on `handle`. The filter starts active.
    pub fn spawn(handle: &Handle, tuning: &Tuning) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let task = FilterTask {
            buffer: String::new(),
            deadline: None,
            debounce: tuning.debounce(),
            sink: None,
            active: true,
        };
        handle.spawn(task.run(rx, shutdown.clone()));
        Self { tx, shutdown }
    }

    /// Queue raw output. Never blocks.
    pub fn append(&self, raw: &str) {
        if raw.is_empty() {
            return;
        }
        self.send(Command::Append(raw.to_owned()));
    }

    pub fn set_sink(&self, sink: Box<dyn BatchSink>) {
        self.send(Command::SetSink(sink));
    }

    pub fn clear_sink(&self) {
        self.send(Command::ClearSink);
    }

    /// Enable or disable accumulation. Disabling drops any pending text.
    pub fn set_active(&self, active: bool) {
        self.send(Command::SetActive(active));
    }

    /// Flush pending text without waiting for the quiet period.
    pub fn flush_now(&self) {
        self.send(Command::FlushNow);
    }

    /// Stop the task; pending text and the armed deadline are discarded.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    fn send(&self, cmd: Command) {
        if self.tx.send(cmd).is_err() {
            trace!("a11y: filter task gone, command dropped");
        }
    }
}

impl Drop for OutputTextFilter {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

struct FilterTask {
    buffer: String,
    deadline: Option<Instant>,
    debounce: Duration,
    sink: Option<Box<dyn BatchSink>>,
    active: bool,
}

impl FilterTask {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>, shutdown: CancellationToken) {
        loop {
            let deadline = self.deadline;
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    debug!("a11y: filter shut down with {} bytes pending", self.buffer.len());
                    break;
                }
                cmd = rx.recv() => match cmd {
                    Some(cmd) => self.apply(cmd),
                    None => break,
                },
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.flush();
                }
            }
        }
    }

    fn apply(&mut self, cmd: Command) {
        match cmd {
            Command::Append(text) => {
                if !self.active {
                    return;
                }
                self.buffer.push_str(&text);
                self.deadline = Some(Instant::now() + self.debounce);
            }
            Command::SetSink(sink) => self.sink = Some(sink),
            Command::ClearSink => self.sink = None,
            Command::SetActive(active) => {
                self.active = active;
                if !active {
                    self.buffer = String::new();
                    self.deadline = None;
                }
            }
            Command::FlushNow => self.flush(),
        }
    }

    fn flush(&mut self) {
        self.deadline = None;
        let raw = std::mem::take(&mut self.buffer);
        let cleaned = clean_output(&raw);
        if cleaned.is_empty() {
            return;
        }
        match self.sink.as_mut() {
            Some(sink) => {
                trace!("a11y: flushing {} chars", cleaned.chars().count());
                sink.on_batch(cleaned);
            }
            None => trace!("a11y: no sink registered, batch dropped"),
        }
    }
}

#[cfg(test)]
#[path = "a11y_tests.rs"]
mod tests;
