// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::event::TerminalKey;
use crate::screen::ScreenInput;

/// Auto-repeat of a held directional key.
///
/// The key is re-injected after `initial`, then every `period`, until
/// [`KeyRepeat::disarm`] or drop. Every injection happens under the gate lock,
/// so once `disarm` returns no further key reaches the screen.
pub(super) struct KeyRepeat {
    gate: Arc<Mutex<Option<TerminalKey>>>,
    cancel: CancellationToken,
}

impl KeyRepeat {
    pub(super) fn arm(
        handle: &Handle,
        screen: Arc<dyn ScreenInput>,
        key: TerminalKey,
        initial: Duration,
        period: Duration,
    ) -> Self {
        let gate = Arc::new(Mutex::new(Some(key)));
        let cancel = CancellationToken::new();
        handle.spawn(run(Arc::clone(&gate), screen, initial, period, cancel.clone()));
        Self { gate, cancel }
    }

    pub(super) fn disarm(&self) {
        *self.gate.lock() = None;
        self.cancel.cancel();
    }
}

impl Drop for KeyRepeat {
    fn drop(&mut self) {
        self.disarm();
    }
}

async fn run(
    gate: Arc<Mutex<Option<TerminalKey>>>,
    screen: Arc<dyn ScreenInput>,
    initial: Duration,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut ticks = tokio::time::interval_at(Instant::now() + initial, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticks.tick() => {}
        }

        let held = gate.lock();
        match *held {
            Some(key) => {
                trace!("gesture: repeat {key}");
                screen.press(key);
            }
            None => break,
        }
    }
}
