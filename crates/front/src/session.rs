// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::debug;

use crate::a11y::OutputTextFilter;
use crate::config::Tuning;
use crate::prompt::PromptRelay;

/// Per-session front-end state: the prompt rendezvous and the output filter.
///
/// The session I/O thread holds a clone of [`SessionFront::relay`] and feeds
/// output through [`SessionFront::propagate_output`]; the shell registers its
/// listener and sink on the same instance.
#[derive(Debug)]
pub struct SessionFront {
    relay: Arc<PromptRelay>,
    filter: OutputTextFilter,
}

impl SessionFront {
    /// Validates `tuning` and spawns the output filter on `handle`.
    pub fn new(handle: &Handle, tuning: &Tuning) -> anyhow::Result<Self> {
        tuning.validate()?;
        Ok(Self {
            relay: Arc::new(PromptRelay::new()),
            filter: OutputTextFilter::spawn(handle, tuning),
        })
    }

    pub fn relay(&self) -> &Arc<PromptRelay> {
        &self.relay
    }

    pub fn filter(&self) -> &OutputTextFilter {
        &self.filter
    }

    /// Forward decoded session output to the screen-reader stream.
    pub fn propagate_output(&self, text: &str) {
        self.filter.append(text);
    }

    pub fn is_torn_down(&self) -> bool {
        self.relay.is_closed() && self.filter.is_shut_down()
    }

    /// Fail the in-flight prompt and every later one, and stop the filter
    /// without flushing. Idempotent.
    pub fn teardown(&self) {
        if self.is_torn_down() {
            return;
        }
        self.relay.close();
        self.filter.shutdown();
        debug!("session: front torn down");
    }
}

impl Drop for SessionFront {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
