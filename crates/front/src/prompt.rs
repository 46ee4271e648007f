// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-slot prompt rendezvous between a session thread and the operator.
//!
//! The session thread asks for a credential or a yes/no confirmation and blocks
//! until the shell answers, cancels, or the session is torn down. Only one
//! request is in flight at a time: an entry guard serializes requesters, and a
//! one-shot reply channel stored in the slot guarantees that at most one answer
//! lands per request.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

/// What kind of answer a prompt expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    String,
    Boolean,
}

impl PromptKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
        }
    }
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A prompt published to the shell while a requester waits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRequest {
    pub kind: PromptKind,
    pub instructions: Option<String>,
    pub hint: String,
}

impl PromptRequest {
    pub fn new(kind: PromptKind, instructions: Option<&str>, hint: impl Into<String>) -> Self {
        Self { kind, instructions: instructions.map(str::to_owned), hint: hint.into() }
    }
}

/// Value supplied by the shell in answer to a prompt.
#[derive(Clone, PartialEq, Eq)]
pub enum PromptResponse {
    Text(String),
    Boolean(bool),
}

impl PromptResponse {
    fn kind(&self) -> PromptKind {
        match self {
            Self::Text(_) => PromptKind::String,
            Self::Boolean(_) => PromptKind::Boolean,
        }
    }
}

// Text responses are usually passwords.
impl fmt::Debug for PromptResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(_) => f.write_str("Text(<redacted>)"),
            Self::Boolean(b) => f.debug_tuple("Boolean").field(b).finish(),
        }
    }
}

/// Result handed back to the requester, consumed exactly once.
#[derive(Clone, PartialEq, Eq)]
pub enum PromptOutcome {
    Text(String),
    Boolean(bool),
    /// Cancelled, interrupted, torn down, or answered with the wrong type.
    NoAnswer,
}

impl PromptOutcome {
    fn from_response(kind: PromptKind, response: Option<PromptResponse>) -> Self {
        match (kind, response) {
            (_, None) => Self::NoAnswer,
            (PromptKind::String, Some(PromptResponse::Text(s))) => Self::Text(s),
            (PromptKind::Boolean, Some(PromptResponse::Boolean(b))) => Self::Boolean(b),
            (kind, Some(other)) => {
                warn!("prompt: {} response to a {kind} prompt, treating as no answer", other.kind());
                Self::NoAnswer
            }
        }
    }

    pub fn is_answered(&self) -> bool {
        !matches!(self, Self::NoAnswer)
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn into_boolean(self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(b),
            _ => None,
        }
    }
}

impl fmt::Debug for PromptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(_) => f.write_str("Text(<redacted>)"),
            Self::Boolean(b) => f.debug_tuple("Boolean").field(b).finish(),
            Self::NoAnswer => f.write_str("NoAnswer"),
        }
    }
}

/// Receives "a prompt is pending" notifications.
///
/// Called on the requester's thread (or the registering thread for catch-up),
/// never while the relay holds a lock, so implementations may call back into
/// the relay. Each registered listener hears about a given request at most once.
pub trait PromptListener: Send + Sync {
    fn prompt_pending(&self, request: &PromptRequest);
}

impl<F> PromptListener for F
where
    F: Fn(&PromptRequest) + Send + Sync,
{
    fn prompt_pending(&self, request: &PromptRequest) {
        self(request)
    }
}

enum Slot {
    Idle,
    /// A requester holds the entry guard but has not published yet.
    Claimed,
    /// Cancelled before publish; the requester returns without waiting.
    Preempted,
    Waiting {
        request: PromptRequest,
        reply: oneshot::Sender<PromptResponse>,
        /// Id of the last listener told about this request.
        announced: Option<u64>,
    },
    /// Answered or cancelled; the requester has not retired the slot yet.
    Settled,
}

/// Cross-thread prompt rendezvous, one instance per live session.
pub struct PromptRelay {
    entry: tokio::sync::Mutex<()>,
    slot: Mutex<Slot>,
    listener: Mutex<Option<(u64, Arc<dyn PromptListener>)>>,
    listener_seq: AtomicU64,
    closed: AtomicBool,
}

impl fmt::Debug for PromptRelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromptRelay")
            .field("pending", &self.pending())
            .field("listener", &self.listener.lock().is_some())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Default for PromptRelay {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptRelay {
    pub fn new() -> Self {
        Self {
            entry: tokio::sync::Mutex::new(()),
            slot: Mutex::new(Slot::Idle),
            listener: Mutex::new(None),
            listener_seq: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Register the prompt-pending listener, replacing any previous one.
    ///
    /// If a request is already pending the listener is notified immediately.
    pub fn set_listener(&self, listener: Arc<dyn PromptListener>) {
        let id = self.listener_seq.fetch_add(1, Ordering::Relaxed);
        *self.listener.lock() = Some((id, listener));
        self.announce();
    }

    pub fn clear_listener(&self) {
        *self.listener.lock() = None;
    }

    /// The request currently waiting for an answer, if any.
    pub fn pending(&self) -> Option<PromptRequest> {
        match &*self.slot.lock() {
            Slot::Waiting { request, .. } => Some(request.clone()),
            Slot::Idle | Slot::Claimed | Slot::Preempted | Slot::Settled => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Request a prompt and block the calling thread until it resolves.
    ///
    /// Must be called from a plain thread, not from inside an async runtime;
    /// async callers use [`PromptRelay::request_async`].
    pub fn request_prompt(
        &self,
        kind: PromptKind,
        instructions: Option<&str>,
        hint: &str,
    ) -> PromptOutcome {
        self.request(PromptRequest::new(kind, instructions, hint))
    }

    /// Blocking form of the rendezvous for a prepared request.
    pub fn request(&self, request: PromptRequest) -> PromptOutcome {
        if self.is_closed() {
            return PromptOutcome::NoAnswer;
        }
        let claim = Claim::new(self, self.entry.blocking_lock());
        let kind = request.kind;
        let Some(reply) = claim.publish(request) else {
            return PromptOutcome::NoAnswer;
        };
        let response = reply.blocking_recv().ok();
        drop(claim);
        PromptOutcome::from_response(kind, response)
    }

    /// Async form of the rendezvous. Dropping the future abandons the request.
    pub async fn request_async(&self, request: PromptRequest) -> PromptOutcome {
        if self.is_closed() {
            return PromptOutcome::NoAnswer;
        }
        let claim = Claim::new(self, self.entry.lock().await);
        let kind = request.kind;
        let Some(reply) = claim.publish(request) else {
            return PromptOutcome::NoAnswer;
        };
        let response = reply.await.ok();
        drop(claim);
        PromptOutcome::from_response(kind, response)
    }

    /// Async counterpart of [`PromptRelay::request_prompt`].
    pub async fn request_prompt_async(
        &self,
        kind: PromptKind,
        instructions: Option<&str>,
        hint: &str,
    ) -> PromptOutcome {
        self.request_async(PromptRequest::new(kind, instructions, hint)).await
    }

    /// Cancel whatever is in flight, then request.
    pub fn request_immediate(&self, request: PromptRequest) -> PromptOutcome {
        self.cancel();
        self.request(request)
    }

    /// Blocking string prompt. `None` when cancelled or answered with a boolean.
    pub fn request_string(&self, instructions: Option<&str>, hint: &str) -> Option<String> {
        self.request_prompt(PromptKind::String, instructions, hint).into_text()
    }

    /// Blocking yes/no prompt. `None` when cancelled or answered with text.
    pub fn request_boolean(&self, instructions: Option<&str>, hint: &str) -> Option<bool> {
        self.request_prompt(PromptKind::Boolean, instructions, hint).into_boolean()
    }

    /// Answer the pending prompt.
    ///
    /// Returns `true` if the value reached a waiting requester. With nothing
    /// pending (or already answered) the call has no effect.
    pub fn respond(&self, value: PromptResponse) -> bool {
        let mut slot = self.slot.lock();
        match std::mem::replace(&mut *slot, Slot::Idle) {
            Slot::Waiting { request, reply, .. } => {
                *slot = Slot::Settled;
                drop(slot);
                debug!("prompt: {} prompt answered", request.kind);
                reply.send(value).is_ok()
            }
            other => {
                *slot = other;
                trace!("prompt: response with no pending prompt ignored");
                false
            }
        }
    }

    /// Cancel the in-flight prompt, if any; the requester observes `NoAnswer`.
    ///
    /// A request is in flight from the moment its requester holds the entry
    /// guard, so a cancel that lands before publish still takes effect.
    pub fn cancel(&self) {
        let mut slot = self.slot.lock();
        // The entry guard is only released under the slot lock.
        if self.entry.try_lock().is_ok() {
            trace!("prompt: cancel with nothing in flight");
            return;
        }
        match &*slot {
            Slot::Waiting { request, .. } => {
                debug!("prompt: {} prompt cancelled", request.kind);
                // Dropping the reply sender wakes the requester.
                *slot = Slot::Settled;
            }
            Slot::Idle | Slot::Claimed => {
                debug!("prompt: cancelled before publish");
                *slot = Slot::Preempted;
            }
            Slot::Preempted | Slot::Settled => {}
        }
    }

    /// Session teardown: fail the in-flight request and every later one.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!("prompt: relay closed");
        }
        self.cancel();
    }

    /// Tell the current listener about the waiting request, unless it already
    /// heard about it.
    fn announce(&self) {
        let Some((id, listener)) = self.listener.lock().clone() else {
            return;
        };
        let request = match &mut *self.slot.lock() {
            Slot::Waiting { request, announced, .. } if *announced != Some(id) => {
                *announced = Some(id);
                request.clone()
            }
            _ => return,
        };
        trace!("prompt: notifying listener {id} of {} prompt", request.kind);
        listener.prompt_pending(&request);
    }
}

/// The requester's hold on the relay, from entry until it is done.
///
/// Dropping it retires the slot and releases the entry guard together under
/// the slot lock.
struct Claim<'a> {
    relay: &'a PromptRelay,
    entry: Option<tokio::sync::MutexGuard<'a, ()>>,
}

impl<'a> Claim<'a> {
    fn new(relay: &'a PromptRelay, entry: tokio::sync::MutexGuard<'a, ()>) -> Self {
        let mut slot = relay.slot.lock();
        if !matches!(*slot, Slot::Preempted) {
            *slot = Slot::Claimed;
        }
        drop(slot);
        Self { relay, entry: Some(entry) }
    }

    /// Publish `request` and hand back the reply channel. `None` when the
    /// claim was cancelled or the relay closed first.
    fn publish(&self, request: PromptRequest) -> Option<oneshot::Receiver<PromptResponse>> {
        let kind = request.kind;
        let (tx, rx) = oneshot::channel();
        {
            let mut slot = self.relay.slot.lock();
            if self.relay.is_closed() || matches!(*slot, Slot::Preempted) {
                debug!("prompt: {kind} prompt dropped before publish");
                return None;
            }
            *slot = Slot::Waiting { request, reply: tx, announced: None };
        }
        debug!("prompt: {kind} prompt pending");
        self.relay.announce();
        Some(rx)
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        let mut slot = self.relay.slot.lock();
        *slot = Slot::Idle;
        self.entry.take();
    }
}

#[cfg(test)]
#[path = "prompt_tests.rs"]
mod tests;
