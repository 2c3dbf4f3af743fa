//! Coordinator lifecycle state.
//!
//! ```text
//! Idle ──start()──► Listening ──trigger──► Triggered ──► ExecutingHooks ──► Done
//! ```
//! Transitions only move forward; a stale writer can never move the state back.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle phase of a [`Coordinator`](crate::Coordinator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ShutdownState {
    /// Constructed, hooks may be registered; nothing is armed.
    Idle = 0,
    /// The termination source is armed.
    Listening = 1,
    /// A trigger won the latch.
    Triggered = 2,
    /// Hooks are running.
    ExecutingHooks = 3,
    /// Every hook settled and the source was released.
    Done = 4,
}

impl ShutdownState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => ShutdownState::Idle,
            1 => ShutdownState::Listening,
            2 => ShutdownState::Triggered,
            3 => ShutdownState::ExecutingHooks,
            _ => ShutdownState::Done,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ShutdownState::Idle => "idle",
            ShutdownState::Listening => "listening",
            ShutdownState::Triggered => "triggered",
            ShutdownState::ExecutingHooks => "executing_hooks",
            ShutdownState::Done => "done",
        }
    }
}

impl fmt::Display for ShutdownState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Atomic, forward-only state cell.
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(ShutdownState::Idle as u8))
    }

    pub(crate) fn get(&self) -> ShutdownState {
        ShutdownState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Moves to `target` if it is ahead of the current state.
    ///
    /// Returns `true` if the state changed.
    pub(crate) fn advance(&self, target: ShutdownState) -> bool {
        let target = target as u8;
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                (cur < target).then_some(target)
            })
            .is_ok()
    }
}
