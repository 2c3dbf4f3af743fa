//! Outcome of a finished shutdown sequence.

use std::sync::Arc;
use std::time::Duration;

use crate::source::TriggerEvent;

/// How a single hook settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookStatus {
    /// Returned `Ok(())` before its deadline.
    Completed,
    /// Returned an error.
    Failed {
        /// Error message.
        error: String,
    },
    /// Did not return before its effective deadline.
    TimedOut {
        /// `true` if the grace period, not the hook's own timeout, set the deadline.
        cut_by_grace: bool,
    },
    /// Panicked while running.
    Panicked {
        /// Panic payload, when it was a string.
        reason: String,
    },
}

impl HookStatus {
    /// True only for [`HookStatus::Completed`].
    pub fn is_success(&self) -> bool {
        matches!(self, HookStatus::Completed)
    }
}

/// Per-hook entry of a [`ShutdownReport`].
#[derive(Debug, Clone)]
pub struct HookOutcome {
    /// Hook name.
    pub name: Arc<str>,
    /// How it settled.
    pub status: HookStatus,
    /// Time from dispatch until settled (or until its deadline).
    pub elapsed: Duration,
    /// Effective budget: `min(hook timeout, remaining grace)` at dispatch.
    pub deadline: Duration,
}

/// Summary published once the coordinator reaches `Done`.
#[derive(Debug, Clone)]
pub struct ShutdownReport {
    /// Trigger that started the sequence.
    pub trigger: TriggerEvent,
    /// One entry per dispatched hook, sorted by name.
    pub outcomes: Vec<HookOutcome>,
    /// Time from trigger until every hook settled.
    pub elapsed: Duration,
}

impl ShutdownReport {
    /// Outcome for `name`, if that hook was dispatched.
    pub fn outcome(&self, name: &str) -> Option<&HookOutcome> {
        self.outcomes.iter().find(|o| &*o.name == name)
    }

    /// True if every dispatched hook completed.
    pub fn all_completed(&self) -> bool {
        self.outcomes.iter().all(|o| o.status.is_success())
    }

    /// Number of hooks that did not complete.
    pub fn failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| !o.status.is_success())
            .count()
    }

    /// True if any hook was cut off by the grace period.
    pub fn grace_exceeded(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| matches!(o.status, HookStatus::TimedOut { cut_by_grace: true }))
    }
}
