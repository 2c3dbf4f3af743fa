//! # Shutdown events emitted by the coordinator and hook workers.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Registration events**: hooks added to the registry
//! - **Trigger events**: the single trigger that started shutdown
//! - **Hook events**: per-hook execution outcome (starting, completed, failed, timed out)
//! - **Terminal events**: settle, source cleanup, completion
//!
//! The [`Event`] struct carries additional metadata such as timestamps, hook name,
//! reasons, and durations.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use terminator::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::HookFailed)
//!     .with_hook("db-pool")
//!     .with_reason("connection reset")
//!     .with_elapsed(Duration::from_millis(40));
//!
//! assert_eq!(ev.kind, EventKind::HookFailed);
//! assert_eq!(ev.hook.as_deref(), Some("db-pool"));
//! assert_eq!(ev.reason.as_deref(), Some("connection reset"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::source::TriggerEvent;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of shutdown events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Registration ===
    /// Hook added to the registry before the trigger.
    ///
    /// Sets:
    /// - `hook`: hook name
    /// - `timeout_ms`: hook timeout
    HookRegistered,

    /// Hook added after the trigger; it will not run in this shutdown pass.
    ///
    /// Sets:
    /// - `hook`: hook name
    /// - `timeout_ms`: hook timeout
    HookRegisteredLate,

    // === Lifecycle ===
    /// Termination source armed; the coordinator is listening.
    ///
    /// Sets:
    /// - `reason`: source name
    Listening,

    /// Shutdown requested (first trigger won the latch).
    ///
    /// Sets:
    /// - `trigger`: what started the shutdown
    ShutdownRequested,

    // === Hook execution ===
    /// Hook dispatched on its own worker.
    ///
    /// Sets:
    /// - `hook`: hook name
    /// - `timeout_ms`: effective budget (min of hook timeout and remaining grace)
    HookStarting,

    /// Hook returned `Ok(())` before its deadline.
    ///
    /// Sets:
    /// - `hook`: hook name
    /// - `elapsed_ms`: execution time
    HookCompleted,

    /// Hook returned an error or panicked.
    ///
    /// Sets:
    /// - `hook`: hook name
    /// - `reason`: error message
    /// - `elapsed_ms`: execution time
    HookFailed,

    /// Hook deadline expired before it returned.
    ///
    /// Sets:
    /// - `hook`: hook name
    /// - `timeout_ms`: effective budget that expired
    /// - `reason`: "hook_timeout" or "grace_period"
    HookTimedOut,

    // === Terminal ===
    /// Every dispatched hook settled.
    ///
    /// Sets:
    /// - `elapsed_ms`: time since the trigger
    /// - `reason`: summary counts
    HooksSettled,

    /// At least one hook was cut off by the grace period.
    ///
    /// Sets:
    /// - `timeout_ms`: configured grace period
    GraceExceeded,

    /// Releasing the termination source failed.
    ///
    /// Sets:
    /// - `reason`: error message
    SourceCleanupFailed,

    /// Shutdown sequence finished; waiters are released.
    ///
    /// Sets:
    /// - `trigger`: what started the shutdown
    /// - `elapsed_ms`: time since the trigger
    ShutdownCompleted,
}

/// Shutdown event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the hook, if applicable.
    pub hook: Option<Arc<str>>,
    /// Human-readable reason (errors, source name, summaries).
    pub reason: Option<Arc<str>>,
    /// Budget in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Elapsed time in milliseconds (compact).
    pub elapsed_ms: Option<u32>,
    /// Trigger that started the shutdown.
    pub trigger: Option<TriggerEvent>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            hook: None,
            reason: None,
            timeout_ms: None,
            elapsed_ms: None,
            trigger: None,
        }
    }

    /// Attaches a hook name.
    #[inline]
    pub fn with_hook(mut self, hook: impl Into<Arc<str>>) -> Self {
        self.hook = Some(hook.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a budget (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(compact_ms(d));
        self
    }

    /// Attaches an elapsed time (stored as milliseconds).
    #[inline]
    pub fn with_elapsed(mut self, d: Duration) -> Self {
        self.elapsed_ms = Some(compact_ms(d));
        self
    }

    /// Attaches the trigger.
    #[inline]
    pub fn with_trigger(mut self, trigger: TriggerEvent) -> Self {
        self.trigger = Some(trigger);
        self
    }

    /// True for per-hook outcome events.
    #[inline]
    pub fn is_hook_outcome(&self) -> bool {
        matches!(
            self.kind,
            EventKind::HookCompleted | EventKind::HookFailed | EventKind::HookTimedOut
        )
    }
}

fn compact_ms(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}
