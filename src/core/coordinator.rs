//! # Coordinator: trigger latch, hook execution, and completion.
//!
//! The [`Coordinator`] owns the hook registry and one termination-event
//! source. It converges every trigger onto a single shutdown decision, runs
//! the hooks concurrently under the grace period, releases the source, and
//! fires completion exactly once.
//!
//! ## Architecture
//! ```text
//! start() ──► source.start() ──► TriggerStream ──► driver task
//!                                                      │
//! stop() ────────────────────────► TriggerLatch ◄──────┘ (first trigger wins)
//!                                       │
//!                                       ▼
//!                      seal registry ─► snapshot ─► run_hooks (one task per hook)
//!                                                      │
//!                                                      ▼
//!                            source.cleanup() ─► report ─► Done ─► Completion::fire
//! ```
//!
//! ## Rules
//! - States only move forward: `Idle → Listening → Triggered → ExecutingHooks → Done`
//! - Exactly one trigger is honored; later ones are silent no-ops
//! - Hooks registered after the trigger are accepted but do not run
//! - The grace period is measured from the trigger, or from `start()` if `stop()` came first
//! - Waiters are released only after every dispatched hook settled and the source was released
//!
//! ## Example
//! ```rust,no_run
//! use std::time::Duration;
//! use terminator::{Coordinator, Deadline, HookError, HookFn, Options};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let coordinator = Coordinator::new(Options::default());
//!
//!     coordinator
//!         .register(
//!             "flush",
//!             HookFn::arc(|deadline: Deadline| async move {
//!                 deadline.run(async { /* flush buffers */ }).await
//!             }),
//!             Duration::from_secs(5),
//!         )
//!         .await?;
//!
//!     coordinator.start().await?;
//!     coordinator.wait().await;
//!     Ok(())
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::Options;
use crate::core::builder::CoordinatorBuilder;
use crate::core::completion::Completion;
use crate::core::latch::TriggerLatch;
use crate::core::report::ShutdownReport;
use crate::core::runner;
use crate::core::state::{ShutdownState, StateCell};
use crate::error::CoordinatorError;
use crate::events::{Bus, Event, EventKind};
use crate::hooks::{HookRef, HookRegistry, Registered};
use crate::source::{TerminationEventSource, TriggerEvent, TriggerStream};

/// Shared state behind every [`Coordinator`] clone.
pub(crate) struct Inner {
    opts: Options,
    bus: Bus,
    registry: HookRegistry,
    source: Mutex<Box<dyn TerminationEventSource>>,
    state: StateCell,
    latch: TriggerLatch,
    started: AtomicBool,
    completion: Completion,
    report: OnceLock<ShutdownReport>,
}

/// Graceful shutdown coordinator.
///
/// Cheap to clone; all clones drive the same shutdown sequence.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<Inner>,
}

impl Coordinator {
    /// Creates a coordinator with the platform source for `opts` and the default [`LogWriter`](crate::LogWriter).
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(opts: Options) -> Self {
        CoordinatorBuilder::new(opts).build()
    }

    /// Starts a builder for custom sources or subscribers.
    pub fn builder(opts: Options) -> CoordinatorBuilder {
        CoordinatorBuilder::new(opts)
    }

    pub(crate) fn from_parts(
        opts: Options,
        bus: Bus,
        source: Box<dyn TerminationEventSource>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                opts,
                bus,
                registry: HookRegistry::new(),
                source: Mutex::new(source),
                state: StateCell::new(),
                latch: TriggerLatch::new(),
                started: AtomicBool::new(false),
                completion: Completion::new(),
                report: OnceLock::new(),
            }),
        }
    }

    /// Registers a hook to run on shutdown.
    ///
    /// Registration after the trigger is accepted (and reported with
    /// [`EventKind::HookRegisteredLate`]) but the hook does not run.
    ///
    /// ### Errors
    /// - [`CoordinatorError::EmptyHookName`]
    /// - [`CoordinatorError::ZeroTimeout`]
    /// - [`CoordinatorError::DuplicateHook`]
    pub async fn register(
        &self,
        name: &str,
        hook: HookRef,
        timeout: Duration,
    ) -> Result<(), CoordinatorError> {
        let kind = match self.inner.registry.register(name, hook, timeout).await? {
            Registered::Pending => EventKind::HookRegistered,
            Registered::AfterSeal => EventKind::HookRegisteredLate,
        };
        self.inner
            .bus
            .publish(Event::new(kind).with_hook(name).with_timeout(timeout));
        Ok(())
    }

    /// Validates the options, arms the termination source, and returns immediately.
    ///
    /// If the source fails to arm, the coordinator stays `Idle` and `start`
    /// may be called again.
    ///
    /// ### Errors
    /// - [`CoordinatorError::InvalidOptions`] if [`Options::validate`] fails; nothing is armed
    /// - [`CoordinatorError::AlreadyStarted`] on a second successful call
    /// - [`CoordinatorError::Source`] if the source could not be armed
    pub async fn start(&self) -> Result<(), CoordinatorError> {
        self.inner.opts.validate()?;
        if self
            .inner
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CoordinatorError::AlreadyStarted);
        }

        let (stream, source_name) = {
            let mut source = self.inner.source.lock().await;
            match source.start() {
                Ok(stream) => (stream, source.name()),
                Err(e) => {
                    self.inner.started.store(false, Ordering::Release);
                    return Err(e.into());
                }
            }
        };
        let armed_at = Instant::now();

        self.inner.state.advance(ShutdownState::Listening);
        self.inner
            .bus
            .publish(Event::new(EventKind::Listening).with_reason(source_name));

        tokio::spawn(drive(Arc::clone(&self.inner), stream, armed_at));
        Ok(())
    }

    /// Requests shutdown manually. Idempotent.
    ///
    /// Called before [`start`](Self::start), the request is latched and the
    /// sequence runs as soon as the coordinator is started.
    pub fn stop(&self) -> Result<(), CoordinatorError> {
        self.inner.trigger(TriggerEvent::ManualStop);
        Ok(())
    }

    /// Completes once the shutdown sequence is `Done`.
    pub async fn wait(&self) {
        self.inner.completion.wait().await
    }

    /// Blocks the calling OS thread until the shutdown sequence is `Done`.
    ///
    /// Do not call from inside an async task.
    pub fn wait_blocking(&self) {
        self.inner.completion.wait_blocking()
    }

    /// Completion signal, observable independently of the coordinator.
    pub fn done(&self) -> Completion {
        self.inner.completion.clone()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ShutdownState {
        self.inner.state.get()
    }

    /// The trigger that won the latch, if any.
    pub fn trigger_event(&self) -> Option<TriggerEvent> {
        self.inner.latch.record().map(|(event, _)| event)
    }

    /// Summary of the finished sequence; `None` until `Done`.
    pub fn report(&self) -> Option<ShutdownReport> {
        self.inner.report.get().cloned()
    }

    /// Number of registered hooks, including late ones.
    pub async fn hook_count(&self) -> usize {
        self.inner.registry.len().await
    }

    /// Configured options.
    pub fn options(&self) -> &Options {
        &self.inner.opts
    }

    /// Event bus, for subscribing to raw shutdown events.
    pub fn bus(&self) -> &Bus {
        &self.inner.bus
    }
}

impl Inner {
    /// Latches `event` if it is the first trigger; seals the registry at that instant.
    fn trigger(&self, event: TriggerEvent) -> bool {
        if !self.latch.fire(event) {
            return false;
        }
        self.registry.seal();
        self.bus
            .publish(Event::new(EventKind::ShutdownRequested).with_trigger(event));
        true
    }
}

/// Waits for the first trigger, then runs the shutdown sequence to `Done`.
async fn drive(inner: Arc<Inner>, mut stream: TriggerStream, armed_at: Instant) {
    loop {
        tokio::select! {
            biased;
            _ = inner.latch.fired() => break,
            ev = stream.recv() => match ev {
                Some(ev) => {
                    inner.trigger(ev);
                }
                None => {
                    inner.latch.fired().await;
                    break;
                }
            },
        }
    }
    let Some((trigger, fired_at)) = inner.latch.record() else {
        return;
    };
    let origin = fired_at.max(armed_at);

    inner.state.advance(ShutdownState::Triggered);
    inner.state.advance(ShutdownState::ExecutingHooks);

    let entries = inner.registry.snapshot().await;
    let outcomes = runner::run_hooks(entries, origin + inner.opts.grace_period, &inner.bus).await;
    let report = ShutdownReport {
        trigger,
        outcomes,
        elapsed: origin.elapsed(),
    };

    let failed = report.failures();
    inner.bus.publish(
        Event::new(EventKind::HooksSettled)
            .with_elapsed(report.elapsed)
            .with_reason(format!(
                "{} completed, {} not completed",
                report.outcomes.len() - failed,
                failed
            )),
    );
    if report.grace_exceeded() {
        inner.bus.publish(
            Event::new(EventKind::GraceExceeded).with_timeout(inner.opts.grace_period),
        );
    }

    drop(stream);
    if let Err(e) = inner.source.lock().await.cleanup() {
        inner
            .bus
            .publish(Event::new(EventKind::SourceCleanupFailed).with_reason(e.to_string()));
    }

    let elapsed = report.elapsed;
    let _ = inner.report.set(report);
    inner.state.advance(ShutdownState::Done);
    inner.bus.publish(
        Event::new(EventKind::ShutdownCompleted)
            .with_trigger(trigger)
            .with_elapsed(elapsed),
    );
    inner.completion.fire();
}
