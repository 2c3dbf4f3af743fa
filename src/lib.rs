//! # terminator
//!
//! **Terminator** coordinates graceful process termination for async Rust services.
//!
//! It listens for a termination request (an OS signal, a command on a local
//! IPC endpoint, or a manual `stop()`), then runs every registered cleanup
//! hook concurrently, each bounded by its own timeout and all bounded by a
//! global grace period, before releasing whoever waits for shutdown.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   SIGINT / SIGTERM / SIGHUP        "SHUTDOWN" on local endpoint      stop()
//!             │                                │                          │
//!             └──────────► TerminationEventSource ◄┘                      │
//!                                   │ TriggerStream                       │
//!                                   ▼                                     ▼
//! ┌───────────────────────────────────────────────────────────────────────────┐
//! │  Coordinator                                                              │
//! │  - TriggerLatch (first trigger wins, seals the registry)                  │
//! │  - HookRegistry (name → hook, timeout)                                    │
//! │  - StateCell (Idle → Listening → Triggered → ExecutingHooks → Done)       │
//! └──────┬──────────────────┬──────────────────┬──────────────────────────────┘
//!        ▼                  ▼                  ▼
//!   ┌──────────┐       ┌──────────┐       ┌──────────┐
//!   │  hook #1 │       │  hook #2 │       │  hook #3 │   one task each,
//!   │ Deadline │       │ Deadline │       │ Deadline │   min(timeout, grace)
//!   └────┬─────┘       └────┬─────┘       └────┬─────┘
//!        │ HookStarting / HookCompleted / HookFailed / HookTimedOut
//!        ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                            │
//! └─────────────────────────────────┬─────────────────────────────────────────┘
//!                                   ▼
//!                          dispatcher ──► lane per subscriber
//!                                              ┌─────┴─────┐
//!                                              ▼           ▼
//!                                          LogWriter     custom
//! ```
//!
//! ### Lifecycle
//! ```text
//! register(..)* ──► start() ──► Listening
//!
//! first trigger ──► Triggered ──► seal registry ──► ExecutingHooks
//!   │
//!   ├─► spawn one task per hook under min(now + timeout, trigger + grace)
//!   ├─► wait until each settles: Completed | Failed | Panicked | TimedOut
//!   ├─► source.cleanup()
//!   └─► Done ──► Completion fires ──► wait() / wait_blocking() return
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                               |
//! |-------------------|---------------------------------------------------------------|--------------------------------------------------|
//! | **Coordination**  | One shutdown decision, concurrent bounded hooks, completion.  | [`Coordinator`], [`ShutdownState`], [`Completion`] |
//! | **Hooks**         | Deadline-aware cleanup actions.                               | [`ShutdownHook`], [`HookFn`], [`Deadline`]       |
//! | **Sources**       | OS signals and a local remote-command endpoint.               | [`TerminationEventSource`], [`SignalSource`], [`RemoteTriggerSource`] |
//! | **Remote sender** | Trigger shutdown of another process on the same host.         | [`send_shutdown`], [`Endpoint`]                  |
//! | **Subscriber API**| Observe shutdown events (logging, metrics, health flags).     | [`Subscribe`], [`LogWriter`], [`Event`]          |
//! | **Errors**        | Typed errors with stable labels.                              | [`CoordinatorError`], [`HookError`], [`SourceError`] |
//! | **Configuration** | Grace period and endpoint, from code or TOML.                 | [`Options`]                                      |
//!
//! ## Example
//! ```rust,no_run
//! use std::time::Duration;
//! use terminator::{Coordinator, Deadline, HookError, HookFn, Options};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let opts = Options::default().with_grace_period(Duration::from_secs(10));
//!     let coordinator = Coordinator::new(opts);
//!
//!     coordinator
//!         .register(
//!             "db-pool",
//!             HookFn::arc(|deadline: Deadline| async move {
//!                 deadline
//!                     .run(async { /* drain connections */ })
//!                     .await
//!             }),
//!             Duration::from_secs(5),
//!         )
//!         .await?;
//!
//!     coordinator.start().await?;
//!     coordinator.wait().await;
//!
//!     if let Some(report) = coordinator.report() {
//!         println!("shutdown by {} in {:?}", report.trigger, report.elapsed);
//!     }
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod hooks;
pub mod logging;
pub mod source;
mod subscribers;

// ---- Public re-exports ----

pub use crate::core::{
    Completion, Coordinator, CoordinatorBuilder, HookOutcome, HookStatus, ShutdownReport,
    ShutdownState,
};
pub use config::Options;
pub use error::{ConfigError, CoordinatorError, HookError, RemoteError, SourceError};
pub use events::{Bus, Event, EventKind};
pub use hooks::{Deadline, HookEntry, HookFn, HookRef, HookRegistry, Registered, ShutdownHook};
pub use source::{
    Endpoint, RemoteTriggerSource, SignalKind, SignalSource, TerminationEventSource,
    TriggerEvent, TriggerSender, TriggerStream, send_shutdown,
};
pub use subscribers::{LogWriter, Subscribe};
