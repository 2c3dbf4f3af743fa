//! Shutdown orchestration.
//!
//! - [`Coordinator`] public entry point: register hooks, start, stop, wait
//! - [`CoordinatorBuilder`] custom source and subscribers
//! - [`ShutdownState`] lifecycle phase
//! - [`Completion`] single-fire done signal
//! - [`ShutdownReport`] per-hook outcomes of a finished sequence
//!
//! Internal: the trigger latch, the forward-only state cell, and the hook runner.

mod builder;
mod completion;
mod coordinator;
mod latch;
mod report;
pub(crate) mod runner;
mod state;

pub use builder::CoordinatorBuilder;
pub use completion::Completion;
pub use coordinator::Coordinator;
pub use report::{HookOutcome, HookStatus, ShutdownReport};
pub use state::ShutdownState;
