//! # Hook abstractions and the hook registry.
//!
//! This module provides the hook-related types:
//! - [`ShutdownHook`] - trait for deadline-aware cleanup actions
//! - [`HookFn`] - function-backed hook implementation
//! - [`HookRef`] - shared reference to a hook (`Arc<dyn ShutdownHook>`)
//! - [`Deadline`] - cooperative deadline scope handed to each execution
//! - [`HookRegistry`] / [`HookEntry`] - append-only name → hook mapping

mod deadline;
mod hook;
mod hook_fn;
mod registry;

pub use deadline::Deadline;
pub use hook::{HookRef, ShutdownHook};
pub use hook_fn::HookFn;
pub use registry::{HookEntry, HookRegistry, Registered};
