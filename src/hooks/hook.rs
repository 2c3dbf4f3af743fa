//! # Shutdown hook abstraction.
//!
//! This module defines the [`ShutdownHook`] trait (async, deadline-aware).
//! The common handle type is [`HookRef`], an `Arc<dyn ShutdownHook>` suitable
//! for sharing between the registry and hook workers.
//!
//! A hook receives a [`Deadline`] and should wrap up before it expires.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HookError;
use crate::hooks::Deadline;

/// Shared handle to a hook.
pub type HookRef = Arc<dyn ShutdownHook>;

/// # Asynchronous, deadline-bound cleanup action.
///
/// Hooks run concurrently and in no particular order. An error is recorded
/// and reported; it does not affect sibling hooks.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use terminator::{Deadline, HookError, ShutdownHook};
///
/// struct FlushMetrics;
///
/// #[async_trait]
/// impl ShutdownHook for FlushMetrics {
///     async fn execute(&self, deadline: Deadline) -> Result<(), HookError> {
///         deadline.run(async { /* flush... */ }).await
///     }
/// }
/// ```
#[async_trait]
pub trait ShutdownHook: Send + Sync + 'static {
    /// Performs the cleanup.
    ///
    /// Implementations should observe `deadline` and return once it expires.
    async fn execute(&self, deadline: Deadline) -> Result<(), HookError>;
}
