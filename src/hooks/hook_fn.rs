//! # Function-backed hook (`HookFn`)
//!
//! [`HookFn`] wraps a closure `F: Fn(Deadline) -> Fut`, producing a fresh
//! future per execution. If the closure needs shared state, capture an
//! `Arc<...>` explicitly.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use terminator::{Deadline, HookError, HookFn, HookRef};
//!
//! let hook: HookRef = HookFn::arc(|deadline: Deadline| async move {
//!     if deadline.is_expired() {
//!         return Err(HookError::Canceled);
//!     }
//!     // close listeners...
//!     Ok(())
//! });
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HookError;
use crate::hooks::{Deadline, ShutdownHook};

/// Function-backed hook implementation.
#[derive(Debug)]
pub struct HookFn<F> {
    f: F,
}

impl<F> HookFn<F> {
    /// Creates a new function-backed hook.
    ///
    /// Prefer [`HookFn::arc`] when you immediately need a [`HookRef`](crate::HookRef).
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the hook and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> ShutdownHook for HookFn<F>
where
    F: Fn(Deadline) -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = Result<(), HookError>> + Send + 'static,
{
    async fn execute(&self, deadline: Deadline) -> Result<(), HookError> {
        (self.f)(deadline).await
    }
}
