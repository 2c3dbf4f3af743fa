//! # Deadline scope handed to every hook.
//!
//! A [`Deadline`] combines the instant at which the hook's budget runs out with
//! a [`CancellationToken`] that the coordinator cancels at that instant. Hooks
//! observe it cooperatively; nothing is interrupted by force.
//!
//! ```text
//! trigger ──► effective = min(now + hook.timeout, trigger + grace)
//!                 │
//!                 ├─► Deadline { at: effective, token }
//!                 └─► at `effective`: token.cancel()  (hook should wrap up)
//! ```

use std::future::Future;
use std::time::Duration;

use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::HookError;

/// Cooperative deadline for a single hook execution.
#[derive(Clone, Debug)]
pub struct Deadline {
    at: Instant,
    budget: Duration,
    token: CancellationToken,
}

impl Deadline {
    /// Creates a deadline expiring at `at` and signalled through `token`.
    pub(crate) fn new(at: Instant, token: CancellationToken) -> Self {
        Self {
            at,
            budget: at.saturating_duration_since(Instant::now()),
            token,
        }
    }

    /// Creates a standalone deadline expiring `budget` from now.
    ///
    /// Useful to drive hooks outside a coordinator (tests, manual cleanup).
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
            budget,
            token: CancellationToken::new(),
        }
    }

    /// Instant at which the budget runs out.
    pub fn at(&self) -> Instant {
        self.at
    }

    /// Total budget this hook was given.
    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Time left before expiry (zero once expired).
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    /// True once the deadline passed or was signalled.
    pub fn is_expired(&self) -> bool {
        self.token.is_cancelled() || Instant::now() >= self.at
    }

    /// Completes when the deadline expires or is signalled, whichever comes first.
    pub async fn expired(&self) {
        tokio::select! {
            _ = self.token.cancelled() => {}
            _ = time::sleep_until(self.at) => {}
        }
    }

    /// Token cancelled when the deadline expires.
    ///
    /// Hand it to APIs that accept a cancellation token.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Runs `fut` until it completes or the deadline expires.
    ///
    /// Returns [`HookError::DeadlineExceeded`] if the deadline wins; `fut` is dropped.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use terminator::{Deadline, HookError};
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let deadline = Deadline::after(Duration::from_millis(10));
    /// let res = deadline.run(std::future::pending::<()>()).await;
    /// assert!(matches!(res, Err(HookError::DeadlineExceeded { .. })));
    /// # }
    /// ```
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, HookError> {
        tokio::select! {
            out = fut => Ok(out),
            _ = self.expired() => Err(HookError::DeadlineExceeded { deadline: self.budget }),
        }
    }
}
