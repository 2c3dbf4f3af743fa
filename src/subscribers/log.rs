//! # LogWriter: shutdown events to `tracing`
//!
//! The built-in subscriber that turns [`Event`]s into structured log records.
//! The coordinator installs it by default; see
//! [`CoordinatorBuilder::without_log_writer`](crate::CoordinatorBuilder::without_log_writer).
//!
//! ## Example output (fmt layer)
//! ```text
//! INFO  shutdown requested trigger=signal(terminate)
//! INFO  executing hook hook="http-server" budget_ms=10000
//! WARN  hook failed hook="db-pool" reason="connection reset" elapsed_ms=41
//! WARN  hook timed out hook="flush" budget_ms=3000 cause="grace_period"
//! INFO  shutdown completed trigger=signal(terminate) elapsed_ms=3001
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let hook = e.hook.as_deref().unwrap_or("");
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::HookRegistered => {
                debug!(hook, timeout_ms = ?e.timeout_ms, "hook registered");
            }
            EventKind::HookRegisteredLate => {
                warn!(
                    hook,
                    "hook registered after shutdown started; it will not run in this pass"
                );
            }
            EventKind::Listening => {
                info!(source = reason, "listening for termination events");
            }
            EventKind::ShutdownRequested => {
                if let Some(trigger) = e.trigger {
                    info!(%trigger, "shutdown requested");
                }
            }
            EventKind::HookStarting => {
                info!(hook, budget_ms = ?e.timeout_ms, "executing hook");
            }
            EventKind::HookCompleted => {
                info!(hook, elapsed_ms = ?e.elapsed_ms, "hook completed");
            }
            EventKind::HookFailed => {
                warn!(hook, reason, elapsed_ms = ?e.elapsed_ms, "hook failed");
            }
            EventKind::HookTimedOut => {
                warn!(hook, budget_ms = ?e.timeout_ms, cause = reason, "hook timed out");
            }
            EventKind::HooksSettled => {
                info!(summary = reason, elapsed_ms = ?e.elapsed_ms, "all hooks settled");
            }
            EventKind::GraceExceeded => {
                warn!(grace_ms = ?e.timeout_ms, "grace period exceeded");
            }
            EventKind::SourceCleanupFailed => {
                error!(reason, "failed to release termination source");
            }
            EventKind::ShutdownCompleted => {
                if let Some(trigger) = e.trigger {
                    info!(%trigger, elapsed_ms = ?e.elapsed_ms, "shutdown completed");
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
