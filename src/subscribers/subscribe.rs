//! # Event subscriber trait.
//!
//! Provides [`Subscribe`] an extension point for plugging custom event handlers
//! into the shutdown sequence (metrics, audit, health flags).
//!
//! Each subscriber gets:
//! - **Dedicated worker task** (runs independently)
//! - **Per-subscriber bounded queue** (capacity via [`Subscribe::queue_capacity`])
//! - **Panic isolation** (panics are caught and logged)
//!
//! ## Architecture
//! ```text
//! dispatcher ──► [bounded lane] ──► worker task ──► subscriber.on_event()
//!                                 └─► panic caught → logged, worker continues
//! ```
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use terminator::{Event, EventKind, Subscribe};
//!
//! struct Health;
//!
//! #[async_trait]
//! impl Subscribe for Health {
//!     async fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::ShutdownRequested) {
//!             // flip the readiness probe to unhealthy
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "health" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Event subscriber for shutdown observability.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Handle errors internally; do not panic.
/// - Slow processing affects only this subscriber's queue.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    ///
    /// Called from a dedicated worker task, not in the publisher context.
    /// Events are delivered in FIFO order per subscriber.
    async fn on_event(&self, event: &Event);

    /// Returns the subscriber name used in logs.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose - override it when possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Returns the preferred queue capacity for this subscriber (min 1).
    ///
    /// Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
