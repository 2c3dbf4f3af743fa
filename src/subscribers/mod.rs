//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait and the built-in [`LogWriter`].
//! Each coordinator delivers bus events to its subscribers through one
//! dispatcher task with a bounded lane per subscriber.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Hook worker ── publish(Event) ──► Bus ──► dispatcher ──► lane per subscriber
//!                                                              │
//!                                                    ┌─────────┼─────────┐
//!                                                    ▼         ▼         ▼
//!                                                LogWriter  Metrics   Custom
//! ```

pub(crate) mod dispatch;
mod log;
mod subscribe;

pub use log::LogWriter;
pub use subscribe::Subscribe;
