//! Shutdown events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the coordinator, the hook registry,
//! and hook workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Coordinator` (registration, trigger, settle, completion),
//!   `runner` hook workers (per-hook outcome).
//! - **Consumers**: the coordinator's subscriber dispatcher, which hands each
//!   event to one bounded lane per subscriber.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
