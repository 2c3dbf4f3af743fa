use std::sync::Arc;

use crate::config::Options;
use crate::core::Coordinator;
use crate::events::Bus;
use crate::source::{self, TerminationEventSource};
use crate::subscribers::{LogWriter, Subscribe, dispatch};

/// Builder for a [`Coordinator`] with a custom source or extra subscribers.
pub struct CoordinatorBuilder {
    opts: Options,
    source: Option<Box<dyn TerminationEventSource>>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    log_writer: bool,
}

impl CoordinatorBuilder {
    /// Creates a new builder with the given options.
    pub fn new(opts: Options) -> Self {
        Self {
            opts,
            source: None,
            subscribers: Vec::new(),
            log_writer: true,
        }
    }

    /// Replaces the platform source picked by [`source::for_options`].
    pub fn with_source(mut self, source: impl TerminationEventSource) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Adds event subscribers.
    ///
    /// Subscribers receive shutdown events (registration, trigger, per-hook
    /// outcome, completion) through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers.extend(subscribers);
        self
    }

    /// Skips the built-in [`LogWriter`].
    pub fn without_log_writer(mut self) -> Self {
        self.log_writer = false;
        self
    }

    /// Builds the coordinator.
    ///
    /// Spawns the subscriber workers, so it must run inside a Tokio runtime.
    /// Options are not checked here; [`Coordinator::start`] rejects invalid ones.
    pub fn build(self) -> Coordinator {
        let bus = Bus::new(self.opts.bus_capacity_clamped());
        let source = self
            .source
            .unwrap_or_else(|| source::for_options(&self.opts));

        let mut subscribers = self.subscribers;
        if self.log_writer {
            subscribers.insert(0, Arc::new(LogWriter::new()));
        }
        if !subscribers.is_empty() {
            dispatch::spawn(&bus, subscribers);
        }

        Coordinator::from_parts(self.opts, bus, source)
    }
}
