//! # Dispatch: bus events to subscribers
//!
//! One dispatcher task per coordinator reads the event bus and offers each
//! event to every subscriber's bounded lane. One worker per subscriber drains
//! its lane and calls [`Subscribe::on_event`].
//!
//! ```text
//! Bus ──► dispatcher ──┬──► [lane: log]    ──► worker ──► on_event()
//!                      └──► [lane: custom] ──► worker ──► on_event()
//! ```
//!
//! - Offering never waits: a full lane drops the event for that subscriber only.
//! - A panic in `on_event` skips that event; the worker keeps draining.
//! - When the bus closes, lanes are closed and workers finish what they hold.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{error, warn};

use crate::core::runner::panic_reason;
use crate::events::{Bus, Event};

use super::Subscribe;

struct Lane {
    subscriber: &'static str,
    tx: mpsc::Sender<Arc<Event>>,
    dropped: u64,
}

impl Lane {
    fn offer(&mut self, ev: &Arc<Event>) {
        match self.tx.try_send(Arc::clone(ev)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                warn!(subscriber = self.subscriber, kind = ?ev.kind, "subscriber lane full; event dropped");
            }
            Err(TrySendError::Closed(_)) => self.dropped += 1,
        }
    }
}

/// Subscribes to `bus` and spawns the dispatcher plus one worker per subscriber.
///
/// The returned handle completes after the bus closed and every worker drained.
pub(crate) fn spawn(bus: &Bus, subscribers: Vec<Arc<dyn Subscribe>>) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    let mut workers = JoinSet::new();
    let mut lanes = Vec::with_capacity(subscribers.len());

    for sub in subscribers {
        let (tx, queue) = mpsc::channel(sub.queue_capacity().max(1));
        lanes.push(Lane {
            subscriber: sub.name(),
            tx,
            dropped: 0,
        });
        workers.spawn(drain(sub, queue));
    }

    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ev) => {
                    let ev = Arc::new(ev);
                    for lane in &mut lanes {
                        lane.offer(&ev);
                    }
                }
                Err(RecvError::Lagged(n)) => {
                    warn!(skipped = n, "subscriber dispatch lagged behind the event bus");
                }
                Err(RecvError::Closed) => break,
            }
        }

        for lane in lanes {
            if lane.dropped > 0 {
                warn!(subscriber = lane.subscriber, dropped = lane.dropped, "subscriber missed shutdown events");
            }
        }
        while workers.join_next().await.is_some() {}
    })
}

async fn drain(sub: Arc<dyn Subscribe>, mut queue: mpsc::Receiver<Arc<Event>>) {
    while let Some(ev) = queue.recv().await {
        if let Err(payload) = AssertUnwindSafe(sub.on_event(&ev)).catch_unwind().await {
            error!(
                subscriber = sub.name(),
                kind = ?ev.kind,
                reason = %panic_reason(payload),
                "subscriber panicked; event skipped"
            );
        }
    }
}
