//! Single-fire trigger latch.
//!
//! Every trigger path (signal, remote command, `stop()`) funnels into
//! [`TriggerLatch::fire`]. Setting the record is the compare-and-set: the
//! first caller stores what happened and when, everyone after it is a no-op.
//! A fired latch therefore always has a record.

use std::sync::OnceLock;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::source::TriggerEvent;

#[derive(Debug)]
pub(crate) struct TriggerLatch {
    record: OnceLock<(TriggerEvent, Instant)>,
    token: CancellationToken,
}

impl TriggerLatch {
    pub(crate) fn new() -> Self {
        Self {
            record: OnceLock::new(),
            token: CancellationToken::new(),
        }
    }

    /// Returns `true` only for the first caller.
    pub(crate) fn fire(&self, event: TriggerEvent) -> bool {
        if self.record.set((event, Instant::now())).is_err() {
            return false;
        }
        self.token.cancel();
        true
    }

    /// The winning trigger and its instant, once the latch has fired.
    pub(crate) fn record(&self) -> Option<(TriggerEvent, Instant)> {
        self.record.get().copied()
    }

    /// Completes once the latch has fired and the record is readable.
    pub(crate) async fn fired(&self) {
        self.token.cancelled().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SignalKind;

    #[tokio::test]
    async fn test_first_trigger_wins() {
        let latch = TriggerLatch::new();
        assert!(latch.record().is_none());

        assert!(latch.fire(TriggerEvent::RemoteCommand));
        assert!(!latch.fire(TriggerEvent::Signal(SignalKind::Interrupt)));
        assert!(!latch.fire(TriggerEvent::ManualStop));

        latch.fired().await;
        assert!(latch.token.is_cancelled());
        assert_eq!(
            latch.record().map(|(ev, _)| ev),
            Some(TriggerEvent::RemoteCommand)
        );
    }

    #[test]
    fn test_concurrent_fire_has_one_winner() {
        let latch = std::sync::Arc::new(TriggerLatch::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let l = latch.clone();
                std::thread::spawn(move || l.fire(TriggerEvent::ManualStop))
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }

    #[test]
    fn test_cancelled_latch_always_has_a_record() {
        for _ in 0..200 {
            let latch = std::sync::Arc::new(TriggerLatch::new());
            let firers: Vec<_> = [TriggerEvent::ManualStop, TriggerEvent::RemoteCommand]
                .into_iter()
                .map(|ev| {
                    let l = latch.clone();
                    std::thread::spawn(move || l.fire(ev))
                })
                .collect();
            let observer = {
                let l = latch.clone();
                std::thread::spawn(move || {
                    while !l.token.is_cancelled() {
                        std::hint::spin_loop();
                    }
                    l.record().is_some()
                })
            };
            for f in firers {
                f.join().unwrap();
            }
            assert!(observer.join().unwrap());
        }
    }
}
