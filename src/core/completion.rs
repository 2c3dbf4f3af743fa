//! Completion signal: fires once, observed by any number of waiters.

use tokio_util::sync::CancellationToken;

/// Single-fire, payload-less "shutdown finished" signal.
///
/// Cheap to clone; every clone observes the same signal. Async waiters use
/// [`wait`](Self::wait), plain OS threads use [`wait_blocking`](Self::wait_blocking).
#[derive(Clone, Debug, Default)]
pub struct Completion {
    token: CancellationToken,
}

impl Completion {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Fires the signal. Idempotent.
    pub(crate) fn fire(&self) {
        self.token.cancel();
    }

    /// True once fired.
    pub fn is_done(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes once fired.
    pub async fn wait(&self) {
        self.token.cancelled().await
    }

    /// Blocks the calling thread until fired.
    ///
    /// Call it from a plain OS thread (e.g. `main` outside the runtime or a
    /// `spawn_blocking` closure), never from inside an async task.
    pub fn wait_blocking(&self) {
        futures::executor::block_on(self.token.cancelled());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_many_threads_release_together() {
        let done = Completion::new();
        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let d = done.clone();
                std::thread::spawn(move || d.wait_blocking())
            })
            .collect();

        assert!(!done.is_done());
        done.fire();
        done.fire();
        for w in waiters {
            w.join().unwrap();
        }
        assert!(done.is_done());
    }

    #[tokio::test]
    async fn test_wait_after_fire_returns_immediately() {
        let done = Completion::new();
        done.fire();
        done.wait().await;
        done.clone().wait().await;
    }
}
