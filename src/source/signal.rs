//! # OS signal source.
//!
//! **Unix:** `SIGINT`, `SIGTERM`, `SIGHUP` via [`tokio::signal::unix`].
//!
//! **Windows:** Ctrl-C, console close, and system shutdown via [`tokio::signal::windows`].
//!
//! Listeners are registered inside [`SignalSource::start`], so a failure is
//! returned to the caller instead of being lost in a background task. Once
//! registered, a listener task republishes every delivery until `cleanup`.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::SourceError;
use crate::source::{
    SignalKind, TRIGGER_CAPACITY, TerminationEventSource, TriggerEvent, TriggerSender,
    TriggerStream,
};

/// Signals-only termination source.
#[derive(Debug, Default)]
pub struct SignalSource {
    token: Option<CancellationToken>,
    started: bool,
}

impl SignalSource {
    /// Creates an unarmed source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the platform signals and spawns the listener task.
    ///
    /// The task exits when `token` is cancelled.
    #[cfg(unix)]
    pub(crate) fn spawn_into(
        tx: TriggerSender,
        token: CancellationToken,
    ) -> Result<(), SourceError> {
        use tokio::signal::unix::{SignalKind as Unix, signal};

        let mut sigint = signal(Unix::interrupt()).map_err(SourceError::Signal)?;
        let mut sigterm = signal(Unix::terminate()).map_err(SourceError::Signal)?;
        let mut sighup = signal(Unix::hangup()).map_err(SourceError::Signal)?;

        tokio::spawn(async move {
            loop {
                let kind = tokio::select! {
                    _ = token.cancelled() => break,
                    Some(()) = sigint.recv() => SignalKind::Interrupt,
                    Some(()) = sigterm.recv() => SignalKind::Terminate,
                    Some(()) = sighup.recv() => SignalKind::Hangup,
                    else => break,
                };
                debug!(signal = kind.as_label(), "termination signal received");
                tx.publish(TriggerEvent::Signal(kind));
            }
        });
        Ok(())
    }

    /// Registers the platform signals and spawns the listener task.
    ///
    /// The task exits when `token` is cancelled.
    #[cfg(windows)]
    pub(crate) fn spawn_into(
        tx: TriggerSender,
        token: CancellationToken,
    ) -> Result<(), SourceError> {
        use tokio::signal::windows::{ctrl_c, ctrl_close, ctrl_shutdown};

        let mut interrupt = ctrl_c().map_err(SourceError::Signal)?;
        let mut close = ctrl_close().map_err(SourceError::Signal)?;
        let mut shutdown = ctrl_shutdown().map_err(SourceError::Signal)?;

        tokio::spawn(async move {
            loop {
                let kind = tokio::select! {
                    _ = token.cancelled() => break,
                    Some(()) = interrupt.recv() => SignalKind::Interrupt,
                    Some(()) = close.recv() => SignalKind::Hangup,
                    Some(()) = shutdown.recv() => SignalKind::Terminate,
                    else => break,
                };
                debug!(signal = kind.as_label(), "termination signal received");
                tx.publish(TriggerEvent::Signal(kind));
            }
        });
        Ok(())
    }
}

impl TerminationEventSource for SignalSource {
    fn name(&self) -> &'static str {
        "signals"
    }

    fn start(&mut self) -> Result<TriggerStream, SourceError> {
        if self.started {
            return Err(SourceError::AlreadyStarted);
        }
        let (tx, stream) = TriggerStream::channel(TRIGGER_CAPACITY);
        let token = CancellationToken::new();
        Self::spawn_into(tx, token.clone())?;

        self.token = Some(token);
        self.started = true;
        Ok(stream)
    }

    fn cleanup(&mut self) -> Result<(), SourceError> {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
        Ok(())
    }
}
