//! # Termination event sources.
//!
//! A [`TerminationEventSource`] turns external stimuli into [`TriggerEvent`]s
//! published on a [`TriggerStream`]. The coordinator arms exactly one source
//! and releases it once the hooks have settled.
//!
//! ## Variants
//! - [`SignalSource`]: OS termination signals only.
//! - [`RemoteTriggerSource`]: signals plus a local endpoint (Unix socket or
//!   Windows named pipe) accepting the `SHUTDOWN` command from another process.
//!
//! [`for_options`] is the only place the variant is chosen.
//!
//! ## Architecture
//! ```text
//!   SIGINT/SIGTERM/SIGHUP ──┐
//!   (Ctrl-C/close/shutdown) ├──► TriggerSender::publish ──► TriggerStream ──► Coordinator driver
//!   endpoint "SHUTDOWN"  ───┘
//! ```
//!
//! ## Custom sources
//! ```rust
//! use terminator::{SourceError, TerminationEventSource, TriggerEvent, TriggerStream};
//!
//! struct Manual;
//!
//! impl TerminationEventSource for Manual {
//!     fn name(&self) -> &'static str { "manual" }
//!
//!     fn start(&mut self) -> Result<TriggerStream, SourceError> {
//!         let (tx, stream) = TriggerStream::channel(1);
//!         tx.publish(TriggerEvent::ManualStop);
//!         Ok(stream)
//!     }
//!
//!     fn cleanup(&mut self) -> Result<(), SourceError> { Ok(()) }
//! }
//! ```

mod endpoint;
mod remote;
mod signal;

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::mpsc;

use crate::config::Options;
use crate::error::SourceError;

pub use endpoint::Endpoint;
pub use remote::{
    CONNECT_TIMEOUT, MAX_FRAME_LEN, READ_TIMEOUT, RemoteTriggerSource, SHUTDOWN_COMMAND,
    send_shutdown,
};
pub use signal::SignalSource;

/// Buffered triggers per stream. Only the first one matters to the coordinator.
pub(crate) const TRIGGER_CAPACITY: usize = 8;

/// Operating-system signal classes that request termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    /// SIGINT / Ctrl-C.
    Interrupt,
    /// SIGTERM / system shutdown.
    Terminate,
    /// SIGHUP / console window closed.
    Hangup,
}

impl SignalKind {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            SignalKind::Interrupt => "interrupt",
            SignalKind::Terminate => "terminate",
            SignalKind::Hangup => "hangup",
        }
    }
}

/// What started the shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerEvent {
    /// An OS termination signal arrived.
    Signal(SignalKind),
    /// [`Coordinator::stop`](crate::Coordinator::stop) was called.
    ManualStop,
    /// The remote endpoint received `SHUTDOWN`.
    RemoteCommand,
}

impl fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerEvent::Signal(kind) => write!(f, "signal({})", kind.as_label()),
            TriggerEvent::ManualStop => f.write_str("manual_stop"),
            TriggerEvent::RemoteCommand => f.write_str("remote_command"),
        }
    }
}

/// # Source of termination requests.
///
/// Implementations own OS resources (signal registrations, listening
/// endpoints) between [`start`](Self::start) and [`cleanup`](Self::cleanup).
///
/// ### Contract
/// - `start` arms the source synchronously: registration errors surface here.
/// - A second `start` returns [`SourceError::AlreadyStarted`].
/// - `cleanup` releases every resource; calling it before `start` or twice is a no-op.
pub trait TerminationEventSource: Send + 'static {
    /// Source name used in logs.
    fn name(&self) -> &'static str;

    /// Arms the source and returns the stream of triggers.
    fn start(&mut self) -> Result<TriggerStream, SourceError>;

    /// Releases resources held since `start`.
    fn cleanup(&mut self) -> Result<(), SourceError>;
}

/// Publishing half of a [`TriggerStream`].
#[derive(Clone, Debug)]
pub struct TriggerSender {
    tx: mpsc::Sender<TriggerEvent>,
}

impl TriggerSender {
    /// Publishes a trigger without blocking.
    ///
    /// Returns `false` if the stream is full or closed; the event is dropped.
    pub fn publish(&self, event: TriggerEvent) -> bool {
        self.tx.try_send(event).is_ok()
    }
}

/// Receiving half of the trigger channel.
///
/// Yields `None` once every [`TriggerSender`] is gone.
#[derive(Debug)]
pub struct TriggerStream {
    rx: mpsc::Receiver<TriggerEvent>,
}

impl TriggerStream {
    /// Creates a bounded trigger channel (capacity min 1).
    pub fn channel(capacity: usize) -> (TriggerSender, TriggerStream) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (TriggerSender { tx }, TriggerStream { rx })
    }

    /// Receives the next trigger.
    pub async fn recv(&mut self) -> Option<TriggerEvent> {
        self.rx.recv().await
    }
}

impl futures::Stream for TriggerStream {
    type Item = TriggerEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Picks the source variant for `opts`.
///
/// - `remote_endpoint` set: [`RemoteTriggerSource`] on that endpoint.
/// - Windows without an endpoint: [`RemoteTriggerSource`] on [`Endpoint::platform_default`].
/// - Otherwise: [`SignalSource`].
pub fn for_options(opts: &Options) -> Box<dyn TerminationEventSource> {
    match &opts.remote_endpoint {
        Some(endpoint) => Box::new(RemoteTriggerSource::new(endpoint.clone())),
        None if cfg!(windows) => Box::new(RemoteTriggerSource::new(Endpoint::platform_default())),
        None => Box::new(SignalSource::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn test_trigger_display() {
        assert_eq!(
            TriggerEvent::Signal(SignalKind::Terminate).to_string(),
            "signal(terminate)"
        );
        assert_eq!(TriggerEvent::ManualStop.to_string(), "manual_stop");
        assert_eq!(TriggerEvent::RemoteCommand.to_string(), "remote_command");
    }

    #[tokio::test]
    async fn test_stream_yields_then_closes() {
        let (tx, mut stream) = TriggerStream::channel(2);
        assert!(tx.publish(TriggerEvent::RemoteCommand));
        drop(tx);

        assert_eq!(stream.next().await, Some(TriggerEvent::RemoteCommand));
        assert_eq!(stream.recv().await, None);
    }

    #[test]
    fn test_publish_never_blocks_when_full() {
        let (tx, _stream) = TriggerStream::channel(1);
        assert!(tx.publish(TriggerEvent::ManualStop));
        assert!(!tx.publish(TriggerEvent::ManualStop));
    }

    #[test]
    fn test_factory_picks_variant() {
        let remote = Options::default().with_remote_endpoint(Endpoint::new("/tmp/x.sock"));
        assert_eq!(for_options(&remote).name(), "remote");

        let plain = for_options(&Options::default());
        if cfg!(windows) {
            assert_eq!(plain.name(), "remote");
        } else {
            assert_eq!(plain.name(), "signals");
        }
    }
}
