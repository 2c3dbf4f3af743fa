//! # Remote shutdown trigger: signals plus a local command endpoint.
//!
//! For hosts where another process cannot reliably deliver a termination
//! signal. [`RemoteTriggerSource`] listens on a well-known local [`Endpoint`]
//! (a Unix domain socket, or a named pipe on Windows) in addition to the OS
//! signals, and [`send_shutdown`] is the companion sender.
//!
//! ## Protocol
//! ```text
//! sender                         listener
//!   │── connect (≤ 5s) ──────────►│
//!   │── b"SHUTDOWN" ─────────────►│  one read, up to 1024 bytes
//!   │── close                     │  exact match → TriggerEvent::RemoteCommand
//!                                 │  anything else → logged, ignored
//! ```
//! No acknowledgement frame; no authentication. Access control is whatever the
//! OS grants on the endpoint.
//!
//! ## Rules
//! - Each connection is served on its own task; the accept loop never blocks on a client.
//! - A client that sends nothing is dropped after [`READ_TIMEOUT`].
//! - Accept errors are logged and the loop keeps going until `cleanup`.
//! - On Unix a stale socket file is replaced at bind time only when nothing answers on it.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{RemoteError, SourceError};
use crate::source::{
    Endpoint, SignalSource, TRIGGER_CAPACITY, TerminationEventSource, TriggerEvent,
    TriggerSender, TriggerStream,
};

/// The only command the endpoint understands.
pub const SHUTDOWN_COMMAND: &[u8] = b"SHUTDOWN";

/// Maximum bytes read from a single connection.
pub const MAX_FRAME_LEN: usize = 1024;

/// Bound on [`send_shutdown`] connecting to the endpoint.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Bound on a connected client sending its command.
pub const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Pause after a failed accept.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Signals plus a local command endpoint.
#[derive(Debug)]
pub struct RemoteTriggerSource {
    endpoint: Endpoint,
    token: Option<CancellationToken>,
    started: bool,
    #[cfg(unix)]
    owns_socket_file: bool,
}

impl RemoteTriggerSource {
    /// Creates an unarmed source for `endpoint`.
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            token: None,
            started: false,
            #[cfg(unix)]
            owns_socket_file: false,
        }
    }

    /// The endpoint this source listens on.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

impl Default for RemoteTriggerSource {
    fn default() -> Self {
        Self::new(Endpoint::platform_default())
    }
}

impl TerminationEventSource for RemoteTriggerSource {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn start(&mut self) -> Result<TriggerStream, SourceError> {
        if self.started {
            return Err(SourceError::AlreadyStarted);
        }
        let (tx, stream) = TriggerStream::channel(TRIGGER_CAPACITY);
        let token = CancellationToken::new();

        let listener = platform::bind(&self.endpoint)?;
        #[cfg(unix)]
        {
            self.owns_socket_file = true;
        }
        if let Err(e) = SignalSource::spawn_into(tx.clone(), token.clone()) {
            drop(listener);
            let _ = self.release_socket_file();
            return Err(e);
        }
        tokio::spawn(platform::accept_loop(
            listener,
            self.endpoint.clone(),
            tx,
            token.clone(),
        ));

        info!(endpoint = %self.endpoint, "remote shutdown endpoint listening");
        self.token = Some(token);
        self.started = true;
        Ok(stream)
    }

    fn cleanup(&mut self) -> Result<(), SourceError> {
        let Some(token) = self.token.take() else {
            return Ok(());
        };
        token.cancel();
        self.release_socket_file()
    }
}

impl RemoteTriggerSource {
    /// Removes the socket file bound by `start`, tolerating it being gone already.
    #[cfg(unix)]
    fn release_socket_file(&mut self) -> Result<(), SourceError> {
        if !std::mem::take(&mut self.owns_socket_file) {
            return Ok(());
        }
        match std::fs::remove_file(self.endpoint.as_str()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SourceError::Cleanup {
                endpoint: self.endpoint.to_string(),
                source,
            }),
        }
    }

    #[cfg(not(unix))]
    fn release_socket_file(&mut self) -> Result<(), SourceError> {
        Ok(())
    }
}

/// True if `frame` is exactly the shutdown command.
fn is_shutdown_command(frame: &[u8]) -> bool {
    frame == SHUTDOWN_COMMAND
}

/// Reads one command frame from `conn` and publishes a trigger on a match.
async fn serve_connection<C>(mut conn: C, tx: TriggerSender)
where
    C: AsyncRead + Unpin,
{
    let mut buf = [0u8; MAX_FRAME_LEN];
    match time::timeout(READ_TIMEOUT, conn.read(&mut buf)).await {
        Ok(Ok(n)) if is_shutdown_command(&buf[..n]) => {
            info!("remote shutdown command received");
            tx.publish(TriggerEvent::RemoteCommand);
        }
        Ok(Ok(n)) => {
            warn!(bytes = n, "ignoring unknown remote command");
        }
        Ok(Err(e)) => {
            warn!(error = %e, "failed to read remote command");
        }
        Err(_) => {
            debug!(timeout = ?READ_TIMEOUT, "remote client sent nothing; dropping connection");
        }
    }
}

/// Connects to `endpoint`, writes [`SHUTDOWN_COMMAND`], and closes.
///
/// Usable from an unrelated process on the same host.
///
/// ### Errors
/// - [`RemoteError::ConnectTimeout`] if the endpoint does not accept within [`CONNECT_TIMEOUT`]
/// - [`RemoteError::Connect`] if the endpoint does not exist or refuses
/// - [`RemoteError::Send`] if writing the frame fails
pub async fn send_shutdown(endpoint: &Endpoint) -> Result<(), RemoteError> {
    let connect = platform::connect(endpoint);
    let mut conn = match time::timeout(CONNECT_TIMEOUT, connect).await {
        Ok(Ok(conn)) => conn,
        Ok(Err(source)) => {
            return Err(RemoteError::Connect {
                endpoint: endpoint.to_string(),
                source,
            });
        }
        Err(_) => {
            return Err(RemoteError::ConnectTimeout {
                endpoint: endpoint.to_string(),
                timeout: CONNECT_TIMEOUT,
            });
        }
    };

    let send_err = |source: io::Error| RemoteError::Send {
        endpoint: endpoint.to_string(),
        source,
    };
    conn.write_all(SHUTDOWN_COMMAND).await.map_err(send_err)?;
    conn.shutdown().await.map_err(send_err)?;
    debug!(%endpoint, "shutdown command sent");
    Ok(())
}

#[cfg(unix)]
mod platform {
    use std::io;
    use std::path::Path;

    use tokio::net::{UnixListener, UnixStream};
    use tokio::time;
    use tokio_util::sync::CancellationToken;
    use tracing::warn;

    use super::{ACCEPT_BACKOFF, serve_connection};
    use crate::error::SourceError;
    use crate::source::{Endpoint, TriggerSender};

    pub(super) fn bind(endpoint: &Endpoint) -> Result<UnixListener, SourceError> {
        let path = Path::new(endpoint.as_str());
        let endpoint_err = |source: io::Error| SourceError::Endpoint {
            endpoint: endpoint.to_string(),
            source,
        };

        match UnixListener::bind(path) {
            Ok(listener) => Ok(listener),
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                if std::os::unix::net::UnixStream::connect(path).is_ok() {
                    return Err(SourceError::EndpointInUse {
                        endpoint: endpoint.to_string(),
                    });
                }
                std::fs::remove_file(path).map_err(endpoint_err)?;
                UnixListener::bind(path).map_err(endpoint_err)
            }
            Err(e) => Err(endpoint_err(e)),
        }
    }

    pub(super) async fn accept_loop(
        listener: UnixListener,
        endpoint: Endpoint,
        tx: TriggerSender,
        token: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                res = listener.accept() => match res {
                    Ok((conn, _addr)) => {
                        tokio::spawn(serve_connection(conn, tx.clone()));
                    }
                    Err(e) => {
                        if token.is_cancelled() {
                            break;
                        }
                        warn!(%endpoint, error = %e, "accept failed");
                        time::sleep(ACCEPT_BACKOFF).await;
                    }
                },
            }
        }
    }

    pub(super) async fn connect(endpoint: &Endpoint) -> io::Result<UnixStream> {
        UnixStream::connect(endpoint.as_str()).await
    }
}

#[cfg(windows)]
mod platform {
    use std::io;
    use std::time::Duration;

    use tokio::net::windows::named_pipe::{
        ClientOptions, NamedPipeClient, NamedPipeServer, ServerOptions,
    };
    use tokio::time;
    use tokio_util::sync::CancellationToken;
    use tracing::warn;

    use super::{ACCEPT_BACKOFF, serve_connection};
    use crate::error::SourceError;
    use crate::source::{Endpoint, TriggerSender};

    /// `ERROR_PIPE_BUSY`: every server instance is serving a client.
    const ERROR_PIPE_BUSY: i32 = 231;

    const BUSY_RETRY: Duration = Duration::from_millis(50);

    pub(super) fn bind(endpoint: &Endpoint) -> Result<NamedPipeServer, SourceError> {
        ServerOptions::new()
            .first_pipe_instance(true)
            .create(endpoint.as_str())
            .map_err(|source| {
                if source.kind() == io::ErrorKind::PermissionDenied {
                    SourceError::EndpointInUse {
                        endpoint: endpoint.to_string(),
                    }
                } else {
                    SourceError::Endpoint {
                        endpoint: endpoint.to_string(),
                        source,
                    }
                }
            })
    }

    pub(super) async fn accept_loop(
        first: NamedPipeServer,
        endpoint: Endpoint,
        tx: TriggerSender,
        token: CancellationToken,
    ) {
        let mut server = first;
        loop {
            let res = tokio::select! {
                _ = token.cancelled() => break,
                res = server.connect() => res,
            };
            if let Err(e) = res {
                if token.is_cancelled() {
                    break;
                }
                warn!(%endpoint, error = %e, "accept failed");
                time::sleep(ACCEPT_BACKOFF).await;
                continue;
            }

            let next = match ServerOptions::new().create(endpoint.as_str()) {
                Ok(next) => next,
                Err(e) => {
                    warn!(%endpoint, error = %e, "failed to create next pipe instance");
                    time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                }
            };
            let conn = std::mem::replace(&mut server, next);
            tokio::spawn(serve_connection(conn, tx.clone()));
        }
    }

    pub(super) async fn connect(endpoint: &Endpoint) -> io::Result<NamedPipeClient> {
        loop {
            match ClientOptions::new().open(endpoint.as_str()) {
                Ok(client) => return Ok(client),
                Err(e) if e.raw_os_error() == Some(ERROR_PIPE_BUSY) => {}
                Err(e) => return Err(e),
            }
            time::sleep(BUSY_RETRY).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_must_match_exactly() {
        assert!(is_shutdown_command(b"SHUTDOWN"));
        assert!(!is_shutdown_command(b"SHUTDOWN\n"));
        assert!(!is_shutdown_command(b"shutdown"));
        assert!(!is_shutdown_command(b""));
    }

    #[tokio::test]
    async fn test_serve_connection_publishes_on_match() {
        let (tx, mut stream) = TriggerStream::channel(1);
        serve_connection(&b"SHUTDOWN"[..], tx).await;
        assert_eq!(stream.recv().await, Some(TriggerEvent::RemoteCommand));
    }

    #[tokio::test]
    async fn test_serve_connection_ignores_other_payloads() {
        let (tx, mut stream) = TriggerStream::channel(1);
        serve_connection(&b"REBOOT"[..], tx).await;
        assert_eq!(stream.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_client_is_dropped() {
        let (tx, mut stream) = TriggerStream::channel(1);
        let (_client, server) = tokio::io::duplex(64);
        serve_connection(server, tx).await;
        assert_eq!(stream.recv().await, None);
    }

    #[test]
    fn test_cleanup_before_start_is_noop() {
        let mut source = RemoteTriggerSource::default();
        assert!(source.cleanup().is_ok());
    }
}
