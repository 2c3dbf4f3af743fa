//! # Example: TCP server with a graceful shutdown hook
//!
//! A tiny HTTP responder on `127.0.0.1:8080`. On Ctrl-C (or SIGTERM) the
//! `http-server` hook stops accepting, lets in-flight connections finish
//! within its deadline, and the process exits once every hook settled.
//!
//! ## Flow
//! ```text
//! Ctrl-C ──► Coordinator ──► http-server hook
//!                               ├─► cancel accept loop
//!                               └─► wait for connections (bounded by Deadline)
//!        ──► Done ──► main returns
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example tcp_server
//! curl http://127.0.0.1:8080/
//! ```

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use terminator::logging::init_tracing;
use terminator::{Coordinator, Deadline, HookError, HookFn, Options};

const RESPONSE: &[u8] =
    b"HTTP/1.1 200 OK\r\ncontent-length: 13\r\nconnection: close\r\n\r\nHello, World!";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let listener = TcpListener::bind("127.0.0.1:8080").await?;
    let stop_accepting = CancellationToken::new();
    let drained = CancellationToken::new();
    tokio::spawn(serve(listener, stop_accepting.clone(), drained.clone()));

    let coordinator = Coordinator::new(Options::default());
    coordinator
        .register(
            "http-server",
            HookFn::arc(move |deadline: Deadline| {
                let stop_accepting = stop_accepting.clone();
                let drained = drained.clone();
                async move {
                    tracing::info!("shutting down HTTP server");
                    stop_accepting.cancel();
                    deadline.run(drained.cancelled()).await?;
                    Ok::<(), HookError>(())
                }
            }),
            Duration::from_secs(10),
        )
        .await?;

    coordinator.start().await?;
    tracing::info!("server is running on 127.0.0.1:8080; press Ctrl+C to stop");

    coordinator.wait().await;
    tracing::info!("graceful shutdown completed");
    Ok(())
}

/// Accepts until `token` is cancelled, waits for in-flight connections, then cancels `drained`.
async fn serve(listener: TcpListener, token: CancellationToken, drained: CancellationToken) {
    let mut conns = JoinSet::new();
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            res = listener.accept() => match res {
                Ok((stream, _)) => {
                    conns.spawn(handle(stream));
                }
                Err(e) => tracing::warn!(error = %e, "accept failed"),
            },
        }
    }
    drop(listener);
    while conns.join_next().await.is_some() {}
    drained.cancel();
}

async fn handle(mut stream: TcpStream) {
    let mut buf = [0u8; 1024];
    if stream.read(&mut buf).await.is_ok() {
        let _ = stream.write_all(RESPONSE).await;
    }
    let _ = stream.shutdown().await;
}
