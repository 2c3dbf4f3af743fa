//! # Example: remote shutdown command
//!
//! Hosts a coordinator with the remote endpoint enabled, then plays the part
//! of "another process" by sending `SHUTDOWN` to it one second later.
//! Run `terminator send --endpoint <path>` from a second terminal to do the
//! same thing across processes.
//!
//! Demonstrates:
//! - `Options::with_remote_endpoint`
//! - a custom [`Subscribe`] next to the default `LogWriter`
//! - hooks that finish, fail, and overrun the grace period
//! - reading the [`ShutdownReport`](terminator::ShutdownReport)
//!
//! ## Run
//! ```bash
//! cargo run --example remote_trigger
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use terminator::logging::init_tracing;
use terminator::{
    Coordinator, Deadline, Endpoint, Event, EventKind, HookError, HookFn, Options, Subscribe,
    send_shutdown,
};

/// Counts hook outcomes as they are reported.
struct Tally;

#[async_trait]
impl Subscribe for Tally {
    async fn on_event(&self, ev: &Event) {
        if ev.is_hook_outcome() {
            println!("[tally] {:?} {}", ev.kind, ev.hook.as_deref().unwrap_or(""));
        }
        if ev.kind == EventKind::ShutdownCompleted {
            println!("[tally] done after {:?} ms", ev.elapsed_ms);
        }
    }

    fn name(&self) -> &'static str {
        "tally"
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let pid = std::process::id();
    let endpoint = if cfg!(windows) {
        Endpoint::new(format!(r"\\.\pipe\terminator-demo-{pid}"))
    } else {
        let path = std::env::temp_dir().join(format!("terminator-demo-{pid}.sock"));
        Endpoint::new(path.to_string_lossy().into_owned())
    };

    let opts = Options::default()
        .with_grace_period(Duration::from_secs(2))
        .with_remote_endpoint(endpoint.clone());
    let subscribers: Vec<Arc<dyn Subscribe>> = vec![Arc::new(Tally)];
    let coordinator = Coordinator::builder(opts)
        .with_subscribers(subscribers)
        .build();

    coordinator
        .register(
            "flush-cache",
            HookFn::arc(|_d: Deadline| async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok::<(), HookError>(())
            }),
            Duration::from_secs(1),
        )
        .await?;
    coordinator
        .register(
            "close-db",
            HookFn::arc(|_d: Deadline| async {
                Err::<(), _>(HookError::fail("pool still has 3 borrowed connections"))
            }),
            Duration::from_secs(1),
        )
        .await?;
    coordinator
        .register(
            "upload-logs",
            HookFn::arc(|deadline: Deadline| async move {
                deadline.run(tokio::time::sleep(Duration::from_secs(30))).await
            }),
            Duration::from_secs(60),
        )
        .await?;

    coordinator.start().await?;
    println!("listening on {endpoint}");

    let sender_endpoint = endpoint.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        if let Err(e) = send_shutdown(&sender_endpoint).await {
            eprintln!("send failed: {e}");
        }
    });

    coordinator.wait().await;

    if let Some(report) = coordinator.report() {
        println!("trigger: {}", report.trigger);
        for outcome in &report.outcomes {
            println!(
                "  {:<12} {:?} after {:?} (budget {:?})",
                outcome.name, outcome.status, outcome.elapsed, outcome.deadline
            );
        }
    }
    Ok(())
}
