use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use terminator::logging::init_tracing;
use terminator::{Coordinator, Deadline, Endpoint, HookError, HookFn, Options, send_shutdown};
use tracing::info;

/// Graceful shutdown helper: trigger a remote shutdown, or host a test listener.
#[derive(Parser, Debug)]
#[command(name = "terminator", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Send the SHUTDOWN command to a process listening on the endpoint.
    Send {
        /// Unix socket path or Windows pipe name (defaults to the well-known endpoint)
        #[arg(short, long)]
        endpoint: Option<String>,
    },

    /// Listen for signals and remote commands, then run a demo hook and exit.
    Listen {
        /// Unix socket path or Windows pipe name (defaults to the well-known endpoint)
        #[arg(short, long)]
        endpoint: Option<String>,

        /// Options file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Grace period override in milliseconds
        #[arg(long)]
        grace_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Send { endpoint } => {
            let endpoint = endpoint.map(Endpoint::new).unwrap_or_default();
            send_shutdown(&endpoint).await?;
            info!(%endpoint, "shutdown command sent");
        }
        Commands::Listen {
            endpoint,
            config,
            grace_ms,
        } => listen(endpoint, config, grace_ms).await?,
    }
    Ok(())
}

async fn listen(
    endpoint: Option<String>,
    config: Option<PathBuf>,
    grace_ms: Option<u64>,
) -> Result<(), Box<dyn Error>> {
    let mut opts = match config {
        Some(path) => Options::load(path)?,
        None => Options::default(),
    };
    if let Some(ms) = grace_ms {
        opts = opts.with_grace_period(Duration::from_millis(ms));
    }
    if let Some(endpoint) = endpoint {
        opts = opts.with_remote_endpoint(Endpoint::new(endpoint));
    } else if opts.remote_endpoint.is_none() {
        opts = opts.with_remote_endpoint(Endpoint::platform_default());
    }
    opts.validate()?;

    let coordinator = Coordinator::new(opts);
    coordinator
        .register(
            "farewell",
            HookFn::arc(|deadline: Deadline| async move {
                info!(budget = ?deadline.budget(), "running farewell hook");
                Ok::<(), HookError>(())
            }),
            Duration::from_secs(1),
        )
        .await?;

    coordinator.start().await?;
    info!("waiting for a termination signal or `terminator send`");
    coordinator.wait().await;

    if let Some(report) = coordinator.report() {
        info!(
            trigger = %report.trigger,
            elapsed = ?report.elapsed,
            failures = report.failures(),
            "shutdown finished"
        );
    }
    Ok(())
}
