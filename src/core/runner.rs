//! # Concurrent hook execution.
//!
//! Runs every snapshotted hook on its own task under its effective deadline
//! and collects one [`HookOutcome`] per hook.
//!
//! ## Deadline policy
//! ```text
//! effective = min(dispatch + hook.timeout, trigger + grace)
//!
//! hook returns first   ──► Completed / Failed / Panicked
//! effective reached    ──► token.cancel() ──► TimedOut { cut_by_grace }
//!                          (task is detached, never aborted)
//! ```
//!
//! ## Event flow
//! ```text
//! HookStarting ──► HookCompleted | HookFailed | HookTimedOut
//! ```
//!
//! ## Rules
//! - One hook's error, panic, or overrun never affects its siblings
//! - Exactly one outcome event per dispatched hook
//! - Nothing here waits past a hook's effective deadline

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::core::report::{HookOutcome, HookStatus};
use crate::events::{Bus, Event, EventKind};
use crate::hooks::{Deadline, HookEntry};

/// Dispatches `entries` concurrently and waits for all of them to settle.
///
/// Outcomes are sorted by hook name.
pub(crate) async fn run_hooks(
    entries: Vec<HookEntry>,
    grace_deadline: Instant,
    bus: &Bus,
) -> Vec<HookOutcome> {
    let mut set = JoinSet::new();
    for entry in entries {
        set.spawn(run_one(entry, grace_deadline, bus.clone()));
    }

    let mut outcomes = Vec::with_capacity(set.len());
    while let Some(res) = set.join_next().await {
        match res {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => warn!(error = %e, "hook worker did not finish"),
        }
    }
    outcomes.sort_unstable_by(|a, b| a.name.cmp(&b.name));
    outcomes
}

/// Runs a single hook and reports how it settled.
async fn run_one(entry: HookEntry, grace_deadline: Instant, bus: Bus) -> HookOutcome {
    let name = entry.name_arc();
    let started = Instant::now();
    let own_deadline = started + entry.timeout();
    let (effective, cut_by_grace) = if grace_deadline <= own_deadline {
        (grace_deadline, true)
    } else {
        (own_deadline, false)
    };
    let budget = effective.saturating_duration_since(started);

    bus.publish(
        Event::new(EventKind::HookStarting)
            .with_hook(Arc::clone(&name))
            .with_timeout(budget),
    );

    let token = CancellationToken::new();
    let deadline = Deadline::new(effective, token.clone());
    let hook = Arc::clone(entry.hook());
    let mut handle = tokio::spawn(async move { hook.execute(deadline).await });

    let status = tokio::select! {
        biased;
        res = &mut handle => match res {
            Ok(Ok(())) => HookStatus::Completed,
            Ok(Err(e)) => HookStatus::Failed { error: e.to_string() },
            Err(e) if e.is_panic() => HookStatus::Panicked {
                reason: panic_reason(e.into_panic()),
            },
            Err(e) => HookStatus::Failed { error: e.to_string() },
        },
        _ = time::sleep_until(effective) => {
            token.cancel();
            HookStatus::TimedOut { cut_by_grace }
        }
    };
    // On timeout `handle` is dropped here: the task keeps running, detached.

    let elapsed = started.elapsed();
    bus.publish(outcome_event(&name, &status, elapsed, budget));

    HookOutcome {
        name,
        status,
        elapsed,
        deadline: budget,
    }
}

fn outcome_event(
    name: &Arc<str>,
    status: &HookStatus,
    elapsed: Duration,
    budget: Duration,
) -> Event {
    let ev = match status {
        HookStatus::Completed => Event::new(EventKind::HookCompleted).with_elapsed(elapsed),
        HookStatus::Failed { error } => Event::new(EventKind::HookFailed)
            .with_reason(error.as_str())
            .with_elapsed(elapsed),
        HookStatus::Panicked { reason } => Event::new(EventKind::HookFailed)
            .with_reason(format!("panicked: {reason}"))
            .with_elapsed(elapsed),
        HookStatus::TimedOut { cut_by_grace } => Event::new(EventKind::HookTimedOut)
            .with_timeout(budget)
            .with_reason(if *cut_by_grace {
                "grace_period"
            } else {
                "hook_timeout"
            }),
    };
    ev.with_hook(Arc::clone(name))
}

pub(crate) fn panic_reason(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
