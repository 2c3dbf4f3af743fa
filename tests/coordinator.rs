use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tokio::time::{self, Instant};

use terminator::{
    Coordinator, CoordinatorError, Deadline, Event, EventKind, HookError, HookFn, HookRef,
    HookStatus, Options, ShutdownState, SignalKind, SourceError, Subscribe,
    TerminationEventSource, TriggerEvent, TriggerSender, TriggerStream,
};

/// Source driven by the test through a [`TriggerSender`].
struct ManualSource {
    stream: Option<TriggerStream>,
    fail_first_start: bool,
    fail_cleanup: bool,
    cleanups: Arc<AtomicUsize>,
}

struct ManualHandle {
    tx: TriggerSender,
    cleanups: Arc<AtomicUsize>,
}

fn manual_source() -> (ManualSource, ManualHandle) {
    let (tx, stream) = TriggerStream::channel(4);
    let cleanups = Arc::new(AtomicUsize::new(0));
    (
        ManualSource {
            stream: Some(stream),
            fail_first_start: false,
            fail_cleanup: false,
            cleanups: cleanups.clone(),
        },
        ManualHandle { tx, cleanups },
    )
}

impl TerminationEventSource for ManualSource {
    fn name(&self) -> &'static str {
        "manual"
    }

    fn start(&mut self) -> Result<TriggerStream, SourceError> {
        if std::mem::take(&mut self.fail_first_start) {
            return Err(SourceError::Signal(io::Error::other("no signal driver")));
        }
        self.stream.take().ok_or(SourceError::AlreadyStarted)
    }

    fn cleanup(&mut self) -> Result<(), SourceError> {
        self.cleanups.fetch_add(1, Ordering::SeqCst);
        if self.fail_cleanup {
            return Err(SourceError::Cleanup {
                endpoint: "manual".into(),
                source: io::Error::other("busy"),
            });
        }
        Ok(())
    }
}

fn coordinator(grace: Duration) -> (Coordinator, ManualHandle) {
    let (source, handle) = manual_source();
    let opts = Options::default().with_grace_period(grace);
    let coord = Coordinator::builder(opts)
        .with_source(source)
        .without_log_writer()
        .build();
    (coord, handle)
}

fn ok_hook(ran: Arc<AtomicBool>) -> HookRef {
    HookFn::arc(move |_d: Deadline| {
        let ran = ran.clone();
        async move {
            ran.store(true, Ordering::SeqCst);
            Ok::<(), HookError>(())
        }
    })
}

/// Sleeps for an hour, ignoring its deadline.
fn stubborn_hook() -> HookRef {
    HookFn::arc(|_d: Deadline| async {
        time::sleep(Duration::from_secs(3600)).await;
        Ok::<(), HookError>(())
    })
}

fn assert_near(actual: Duration, expected: Duration) {
    assert!(
        actual >= expected && actual < expected + Duration::from_millis(50),
        "expected ~{expected:?}, got {actual:?}"
    );
}

#[tokio::test]
async fn duplicate_registration_is_rejected_and_first_kept() {
    let (coord, _h) = coordinator(Duration::from_secs(5));
    let first = Arc::new(AtomicBool::new(false));
    let second = Arc::new(AtomicBool::new(false));

    coord
        .register("db", ok_hook(first.clone()), Duration::from_secs(1))
        .await
        .unwrap();
    let err = coord
        .register("db", ok_hook(second.clone()), Duration::from_secs(1))
        .await
        .unwrap_err();
    assert!(matches!(err, CoordinatorError::DuplicateHook { ref name } if name == "db"));
    assert_eq!(coord.hook_count().await, 1);

    coord.start().await.unwrap();
    coord.stop().unwrap();
    coord.wait().await;

    assert!(first.load(Ordering::SeqCst));
    assert!(!second.load(Ordering::SeqCst));
}

#[tokio::test]
async fn second_start_is_rejected() {
    let (coord, h) = coordinator(Duration::from_secs(5));
    coord.start().await.unwrap();
    assert_eq!(coord.state(), ShutdownState::Listening);

    assert!(matches!(
        coord.start().await,
        Err(CoordinatorError::AlreadyStarted)
    ));

    coord.stop().unwrap();
    coord.wait().await;
    assert_eq!(h.cleanups.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn source_trigger_runs_hooks_and_releases_source() {
    let (coord, h) = coordinator(Duration::from_secs(5));
    let ran = Arc::new(AtomicBool::new(false));
    coord
        .register("http", ok_hook(ran.clone()), Duration::from_secs(1))
        .await
        .unwrap();

    coord.start().await.unwrap();
    let done = coord.done();
    assert!(!done.is_done());

    h.tx.publish(TriggerEvent::Signal(SignalKind::Terminate));
    done.wait().await;

    assert!(ran.load(Ordering::SeqCst));
    assert_eq!(coord.state(), ShutdownState::Done);
    assert_eq!(
        coord.trigger_event(),
        Some(TriggerEvent::Signal(SignalKind::Terminate))
    );
    assert_eq!(h.cleanups.load(Ordering::SeqCst), 1);

    let report = coord.report().unwrap();
    assert!(report.all_completed());
    assert_eq!(report.outcome("http").unwrap().status, HookStatus::Completed);
}

#[tokio::test]
async fn only_the_first_trigger_is_honored() {
    let (coord, h) = coordinator(Duration::from_secs(5));
    let runs = Arc::new(AtomicUsize::new(0));
    let r = runs.clone();
    coord
        .register(
            "count",
            HookFn::arc(move |_d: Deadline| {
                let r = r.clone();
                async move {
                    r.fetch_add(1, Ordering::SeqCst);
                    Ok::<(), HookError>(())
                }
            }),
            Duration::from_secs(1),
        )
        .await
        .unwrap();

    coord.start().await.unwrap();
    h.tx.publish(TriggerEvent::RemoteCommand);
    coord.wait().await;

    h.tx.publish(TriggerEvent::Signal(SignalKind::Interrupt));
    coord.stop().unwrap();
    coord.stop().unwrap();
    time::sleep(Duration::from_millis(20)).await;

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(coord.trigger_event(), Some(TriggerEvent::RemoteCommand));
    assert_eq!(h.cleanups.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn grace_period_caps_total_wait() {
    let (coord, _h) = coordinator(Duration::from_secs(3));
    for (name, timeout) in [("one", 1), ("two", 2), ("ten", 10)] {
        coord
            .register(name, stubborn_hook(), Duration::from_secs(timeout))
            .await
            .unwrap();
    }
    coord.start().await.unwrap();

    let started = Instant::now();
    coord.stop().unwrap();
    coord.wait().await;
    assert_near(started.elapsed(), Duration::from_secs(3));

    let report = coord.report().unwrap();
    let status = |name: &str| report.outcome(name).unwrap().status.clone();
    assert_eq!(status("one"), HookStatus::TimedOut { cut_by_grace: false });
    assert_eq!(status("two"), HookStatus::TimedOut { cut_by_grace: false });
    assert_eq!(status("ten"), HookStatus::TimedOut { cut_by_grace: true });
    assert_near(report.outcome("one").unwrap().elapsed, Duration::from_secs(1));
    assert_eq!(report.outcome("ten").unwrap().deadline, Duration::from_secs(3));
    assert!(report.grace_exceeded());
}

#[tokio::test(start_paused = true)]
async fn deadline_aware_hook_sees_cancellation() {
    let (coord, _h) = coordinator(Duration::from_secs(30));
    let observed = Arc::new(AtomicBool::new(false));
    let o = observed.clone();
    coord
        .register(
            "cooperative",
            HookFn::arc(move |deadline: Deadline| {
                let o = o.clone();
                async move {
                    deadline.token().cancelled().await;
                    o.store(true, Ordering::SeqCst);
                    Err::<(), _>(HookError::Canceled)
                }
            }),
            Duration::from_secs(2),
        )
        .await
        .unwrap();

    coord.start().await.unwrap();
    coord.stop().unwrap();
    coord.wait().await;

    time::sleep(Duration::from_millis(1)).await;
    assert!(observed.load(Ordering::SeqCst));
    assert_eq!(
        coord.report().unwrap().outcome("cooperative").unwrap().status,
        HookStatus::TimedOut { cut_by_grace: false }
    );
}

#[tokio::test]
async fn failing_and_panicking_hooks_do_not_affect_siblings() {
    let (coord, _h) = coordinator(Duration::from_secs(5));
    let ran = Arc::new(AtomicBool::new(false));

    coord
        .register(
            "fails",
            HookFn::arc(|_d: Deadline| async { Err::<(), _>(HookError::fail("disk full")) }),
            Duration::from_secs(1),
        )
        .await
        .unwrap();
    coord
        .register(
            "panics",
            HookFn::arc(|_d: Deadline| async {
                if true {
                    panic!("bad state");
                }
                Ok::<(), HookError>(())
            }),
            Duration::from_secs(1),
        )
        .await
        .unwrap();
    coord
        .register("fine", ok_hook(ran.clone()), Duration::from_secs(1))
        .await
        .unwrap();

    coord.start().await.unwrap();
    coord.stop().unwrap();
    coord.wait().await;

    assert!(ran.load(Ordering::SeqCst));
    let report = coord.report().unwrap();
    assert_eq!(report.failures(), 2);
    assert_eq!(
        report.outcome("fails").unwrap().status,
        HookStatus::Failed {
            error: "cleanup failed: disk full".into()
        }
    );
    assert_eq!(
        report.outcome("panics").unwrap().status,
        HookStatus::Panicked {
            reason: "bad state".into()
        }
    );
    assert_eq!(report.outcome("fine").unwrap().status, HookStatus::Completed);
}

#[tokio::test]
async fn stop_before_start_runs_once_started_and_skips_late_hooks() {
    let (coord, _h) = coordinator(Duration::from_secs(5));
    let early = Arc::new(AtomicBool::new(false));
    let late = Arc::new(AtomicBool::new(false));

    coord
        .register("early", ok_hook(early.clone()), Duration::from_secs(1))
        .await
        .unwrap();
    coord.stop().unwrap();
    assert_eq!(coord.state(), ShutdownState::Idle);
    assert_eq!(coord.trigger_event(), Some(TriggerEvent::ManualStop));

    coord
        .register("late", ok_hook(late.clone()), Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(coord.hook_count().await, 2);

    coord.start().await.unwrap();
    coord.wait().await;

    assert!(early.load(Ordering::SeqCst));
    assert!(!late.load(Ordering::SeqCst));
    let report = coord.report().unwrap();
    assert_eq!(report.outcomes.len(), 1);
    assert!(report.outcome("late").is_none());
}

#[tokio::test]
async fn hook_registered_while_executing_is_reported_late_and_skipped() {
    let (coord, _h) = coordinator(Duration::from_secs(5));
    let (entered_tx, entered_rx) = oneshot::channel();
    let entered_tx = Arc::new(std::sync::Mutex::new(Some(entered_tx)));
    let release = CancellationToken::new();
    let r = release.clone();
    coord
        .register(
            "slow",
            HookFn::arc(move |_d: Deadline| {
                let entered_tx = entered_tx.clone();
                let r = r.clone();
                async move {
                    if let Some(tx) = entered_tx.lock().unwrap().take() {
                        let _ = tx.send(());
                    }
                    r.cancelled().await;
                    Ok::<(), HookError>(())
                }
            }),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

    coord.start().await.unwrap();
    coord.stop().unwrap();
    entered_rx.await.unwrap();
    assert_eq!(coord.state(), ShutdownState::ExecutingHooks);

    let mut rx = coord.bus().subscribe();
    let late = Arc::new(AtomicBool::new(false));
    coord
        .register("late", ok_hook(late.clone()), Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(coord.hook_count().await, 2);

    release.cancel();
    coord.wait().await;

    let late_event = std::iter::from_fn(|| rx.try_recv().ok())
        .find(|ev| ev.hook.as_deref() == Some("late"))
        .unwrap();
    assert_eq!(late_event.kind, EventKind::HookRegisteredLate);

    assert!(!late.load(Ordering::SeqCst));
    let report = coord.report().unwrap();
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcome("slow").unwrap().status, HookStatus::Completed);
    assert!(report.outcome("late").is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_stop_and_source_trigger_always_reaches_done() {
    for _ in 0..200 {
        let (coord, h) = coordinator(Duration::from_secs(5));
        coord.start().await.unwrap();

        let c = coord.clone();
        let stopper = std::thread::spawn(move || c.stop());
        h.tx.publish(TriggerEvent::RemoteCommand);
        stopper.join().unwrap().unwrap();

        time::timeout(Duration::from_secs(2), coord.wait())
            .await
            .unwrap();
        assert_eq!(coord.state(), ShutdownState::Done);
        let trigger = coord.trigger_event().unwrap();
        assert!(matches!(
            trigger,
            TriggerEvent::ManualStop | TriggerEvent::RemoteCommand
        ));
        assert_eq!(coord.report().unwrap().trigger, trigger);
        assert_eq!(h.cleanups.load(Ordering::SeqCst), 1);
    }
}

#[tokio::test]
async fn failed_start_leaves_coordinator_idle_and_retryable() {
    let (mut source, _h) = manual_source();
    source.fail_first_start = true;
    let coord = Coordinator::builder(Options::default())
        .with_source(source)
        .without_log_writer()
        .build();

    let err = coord.start().await.unwrap_err();
    assert!(matches!(err, CoordinatorError::Source(SourceError::Signal(_))));
    assert_eq!(coord.state(), ShutdownState::Idle);

    coord.start().await.unwrap();
    assert_eq!(coord.state(), ShutdownState::Listening);
    coord.stop().unwrap();
    coord.wait().await;
}

#[tokio::test]
async fn invalid_options_are_rejected_at_start() {
    let (source, h) = manual_source();
    let opts = Options::default().with_grace_period(Duration::ZERO);
    let coord = Coordinator::builder(opts)
        .with_source(source)
        .without_log_writer()
        .build();

    let err = coord.start().await.unwrap_err();
    assert_eq!(err.as_label(), "coordinator_invalid_options");
    assert!(err.to_string().contains("grace_period must be positive"));
    assert_eq!(coord.state(), ShutdownState::Idle);
    assert!(!coord.done().is_done());
    assert_eq!(h.cleanups.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cleanup_failure_is_reported_and_sequence_completes() {
    let (mut source, h) = manual_source();
    source.fail_cleanup = true;
    let coord = Coordinator::builder(Options::default())
        .with_source(source)
        .without_log_writer()
        .build();
    let mut rx = coord.bus().subscribe();

    coord.start().await.unwrap();
    coord.stop().unwrap();
    coord.wait().await;

    assert_eq!(coord.state(), ShutdownState::Done);
    assert_eq!(h.cleanups.load(Ordering::SeqCst), 1);

    let mut kinds = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        kinds.push(ev.kind);
    }
    assert!(kinds.contains(&EventKind::SourceCleanupFailed));
    assert_eq!(kinds.last(), Some(&EventKind::ShutdownCompleted));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn blocking_waiters_are_released_together() {
    let (coord, _h) = coordinator(Duration::from_secs(5));
    coord.start().await.unwrap();

    let waiters: Vec<_> = (0..3)
        .map(|_| {
            let c = coord.clone();
            tokio::task::spawn_blocking(move || {
                c.wait_blocking();
                c.state()
            })
        })
        .collect();

    time::sleep(Duration::from_millis(20)).await;
    coord.stop().unwrap();

    for w in waiters {
        assert_eq!(w.await.unwrap(), ShutdownState::Done);
    }
}

struct Recorder {
    tx: mpsc::UnboundedSender<EventKind>,
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, ev: &Event) {
        let _ = self.tx.send(ev.kind);
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

#[tokio::test]
async fn subscribers_observe_the_lifecycle() {
    let (source, _h) = manual_source();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let recorder: Arc<dyn Subscribe> = Arc::new(Recorder { tx });
    let coord = Coordinator::builder(Options::default())
        .with_source(source)
        .with_subscribers(vec![recorder])
        .build();

    coord
        .register(
            "noop",
            ok_hook(Arc::new(AtomicBool::new(false))),
            Duration::from_secs(1),
        )
        .await
        .unwrap();
    coord.start().await.unwrap();
    coord.stop().unwrap();
    coord.wait().await;

    let mut seen = Vec::new();
    let collect = async {
        while let Some(kind) = rx.recv().await {
            seen.push(kind);
            if kind == EventKind::ShutdownCompleted {
                break;
            }
        }
    };
    time::timeout(Duration::from_secs(2), collect).await.unwrap();

    assert_eq!(
        seen,
        vec![
            EventKind::HookRegistered,
            EventKind::Listening,
            EventKind::ShutdownRequested,
            EventKind::HookStarting,
            EventKind::HookCompleted,
            EventKind::HooksSettled,
            EventKind::ShutdownCompleted,
        ]
    );
}

#[tokio::test]
async fn invalid_registrations_are_rejected() {
    let (coord, _h) = coordinator(Duration::from_secs(5));
    let hook = ok_hook(Arc::new(AtomicBool::new(false)));

    assert!(matches!(
        coord.register("", hook.clone(), Duration::from_secs(1)).await,
        Err(CoordinatorError::EmptyHookName)
    ));
    assert!(matches!(
        coord.register("zero", hook, Duration::ZERO).await,
        Err(CoordinatorError::ZeroTimeout { .. })
    ));
    assert_eq!(coord.hook_count().await, 0);
}
