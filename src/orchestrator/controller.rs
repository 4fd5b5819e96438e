//! Flow lifecycle controller.
//!
//! Applies UI commands to the state machine, runs the one outbound request and
//! the auto-close timer, and emits events for presentation layers.

use super::timer::AutoCloseTimer;
use crate::client::{ScaleoutError, ScaleoutTransport};
use crate::flow::{Applied, FlowError, Outcome, ScaleoutFlow};
use crate::model::{
    DurationHours, FlowEvent, FlowReport, FlowStatus, ScaleLevel, ScaleoutRequest,
    ScaleoutResponse, ToastKind,
};
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

/// Commands emitted by UI layers to drive the flow.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FlowCommand {
    SetLevel(ScaleLevel),
    SetSize(u32),
    SetDuration(DurationHours),
    Apply,
    Confirm,
    Cancel,
    Close,
    /// Tear down without closing; deferred while a request is in flight.
    Quit,
}

type InFlight = JoinHandle<Result<ScaleoutResponse, ScaleoutError>>;

/// Apply one command; returns the request to send when the flow entered Submitting.
fn apply_command(
    flow: &mut ScaleoutFlow,
    cmd: FlowCommand,
) -> Result<Option<ScaleoutRequest>, FlowError> {
    match cmd {
        FlowCommand::SetLevel(level) => flow.set_level(level).map(|_| None),
        FlowCommand::SetSize(size) => flow.set_size(size).map(|_| None),
        FlowCommand::SetDuration(d) => flow.set_duration(d).map(|_| None),
        FlowCommand::Apply => match flow.apply()? {
            Applied::Confirming => Ok(None),
            Applied::Submit(request) => Ok(Some(request)),
        },
        FlowCommand::Confirm => flow.confirm().map(Some),
        FlowCommand::Cancel => flow.cancel().map(|_| None),
        FlowCommand::Close => flow.close().map(|_| None),
        // Handled by the controller loop.
        FlowCommand::Quit => Ok(None),
    }
}

fn spawn_submit(transport: &Arc<dyn ScaleoutTransport>, request: ScaleoutRequest) -> InFlight {
    let transport = Arc::clone(transport);
    tokio::spawn(async move { transport.submit(&request).await })
}

fn emit_view(event_tx: &UnboundedSender<FlowEvent>, flow: &ScaleoutFlow) {
    let _ = event_tx.send(FlowEvent::Updated(Box::new(flow.view())));
}

/// Drive a flow until it closes (or the UI quits) and return its final report.
pub(crate) async fn run_controller(
    mut flow: ScaleoutFlow,
    transport: Arc<dyn ScaleoutTransport>,
    event_tx: UnboundedSender<FlowEvent>,
    mut cmd_rx: UnboundedReceiver<FlowCommand>,
) -> FlowReport {
    let mut in_flight: Option<InFlight> = None;
    let mut auto_close: Option<AutoCloseTimer> = None;
    let mut quit_pending = false;
    let mut commands_open = true;

    emit_view(&event_tx, &flow);

    loop {
        tokio::select! {
            cmd = cmd_rx.recv(), if commands_open => {
                let cmd = match cmd {
                    Some(cmd) => cmd,
                    None => {
                        commands_open = false;
                        FlowCommand::Quit
                    }
                };
                if matches!(cmd, FlowCommand::Quit) {
                    if in_flight.is_none() {
                        break;
                    }
                    // Quit waits for the request so its outcome is still reported.
                    quit_pending = true;
                    let _ = event_tx.send(FlowEvent::Info(
                        "Waiting for the scale-out request to finish…".into(),
                    ));
                    continue;
                }

                match apply_command(&mut flow, cmd) {
                    Ok(Some(request)) => {
                        debug_assert!(in_flight.is_none(), "second request while one is in flight");
                        tracing::info!(body = ?request.body(), "submitting scale-out request");
                        in_flight = Some(spawn_submit(&transport, request));
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::debug!(error = %e, status = %flow.status(), "command rejected");
                        let _ = event_tx.send(FlowEvent::Info(e.to_string()));
                    }
                }
                if flow.status() == FlowStatus::Closed {
                    if let Some(timer) = auto_close.take() {
                        tracing::debug!(
                            remaining_ms = timer.remaining().as_millis() as u64,
                            "auto-close cancelled"
                        );
                        timer.cancel();
                    }
                }
                emit_view(&event_tx, &flow);
            }
            // Do not take the JoinHandle before this branch wins; see the timer branch too.
            joined = async {
                match in_flight.as_mut() {
                    Some(h) => h.await,
                    None => futures::future::pending().await,
                }
            } => {
                in_flight = None;
                let result = joined.unwrap_or_else(|e| {
                    Err(ScaleoutError::Transport(format!("request task failed: {e}")))
                });
                match flow.complete(result) {
                    Ok(Outcome::Notified(toast)) => {
                        tracing::info!(message = %toast.message, "scale-out request succeeded");
                        let _ = event_tx.send(FlowEvent::Toast(toast));
                    }
                    Ok(Outcome::Panel { message, close_after }) => {
                        tracing::info!(%message, ?close_after, "scale-out request succeeded");
                        auto_close = Some(AutoCloseTimer::start(close_after));
                        let _ = event_tx.send(FlowEvent::SuccessPanel {
                            message,
                            closes_in: close_after,
                        });
                    }
                    Ok(Outcome::Failed(toast)) => {
                        debug_assert_eq!(toast.kind, ToastKind::Error);
                        tracing::warn!(message = %toast.message, "scale-out request failed");
                        let _ = event_tx.send(FlowEvent::Toast(toast));
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "request completed outside of Submitting");
                    }
                }
                emit_view(&event_tx, &flow);
                if quit_pending {
                    break;
                }
            }
            () = async {
                match auto_close.as_mut() {
                    Some(timer) => timer.wait().await,
                    None => futures::future::pending().await,
                }
            } => {
                auto_close = None;
                if let Err(e) = flow.auto_close_elapsed() {
                    tracing::debug!(error = %e, "auto-close ignored");
                }
                emit_view(&event_tx, &flow);
            }
        }

        if flow.status() == FlowStatus::Closed {
            break;
        }
    }

    if let Some(timer) = auto_close.take() {
        timer.cancel();
    }

    let report = flow.report();
    tracing::info!(
        status = %report.status,
        outcome = %report.outcome,
        submissions = report.submissions,
        "scale-out flow finished"
    );
    let _ = event_tx.send(FlowEvent::Closed(Box::new(report.clone())));
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScaleoutConfig;
    use crate::model::{Toast, ToastKind};
    use futures::future::BoxFuture;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::Instant;

    struct FakeTransport {
        responses: Mutex<VecDeque<Result<ScaleoutResponse, ScaleoutError>>>,
        latency: Duration,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl FakeTransport {
        fn new(
            responses: Vec<Result<ScaleoutResponse, ScaleoutError>>,
            latency: Duration,
        ) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                latency,
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            })
        }
    }

    impl ScaleoutTransport for FakeTransport {
        fn submit<'a>(
            &'a self,
            _request: &'a ScaleoutRequest,
        ) -> BoxFuture<'a, Result<ScaleoutResponse, ScaleoutError>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_in_flight.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(self.latency).await;
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                self.responses
                    .lock()
                    .unwrap()
                    .pop_front()
                    .unwrap_or_else(|| Err(ScaleoutError::Transport("no response queued".into())))
            })
        }
    }

    fn ok(message: &str) -> Result<ScaleoutResponse, ScaleoutError> {
        Ok(ScaleoutResponse {
            success: Some(true),
            message: Some(message.into()),
            ..Default::default()
        })
    }

    fn settings(confirm: bool, delay: Duration) -> ScaleoutConfig {
        ScaleoutConfig {
            confirm,
            success_close_delay: delay,
            ..ScaleoutConfig::default()
        }
    }

    struct Harness {
        cmd_tx: mpsc::UnboundedSender<FlowCommand>,
        event_rx: mpsc::UnboundedReceiver<FlowEvent>,
        handle: JoinHandle<FlowReport>,
    }

    fn start(settings: ScaleoutConfig, transport: Arc<FakeTransport>) -> Harness {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let flow = ScaleoutFlow::new(settings);
        let handle = tokio::spawn(run_controller(flow, transport, event_tx, cmd_rx));
        Harness {
            cmd_tx,
            event_rx,
            handle,
        }
    }

    fn count_toasts(events: &[FlowEvent], kind: ToastKind) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, FlowEvent::Toast(Toast { kind: k, .. }) if *k == kind))
            .count()
    }

    fn count_panels(events: &[FlowEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, FlowEvent::SuccessPanel { .. }))
            .count()
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_clicks_send_one_request_and_auto_close_after_delay() {
        let transport = FakeTransport::new(vec![ok("queued")], Duration::from_millis(200));
        let mut h = start(settings(true, Duration::from_millis(3000)), transport.clone());

        for cmd in [
            FlowCommand::Apply,
            FlowCommand::Confirm,
            FlowCommand::Confirm,
            FlowCommand::Apply,
            FlowCommand::Close,
            FlowCommand::Cancel,
        ] {
            h.cmd_tx.send(cmd).unwrap();
        }

        let mut events = Vec::new();
        let mut panel_at = None;
        let mut closed_at = None;
        while let Some(ev) = h.event_rx.recv().await {
            match &ev {
                FlowEvent::SuccessPanel { .. } => panel_at = Some(Instant::now()),
                FlowEvent::Updated(view) if view.status == FlowStatus::Submitting => {
                    assert!(!view.can_submit && !view.can_close && !view.can_cancel);
                }
                FlowEvent::Closed(_) => closed_at = Some(Instant::now()),
                _ => {}
            }
            let done = matches!(ev, FlowEvent::Closed(_));
            events.push(ev);
            if done {
                break;
            }
        }

        let report = h.handle.await.unwrap();
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.submissions, 1);
        assert_eq!(report.status, FlowStatus::Closed);
        assert_eq!(report.outcome, FlowStatus::Succeeded);
        assert_eq!(count_panels(&events), 1);
        assert_eq!(count_toasts(&events, ToastKind::Success), 0);
        assert_eq!(count_toasts(&events, ToastKind::Error), 0);

        let waited = closed_at.unwrap() - panel_at.unwrap();
        assert!(waited >= Duration::from_millis(3000), "closed early: {waited:?}");
        assert!(waited < Duration::from_millis(3010), "closed late: {waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn failure_reenables_inputs_and_retry_never_overlaps() {
        let transport = FakeTransport::new(
            vec![
                Err(ScaleoutError::Application {
                    status: Some(500),
                    message: Some("Redis connection failed".into()),
                }),
                ok("queued on retry"),
            ],
            Duration::from_millis(100),
        );
        let mut h = start(settings(false, Duration::ZERO), transport.clone());
        h.cmd_tx.send(FlowCommand::Apply).unwrap();

        let mut events = Vec::new();
        while let Some(ev) = h.event_rx.recv().await {
            match &ev {
                FlowEvent::Updated(view) if view.status == FlowStatus::Failed => {
                    assert!(view.inputs_enabled);
                    assert_eq!(
                        view.last_error.as_deref(),
                        Some("Scale-out request failed: Redis connection failed")
                    );
                    h.cmd_tx.send(FlowCommand::SetLevel(ScaleLevel::Maximum)).unwrap();
                    h.cmd_tx.send(FlowCommand::Apply).unwrap();
                    h.cmd_tx.send(FlowCommand::Apply).unwrap();
                }
                FlowEvent::Closed(_) => {
                    events.push(ev);
                    break;
                }
                _ => {}
            }
            events.push(ev);
        }

        let report = h.handle.await.unwrap();
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
        assert_eq!(transport.max_in_flight.load(Ordering::SeqCst), 1);
        assert_eq!(count_toasts(&events, ToastKind::Error), 1);
        assert_eq!(count_toasts(&events, ToastKind::Success), 1);
        assert_eq!(count_panels(&events), 0);
        assert_eq!(report.outcome, FlowStatus::Succeeded);
        assert_eq!(
            report.response.and_then(|r| r.message).as_deref(),
            Some("queued on retry")
        );
        assert!(events.iter().any(|e| matches!(e, FlowEvent::Info(m) if m.contains("in flight"))));
    }

    #[tokio::test(start_paused = true)]
    async fn quit_during_submit_waits_for_outcome() {
        let transport = FakeTransport::new(vec![ok("queued")], Duration::from_secs(2));
        let mut h = start(settings(false, Duration::from_secs(3)), transport.clone());
        h.cmd_tx.send(FlowCommand::Apply).unwrap();
        h.cmd_tx.send(FlowCommand::Quit).unwrap();

        let started = Instant::now();
        let report = h.handle.await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(2));
        assert!(started.elapsed() < Duration::from_secs(3));
        assert_eq!(report.status, FlowStatus::Succeeded);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);

        let mut saw_panel = false;
        while let Ok(ev) = h.event_rx.try_recv() {
            saw_panel |= matches!(ev, FlowEvent::SuccessPanel { .. });
        }
        assert!(saw_panel);
    }

    #[tokio::test(start_paused = true)]
    async fn closing_a_closable_panel_cancels_auto_close() {
        let transport = FakeTransport::new(vec![ok("queued")], Duration::from_millis(10));
        let cfg = ScaleoutConfig {
            success_panel_closable: true,
            ..settings(false, Duration::from_secs(3))
        };
        let mut h = start(cfg, transport);
        h.cmd_tx.send(FlowCommand::Apply).unwrap();

        let mut panel_at = None;
        while let Some(ev) = h.event_rx.recv().await {
            match ev {
                FlowEvent::SuccessPanel { .. } => {
                    panel_at = Some(Instant::now());
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    h.cmd_tx.send(FlowCommand::Close).unwrap();
                }
                FlowEvent::Closed(report) => {
                    assert_eq!(report.outcome, FlowStatus::Succeeded);
                    let waited = Instant::now() - panel_at.unwrap();
                    assert!(waited < Duration::from_secs(1));
                    break;
                }
                _ => {}
            }
        }
        h.handle.await.unwrap();
    }

    #[tokio::test]
    async fn cancel_from_idle_closes_without_request() {
        let transport = FakeTransport::new(vec![], Duration::ZERO);
        let h = start(settings(true, Duration::from_secs(3)), transport.clone());
        h.cmd_tx.send(FlowCommand::Apply).unwrap();
        h.cmd_tx.send(FlowCommand::Cancel).unwrap();
        h.cmd_tx.send(FlowCommand::Cancel).unwrap();

        let report = h.handle.await.unwrap();
        assert_eq!(report.status, FlowStatus::Closed);
        assert_eq!(report.outcome, FlowStatus::Idle);
        assert_eq!(report.submissions, 0);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn dropped_command_channel_ends_idle_flow() {
        let transport = FakeTransport::new(vec![], Duration::ZERO);
        let h = start(settings(true, Duration::from_secs(3)), transport);
        drop(h.cmd_tx);
        let report = h.handle.await.unwrap();
        assert_eq!(report.status, FlowStatus::Idle);
    }
}
