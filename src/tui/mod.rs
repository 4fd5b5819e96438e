mod dialog;
mod help;
mod state;

use crate::client::{RedashClient, ScaleoutTransport};
use crate::config::AppConfig;
use crate::flow::{FlowView, ScaleoutFlow};
use crate::model::{FlowEvent, FlowReport, FlowStatus, RequestShape};
use crate::orchestrator::{self, FlowCommand};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use state::UiState;
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Size step for PgUp/PgDn.
const SIZE_PAGE: u32 = 10;

pub async fn run(cfg: AppConfig) -> Result<()> {
    let (event_tx, event_rx) = mpsc::unbounded_channel::<FlowEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<FlowCommand>();

    let transport: Arc<dyn ScaleoutTransport> = Arc::new(RedashClient::new(&cfg)?);
    let flow = ScaleoutFlow::new(cfg.scaleout.clone());

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_cfg = cfg.clone();
    let ui_handle = std::thread::spawn(move || run_threaded(ui_cfg, event_rx, cmd_tx));

    let report = orchestrator::run_controller(flow, transport, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    print_outcome(&report);
    Ok(())
}

/// Leave a trace of what happened once the alternate screen is gone.
fn print_outcome(report: &FlowReport) {
    match report.outcome {
        FlowStatus::Succeeded => {
            println!("{}", success_message(report));
        }
        FlowStatus::Failed => {
            if let Some(err) = report.error.as_deref() {
                eprintln!("{err}");
            }
        }
        _ => {}
    }
}

/// Server message for a successful report, or the default one.
fn success_message(report: &FlowReport) -> &str {
    report
        .response
        .as_ref()
        .and_then(|r| r.message.as_deref())
        .filter(|m| !m.is_empty())
        .unwrap_or(crate::flow::DEFAULT_SUCCESS_MESSAGE)
}

/// Run the TUI loop on a dedicated thread.
pub fn run_threaded(
    cfg: AppConfig,
    mut event_rx: UnboundedReceiver<FlowEvent>,
    cmd_tx: UnboundedSender<FlowCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    let mut state = UiState {
        server: cfg.base_url.clone(),
        endpoint: cfg.scaleout.endpoint.clone(),
        ..Default::default()
    };

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let mut disconnected = false;
    let res = loop {
        while !disconnected {
            match event_rx.try_recv() {
                Ok(ev) => state.apply_event(ev),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if state.report.is_none() {
                        tracing::warn!("controller went away before closing the dialog");
                    }
                    disconnected = true;
                }
            }
        }
        if state.is_closed() || disconnected {
            break Ok(());
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| dialog::draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match (k.modifiers, k.code) {
                    (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                        // The controller defers this while a request is in flight.
                        let _ = cmd_tx.send(FlowCommand::Quit);
                    }
                    (_, KeyCode::Char('?')) => {
                        state.show_help = !state.show_help;
                    }
                    (_, KeyCode::Esc) if state.show_help => {
                        state.show_help = false;
                    }
                    (_, code) => {
                        let Some(view) = state.view.as_ref() else {
                            continue;
                        };
                        match command_for_key(view, code) {
                            Some(cmd) => {
                                state.info.clear();
                                let _ = cmd_tx.send(cmd);
                            }
                            None => {
                                if let Some(hint) = disabled_hint(view, code) {
                                    state.info = hint.into();
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

/// Map a key to a flow command, honoring what the current view allows.
fn command_for_key(view: &FlowView, code: KeyCode) -> Option<FlowCommand> {
    match code {
        KeyCode::Left | KeyCode::Char('h') if view.inputs_enabled => match view.shape {
            RequestShape::Level => Some(FlowCommand::SetLevel(view.level.prev())),
            RequestShape::Size => step_size(view, -1),
            RequestShape::Empty => None,
        },
        KeyCode::Right | KeyCode::Char('l') if view.inputs_enabled => match view.shape {
            RequestShape::Level => Some(FlowCommand::SetLevel(view.level.next())),
            RequestShape::Size => step_size(view, 1),
            RequestShape::Empty => None,
        },
        KeyCode::PageDown if view.inputs_enabled && view.shape == RequestShape::Size => {
            step_size(view, -(SIZE_PAGE as i64))
        }
        KeyCode::PageUp if view.inputs_enabled && view.shape == RequestShape::Size => {
            step_size(view, SIZE_PAGE as i64)
        }
        KeyCode::Up | KeyCode::Char('k')
            if view.inputs_enabled && view.shape != RequestShape::Empty =>
        {
            step_duration(view, -1)
        }
        KeyCode::Down | KeyCode::Char('j')
            if view.inputs_enabled && view.shape != RequestShape::Empty =>
        {
            step_duration(view, 1)
        }
        KeyCode::Enter if view.can_submit => Some(match view.status {
            FlowStatus::AwaitingConfirmation => FlowCommand::Confirm,
            _ => FlowCommand::Apply,
        }),
        KeyCode::Esc if view.can_cancel => Some(FlowCommand::Cancel),
        KeyCode::Char('q') if view.can_close => Some(FlowCommand::Close),
        _ => None,
    }
}

fn disabled_hint(view: &FlowView, code: KeyCode) -> Option<&'static str> {
    match (view.status, code) {
        (FlowStatus::Submitting, KeyCode::Char('q') | KeyCode::Esc) => {
            Some("Waiting for the scale-out request to finish…")
        }
        (FlowStatus::Succeeded, KeyCode::Char('q') | KeyCode::Esc) => {
            Some("The dialog closes on its own")
        }
        _ => None,
    }
}

fn step_size(view: &FlowView, delta: i64) -> Option<FlowCommand> {
    let next = (view.size as i64 + delta).clamp(view.min_size as i64, view.max_size as i64) as u32;
    (next != view.size).then_some(FlowCommand::SetSize(next))
}

fn step_duration(view: &FlowView, delta: isize) -> Option<FlowCommand> {
    let idx = view
        .allowed_durations
        .iter()
        .position(|d| *d == view.duration)?;
    let next = idx.checked_add_signed(delta)?;
    view.allowed_durations
        .get(next)
        .copied()
        .map(FlowCommand::SetDuration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScaleoutConfig;
    use crate::model::{DurationHours, ScaleLevel, ScaleoutResponse};

    fn view_with(shape: RequestShape) -> FlowView {
        let settings = ScaleoutConfig {
            shape,
            ..Default::default()
        };
        ScaleoutFlow::new(settings).view()
    }

    #[test]
    fn arrows_cycle_level() {
        let view = view_with(RequestShape::Level);
        assert_eq!(
            command_for_key(&view, KeyCode::Right),
            Some(FlowCommand::SetLevel(ScaleLevel::Maximum))
        );
        assert_eq!(
            command_for_key(&view, KeyCode::Char('h')),
            Some(FlowCommand::SetLevel(ScaleLevel::Light))
        );
    }

    #[test]
    fn size_steps_clamp_to_bounds() {
        let mut view = view_with(RequestShape::Size);
        assert_eq!(
            command_for_key(&view, KeyCode::PageUp),
            Some(FlowCommand::SetSize(30))
        );
        view.size = view.max_size;
        assert_eq!(command_for_key(&view, KeyCode::Right), None);
        assert_eq!(
            command_for_key(&view, KeyCode::PageDown),
            Some(FlowCommand::SetSize(view.max_size - SIZE_PAGE))
        );
        view.size = view.min_size + 3;
        assert_eq!(
            command_for_key(&view, KeyCode::PageDown),
            Some(FlowCommand::SetSize(view.min_size))
        );
    }

    #[test]
    fn duration_steps_through_allowed_set() {
        let view = view_with(RequestShape::Level);
        assert_eq!(
            command_for_key(&view, KeyCode::Down),
            Some(FlowCommand::SetDuration(DurationHours::from_minutes(240)))
        );
        assert_eq!(
            command_for_key(&view, KeyCode::Up),
            Some(FlowCommand::SetDuration(DurationHours::from_minutes(60)))
        );

        let mut last = view.clone();
        last.duration = *last.allowed_durations.last().unwrap();
        assert_eq!(command_for_key(&last, KeyCode::Down), None);
        let mut first = view;
        first.duration = first.allowed_durations[0];
        assert_eq!(command_for_key(&first, KeyCode::Up), None);
    }

    #[test]
    fn enter_applies_then_confirms() {
        let mut flow = ScaleoutFlow::new(ScaleoutConfig::default());
        assert_eq!(
            command_for_key(&flow.view(), KeyCode::Enter),
            Some(FlowCommand::Apply)
        );
        flow.apply().unwrap();
        assert_eq!(
            command_for_key(&flow.view(), KeyCode::Enter),
            Some(FlowCommand::Confirm)
        );
        assert_eq!(
            command_for_key(&flow.view(), KeyCode::Esc),
            Some(FlowCommand::Cancel)
        );
    }

    #[test]
    fn nothing_gets_through_while_submitting() {
        let mut flow = ScaleoutFlow::new(ScaleoutConfig::default());
        flow.apply().unwrap();
        flow.confirm().unwrap();
        let view = flow.view();
        for code in [
            KeyCode::Enter,
            KeyCode::Esc,
            KeyCode::Char('q'),
            KeyCode::Left,
            KeyCode::Down,
        ] {
            assert_eq!(command_for_key(&view, code), None);
        }
        assert!(disabled_hint(&view, KeyCode::Char('q')).is_some());
    }

    #[test]
    fn success_message_prefers_server_text() {
        let mut report = ScaleoutFlow::new(ScaleoutConfig::default()).report();
        report.outcome = FlowStatus::Succeeded;
        report.response = Some(ScaleoutResponse {
            success: Some(true),
            message: Some("Scaled out to 20 workers".into()),
            ..Default::default()
        });
        assert_eq!(success_message(&report), "Scaled out to 20 workers");

        report.response = Some(ScaleoutResponse {
            success: Some(true),
            message: Some(String::new()),
            ..Default::default()
        });
        assert_eq!(success_message(&report), crate::flow::DEFAULT_SUCCESS_MESSAGE);

        report.response = None;
        assert_eq!(success_message(&report), crate::flow::DEFAULT_SUCCESS_MESSAGE);
    }

    #[test]
    fn empty_shape_has_no_inputs() {
        let view = view_with(RequestShape::Empty);
        assert_eq!(command_for_key(&view, KeyCode::Left), None);
        assert_eq!(command_for_key(&view, KeyCode::Down), None);
        assert_eq!(
            command_for_key(&view, KeyCode::Enter),
            Some(FlowCommand::Apply)
        );
    }
}
