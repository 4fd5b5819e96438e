use crate::flow::FlowView;
use crate::model::{FlowEvent, FlowReport, Toast};
use std::time::{Duration, Instant};

/// How long a toast stays in the status bar.
const TOAST_TTL: Duration = Duration::from_secs(6);

pub struct SuccessPanel {
    pub message: String,
    pub deadline: Instant,
}

pub struct UiState {
    pub view: Option<FlowView>,
    pub toast: Option<(Toast, Instant)>,
    pub info: String,
    pub panel: Option<SuccessPanel>,
    pub show_help: bool,
    pub started: Instant,
    pub server: String,
    pub endpoint: String,
    pub report: Option<FlowReport>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            view: None,
            toast: None,
            info: String::new(),
            panel: None,
            show_help: false,
            started: Instant::now(),
            server: String::new(),
            endpoint: String::new(),
            report: None,
        }
    }
}

impl UiState {
    pub fn apply_event(&mut self, ev: FlowEvent) {
        match ev {
            FlowEvent::Updated(view) => {
                self.view = Some(*view);
            }
            FlowEvent::Toast(toast) => {
                self.info.clear();
                self.toast = Some((toast, Instant::now()));
            }
            FlowEvent::SuccessPanel { message, closes_in } => {
                self.info.clear();
                self.panel = Some(SuccessPanel {
                    message,
                    deadline: Instant::now() + closes_in,
                });
            }
            FlowEvent::Info(msg) => {
                self.info = msg;
            }
            FlowEvent::Closed(report) => {
                self.report = Some(*report);
            }
        }
    }

    pub fn visible_toast(&self) -> Option<&Toast> {
        self.toast
            .as_ref()
            .filter(|(_, at)| at.elapsed() < TOAST_TTL)
            .map(|(toast, _)| toast)
    }

    /// Whole seconds until the success panel closes, rounded up.
    pub fn panel_seconds_left(&self) -> u64 {
        self.panel
            .as_ref()
            .map(|p| {
                let left = p.deadline.saturating_duration_since(Instant::now());
                left.as_millis().div_ceil(1000) as u64
            })
            .unwrap_or(0)
    }

    pub fn is_closed(&self) -> bool {
        self.report.is_some()
    }
}
