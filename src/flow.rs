//! Scale-out request state machine.
//!
//! Pure and synchronous: the async controller feeds it commands and request
//! outcomes, and it decides what is allowed. Submit and close affordances are
//! derived from the status here, never tracked separately by a UI.

use crate::client::ScaleoutError;
use crate::config::ScaleoutConfig;
use crate::labels;
use crate::model::{
    DurationHours, FlowReport, FlowStatus, RequestShape, ScaleLevel, ScaleParams,
    ScaleoutRequest, ScaleoutResponse, Toast,
};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

pub(crate) const DEFAULT_SUCCESS_MESSAGE: &str = "Scale-out request submitted";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("a scale-out request is already in flight")]
    Busy,
    #[error("cannot {action} while {status}")]
    InvalidTransition {
        action: &'static str,
        status: FlowStatus,
    },
    #[error("{0} is not one of the allowed durations")]
    DurationNotAllowed(String),
    #[error("scale size {size} is outside {min}..={max}")]
    SizeOutOfRange { size: u32, min: u32, max: u32 },
}

/// Result of `apply`.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    /// The summary is shown and waits for `confirm`.
    Confirming,
    /// Send exactly this request.
    Submit(ScaleoutRequest),
}

/// Result of `complete`; each variant is exactly one user-visible signal.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Success reported as a toast; the flow is already closed.
    Notified(Toast),
    /// Success panel shown until `auto_close_elapsed`.
    Panel { message: String, close_after: Duration },
    /// Error toast; the flow is editable again.
    Failed(Toast),
}

/// Read-only snapshot handed to presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowView {
    pub status: FlowStatus,
    pub shape: RequestShape,
    pub level: ScaleLevel,
    pub size: u32,
    pub min_size: u32,
    pub max_size: u32,
    pub duration: DurationHours,
    pub allowed_durations: Vec<DurationHours>,
    /// `(label, value)` pairs of the confirmation summary.
    pub summary: Vec<(String, String)>,
    pub inputs_enabled: bool,
    pub can_submit: bool,
    pub can_cancel: bool,
    pub can_close: bool,
    pub panel_message: Option<String>,
    pub last_error: Option<String>,
}

pub struct ScaleoutFlow {
    settings: ScaleoutConfig,
    status: FlowStatus,
    level: ScaleLevel,
    size: u32,
    duration: DurationHours,
    submissions: u32,
    last_request: Option<ScaleoutRequest>,
    last_response: Option<ScaleoutResponse>,
    last_error: Option<String>,
    panel_message: Option<String>,
    closed_from: Option<FlowStatus>,
}

impl ScaleoutFlow {
    /// Expects a validated config (see `AppConfig::validate`).
    pub fn new(settings: ScaleoutConfig) -> Self {
        Self {
            status: FlowStatus::Idle,
            level: settings.default_level,
            size: settings.default_size,
            duration: settings.default_duration,
            settings,
            submissions: 0,
            last_request: None,
            last_response: None,
            last_error: None,
            panel_message: None,
            closed_from: None,
        }
    }

    pub fn status(&self) -> FlowStatus {
        self.status
    }

    pub fn inputs_enabled(&self) -> bool {
        matches!(self.status, FlowStatus::Idle | FlowStatus::Failed)
    }

    pub fn can_submit(&self) -> bool {
        matches!(
            self.status,
            FlowStatus::Idle | FlowStatus::Failed | FlowStatus::AwaitingConfirmation
        )
    }

    pub fn can_cancel(&self) -> bool {
        matches!(
            self.status,
            FlowStatus::Idle | FlowStatus::Failed | FlowStatus::AwaitingConfirmation
        )
    }

    pub fn can_close(&self) -> bool {
        match self.status {
            FlowStatus::Idle | FlowStatus::Failed | FlowStatus::AwaitingConfirmation => true,
            FlowStatus::Succeeded => self.settings.success_panel_closable,
            FlowStatus::Submitting | FlowStatus::Closed => false,
        }
    }

    fn require(&self, action: &'static str, allowed: &[FlowStatus]) -> Result<(), FlowError> {
        if allowed.contains(&self.status) {
            Ok(())
        } else if self.status == FlowStatus::Submitting {
            Err(FlowError::Busy)
        } else {
            Err(FlowError::InvalidTransition {
                action,
                status: self.status,
            })
        }
    }

    fn require_editable(&self, action: &'static str) -> Result<(), FlowError> {
        self.require(action, &[FlowStatus::Idle, FlowStatus::Failed])
    }

    pub fn set_level(&mut self, level: ScaleLevel) -> Result<(), FlowError> {
        self.require_editable("change the level")?;
        self.level = level;
        Ok(())
    }

    pub fn set_size(&mut self, size: u32) -> Result<(), FlowError> {
        self.require_editable("change the size")?;
        let (min, max) = (self.settings.min_size, self.settings.max_size);
        if !(min..=max).contains(&size) {
            return Err(FlowError::SizeOutOfRange { size, min, max });
        }
        self.size = size;
        Ok(())
    }

    pub fn set_duration(&mut self, duration: DurationHours) -> Result<(), FlowError> {
        self.require_editable("change the duration")?;
        if !self.settings.allowed_durations.contains(&duration) {
            return Err(FlowError::DurationNotAllowed(labels::duration_label(duration)));
        }
        self.duration = duration;
        Ok(())
    }

    pub fn apply(&mut self) -> Result<Applied, FlowError> {
        self.require_editable("apply")?;
        if self.settings.confirm {
            self.status = FlowStatus::AwaitingConfirmation;
            Ok(Applied::Confirming)
        } else {
            Ok(Applied::Submit(self.begin_submit()))
        }
    }

    pub fn confirm(&mut self) -> Result<ScaleoutRequest, FlowError> {
        self.require("confirm", &[FlowStatus::AwaitingConfirmation])?;
        Ok(self.begin_submit())
    }

    fn begin_submit(&mut self) -> ScaleoutRequest {
        let request = self.request();
        self.status = FlowStatus::Submitting;
        self.submissions += 1;
        self.last_request = Some(request);
        self.last_error = None;
        request
    }

    /// Back out of the confirmation, or dismiss the dialog when editing.
    pub fn cancel(&mut self) -> Result<(), FlowError> {
        self.require(
            "cancel",
            &[
                FlowStatus::AwaitingConfirmation,
                FlowStatus::Idle,
                FlowStatus::Failed,
            ],
        )?;
        if self.status == FlowStatus::AwaitingConfirmation {
            self.status = FlowStatus::Idle;
        } else {
            self.close_now();
        }
        Ok(())
    }

    pub fn close(&mut self) -> Result<(), FlowError> {
        if !self.can_close() {
            self.require("close", &[])?;
        }
        self.close_now();
        Ok(())
    }

    fn close_now(&mut self) {
        self.closed_from = Some(self.status);
        self.status = FlowStatus::Closed;
    }

    pub fn complete(
        &mut self,
        result: Result<ScaleoutResponse, ScaleoutError>,
    ) -> Result<Outcome, FlowError> {
        self.require("complete a request", &[FlowStatus::Submitting])?;
        match result {
            Ok(response) => {
                let message = response
                    .message
                    .clone()
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_SUCCESS_MESSAGE.to_string());
                self.last_response = Some(response);
                self.status = FlowStatus::Succeeded;
                let delay = self.settings.success_close_delay;
                if delay.is_zero() {
                    self.close_now();
                    Ok(Outcome::Notified(Toast::success(message)))
                } else {
                    self.panel_message = Some(message.clone());
                    Ok(Outcome::Panel {
                        message,
                        close_after: delay,
                    })
                }
            }
            Err(err) => {
                let message = err.user_message();
                self.last_error = Some(message.clone());
                self.status = FlowStatus::Failed;
                Ok(Outcome::Failed(Toast::error(message)))
            }
        }
    }

    pub fn auto_close_elapsed(&mut self) -> Result<(), FlowError> {
        self.require("auto-close", &[FlowStatus::Succeeded])?;
        self.close_now();
        Ok(())
    }

    pub fn request(&self) -> ScaleoutRequest {
        let params = match self.settings.shape {
            RequestShape::Level => ScaleParams::Level(self.level),
            RequestShape::Size => ScaleParams::Size(self.size),
            RequestShape::Empty => ScaleParams::Empty,
        };
        ScaleoutRequest {
            params,
            duration: self.duration,
        }
    }

    /// Confirmation summary, rendered through the label lookup.
    pub fn summary(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        match self.settings.shape {
            RequestShape::Level => out.push((
                "Performance level".to_string(),
                labels::level_label(self.level).to_string(),
            )),
            RequestShape::Size => {
                out.push(("Scale size".to_string(), labels::size_label(self.size)))
            }
            RequestShape::Empty => return out,
        }
        out.push((
            "Expires after".to_string(),
            labels::duration_label(self.duration),
        ));
        out
    }

    pub fn view(&self) -> FlowView {
        FlowView {
            status: self.status,
            shape: self.settings.shape,
            level: self.level,
            size: self.size,
            min_size: self.settings.min_size,
            max_size: self.settings.max_size,
            duration: self.duration,
            allowed_durations: self.settings.allowed_durations.clone(),
            summary: self.summary(),
            inputs_enabled: self.inputs_enabled(),
            can_submit: self.can_submit(),
            can_cancel: self.can_cancel(),
            can_close: self.can_close(),
            panel_message: self.panel_message.clone(),
            last_error: self.last_error.clone(),
        }
    }

    pub fn report(&self) -> FlowReport {
        FlowReport {
            status: self.status,
            outcome: self.closed_from.unwrap_or(self.status),
            submissions: self.submissions,
            last_request: self.last_request.map(|r| r.body()),
            response: self.last_response.clone(),
            error: self.last_error.clone(),
        }
    }
}
