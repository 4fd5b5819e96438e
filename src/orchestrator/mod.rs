//! Application-level orchestration of a scale-out flow.
//!
//! The controller owns the state machine, the single in-flight request and the
//! auto-close timer. UI/CLI layers send commands and render the events it emits.

mod controller;
mod timer;

pub(crate) use controller::{run_controller, FlowCommand};
