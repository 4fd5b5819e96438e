//! Text summary builders for CLI output.
//!
//! Formats the confirmation summary and the metadata line for text mode.

use crate::flow::FlowView;
use crate::metadata::QueryMetadataView;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

pub(crate) fn build_confirmation_summary(view: &FlowView) -> TextSummary {
    let mut lines = vec!["Trino scale-out".to_string()];
    if view.summary.is_empty() {
        lines.push("  (server defaults)".to_string());
    }
    let width = view
        .summary
        .iter()
        .map(|(label, _)| label.chars().count())
        .max()
        .unwrap_or(0);
    for (label, value) in &view.summary {
        lines.push(format!("  {label:<width$}  {value}"));
    }
    TextSummary { lines }
}

pub(crate) fn build_metadata_summary(view: &QueryMetadataView) -> TextSummary {
    let mut lines = Vec::new();
    if let Some(warning) = view.truncation_warning.as_deref() {
        lines.push(format!("Warning: {warning}"));
    }

    let mut main = format!("{}  {}", view.rows, view.runtime);
    if !view.executing {
        main.push_str(" runtime");
    }
    if let Some(cost) = view.cost.as_deref() {
        main.push_str(&format!("  Query Cost {cost}"));
    }
    lines.push(main);
    lines.push(format!("Refreshed {}", view.refreshed));

    TextSummary { lines }
}
