use super::help::draw_help;
use super::state::UiState;
use crate::flow::FlowView;
use crate::labels;
use crate::model::{FlowStatus, RequestShape, ScaleLevel, ToastKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub fn draw(area: Rect, f: &mut Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    let header = Paragraph::new(Line::from(vec![
        Span::styled("Server: ", Style::default().fg(Color::Gray)),
        Span::raw(state.server.as_str()),
        Span::styled("  Endpoint: ", Style::default().fg(Color::Gray)),
        Span::raw(state.endpoint.as_str()),
    ]))
    .block(Block::default().borders(Borders::ALL).title("trino-scaleout"));
    f.render_widget(header, chunks[0]);

    let modal = centered_rect(64, 15, chunks[1]);
    f.render_widget(Clear, modal);
    match state.view.as_ref() {
        Some(view) => draw_dialog(modal, f, view, state),
        None => {
            let p = Paragraph::new("Loading…").block(dialog_block(Color::Cyan));
            f.render_widget(p, modal);
        }
    }

    draw_status(chunks[2], f, state);

    if state.show_help {
        draw_help(centered_rect(52, 14, area), f);
    }
}

fn dialog_block(color: Color) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title("Trino Scale-out")
}

fn draw_dialog(area: Rect, f: &mut Frame, view: &FlowView, state: &UiState) {
    let (lines, color) = match view.status {
        FlowStatus::Idle | FlowStatus::Failed => (form_lines(view), Color::Cyan),
        FlowStatus::AwaitingConfirmation => (confirmation_lines(view), Color::Yellow),
        FlowStatus::Submitting => (submitting_lines(view, state), Color::Yellow),
        FlowStatus::Succeeded => (success_lines(view, state), Color::Green),
        FlowStatus::Closed => (vec![Line::from("Closing…")], Color::DarkGray),
    };
    let p = Paragraph::new(lines)
        .block(dialog_block(color))
        .wrap(Wrap { trim: false });
    f.render_widget(p, area);
}

fn form_lines(view: &FlowView) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from("Add temporary workers to the Trino cluster."),
        Line::from(""),
    ];
    match view.shape {
        RequestShape::Level => {
            let mut spans = vec![field_label("Performance level"), arrow("◀ ")];
            for level in ScaleLevel::ALL {
                let name = labels::level_label(level);
                if level == view.level {
                    spans.push(Span::styled(format!("[{name}]"), selected_style()));
                } else {
                    spans.push(Span::raw(format!(" {name} ")));
                }
                spans.push(Span::raw(" "));
            }
            spans.push(arrow("▶"));
            lines.push(Line::from(spans));
        }
        RequestShape::Size => {
            lines.push(Line::from(vec![
                field_label("Scale size"),
                arrow("◀ "),
                Span::styled(labels::size_label(view.size), selected_style()),
                arrow(" ▶"),
                Span::styled(
                    format!("  ({}–{})", view.min_size, view.max_size),
                    Style::default().fg(Color::DarkGray),
                ),
            ]));
        }
        RequestShape::Empty => {
            lines.push(Line::from("The server picks the scale-out settings."));
        }
    }
    if view.shape != RequestShape::Empty {
        lines.push(Line::from(vec![
            field_label("Expires after"),
            arrow("▲ "),
            Span::styled(labels::duration_label(view.duration), selected_style()),
            arrow(" ▼"),
        ]));
    }
    if let Some(err) = view.last_error.as_deref() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            err.to_string(),
            Style::default().fg(Color::Red),
        )));
    }
    lines.push(Line::from(""));
    lines.push(buttons(&[
        ("Enter", "Scale-out", view.can_submit),
        ("Esc", "Cancel", view.can_cancel),
    ]));
    lines
}

fn summary_lines(view: &FlowView) -> Vec<Line<'static>> {
    if view.summary.is_empty() {
        return vec![Line::from("  (server defaults)")];
    }
    view.summary
        .iter()
        .map(|(label, value)| {
            Line::from(vec![
                field_label(label),
                Span::styled(value.clone(), Style::default().add_modifier(Modifier::BOLD)),
            ])
        })
        .collect()
}

fn confirmation_lines(view: &FlowView) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from("Scale out Trino with these settings?"),
        Line::from(""),
    ];
    lines.extend(summary_lines(view));
    lines.push(Line::from(""));
    lines.push(buttons(&[
        ("Enter", "Confirm", view.can_submit),
        ("Esc", "Back", view.can_cancel),
    ]));
    lines
}

fn submitting_lines(view: &FlowView, state: &UiState) -> Vec<Line<'static>> {
    let frame = (state.started.elapsed().as_millis() / 100) as usize % SPINNER.len();
    let mut lines = vec![
        Line::from(vec![
            Span::styled(SPINNER[frame], Style::default().fg(Color::Yellow)),
            Span::raw(" Submitting scale-out request…"),
        ]),
        Line::from(""),
    ];
    lines.extend(summary_lines(view));
    lines.push(Line::from(""));
    lines.push(buttons(&[
        ("Enter", "Confirm", view.can_submit),
        ("Esc", "Back", view.can_cancel),
        ("q", "Close", view.can_close),
    ]));
    lines
}

fn success_lines(view: &FlowView, state: &UiState) -> Vec<Line<'static>> {
    let message = view.panel_message.clone().unwrap_or_default();
    let mut lines = vec![
        Line::from(Span::styled(
            "✔ Scale-out requested",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(message),
        Line::from(""),
        Line::from(Span::styled(
            format!("Closing in {}s", state.panel_seconds_left()),
            Style::default().fg(Color::DarkGray),
        )),
    ];
    if view.can_close {
        lines.push(Line::from(""));
        lines.push(buttons(&[("q", "Close", true)]));
    }
    lines
}

fn draw_status(area: Rect, f: &mut Frame, state: &UiState) {
    let line = if let Some(toast) = state.visible_toast() {
        let color = match toast.kind {
            ToastKind::Success => Color::Green,
            ToastKind::Error => Color::Red,
        };
        Line::from(Span::styled(toast.message.clone(), Style::default().fg(color)))
    } else if !state.info.is_empty() {
        Line::from(Span::styled(
            state.info.clone(),
            Style::default().fg(Color::Yellow),
        ))
    } else {
        let status = state
            .view
            .as_ref()
            .map(|v| v.status.to_string())
            .unwrap_or_default();
        Line::from(vec![
            Span::styled(status, Style::default().fg(Color::Gray)),
            Span::raw("  "),
            Span::styled("? for help", Style::default().fg(Color::DarkGray)),
        ])
    };
    let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(p, area);
}

fn field_label(label: &str) -> Span<'static> {
    Span::styled(format!("{label:<20}"), Style::default().fg(Color::Gray))
}

fn arrow(s: &'static str) -> Span<'static> {
    Span::styled(s, Style::default().fg(Color::DarkGray))
}

fn selected_style() -> Style {
    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
}

fn buttons(items: &[(&'static str, &'static str, bool)]) -> Line<'static> {
    let mut spans = Vec::new();
    for (key, label, enabled) in items {
        let (key_style, label_style) = if *enabled {
            (
                Style::default().fg(Color::Magenta),
                Style::default().add_modifier(Modifier::BOLD),
            )
        } else {
            (
                Style::default().fg(Color::DarkGray),
                Style::default().fg(Color::DarkGray),
            )
        };
        spans.push(Span::styled(format!("[{key}] "), key_style));
        spans.push(Span::styled(*label, label_style));
        spans.push(Span::raw("   "));
    }
    Line::from(spans)
}

/// A rect of at most `width`×`height`, centered in `area`.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect {
        x: area.x + (area.width - w) / 2,
        y: area.y + (area.height - h) / 2,
        width: w,
        height: h,
    }
}
