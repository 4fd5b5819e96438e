use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

fn key_line(key: &'static str, pad: usize, what: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(key, Style::default().fg(Color::Magenta)),
        Span::raw(format!("{:pad$}{what}", "")),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        key_line("←/→", 9, "Change level / size"),
        key_line("PgUp/PgDn", 3, "Change size by 10"),
        key_line("↑/↓", 9, "Change expiry"),
        key_line("Enter", 7, "Scale-out / Confirm"),
        key_line("Esc", 9, "Back / Cancel"),
        key_line("q", 11, "Close dialog"),
        key_line("Ctrl-C", 6, "Quit"),
        key_line("?", 11, "Toggle this help"),
        Line::from(""),
        Line::from("Closing is disabled while a request is in flight."),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(Clear, area);
    f.render_widget(p, area);
}
