use changi_core::{ChatRole, ChatSurface, Status};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::app::{App, BackendHealth};

const SPINNER: [&str; 3] = ["·  ", "·· ", "···"];

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, history, input row, status line, footer
    let [header_area, history_area, input_row, status_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_history(app, frame, history_area);
    render_input(app, frame, input_row);
    render_status(app, frame, status_area);
    render_footer(frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let health_color = match app.health {
        BackendHealth::Checking => Color::DarkGray,
        BackendHealth::Online => Color::Green,
        BackendHealth::Degraded => Color::Yellow,
        BackendHealth::Unreachable => Color::Red,
    };

    let header = Line::from(vec![
        Span::styled(
            " Changi Airport Assistant ",
            Style::default().fg(Color::White).bg(Color::Magenta).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" {} ", app.base_url)),
        Span::styled(format!("[{}]", app.health.label()), Style::default().fg(health_color)),
    ]);

    frame.render_widget(Paragraph::new(header), area);
}

fn render_history(app: &mut App, frame: &mut Frame, area: Rect) {
    app.history_area = Some(area);

    let focused = !app.panel().is_input_focused();
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Chat ");

    let inner_width = area.width.saturating_sub(2);
    let panel = app.panel_mut();
    panel.viewport_height = area.height.saturating_sub(2);

    let text = if panel.messages().is_empty() {
        Text::from(Span::styled(
            "Ask about dining, attractions, transport or services at Changi...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();
        for msg in panel.messages() {
            let header_style = match msg.role {
                ChatRole::User => Style::default().fg(Color::Cyan),
                ChatRole::Assistant => Style::default().fg(Color::Yellow),
            };
            lines.push(Line::from(Span::styled(
                msg.role.label(),
                header_style.add_modifier(Modifier::BOLD),
            )));
            // Plain text only, no markup interpretation
            if msg.content.is_empty() {
                lines.push(Line::default());
            }
            for line in msg.content.lines() {
                lines.push(Line::from(line.to_string()));
            }
            lines.push(Line::default());
        }
        Text::from(lines)
    };

    // Measure with the same wrapping that draws it, so the bottom is reachable
    let history = Paragraph::new(text).wrap(Wrap { trim: false });
    let rendered = u16::try_from(history.line_count(inner_width)).unwrap_or(u16::MAX);
    panel.set_content_height(rendered);

    let history = history.block(block).scroll((panel.scroll, 0));
    frame.render_widget(history, area);
}

fn render_input(app: &mut App, frame: &mut Frame, area: Rect) {
    let [input_area, send_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(10),
    ])
    .areas(area);

    app.input_area = Some(input_area);
    app.send_area = Some(send_area);

    let panel = app.panel();
    let focused = panel.is_input_focused();
    let border_color = if focused { Color::Yellow } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Ask ");

    // Horizontal scrolling keeps the cursor inside the box
    let inner_width = input_area.width.saturating_sub(2) as usize;
    let cursor_pos = panel.cursor();
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = panel
        .input_value()
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(input, input_area);

    if focused {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((input_area.x + cursor_x + 1, input_area.y + 1));
    }

    let send = Paragraph::new(Span::styled(
        "Send",
        Style::default().fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(send, send_area);
}

fn render_status(app: &App, frame: &mut Frame, area: Rect) {
    let status = app.panel().status();
    let style = match status {
        Status::Idle => Style::default().fg(Color::Green),
        Status::Pending => Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        Status::Error => Style::default().fg(Color::Red),
    };

    let mut spans = Vec::new();
    if app.is_pending() {
        spans.push(Span::raw(SPINNER[app.animation_frame as usize % SPINNER.len()]));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::styled(status.text(), style));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_footer(frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = vec![
        Span::styled(" Enter ", key_style),
        Span::styled(" send ", label_style),
        Span::styled(" ^S ", key_style),
        Span::styled(" send ", label_style),
        Span::styled(" Tab ", key_style),
        Span::styled(" focus ", label_style),
        Span::styled(" PgUp/PgDn ", key_style),
        Span::styled(" scroll ", label_style),
        Span::styled(" Esc ", key_style),
        Span::styled(" quit ", label_style),
    ];

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}
