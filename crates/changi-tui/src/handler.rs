use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::App;
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Paste(text) => {
            if app.panel().is_input_focused() {
                app.panel_mut().insert_text(&text);
            }
        }
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Answer(outcome) => app.settle(outcome),
        AppEvent::Health(probe) => app.set_health(probe),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => {
                app.should_quit = true;
                return;
            }
            // Keyboard alias for the send button
            KeyCode::Char('s') => {
                app.submit();
                return;
            }
            _ => {}
        }
    }

    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Tab => app.toggle_focus(),
        KeyCode::PageUp => {
            let page = page_height(app);
            app.panel_mut().scroll_up(page);
        }
        KeyCode::PageDown => {
            let page = page_height(app);
            app.panel_mut().scroll_down(page);
        }
        _ if app.panel().is_input_focused() => handle_input_key(app, key),
        _ => handle_history_key(app, key),
    }
}

fn handle_input_key(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Enter {
        app.submit();
        return;
    }

    let panel = app.panel_mut();
    match key.code {
        KeyCode::Backspace => panel.backspace(),
        KeyCode::Delete => panel.delete(),
        KeyCode::Left => panel.cursor_left(),
        KeyCode::Right => panel.cursor_right(),
        KeyCode::Home => panel.cursor_home(),
        KeyCode::End => panel.cursor_end(),
        KeyCode::Char(c) if !is_shortcut(key.modifiers) => panel.insert_char(c),
        _ => {}
    }
}

/// Ctrl or Alt chords are shortcuts, not text. AltGr arrives as Ctrl+Alt on
/// some platforms and does type a character.
fn is_shortcut(modifiers: KeyModifiers) -> bool {
    let ctrl = modifiers.contains(KeyModifiers::CONTROL);
    let alt = modifiers.contains(KeyModifiers::ALT);
    ctrl != alt
}

fn handle_history_key(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('q') {
        app.should_quit = true;
        return;
    }

    let panel = app.panel_mut();
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => panel.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => panel.scroll_up(1),
        KeyCode::Char('g') => panel.scroll = 0,
        KeyCode::Char('G') => {
            let bottom = panel.max_scroll();
            panel.scroll = bottom;
        }
        _ => {}
    }
}

fn page_height(app: &App) -> u16 {
    (app.panel().viewport_height / 2).max(1)
}

fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    let in_history = app.history_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_input = app.input_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_send = app.send_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    match mouse.kind {
        MouseEventKind::ScrollDown if in_history => app.panel_mut().scroll_down(3),
        MouseEventKind::ScrollUp if in_history => app.panel_mut().scroll_up(3),
        MouseEventKind::Down(MouseButton::Left) => {
            if in_send {
                app.submit();
            } else if in_input && !app.panel().is_input_focused() {
                app.toggle_focus();
            } else if in_history && app.panel().is_input_focused() {
                app.toggle_focus();
            }
        }
        _ => {}
    }
}
