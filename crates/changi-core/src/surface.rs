//! The elements a chat widget drives: history panel, text input, status line.

use crate::state::{ChatMessage, Status};

/// Elements the widget reads and mutates. A host must provide all of them
/// before a widget can be built.
pub trait ChatSurface {
    /// Append a message as the last item of the history panel
    fn append_message(&mut self, message: ChatMessage);
    /// Scroll the history panel so the newest message is visible
    fn scroll_to_bottom(&mut self);
    fn input_value(&self) -> &str;
    fn set_input_value(&mut self, value: &str);
    fn set_status(&mut self, status: Status);
    fn focus_input(&mut self);
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// In-memory surface. The terminal host renders straight from it.
#[derive(Debug, Default)]
pub struct ChatPanel {
    messages: Vec<ChatMessage>,
    input: String,
    cursor: usize, // in chars
    status: Status,
    input_focused: bool,

    pub scroll: u16,
    // Inner height of the history area from the last render
    pub viewport_height: u16,
    content_height: u16,
    pin_to_bottom: bool,
}

impl ChatPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_input_focused(&self) -> bool {
        self.input_focused
    }

    pub fn blur_input(&mut self) {
        self.input_focused = false;
    }

    /// Insert pasted text at the cursor. Line breaks are dropped, the input
    /// is a single line.
    pub fn insert_text(&mut self, text: &str) {
        for c in text.chars().filter(|c| *c != '\n' && *c != '\r') {
            self.insert_char(c);
        }
    }

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.input, self.cursor);
        self.input.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.input.chars().count() {
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.input.chars().count());
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.input.chars().count();
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_add(lines).min(self.max_scroll());
    }

    /// Wrapped line count of the history as last rendered
    pub fn content_height(&self) -> u16 {
        self.content_height
    }

    /// Record the rendered height of the history. A pending scroll-to-bottom
    /// lands here, once the real wrapped height is known.
    pub fn set_content_height(&mut self, lines: u16) {
        self.content_height = lines;
        if self.pin_to_bottom {
            self.scroll = self.max_scroll();
            self.pin_to_bottom = false;
        } else {
            self.scroll = self.scroll.min(self.max_scroll());
        }
    }

    pub fn max_scroll(&self) -> u16 {
        self.content_height.saturating_sub(self.viewport_height)
    }
}

impl ChatSurface for ChatPanel {
    fn append_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    fn scroll_to_bottom(&mut self) {
        self.scroll = self.max_scroll();
        self.pin_to_bottom = true;
    }

    fn input_value(&self) -> &str {
        &self.input
    }

    fn set_input_value(&mut self, value: &str) {
        self.input = value.to_string();
        self.cursor = self.input.chars().count();
    }

    fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    fn focus_input(&mut self) {
        self.input_focused = true;
    }
}
