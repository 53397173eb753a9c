//! Single-line message input.

use crate::text::visual_width;
use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

pub const PLACEHOLDER: &str = "Type your message...";

/// Content and cursor of the input field.
#[derive(Debug, Clone, Default)]
pub struct TextInputState {
    content: String,
    /// Cursor position (character index).
    cursor: usize,
    /// Sent messages, oldest first, for up/down recall.
    history: Vec<String>,
    /// Position in history while recalling; `None` means editing fresh input.
    history_index: Option<usize>,
    /// Fresh input saved while recalling history.
    saved_input: String,
}

impl TextInputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_index)
            .map_or(self.content.len(), |(i, _)| i)
    }

    fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    /// Insert a character at the cursor position.
    pub fn insert(&mut self, ch: char) {
        let at = self.byte_index(self.cursor);
        self.content.insert(at, ch);
        self.cursor += 1;
    }

    pub fn insert_str(&mut self, s: &str) {
        let at = self.byte_index(self.cursor);
        self.content.insert_str(at, s);
        self.cursor += s.chars().count();
    }

    /// Delete the character before the cursor.
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index(self.cursor);
            self.content.remove(at);
        }
    }

    /// Delete the character at the cursor.
    pub fn delete(&mut self) {
        if self.cursor < self.char_len() {
            let at = self.byte_index(self.cursor);
            self.content.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.char_len() {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.char_len();
    }

    /// Clear the field after a message was accepted, remembering it.
    pub fn submit(&mut self) -> String {
        let content = std::mem::take(&mut self.content);
        self.cursor = 0;
        if !content.trim().is_empty() {
            self.history.push(content.clone());
        }
        self.history_index = None;
        self.saved_input.clear();
        content
    }

    /// Recall the previous sent message.
    pub fn history_prev(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let index = match self.history_index {
            None => {
                self.saved_input = self.content.clone();
                self.history.len() - 1
            }
            Some(0) => 0,
            Some(i) => i - 1,
        };
        self.history_index = Some(index);
        self.content = self.history[index].clone();
        self.move_end();
    }

    /// Move forward through history, back to the fresh input at the end.
    pub fn history_next(&mut self) {
        let Some(index) = self.history_index else {
            return;
        };
        if index + 1 < self.history.len() {
            self.history_index = Some(index + 1);
            self.content = self.history[index + 1].clone();
        } else {
            self.history_index = None;
            self.content = std::mem::take(&mut self.saved_input);
        }
        self.move_end();
    }
}

/// Renders a [`TextInputState`] as `> text_`.
#[derive(Debug, Clone, Copy)]
pub struct TextInput<'a> {
    state: &'a TextInputState,
    focused: bool,
    theme: Theme,
}

impl<'a> TextInput<'a> {
    pub fn new(state: &'a TextInputState, theme: Theme) -> Self {
        Self {
            state,
            focused: false,
            theme,
        }
    }

    #[must_use]
    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }
}

const PROMPT: &str = "> ";

impl Widget for TextInput<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 1 || area.width < 1 {
            return;
        }

        let prompt_style = if self.focused {
            self.theme.border_focused()
        } else {
            self.theme.dim()
        };
        let mut spans = vec![Span::styled(PROMPT, prompt_style)];

        if self.state.is_empty() {
            if self.focused {
                spans.push(Span::styled("_", self.theme.base()));
            }
            spans.push(Span::styled(PLACEHOLDER, self.theme.dim()));
        } else {
            // Keep the cursor in view by dropping characters from the left.
            let available = usize::from(area.width).saturating_sub(PROMPT.len() + 1);
            let before: String = self.state.content.chars().take(self.state.cursor).collect();
            let after: String = self.state.content.chars().skip(self.state.cursor).collect();
            let mut visible_before = before.as_str();
            while visual_width(visible_before) > available {
                let mut chars = visible_before.chars();
                chars.next();
                visible_before = chars.as_str();
            }
            spans.push(Span::styled(visible_before.to_string(), self.theme.base()));
            if self.focused {
                spans.push(Span::styled(
                    if after.is_empty() { "_" } else { "|" },
                    self.theme.base(),
                ));
            }
            spans.push(Span::styled(after, self.theme.base()));
        }

        Paragraph::new(Line::from(spans))
            .style(self.theme.base())
            .render(area, buf);
    }
}
