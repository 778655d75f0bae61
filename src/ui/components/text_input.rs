use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::Theme;
use crate::ui::{Component, Handled, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextInputEvent {
    Changed,
    Submitted,
}

/// Single-line bordered text field.
///
/// The cursor is a character index, so multi-byte input edits cleanly.
pub struct TextInput {
    label: String,
    value: String,
    cursor: usize,
    placeholder: Option<String>,
    focused: bool,
    invalid: bool,
}

impl TextInput {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: String::new(),
            cursor: 0,
            placeholder: None,
            focused: false,
            invalid: false,
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Insert pasted text at the cursor. Line breaks and other control
    /// characters are dropped, the field is single-line.
    pub fn insert_str(&mut self, text: &str) -> Handled<TextInputEvent> {
        let before = self.cursor;
        for c in text.chars().filter(|c| !c.is_control()) {
            self.insert_char(c);
        }
        if self.cursor == before {
            Handled::Consumed
        } else {
            TextInputEvent::Changed.into()
        }
    }

    pub const fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    pub const fn set_invalid(&mut self, invalid: bool) {
        self.invalid = invalid;
    }

    fn len(&self) -> usize {
        self.value.chars().count()
    }

    fn byte_offset(&self, index: usize) -> usize {
        self.value
            .char_indices()
            .nth(index)
            .map_or(self.value.len(), |(offset, _)| offset)
    }

    fn insert_char(&mut self, c: char) {
        let offset = self.byte_offset(self.cursor);
        self.value.insert(offset, c);
        self.cursor += 1;
    }

    fn delete_char_before_cursor(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        let offset = self.byte_offset(self.cursor);
        self.value.remove(offset);
        true
    }

    fn delete_char_at_cursor(&mut self) -> bool {
        if self.cursor >= self.len() {
            return false;
        }
        let offset = self.byte_offset(self.cursor);
        self.value.remove(offset);
        true
    }

    fn delete_word_before_cursor(&mut self) -> bool {
        let chars: Vec<char> = self.value.chars().collect();
        let mut pos = self.cursor;
        // Skip trailing spaces, then the word itself
        while pos > 0 && chars[pos - 1] == ' ' {
            pos -= 1;
        }
        while pos > 0 && chars[pos - 1] != ' ' {
            pos -= 1;
        }
        if pos == self.cursor {
            return false;
        }
        let start = self.byte_offset(pos);
        let end = self.byte_offset(self.cursor);
        self.value.drain(start..end);
        self.cursor = pos;
        true
    }

    fn clear_line(&mut self) -> bool {
        let changed = !self.value.is_empty();
        self.value.clear();
        self.cursor = 0;
        changed
    }

    fn edited(changed: bool) -> Handled<TextInputEvent> {
        if changed {
            TextInputEvent::Changed.into()
        } else {
            Handled::Consumed
        }
    }
}

impl Component for TextInput {
    type Output = TextInputEvent;

    fn handle_key(&mut self, key: KeyEvent) -> Result<Handled<Self::Output>> {
        Ok(match (key.code, key.modifiers) {
            (KeyCode::Enter, _) => TextInputEvent::Submitted.into(),

            // Delete
            (KeyCode::Backspace, KeyModifiers::ALT) | (KeyCode::Char('w'), KeyModifiers::CONTROL) => {
                Self::edited(self.delete_word_before_cursor())
            }
            (KeyCode::Backspace, _) => Self::edited(self.delete_char_before_cursor()),
            (KeyCode::Delete, _) => Self::edited(self.delete_char_at_cursor()),
            (KeyCode::Char('u'), KeyModifiers::CONTROL) => Self::edited(self.clear_line()),

            // Navigation
            (KeyCode::Left, _) => {
                self.cursor = self.cursor.saturating_sub(1);
                Handled::Consumed
            }
            (KeyCode::Right, _) => {
                self.cursor = (self.cursor + 1).min(self.len());
                Handled::Consumed
            }
            (KeyCode::Home, _) | (KeyCode::Char('a'), KeyModifiers::CONTROL) => {
                self.cursor = 0;
                Handled::Consumed
            }
            (KeyCode::End, _) | (KeyCode::Char('e'), KeyModifiers::CONTROL) => {
                self.cursor = self.len();
                Handled::Consumed
            }

            // Character input
            (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) => {
                self.insert_char(c);
                TextInputEvent::Changed.into()
            }

            _ => Handled::Ignored,
        })
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let input_style = Style::default().fg(theme.text());
        let cursor_style = Style::default()
            .fg(theme.base())
            .bg(theme.text())
            .add_modifier(Modifier::BOLD);
        let placeholder_style = Style::default().fg(theme.overlay0());

        let line = match (&self.placeholder, self.value.is_empty()) {
            (Some(placeholder), true) if self.focused => Line::from(vec![
                Span::styled(" ", cursor_style),
                Span::styled(placeholder.clone(), placeholder_style),
            ]),
            (Some(placeholder), true) => Line::from(Span::styled(placeholder.clone(), placeholder_style)),
            _ if self.focused => {
                let before: String = self.value.chars().take(self.cursor).collect();
                let cursor_char = self.value.chars().nth(self.cursor).unwrap_or(' ');
                let after: String = self.value.chars().skip(self.cursor + 1).collect();
                Line::from(vec![
                    Span::styled(before, input_style),
                    Span::styled(cursor_char.to_string(), cursor_style),
                    Span::styled(after, input_style),
                ])
            }
            _ => Line::from(Span::styled(self.value.clone(), input_style)),
        };

        let border_color = match (self.invalid, self.focused) {
            (true, _) => theme.error(),
            (false, true) => theme.border_focused(),
            (false, false) => theme.border(),
        };
        let title_style = if self.focused {
            Style::default()
                .fg(theme.highlight())
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.subtext1())
        };

        let block = Block::default()
            .title(format!(" {} ", self.label))
            .title_style(title_style)
            .borders(Borders::ALL)
            .border_type(theme.border_type)
            .border_style(Style::default().fg(border_color));

        frame.render_widget(Paragraph::new(line).block(block), area);
    }
}
