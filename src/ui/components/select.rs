use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::Theme;
use crate::ui::{Component, Handled, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectEvent {
    Changed,
    Submitted,
}

/// One choice in a [`Select`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Inline drop-down replacement that cycles through its options in place.
///
/// The first option is usually a placeholder with an empty value.
pub struct Select {
    label: String,
    options: Vec<SelectOption>,
    selected: usize,
    focused: bool,
    invalid: bool,
}

impl Select {
    pub fn new(label: impl Into<String>, options: Vec<SelectOption>) -> Self {
        Self {
            label: label.into(),
            options,
            selected: 0,
            focused: false,
            invalid: false,
        }
    }

    /// Value of the selected option, empty when there are no options.
    pub fn value(&self) -> &str {
        self.options
            .get(self.selected)
            .map_or("", |option| option.value.as_str())
    }

    pub const fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    pub const fn set_invalid(&mut self, invalid: bool) {
        self.invalid = invalid;
    }

    fn cycle(&mut self, forward: bool) -> Handled<SelectEvent> {
        let count = self.options.len();
        if count < 2 {
            return Handled::Consumed;
        }
        self.selected = if forward {
            (self.selected + 1) % count
        } else {
            (self.selected + count - 1) % count
        };
        SelectEvent::Changed.into()
    }
}

impl Component for Select {
    type Output = SelectEvent;

    fn handle_key(&mut self, key: KeyEvent) -> Result<Handled<Self::Output>> {
        Ok(match key.code {
            KeyCode::Right | KeyCode::Char(' ' | 'l') => self.cycle(true),
            KeyCode::Left | KeyCode::Char('h') => self.cycle(false),
            KeyCode::Enter => SelectEvent::Submitted.into(),
            _ => Handled::Ignored,
        })
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let label = self
            .options
            .get(self.selected)
            .map_or("", |option| option.label.as_str());
        let value_style = if self.value().is_empty() {
            Style::default().fg(theme.overlay0())
        } else {
            Style::default().fg(theme.text())
        };
        let arrow_style = Style::default().fg(if self.focused {
            theme.peach()
        } else {
            theme.overlay1()
        });

        let line = Line::from(vec![
            Span::styled("◂ ", arrow_style),
            Span::styled(label.to_string(), value_style),
            Span::styled(" ▸", arrow_style),
        ]);

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
