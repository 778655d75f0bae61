use std::sync::Arc;

use crossterm::event::{KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use tracing::debug;

use crate::Theme;
use crate::config::{FormAction, KeyResolver};
use crate::form::schema::{Field, FieldErrors, FormRecord, Position, RawForm, validate};
use crate::ui::components::{Select, SelectEvent, SelectOption, TextInput, TextInputEvent};
use crate::ui::{Component, Handled, Modal, Result, ScrollLock, ScrollLockGuard, contains};

const TITLE: &str = "Application Form";
const DESCRIPTION: &str = "Please fill in the fields below. All fields are required unless marked optional.";
const DIALOG_WIDTH: u16 = 68;
const DIALOG_HEIGHT: u16 = 26;
const FIELD_HEIGHT: u16 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    Submitted(FormRecord),
    Cancelled,
}

/// Lifecycle of a mounted dialog. Field errors live inside `Open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Open,
    Submitting,
    Closed,
}

/// Where keyboard focus sits inside the dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogFocus {
    /// The dialog itself, right after it opens.
    Container,
    Field(Field),
    CancelButton,
    SubmitButton,
}

const FOCUS_RING: [DialogFocus; 6] = [
    DialogFocus::Field(Field::Name),
    DialogFocus::Field(Field::Email),
    DialogFocus::Field(Field::Position),
    DialogFocus::Field(Field::Github),
    DialogFocus::CancelButton,
    DialogFocus::SubmitButton,
];

/// What assistive tooling needs to know about the open dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogSemantics<'a> {
    pub role: &'static str,
    pub modal: bool,
    pub label: &'a str,
    pub description: &'a str,
    /// Polite announcement after a failed submit, e.g. "2 fields need attention".
    pub announcement: Option<&'a str>,
}

/// Hit areas from the last render, used for mouse handling.
#[derive(Debug, Default, Clone, Copy)]
struct HitAreas {
    content: Rect,
    fields: [Rect; 4],
    cancel: Rect,
    submit: Rect,
}

/// The application form as a modal overlay.
///
/// Holds the page scroll lock for as long as it is mounted. Once it has
/// emitted a [`FormEvent`] it is closed and ignores further input.
pub struct FormDialog {
    name: TextInput,
    email: TextInput,
    position: Select,
    github: TextInput,
    focus: DialogFocus,
    phase: Phase,
    errors: FieldErrors,
    announcement: Option<String>,
    hit_areas: Option<HitAreas>,
    resolver: Arc<KeyResolver>,
    _scroll_guard: ScrollLockGuard,
}

impl FormDialog {
    pub fn new(resolver: Arc<KeyResolver>, scroll_lock: &ScrollLock) -> Self {
        let mut options = vec![SelectOption::new("", "Select your experience")];
        options.extend(
            Position::ALL
                .into_iter()
                .map(|position| SelectOption::new(position.code(), position.label())),
        );

        Self {
            name: TextInput::new(Field::Name.label()),
            email: TextInput::new(Field::Email.label()).with_placeholder("you@example.com"),
            position: Select::new(Field::Position.label(), options),
            github: TextInput::new(Field::Github.label())
                .with_placeholder("https://github.com/your-username"),
            focus: DialogFocus::Container,
            phase: Phase::Open,
            errors: FieldErrors::default(),
            announcement: None,
            hit_areas: None,
            resolver,
            _scroll_guard: scroll_lock.acquire(),
        }
    }

    pub const fn focus(&self) -> DialogFocus {
        self.focus
    }

    pub const fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_invalid(&self, field: Field) -> bool {
        self.errors.contains(field)
    }

    pub fn error_for(&self, field: Field) -> Option<&str> {
        self.errors.get(field)
    }

    pub fn semantics(&self) -> DialogSemantics<'_> {
        DialogSemantics {
            role: "dialog",
            modal: true,
            label: TITLE,
            description: DESCRIPTION,
            announcement: self.announcement.as_deref(),
        }
    }

    /// Current field values as typed.
    pub fn raw(&self) -> RawForm {
        RawForm {
            name: self.name.value().to_string(),
            email: self.email.value().to_string(),
            position: self.position.value().to_string(),
            github: self.github.value().to_string(),
        }
    }

    fn set_focus(&mut self, focus: DialogFocus) {
        self.focus = focus;
        self.name.set_focused(focus == DialogFocus::Field(Field::Name));
        self.email.set_focused(focus == DialogFocus::Field(Field::Email));
        self.position.set_focused(focus == DialogFocus::Field(Field::Position));
        self.github.set_focused(focus == DialogFocus::Field(Field::Github));
    }

    fn move_focus(&mut self, forward: bool) {
        let count = FOCUS_RING.len();
        let next = match FOCUS_RING.iter().position(|f| *f == self.focus) {
            Some(index) if forward => (index + 1) % count,
            Some(index) => (index + count - 1) % count,
            None if forward => 0,
            None => count - 1,
        };
        self.set_focus(FOCUS_RING[next]);
    }

    fn sync_invalid_flags(&mut self) {
        self.name.set_invalid(self.errors.contains(Field::Name));
        self.email.set_invalid(self.errors.contains(Field::Email));
        self.position.set_invalid(self.errors.contains(Field::Position));
        self.github.set_invalid(self.errors.contains(Field::Github));
    }

    fn field_edited(&mut self, field: Field) {
        if self.errors.contains(field) {
            self.errors.remove(field);
            self.sync_invalid_flags();
        }
    }

    fn submit(&mut self) -> Handled<FormEvent> {
        self.phase = Phase::Submitting;
        match validate(&self.raw()) {
            Ok(record) => {
                self.phase = Phase::Closed;
                self.errors = FieldErrors::default();
                self.announcement = None;
                FormEvent::Submitted(record).into()
            }
            Err(errors) => {
                let count = errors.len();
                debug!(count, "Form submission rejected");
                self.announcement = Some(if count == 1 {
                    "1 field needs attention".to_string()
                } else {
                    format!("{count} fields need attention")
                });
                if let Some(first) = errors.first() {
                    self.set_focus(DialogFocus::Field(first));
                }
                self.errors = errors;
                self.sync_invalid_flags();
                self.phase = Phase::Open;
                Handled::Consumed
            }
        }
    }

    fn cancel(&mut self) -> Handled<FormEvent> {
        self.phase = Phase::Closed;
        FormEvent::Cancelled.into()
    }

    fn handle_field_key(&mut self, field: Field, key: KeyEvent) -> Result<Handled<FormEvent>> {
        let outcome = match field {
            Field::Name => text_outcome(self.name.handle_key(key)?),
            Field::Email => text_outcome(self.email.handle_key(key)?),
            Field::Github => text_outcome(self.github.handle_key(key)?),
            Field::Position => match self.position.handle_key(key)? {
                Handled::Event(SelectEvent::Changed) => Outcome::Edited,
                Handled::Event(SelectEvent::Submitted) => Outcome::Submit,
                Handled::Consumed => Outcome::Nothing,
                Handled::Ignored => Outcome::Unhandled,
            },
        };

        Ok(match outcome {
            Outcome::Edited => {
                self.field_edited(field);
                Handled::Consumed
            }
            Outcome::Submit => self.submit(),
            Outcome::Nothing => Handled::Consumed,
            Outcome::Unhandled if self.resolver.matches_form(&key, FormAction::Submit) => self.submit(),
            Outcome::Unhandled => Handled::Consumed,
        })
    }

    fn render_buttons(&self, frame: &mut Frame, area: Rect, theme: &Theme) -> (Rect, Rect) {
        let [_, cancel_area, _, submit_area] = Layout::horizontal([
            Constraint::Fill(1),
            Constraint::Length(12),
            Constraint::Length(2),
            Constraint::Length(12),
        ])
        .areas(area);

        let button = |label: &str, focused: bool, accent: Color| {
            let style = if focused {
                Style::default()
                    .fg(theme.base())
                    .bg(accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(accent)
            };
            Paragraph::new(Line::from(Span::styled(format!("[ {label} ]"), style)))
                .alignment(Alignment::Center)
        };

        frame.render_widget(
            button("Cancel", self.focus == DialogFocus::CancelButton, theme.overlay2()),
            cancel_area,
        );
        frame.render_widget(
            button("Submit", self.focus == DialogFocus::SubmitButton, theme.success()),
            submit_area,
        );
        (cancel_area, submit_area)
    }
}

enum Outcome {
    Edited,
    Submit,
    Nothing,
    Unhandled,
}

fn text_outcome(handled: Handled<TextInputEvent>) -> Outcome {
    match handled {
        Handled::Event(TextInputEvent::Changed) => Outcome::Edited,
        Handled::Event(TextInputEvent::Submitted) => Outcome::Submit,
        Handled::Consumed => Outcome::Nothing,
        Handled::Ignored => Outcome::Unhandled,
    }
}

impl Modal for FormDialog {
    type Msg = FormEvent;

    fn handle_key(&mut self, key: KeyEvent) -> Result<Handled<Self::Msg>> {
        if self.phase == Phase::Closed {
            return Ok(Handled::Consumed);
        }
        if self.resolver.matches_form(&key, FormAction::Cancel) {
            return Ok(self.cancel());
        }
        if self.resolver.matches_form(&key, FormAction::NextField) {
            self.move_focus(true);
            return Ok(Handled::Consumed);
        }
        if self.resolver.matches_form(&key, FormAction::PreviousField) {
            self.move_focus(false);
            return Ok(Handled::Consumed);
        }

        let submit_key = self.resolver.matches_form(&key, FormAction::Submit);
        match self.focus {
            DialogFocus::Field(field) => self.handle_field_key(field, key),
            DialogFocus::CancelButton if submit_key => Ok(self.cancel()),
            DialogFocus::SubmitButton | DialogFocus::Container if submit_key => Ok(self.submit()),
            _ => Ok(Handled::Consumed),
        }
    }

    fn handle_paste(&mut self, text: &str) -> Result<Handled<Self::Msg>> {
        if self.phase == Phase::Closed {
            return Ok(Handled::Consumed);
        }
        let DialogFocus::Field(field) = self.focus else {
            return Ok(Handled::Consumed);
        };
        let pasted = match field {
            Field::Name => self.name.insert_str(text),
            Field::Email => self.email.insert_str(text),
            Field::Github => self.github.insert_str(text),
            Field::Position => Handled::Ignored,
        };
        if pasted == Handled::Event(TextInputEvent::Changed) {
            self.field_edited(field);
        }
        Ok(Handled::Consumed)
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> Result<Handled<Self::Msg>> {
        if self.phase == Phase::Closed || mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return Ok(Handled::Consumed);
        }
        let Some(areas) = self.hit_areas else {
            return Ok(Handled::Consumed);
        };
        let (column, row) = (mouse.column, mouse.row);

        if !contains(areas.content, column, row) {
            debug!("Overlay clicked outside the form");
            return Ok(self.cancel());
        }
        if contains(areas.cancel, column, row) {
            return Ok(self.cancel());
        }
        if contains(areas.submit, column, row) {
            self.set_focus(DialogFocus::SubmitButton);
            return Ok(self.submit());
        }
        if let Some(index) = areas.fields.iter().position(|area| contains(*area, column, row)) {
            self.set_focus(DialogFocus::Field(Field::ALL[index]));
        }
        Ok(Handled::Consumed)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        // Dim the page underneath
        frame
            .buffer_mut()
            .set_style(area, Style::default().add_modifier(Modifier::DIM));

        let content = area.centered(
            Constraint::Length(DIALOG_WIDTH.min(area.width)),
            Constraint::Length(DIALOG_HEIGHT.min(area.height)),
        );
        frame.render_widget(Clear, content);

        let border_color = if self.focus == DialogFocus::Container {
            theme.highlight()
        } else {
            theme.border_focused()
        };
        let hints = format!(
            " {} next · {} submit · {} cancel ",
            self.resolver.display_form(FormAction::NextField),
            self.resolver.display_form(FormAction::Submit),
            self.resolver.display_form(FormAction::Cancel),
        );
        let block = Block::default()
            .title(format!(" {TITLE} "))
            .title_style(
                Style::default()
                    .fg(theme.highlight())
                    .add_modifier(Modifier::BOLD),
            )
            .title_bottom(Line::from(Span::styled(hints, Style::default().fg(theme.overlay1()))))
            .borders(Borders::ALL)
            .border_type(theme.border_type)
            .border_style(Style::default().fg(border_color))
            .style(Style::default().bg(theme.base()));
        let inner = block.inner(content);
        frame.render_widget(block, content);

        let [description_area, _, fields_area, _, buttons_area, announcement_area] =
            Layout::vertical([
                Constraint::Length(2),
                Constraint::Length(1),
                Constraint::Length(4 * (FIELD_HEIGHT + 1)),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .areas(inner.inner(Margin::new(1, 0)));

        frame.render_widget(
            Paragraph::new(DESCRIPTION)
                .style(Style::default().fg(theme.subtext0()))
                .wrap(Wrap { trim: true }),
            description_area,
        );

        let rows = Layout::vertical([Constraint::Length(FIELD_HEIGHT + 1); 4]).split(fields_area);
        let mut fields = [Rect::default(); 4];
        for (index, field) in Field::ALL.into_iter().enumerate() {
            let [input_area, error_area] =
                Layout::vertical([Constraint::Length(FIELD_HEIGHT), Constraint::Length(1)])
                    .areas(rows[index]);
            match field {
                Field::Name => self.name.render(frame, input_area, theme),
                Field::Email => self.email.render(frame, input_area, theme),
                Field::Position => self.position.render(frame, input_area, theme),
                Field::Github => self.github.render(frame, input_area, theme),
            }
            if let Some(message) = self.errors.get(field) {
                frame.render_widget(
                    Paragraph::new(Line::from(vec![
                        Span::styled("  ✗ ", Style::default().fg(theme.error())),
                        Span::styled(message.to_string(), Style::default().fg(theme.error())),
                    ])),
                    error_area,
                );
            }
            fields[index] = input_area;
        }

        let (cancel, submit) = self.render_buttons(frame, buttons_area, theme);

        if let Some(announcement) = &self.announcement {
            frame.render_widget(
                Paragraph::new(announcement.as_str())
                    .style(
                        Style::default()
                            .fg(theme.warning())
                            .add_modifier(Modifier::ITALIC),
                    )
                    .alignment(Alignment::Center),
                announcement_area,
            );
        }

        self.hit_areas = Some(HitAreas {
            content,
            fields,
            cancel,
            submit,
        });
    }

    fn title(&self) -> Option<&str> {
        Some(TITLE)
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyModifiers};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;

    fn dialog(lock: &ScrollLock) -> FormDialog {
        FormDialog::new(Arc::new(KeyResolver::default()), lock)
    }

    fn press(dialog: &mut FormDialog, code: KeyCode) -> Handled<FormEvent> {
        dialog.handle_key(KeyEvent::new(code, KeyModifiers::NONE)).unwrap()
    }

    fn type_str(dialog: &mut FormDialog, text: &str) {
        for c in text.chars() {
            press(dialog, KeyCode::Char(c));
        }
    }

    fn click(dialog: &mut FormDialog, column: u16, row: u16) -> Handled<FormEvent> {
        dialog
            .handle_mouse(MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Left),
                column,
                row,
                modifiers: KeyModifiers::NONE,
            })
            .unwrap()
    }

    fn draw(dialog: &mut FormDialog) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        let theme = Theme::default();
        terminal
            .draw(|frame| dialog.render(frame, frame.area(), &theme))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn fill_valid(dialog: &mut FormDialog) {
        press(dialog, KeyCode::Tab);
        type_str(dialog, "  Ann Lee ");
        press(dialog, KeyCode::Tab);
        type_str(dialog, " Foo@Bar.com ");
        press(dialog, KeyCode::Tab);
        press(dialog, KeyCode::Right);
        press(dialog, KeyCode::Tab);
        type_str(dialog, "https://github.com/u");
    }

    #[test]
    fn test_opens_on_container_and_holds_scroll_lock() {
        let lock = ScrollLock::new();
        let dialog = dialog(&lock);
        assert_eq!(dialog.focus(), DialogFocus::Container);
        assert_eq!(dialog.phase(), Phase::Open);
        assert!(lock.is_locked());
        drop(dialog);
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_valid_submit_emits_normalized_record() {
        let lock = ScrollLock::new();
        let mut dialog = dialog(&lock);
        fill_valid(&mut dialog);

        let result = press(&mut dialog, KeyCode::Enter);
        assert_eq!(
            result,
            Handled::Event(FormEvent::Submitted(FormRecord {
                name: "Ann Lee".to_string(),
                email: "foo@bar.com".to_string(),
                position: Position::Junior,
                github: "https://github.com/u".to_string(),
            }))
        );
        assert_eq!(dialog.phase(), Phase::Closed);
    }

    #[test]
    fn test_invalid_submit_stays_open_with_errors() {
        let lock = ScrollLock::new();
        let mut dialog = dialog(&lock);
        press(&mut dialog, KeyCode::Tab);
        type_str(&mut dialog, "Ann");
        press(&mut dialog, KeyCode::Tab);
        type_str(&mut dialog, "not-an-email");

        assert_eq!(press(&mut dialog, KeyCode::Enter), Handled::Consumed);
        assert_eq!(dialog.phase(), Phase::Open);
        assert_eq!(dialog.focus(), DialogFocus::Field(Field::Email));
        assert!(dialog.is_invalid(Field::Email));
        assert!(dialog.is_invalid(Field::Position));
        assert!(!dialog.is_invalid(Field::Name));
        assert_eq!(dialog.error_for(Field::Email), Some("Please enter a valid email address."));
        assert_eq!(dialog.semantics().announcement, Some("2 fields need attention"));
    }

    #[test]
    fn test_empty_submit_from_container() {
        let lock = ScrollLock::new();
        let mut dialog = dialog(&lock);
        assert_eq!(press(&mut dialog, KeyCode::Enter), Handled::Consumed);
        assert_eq!(dialog.focus(), DialogFocus::Field(Field::Name));
        assert_eq!(dialog.semantics().announcement, Some("3 fields need attention"));
    }

    #[test]
    fn test_editing_clears_field_error() {
        let lock = ScrollLock::new();
        let mut dialog = dialog(&lock);
        press(&mut dialog, KeyCode::Enter);
        assert!(dialog.is_invalid(Field::Name));
        type_str(&mut dialog, "A");
        assert!(!dialog.is_invalid(Field::Name));
        assert!(dialog.is_invalid(Field::Email));
    }

    #[test]
    fn test_paste_goes_to_focused_field_and_clears_its_error() {
        let lock = ScrollLock::new();
        let mut dialog = dialog(&lock);
        dialog.handle_paste("ignored on the container").unwrap();
        assert_eq!(dialog.raw(), RawForm::default());

        press(&mut dialog, KeyCode::Enter);
        press(&mut dialog, KeyCode::Tab);
        assert!(dialog.is_invalid(Field::Email));
        assert_eq!(dialog.handle_paste("ann@example.com").unwrap(), Handled::Consumed);
        assert_eq!(dialog.raw().email, "ann@example.com");
        assert!(!dialog.is_invalid(Field::Email));
        assert!(dialog.is_invalid(Field::Name));

        press(&mut dialog, KeyCode::Tab);
        dialog.handle_paste("lead").unwrap();
        assert_eq!(dialog.raw().position, "");
    }

    #[test]
    fn test_escape_cancels_once() {
        let lock = ScrollLock::new();
        let mut dialog = dialog(&lock);
        type_str(&mut dialog, "ignored");
        assert_eq!(press(&mut dialog, KeyCode::Esc), Handled::Event(FormEvent::Cancelled));
        assert_eq!(press(&mut dialog, KeyCode::Esc), Handled::Consumed);
        assert_eq!(press(&mut dialog, KeyCode::Enter), Handled::Consumed);
        assert_eq!(dialog.phase(), Phase::Closed);
    }

    #[test]
    fn test_cancel_button() {
        let lock = ScrollLock::new();
        let mut dialog = dialog(&lock);
        press(&mut dialog, KeyCode::BackTab);
        assert_eq!(dialog.focus(), DialogFocus::SubmitButton);
        press(&mut dialog, KeyCode::Up);
        assert_eq!(dialog.focus(), DialogFocus::CancelButton);
        assert_eq!(press(&mut dialog, KeyCode::Enter), Handled::Event(FormEvent::Cancelled));
    }

    #[test]
    fn test_focus_ring_wraps() {
        let lock = ScrollLock::new();
        let mut dialog = dialog(&lock);
        for _ in 0..FOCUS_RING.len() {
            press(&mut dialog, KeyCode::Tab);
        }
        assert_eq!(dialog.focus(), DialogFocus::SubmitButton);
        press(&mut dialog, KeyCode::Down);
        assert_eq!(dialog.focus(), DialogFocus::Field(Field::Name));
    }

    #[test]
    fn test_overlay_click_cancels_once() {
        let lock = ScrollLock::new();
        let mut dialog = dialog(&lock);
        draw(&mut dialog);
        assert_eq!(click(&mut dialog, 0, 0), Handled::Event(FormEvent::Cancelled));
        assert_eq!(click(&mut dialog, 0, 0), Handled::Consumed);
    }

    #[test]
    fn test_click_inside_focuses_field() {
        let lock = ScrollLock::new();
        let mut dialog = dialog(&lock);
        draw(&mut dialog);
        let areas = dialog.hit_areas.unwrap();
        let email = areas.fields[1];
        assert_eq!(click(&mut dialog, email.x + 2, email.y + 1), Handled::Consumed);
        assert_eq!(dialog.focus(), DialogFocus::Field(Field::Email));

        let cancel = areas.cancel;
        assert_eq!(click(&mut dialog, cancel.x, cancel.y), Handled::Event(FormEvent::Cancelled));
    }

    #[test]
    fn test_render_shows_labels_and_errors() {
        let lock = ScrollLock::new();
        let mut dialog = dialog(&lock);
        press(&mut dialog, KeyCode::Enter);
        let screen = draw(&mut dialog);
        assert!(screen.contains("Application Form"));
        assert!(screen.contains("Name / nickname"));
        assert!(screen.contains("Please enter your name."));
        assert!(screen.contains("3 fields need attention"));
    }

    #[test]
    fn test_semantics() {
        let lock = ScrollLock::new();
        let dialog = dialog(&lock);
        let semantics = dialog.semantics();
        assert_eq!(semantics.role, "dialog");
        assert!(semantics.modal);
        assert_eq!(semantics.label, TITLE);
        assert_eq!(semantics.announcement, None);
        assert_eq!(dialog.title(), Some(TITLE));
    }
}
