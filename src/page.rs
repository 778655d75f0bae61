//! The page behind the modal: opens the form and lists past results.

use std::sync::Arc;

use crossterm::event::{KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::Theme;
use crate::config::{GlobalAction, KeyResolver, NavAction};
use crate::form::FormRecord;
use crate::modal::FocusHost;
use crate::ui::{Component, Handled, Result, ScrollLock, contains};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageFocus {
    OpenButton,
    History,
    QuitButton,
}

const FOCUS_ORDER: [PageFocus; 3] = [PageFocus::OpenButton, PageFocus::History, PageFocus::QuitButton];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    OpenForm,
    Quit,
}

/// How one opening of the form ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome {
    Submitted(FormRecord),
    Cancelled,
    Failed(String),
}

#[derive(Debug, Default, Clone, Copy)]
struct PageAreas {
    open: Rect,
    history: Rect,
    quit: Rect,
}

pub struct Page {
    /// `None` while focus sits in an overlay.
    focus: Option<PageFocus>,
    history: Vec<FormOutcome>,
    scroll: usize,
    visible_rows: usize,
    notice: Option<String>,
    areas: Option<PageAreas>,
    scroll_lock: ScrollLock,
    resolver: Arc<KeyResolver>,
}

impl Page {
    pub const fn new(resolver: Arc<KeyResolver>, scroll_lock: ScrollLock) -> Self {
        Self {
            focus: Some(PageFocus::OpenButton),
            history: Vec::new(),
            scroll: 0,
            visible_rows: 1,
            notice: None,
            areas: None,
            scroll_lock,
            resolver,
        }
    }

    pub fn history(&self) -> &[FormOutcome] {
        &self.history
    }

    pub const fn scroll_offset(&self) -> usize {
        self.scroll
    }

    /// Append a result and keep the newest entry in view.
    pub fn record(&mut self, outcome: FormOutcome) {
        self.history.push(outcome);
        self.notice = None;
        self.scroll = self.max_scroll();
    }

    pub const fn has_focus(&self) -> bool {
        self.focus.is_some()
    }

    /// Give up focus, e.g. to a modal on top of the page.
    pub const fn blur(&mut self) {
        self.focus = None;
    }

    pub fn show_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    fn max_scroll(&self) -> usize {
        self.history.len().saturating_sub(self.visible_rows)
    }

    fn scroll_by(&mut self, delta: isize) -> Handled<PageEvent> {
        if self.scroll_lock.is_locked() {
            return Handled::Consumed;
        }
        self.scroll = self.scroll.saturating_add_signed(delta).min(self.max_scroll());
        Handled::Consumed
    }

    fn move_focus(&mut self, forward: bool) {
        let count = FOCUS_ORDER.len();
        let next = match FOCUS_ORDER.iter().position(|f| Some(*f) == self.focus) {
            Some(index) if forward => (index + 1) % count,
            Some(index) => (index + count - 1) % count,
            None => 0,
        };
        self.focus = Some(FOCUS_ORDER[next]);
    }

    fn activate(&self) -> Handled<PageEvent> {
        match self.focus {
            Some(PageFocus::OpenButton) => PageEvent::OpenForm.into(),
            Some(PageFocus::QuitButton) => PageEvent::Quit.into(),
            Some(PageFocus::History) | None => Handled::Consumed,
        }
    }

    fn history_line<'a>(outcome: &'a FormOutcome, theme: &Theme) -> Line<'a> {
        match outcome {
            FormOutcome::Submitted(record) => {
                let mut spans = vec![
                    Span::styled("✓ ", Style::default().fg(theme.success())),
                    Span::styled(record.name.as_str(), Style::default().fg(theme.text())),
                    Span::styled(format!(" <{}>", record.email), Style::default().fg(theme.subtext1())),
                    Span::styled(
                        format!(" · {}", record.position.label()),
                        Style::default().fg(theme.info()),
                    ),
                ];
                if !record.github.is_empty() {
                    spans.push(Span::styled(
                        format!(" · {}", record.github),
                        Style::default().fg(theme.overlay2()),
                    ));
                }
                Line::from(spans)
            }
            FormOutcome::Cancelled => Line::from(vec![
                Span::styled("✗ ", Style::default().fg(theme.overlay1())),
                Span::styled("cancelled", Style::default().fg(theme.overlay1())),
            ]),
            FormOutcome::Failed(message) => Line::from(vec![
                Span::styled("! ", Style::default().fg(theme.error())),
                Span::styled(message.as_str(), Style::default().fg(theme.error())),
            ]),
        }
    }

    fn button<'a>(&self, label: &'a str, target: PageFocus, theme: &Theme) -> Paragraph<'a> {
        let style = if self.focus == Some(target) {
            Style::default()
                .fg(theme.base())
                .bg(theme.primary())
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.primary())
        };
        Paragraph::new(Line::from(Span::styled(label, style))).alignment(Alignment::Center)
    }
}

impl Component for Page {
    type Output = PageEvent;

    fn handle_key(&mut self, key: KeyEvent) -> Result<Handled<Self::Output>> {
        let resolver = Arc::clone(&self.resolver);
        if resolver.matches_global(&key, GlobalAction::OpenForm) {
            return Ok(PageEvent::OpenForm.into());
        }
        if resolver.matches_nav(&key, NavAction::Next) {
            self.move_focus(true);
            return Ok(Handled::Consumed);
        }
        if resolver.matches_nav(&key, NavAction::Previous) {
            self.move_focus(false);
            return Ok(Handled::Consumed);
        }
        if resolver.matches_nav(&key, NavAction::Select) {
            return Ok(self.activate());
        }

        if self.focus == Some(PageFocus::History) {
            let page = isize::try_from(self.visible_rows.max(1)).unwrap_or(isize::MAX);
            if resolver.matches_nav(&key, NavAction::Up) {
                return Ok(self.scroll_by(-1));
            }
            if resolver.matches_nav(&key, NavAction::Down) {
                return Ok(self.scroll_by(1));
            }
            if resolver.matches_nav(&key, NavAction::PageUp) {
                return Ok(self.scroll_by(-page));
            }
            if resolver.matches_nav(&key, NavAction::PageDown) {
                return Ok(self.scroll_by(page));
            }
        }
        Ok(Handled::Ignored)
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> Result<Handled<Self::Output>> {
        let Some(areas) = self.areas else {
            return Ok(Handled::Ignored);
        };
        let (column, row) = (mouse.column, mouse.row);
        Ok(match mouse.kind {
            MouseEventKind::ScrollUp if contains(areas.history, column, row) => self.scroll_by(-1),
            MouseEventKind::ScrollDown if contains(areas.history, column, row) => self.scroll_by(1),
            MouseEventKind::Down(MouseButton::Left) => {
                if contains(areas.open, column, row) {
                    self.focus = Some(PageFocus::OpenButton);
                    PageEvent::OpenForm.into()
                } else if contains(areas.quit, column, row) {
                    self.focus = Some(PageFocus::QuitButton);
                    PageEvent::Quit.into()
                } else if contains(areas.history, column, row) {
                    self.focus = Some(PageFocus::History);
                    Handled::Consumed
                } else {
                    Handled::Ignored
                }
            }
            _ => Handled::Ignored,
        })
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        frame.render_widget(Block::default().style(Style::default().bg(theme.base())), area);

        let [header_area, intro_area, buttons_area, notice_area, history_area, footer_area] =
            Layout::vertical([
                Constraint::Length(1),
                Constraint::Length(2),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Fill(1),
                Constraint::Length(1),
            ])
            .areas(area);

        frame.render_widget(
            Paragraph::new(Span::styled(
                " applyform ",
                Style::default()
                    .fg(theme.highlight())
                    .add_modifier(Modifier::BOLD),
            )),
            header_area,
        );
        frame.render_widget(
            Paragraph::new(" Open the application form, fill it in, and the result shows up below.")
                .style(Style::default().fg(theme.subtext0())),
            intro_area,
        );

        let [_, open_area, _, quit_area, _] = Layout::horizontal([
            Constraint::Length(1),
            Constraint::Length(28),
            Constraint::Length(2),
            Constraint::Length(10),
            Constraint::Fill(1),
        ])
        .areas(buttons_area);
        frame.render_widget(
            self.button("[ Fill in the application ]", PageFocus::OpenButton, theme),
            open_area,
        );
        frame.render_widget(self.button("[ Quit ]", PageFocus::QuitButton, theme), quit_area);

        if let Some(notice) = &self.notice {
            frame.render_widget(
                Paragraph::new(format!(" {notice}")).style(Style::default().fg(theme.warning())),
                notice_area,
            );
        }

        let border_color = if self.focus == Some(PageFocus::History) {
            theme.border_focused()
        } else {
            theme.border()
        };
        let block = Block::default()
            .title(format!(" Results ({}) ", self.history.len()))
            .title_style(Style::default().fg(theme.header()))
            .borders(Borders::ALL)
            .border_type(theme.border_type)
            .border_style(Style::default().fg(border_color));
        let inner = block.inner(history_area);
        frame.render_widget(block, history_area);

        self.visible_rows = usize::from(inner.height).max(1);
        self.scroll = self.scroll.min(self.max_scroll());
        let lines: Vec<Line> = self
            .history
            .iter()
            .skip(self.scroll)
            .take(self.visible_rows)
            .map(|outcome| Self::history_line(outcome, theme))
            .collect();
        if lines.is_empty() {
            frame.render_widget(
                Paragraph::new("No results yet.").style(Style::default().fg(theme.overlay0())),
                inner,
            );
        } else {
            frame.render_widget(Paragraph::new(lines), inner);
        }

        let hints = format!(
            " {} open form · {} focus · {} select · {} quit",
            self.resolver.display_global(GlobalAction::OpenForm),
            self.resolver.display_nav(NavAction::Next),
            self.resolver.display_nav(NavAction::Select),
            self.resolver.display_global(GlobalAction::Quit),
        );
        frame.render_widget(
            Paragraph::new(hints).style(Style::default().fg(theme.overlay1())),
            footer_area,
        );

        self.areas = Some(PageAreas {
            open: open_area,
            history: inner,
            quit: quit_area,
        });
    }
}

impl FocusHost for Page {
    type Target = PageFocus;

    fn focused(&self) -> Self::Target {
        self.focus.unwrap_or(PageFocus::OpenButton)
    }

    fn restore_focus(&mut self, target: Self::Target) {
        self.focus = Some(target);
    }
}
