use std::sync::Arc;

use color_eyre::eyre::eyre;
use crossterm::event::{KeyEvent, MouseEvent};
use ratatui::Terminal;
use ratatui::backend::Backend;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};

use crate::Theme;
use crate::cli::Args;
use crate::config::{AppConfig, GlobalAction, KeyResolver};
use crate::form::{FormDialog, FormEvent, FormRecord};
use crate::modal::{ControllerError, FocusHost, ModalController, ModalSignal};
use crate::page::{FormOutcome, Page, PageEvent, PageFocus};
use crate::tui::{Event, Tui};
use crate::ui::{Component, Handled, Modal, ScrollLock};

const FRAME_RATE: f64 = 30.0;
const TICK_RATE: f64 = 4.0;

/// Work queued for the main loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Quit,
    Suspend,
    Render,
    OpenForm,
    FormResolved(FormOutcome),
}

pub struct App {
    page: Page,
    dialog: Option<FormDialog>,
    controller: ModalController<PageFocus>,
    signals: UnboundedReceiver<ModalSignal<PageFocus>>,
    pending_focus: Option<PageFocus>,
    scroll_lock: ScrollLock,
    submitted: Vec<FormRecord>,
    resolver: Arc<KeyResolver>,
    theme: Theme,
    should_quit: bool,
    should_suspend: bool,
    message_tx: UnboundedSender<Message>,
    message_rx: UnboundedReceiver<Message>,
}

impl App {
    pub fn new(config: &AppConfig, resolver: Arc<KeyResolver>, theme: Theme) -> Self {
        debug!(theme = %config.theme.name, "Creating app");
        let (message_tx, message_rx) = mpsc::unbounded_channel();
        let (controller, signals) = ModalController::new();
        let scroll_lock = ScrollLock::new();
        Self {
            page: Page::new(Arc::clone(&resolver), scroll_lock.clone()),
            dialog: None,
            controller,
            signals,
            pending_focus: None,
            scroll_lock,
            submitted: Vec::new(),
            resolver,
            theme,
            should_quit: false,
            should_suspend: false,
            message_tx,
            message_rx,
        }
    }

    pub fn apply_cli_args(&mut self, args: &Args) -> color_eyre::Result<()> {
        if args.open {
            self.message_tx.send(Message::OpenForm)?;
        }
        Ok(())
    }

    /// Run until the user quits and return every submitted record.
    pub async fn run(mut self) -> color_eyre::Result<Vec<FormRecord>> {
        let mut tui = Tui::new(FRAME_RATE, TICK_RATE)?;
        tui.enter()?;

        loop {
            self.handle_events(&mut tui).await?;
            self.handle_signals(&mut *tui)?;
            self.handle_messages(&mut *tui)?;
            if self.should_suspend {
                tui.suspend()?;
                self.should_suspend = false;
                tui.enter()?;
                tui.clear()?;
            } else if self.should_quit {
                break;
            }
        }

        self.controller.shutdown();
        tui.exit()?;
        Ok(self.submitted)
    }

    async fn handle_events(&mut self, tui: &mut Tui) -> color_eyre::Result<()> {
        let Some(event) = tui.next_event().await else {
            return Ok(());
        };

        match event {
            Event::Quit => self.message_tx.send(Message::Quit)?,
            Event::Suspend => self.message_tx.send(Message::Suspend)?,
            Event::Init | Event::Render | Event::Resize(_, _) => self.message_tx.send(Message::Render)?,
            Event::Error(err) => warn!("Terminal event error: {err}"),
            Event::Tick => self.page.on_tick(),
            Event::Key(key) => self.handle_key(key)?,
            Event::Mouse(mouse) => self.handle_mouse(mouse)?,
            Event::Paste(text) => self.handle_paste(&text)?,
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> color_eyre::Result<()> {
        if let Some(dialog) = &mut self.dialog {
            if let Handled::Event(event) = dialog.handle_key(key)? {
                self.on_form_event(event)?;
            }
            return Ok(());
        }

        if self.resolver.matches_global(&key, GlobalAction::Quit) {
            return Ok(self.message_tx.send(Message::Quit)?);
        }
        if let Handled::Event(event) = self.page.handle_key(key)? {
            self.on_page_event(event)?;
        }
        Ok(())
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> color_eyre::Result<()> {
        if let Some(dialog) = &mut self.dialog {
            if let Handled::Event(event) = dialog.handle_mouse(mouse)? {
                self.on_form_event(event)?;
            }
            return Ok(());
        }
        if let Handled::Event(event) = self.page.handle_mouse(mouse)? {
            self.on_page_event(event)?;
        }
        Ok(())
    }

    /// Pasted text only goes to the form; the page has nothing to type into.
    fn handle_paste(&mut self, text: &str) -> color_eyre::Result<()> {
        if let Some(dialog) = &mut self.dialog
            && let Handled::Event(event) = dialog.handle_paste(text)?
        {
            self.on_form_event(event)?;
        }
        Ok(())
    }

    fn on_page_event(&self, event: PageEvent) -> color_eyre::Result<()> {
        let message = match event {
            PageEvent::OpenForm => Message::OpenForm,
            PageEvent::Quit => Message::Quit,
        };
        Ok(self.message_tx.send(message)?)
    }

    fn on_form_event(&self, event: FormEvent) -> color_eyre::Result<()> {
        match event {
            FormEvent::Submitted(record) => self.controller.submit(record)?,
            FormEvent::Cancelled => self.controller.cancel()?,
        }
        Ok(())
    }

    /// Open the form and hand the result back to the page once it resolves.
    fn open_form(&mut self) -> color_eyre::Result<()> {
        // A reopen can land before the frame that would restore focus
        if let Some(target) = self.pending_focus.take() {
            self.page.restore_focus(target);
        }
        let pending = match self.controller.open_form_modal(&self.page) {
            Ok(pending) => pending,
            Err(ControllerError::SessionPending(session)) => {
                self.page
                    .show_notice(format!("The form is already open (session {session})."));
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        let message_tx = self.message_tx.clone();
        tokio::spawn(async move {
            let session = pending.session();
            let outcome = match pending.await {
                Ok(Some(record)) => {
                    info!(session, "Form submitted");
                    FormOutcome::Submitted(record)
                }
                Ok(None) => {
                    info!(session, "Form cancelled");
                    FormOutcome::Cancelled
                }
                Err(err) => {
                    error!(session, "Form modal failed: {err}");
                    FormOutcome::Failed(err.to_string())
                }
            };
            let _ = message_tx.send(Message::FormResolved(outcome));
        });
        Ok(())
    }

    /// Apply controller signals in order. Closing draws a frame before focus
    /// is handed back, so the page never receives focus under the dialog.
    fn handle_signals<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> color_eyre::Result<()> {
        while let Ok(signal) = self.signals.try_recv() {
            match signal {
                ModalSignal::Opened(session) => {
                    debug!(session, "Mounting form dialog");
                    self.pending_focus = None;
                    self.page.blur();
                    self.dialog = Some(FormDialog::new(Arc::clone(&self.resolver), &self.scroll_lock));
                }
                ModalSignal::Closed(session) => {
                    debug!(session, "Unmounting form dialog");
                    self.dialog = None;
                    self.render(terminal)?;
                }
                ModalSignal::RestoreFocus(target) => self.pending_focus = Some(target),
            }
        }
        Ok(())
    }

    fn handle_messages<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> color_eyre::Result<()> {
        while let Ok(message) = self.message_rx.try_recv() {
            if message != Message::Render {
                debug!("Handling message: {:?}", message);
            }

            match message {
                Message::Quit => self.should_quit = true,
                Message::Suspend => self.should_suspend = true,
                Message::Render => self.render(terminal)?,
                Message::OpenForm => self.open_form()?,
                Message::FormResolved(outcome) => {
                    if let FormOutcome::Submitted(record) = &outcome {
                        self.submitted.push(record.clone());
                    }
                    self.page.record(outcome);
                }
            }
        }
        // Opening queues a signal that should mount the dialog in this pass.
        self.handle_signals(terminal)
    }

    fn render<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> color_eyre::Result<()> {
        let theme = self.theme;
        terminal
            .draw(|frame| {
                let area = frame.area();
                self.page.render(frame, area, &theme);
                if let Some(dialog) = &mut self.dialog {
                    dialog.render(frame, area, &theme);
                }
            })
            .map_err(|err| eyre!("Failed to draw frame: {err}"))?;

        if let Some(target) = self.pending_focus.take() {
            debug!(?target, "Restoring focus");
            self.page.restore_focus(target);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyModifiers};
    use ratatui::backend::TestBackend;

    use super::*;
    use crate::form::Position;

    fn app() -> (App, Terminal<TestBackend>) {
        let config = AppConfig::default();
        let resolver = Arc::new(KeyResolver::new(Arc::new(config.keybindings.clone())));
        let app = App::new(&config, resolver, Theme::default());
        let terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        (app, terminal)
    }

    fn press(app: &mut App, terminal: &mut Terminal<TestBackend>, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE)).unwrap();
        app.handle_messages(terminal).unwrap();
    }

    fn type_str(app: &mut App, terminal: &mut Terminal<TestBackend>, text: &str) {
        for c in text.chars() {
            press(app, terminal, KeyCode::Char(c));
        }
    }

    /// Let the spawned caller task deliver its result.
    async fn settle(app: &mut App, terminal: &mut Terminal<TestBackend>) {
        for _ in 0..10 {
            tokio::task::yield_now().await;
            app.handle_messages(terminal).unwrap();
        }
    }

    #[tokio::test]
    async fn test_open_mounts_dialog_and_locks_scroll() {
        let (mut app, mut terminal) = app();
        press(&mut app, &mut terminal, KeyCode::Char('o'));
        assert!(app.dialog.is_some());
        assert!(app.controller.is_open());
        assert!(app.scroll_lock.is_locked());
        assert!(!app.page.has_focus());
    }

    #[tokio::test]
    async fn test_escape_cancels_and_restores_focus_after_render() {
        let (mut app, mut terminal) = app();
        press(&mut app, &mut terminal, KeyCode::Tab);
        assert_eq!(app.page.focused(), PageFocus::History);
        press(&mut app, &mut terminal, KeyCode::Char('o'));

        app.handle_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)).unwrap();
        app.handle_signals(&mut terminal).unwrap();
        assert!(app.dialog.is_none());
        assert!(!app.scroll_lock.is_locked());
        // Focus is applied after the next frame, not during the closing one
        assert!(!app.page.has_focus());
        assert_eq!(app.pending_focus, Some(PageFocus::History));

        app.render(&mut terminal).unwrap();
        assert_eq!(app.page.focused(), PageFocus::History);
        assert!(app.page.has_focus());

        settle(&mut app, &mut terminal).await;
        assert_eq!(app.page.history(), &[FormOutcome::Cancelled]);
        assert!(app.submitted.is_empty());
    }

    #[tokio::test]
    async fn test_reopen_before_next_frame_keeps_focus_target() {
        let (mut app, mut terminal) = app();
        press(&mut app, &mut terminal, KeyCode::Tab);
        press(&mut app, &mut terminal, KeyCode::Char('o'));
        press(&mut app, &mut terminal, KeyCode::Esc);
        assert_eq!(app.pending_focus, Some(PageFocus::History));

        // Reopen without a frame in between
        press(&mut app, &mut terminal, KeyCode::Char('o'));
        assert!(app.dialog.is_some());
        assert_eq!(app.pending_focus, None);
        app.render(&mut terminal).unwrap();
        assert!(!app.page.has_focus());

        press(&mut app, &mut terminal, KeyCode::Esc);
        app.render(&mut terminal).unwrap();
        assert!(app.page.has_focus());
        assert_eq!(app.page.focused(), PageFocus::History);

        settle(&mut app, &mut terminal).await;
        assert_eq!(app.page.history(), &[FormOutcome::Cancelled, FormOutcome::Cancelled]);
    }

    #[tokio::test]
    async fn test_paste_fills_focused_field() {
        let (mut app, mut terminal) = app();
        app.handle_paste("ignored without a form").unwrap();
        press(&mut app, &mut terminal, KeyCode::Char('o'));
        press(&mut app, &mut terminal, KeyCode::Tab);
        app.handle_paste("Ann Lee").unwrap();
        assert_eq!(app.dialog.as_ref().map(|d| d.raw().name), Some("Ann Lee".to_string()));
    }

    #[tokio::test]
    async fn test_repeated_escape_resolves_once() {
        let (mut app, mut terminal) = app();
        press(&mut app, &mut terminal, KeyCode::Char('o'));
        press(&mut app, &mut terminal, KeyCode::Esc);
        press(&mut app, &mut terminal, KeyCode::Esc);
        settle(&mut app, &mut terminal).await;
        assert_eq!(app.page.history(), &[FormOutcome::Cancelled]);
    }

    #[tokio::test]
    async fn test_submit_records_validated_result() {
        let (mut app, mut terminal) = app();
        press(&mut app, &mut terminal, KeyCode::Enter);
        assert!(app.dialog.is_some());

        press(&mut app, &mut terminal, KeyCode::Tab);
        type_str(&mut app, &mut terminal, "Ann");
        press(&mut app, &mut terminal, KeyCode::Tab);
        type_str(&mut app, &mut terminal, "ANN@Example.com ");
        press(&mut app, &mut terminal, KeyCode::Tab);
        press(&mut app, &mut terminal, KeyCode::Left);
        press(&mut app, &mut terminal, KeyCode::Enter);
        assert!(app.dialog.is_none());

        settle(&mut app, &mut terminal).await;
        let expected = FormRecord {
            name: "Ann".to_string(),
            email: "ann@example.com".to_string(),
            position: Position::Lead,
            github: String::new(),
        };
        assert_eq!(app.submitted, vec![expected.clone()]);
        assert_eq!(app.page.history(), &[FormOutcome::Submitted(expected)]);
        assert_eq!(app.page.focused(), PageFocus::OpenButton);
    }

    #[tokio::test]
    async fn test_invalid_submit_keeps_dialog_open() {
        let (mut app, mut terminal) = app();
        press(&mut app, &mut terminal, KeyCode::Char('o'));
        press(&mut app, &mut terminal, KeyCode::Enter);
        assert!(app.dialog.is_some());
        assert!(app.controller.is_open());
        settle(&mut app, &mut terminal).await;
        assert!(app.page.history().is_empty());
    }

    #[tokio::test]
    async fn test_second_open_shows_notice() {
        let (mut app, mut terminal) = app();
        app.message_tx.send(Message::OpenForm).unwrap();
        app.message_tx.send(Message::OpenForm).unwrap();
        app.handle_messages(&mut terminal).unwrap();
        assert!(app.controller.is_open());

        press(&mut app, &mut terminal, KeyCode::Esc);
        settle(&mut app, &mut terminal).await;
        assert_eq!(app.page.history(), &[FormOutcome::Cancelled]);
    }

    #[tokio::test]
    async fn test_quit_key_is_for_the_page_only() {
        let (mut app, mut terminal) = app();
        press(&mut app, &mut terminal, KeyCode::Char('o'));
        press(&mut app, &mut terminal, KeyCode::Tab);
        press(&mut app, &mut terminal, KeyCode::Char('q'));
        assert!(!app.should_quit);
        assert_eq!(app.dialog.as_ref().map(|d| d.raw().name), Some("q".to_string()));

        press(&mut app, &mut terminal, KeyCode::Esc);
        press(&mut app, &mut terminal, KeyCode::Char('q'));
        assert!(app.should_quit);
    }
}
