use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::form::FormRecord;
use crate::modal::FocusHost;

pub type SessionId = u64;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControllerError {
    #[error("a form modal is already open (session {0})")]
    SessionPending(SessionId),
    #[error("no form modal is open")]
    NoActiveSession,
    #[error("the modal host is gone")]
    Detached,
    #[error("the form modal was dropped before it resolved")]
    Dropped,
}

/// Notifications from the controller to the UI, in the order they must be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalSignal<F> {
    /// Mount the dialog for this session.
    Opened(SessionId),
    /// Unmount the dialog for this session.
    Closed(SessionId),
    /// Move focus back once the closing frame has been drawn.
    RestoreFocus(F),
}

struct Session<F> {
    id: SessionId,
    responder: oneshot::Sender<Option<FormRecord>>,
    restore: F,
}

struct State<F> {
    session: Option<Session<F>>,
    next_id: SessionId,
}

/// Arbitrates the single form modal of the application.
///
/// Cloning yields another handle to the same session state.
pub struct ModalController<F> {
    state: Arc<Mutex<State<F>>>,
    signals: UnboundedSender<ModalSignal<F>>,
}

impl<F> Clone for ModalController<F> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            signals: self.signals.clone(),
        }
    }
}

impl<F: Clone + Send + 'static> ModalController<F> {
    /// Create a controller and the receiving end the UI listens on.
    pub fn new() -> (Self, UnboundedReceiver<ModalSignal<F>>) {
        let (signals, receiver) = mpsc::unbounded_channel();
        let controller = Self {
            state: Arc::new(Mutex::new(State {
                session: None,
                next_id: 1,
            })),
            signals,
        };
        (controller, receiver)
    }

    /// Open the form modal and return a handle that resolves with the result.
    ///
    /// Only one session may be pending; a second call is rejected with
    /// [`ControllerError::SessionPending`] and leaves the first untouched.
    pub fn open_form_modal<H>(&self, host: &H) -> Result<PendingForm, ControllerError>
    where
        H: FocusHost<Target = F>,
    {
        let mut state = self.lock();
        if let Some(session) = &state.session {
            warn!(session = session.id, "Rejected form modal request, a session is pending");
            return Err(ControllerError::SessionPending(session.id));
        }

        let id = state.next_id;
        self.signals
            .send(ModalSignal::Opened(id))
            .map_err(|_| ControllerError::Detached)?;

        let (responder, receiver) = oneshot::channel();
        state.next_id += 1;
        state.session = Some(Session {
            id,
            responder,
            restore: host.focused(),
        });
        info!(session = id, "Form modal opened");

        Ok(PendingForm {
            session: id,
            receiver,
        })
    }

    /// Resolve the pending session with a validated record.
    pub fn submit(&self, record: FormRecord) -> Result<(), ControllerError> {
        self.resolve(Some(record))
    }

    /// Resolve the pending session without a result.
    pub fn cancel(&self) -> Result<(), ControllerError> {
        self.resolve(None)
    }

    pub fn is_open(&self) -> bool {
        self.lock().session.is_some()
    }

    /// Tear down: a pending session resolves without a result.
    pub fn shutdown(&self) {
        let Some(session) = self.lock().session.take() else {
            return;
        };
        info!(session = session.id, "Form modal closed on shutdown");
        let _ = session.responder.send(None);
        let _ = self.signals.send(ModalSignal::Closed(session.id));
    }

    fn resolve(&self, result: Option<FormRecord>) -> Result<(), ControllerError> {
        // The lock is released before signalling so the UI may re-enter.
        let session = self
            .lock()
            .session
            .take()
            .ok_or(ControllerError::NoActiveSession)?;

        let outcome = if result.is_some() { "submitted" } else { "cancelled" };
        if session.responder.send(result).is_err() {
            debug!(session = session.id, "Caller stopped waiting for the form result");
        }
        info!(session = session.id, outcome, "Form modal closed");

        self.signals
            .send(ModalSignal::Closed(session.id))
            .map_err(|_| ControllerError::Detached)?;
        self.signals
            .send(ModalSignal::RestoreFocus(session.restore))
            .map_err(|_| ControllerError::Detached)
    }

    fn lock(&self) -> MutexGuard<'_, State<F>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Awaitable result of [`ModalController::open_form_modal`].
///
/// Yields `Some(record)` on submit and `None` on cancel, exactly once.
#[derive(Debug)]
#[must_use = "the form result is lost unless the pending form is awaited"]
pub struct PendingForm {
    session: SessionId,
    receiver: oneshot::Receiver<Option<FormRecord>>,
}

impl PendingForm {
    pub const fn session(&self) -> SessionId {
        self.session
    }
}

impl Future for PendingForm {
    type Output = Result<Option<FormRecord>, ControllerError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|result| result.map_err(|_| ControllerError::Dropped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::Position;

    #[derive(Default)]
    struct FakeHost {
        focus: &'static str,
    }

    impl FocusHost for FakeHost {
        type Target = &'static str;

        fn focused(&self) -> Self::Target {
            self.focus
        }

        fn restore_focus(&mut self, target: Self::Target) {
            self.focus = target;
        }
    }

    fn record() -> FormRecord {
        FormRecord {
            name: "Ann".to_string(),
            email: "ann@example.com".to_string(),
            position: Position::Junior,
            github: String::new(),
        }
    }

    fn drain<F>(receiver: &mut UnboundedReceiver<ModalSignal<F>>) -> Vec<ModalSignal<F>> {
        let mut signals = Vec::new();
        while let Ok(signal) = receiver.try_recv() {
            signals.push(signal);
        }
        signals
    }

    #[tokio::test]
    async fn test_cancel_resolves_with_none() {
        let (controller, mut signals) = ModalController::new();
        let host = FakeHost { focus: "open-button" };

        let pending = controller.open_form_modal(&host).unwrap();
        assert!(controller.is_open());
        controller.cancel().unwrap();

        assert_eq!(pending.await, Ok(None));
        assert!(!controller.is_open());
        assert_eq!(
            drain(&mut signals),
            vec![
                ModalSignal::Opened(1),
                ModalSignal::Closed(1),
                ModalSignal::RestoreFocus("open-button"),
            ]
        );
    }

    #[tokio::test]
    async fn test_submit_resolves_with_record() {
        let (controller, _signals) = ModalController::new();
        let pending = controller.open_form_modal(&FakeHost::default()).unwrap();
        controller.submit(record()).unwrap();
        assert_eq!(pending.await, Ok(Some(record())));
    }

    #[tokio::test]
    async fn test_repeated_cancel_resolves_once() {
        let (controller, mut signals) = ModalController::new();
        let pending = controller.open_form_modal(&FakeHost::default()).unwrap();

        controller.cancel().unwrap();
        assert_eq!(controller.cancel(), Err(ControllerError::NoActiveSession));
        assert_eq!(controller.submit(record()), Err(ControllerError::NoActiveSession));

        assert_eq!(pending.await, Ok(None));
        let closed = drain(&mut signals)
            .into_iter()
            .filter(|signal| matches!(signal, ModalSignal::Closed(_)))
            .count();
        assert_eq!(closed, 1);
    }

    #[tokio::test]
    async fn test_second_open_is_rejected() {
        let (controller, _signals) = ModalController::new();
        let host = FakeHost::default();
        let first = controller.open_form_modal(&host).unwrap();

        let second = controller.open_form_modal(&host);
        assert_eq!(second.unwrap_err(), ControllerError::SessionPending(first.session()));
        assert!(controller.is_open());

        controller.submit(record()).unwrap();
        assert_eq!(first.await, Ok(Some(record())));
    }

    #[tokio::test]
    async fn test_sessions_get_fresh_ids() {
        let (controller, _signals) = ModalController::new();
        let host = FakeHost::default();
        let first = controller.open_form_modal(&host).unwrap();
        controller.cancel().unwrap();
        let second = controller.open_form_modal(&host).unwrap();
        assert!(second.session() > first.session());
        controller.cancel().unwrap();
        assert_eq!(second.await, Ok(None));
    }

    #[tokio::test]
    async fn test_focus_target_is_captured_at_open() {
        let (controller, mut signals) = ModalController::new();
        let mut host = FakeHost { focus: "history" };
        let _pending = controller.open_form_modal(&host).unwrap();

        host.restore_focus("dialog");
        controller.cancel().unwrap();

        let restore = drain(&mut signals).into_iter().find_map(|signal| match signal {
            ModalSignal::RestoreFocus(target) => Some(target),
            _ => None,
        });
        assert_eq!(restore, Some("history"));
    }

    #[tokio::test]
    async fn test_open_without_ui_is_detached() {
        let (controller, signals) = ModalController::<&'static str>::new();
        drop(signals);
        let result = controller.open_form_modal(&FakeHost::default());
        assert_eq!(result.unwrap_err(), ControllerError::Detached);
        assert!(!controller.is_open());
    }

    #[tokio::test]
    async fn test_shutdown_resolves_pending_with_none() {
        let (controller, _signals) = ModalController::new();
        let pending = controller.open_form_modal(&FakeHost::default()).unwrap();
        controller.shutdown();
        assert_eq!(pending.await, Ok(None));
        assert!(!controller.is_open());
        controller.shutdown();
    }

    #[tokio::test]
    async fn test_dropped_controller_fails_pending() {
        let (controller, _signals) = ModalController::new();
        let pending = controller.open_form_modal(&FakeHost::default()).unwrap();
        drop(controller);
        assert_eq!(pending.await, Err(ControllerError::Dropped));
    }

    #[tokio::test]
    async fn test_result_is_delivered_to_spawned_caller() {
        let (controller, _signals) = ModalController::new();
        let pending = controller.open_form_modal(&FakeHost::default()).unwrap();
        let caller = tokio::spawn(pending);
        tokio::task::yield_now().await;
        controller.submit(record()).unwrap();
        assert_eq!(caller.await.unwrap(), Ok(Some(record())));
    }
}
