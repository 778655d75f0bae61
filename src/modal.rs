//! Modal session arbitration.
//!
//! The [`ModalController`] owns the single modal session of the application.
//! Callers open the form with [`ModalController::open_form_modal`] and await
//! the returned [`PendingForm`]; the UI side receives [`ModalSignal`]s over
//! a channel and reports the user's decision back to the controller.

mod controller;
mod focus;

pub use controller::{ControllerError, ModalController, ModalSignal, PendingForm};
pub use focus::FocusHost;
