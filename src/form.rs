//! The application form: validation rules and the modal dialog.

mod dialog;
pub mod schema;

pub use dialog::{FormDialog, FormEvent};
pub use schema::{FormRecord, Position};
