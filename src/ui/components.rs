mod select;
mod text_input;

pub use select::{Select, SelectEvent, SelectOption};
pub use text_input::{TextInput, TextInputEvent};
