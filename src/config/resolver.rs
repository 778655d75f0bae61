use std::sync::Arc;

use crossterm::event::KeyEvent;

use crate::config::actions::{FormAction, GlobalAction, NavAction};
use crate::config::keybindings::KeybindingsConfig;

/// Maps key events to configured actions.
pub struct KeyResolver {
    pub keybindings: Arc<KeybindingsConfig>,
}

impl KeyResolver {
    pub const fn new(keybindings: Arc<KeybindingsConfig>) -> Self {
        Self { keybindings }
    }

    // Global actions
    pub fn matches_global(&self, event: &KeyEvent, action: GlobalAction) -> bool {
        let kb = &self.keybindings.global;
        match action {
            GlobalAction::Quit => kb.quit.matches(event),
            GlobalAction::OpenForm => kb.open_form.matches(event),
        }
    }

    pub fn display_global(&self, action: GlobalAction) -> String {
        let kb = &self.keybindings.global;
        match action {
            GlobalAction::Quit => kb.quit.display(),
            GlobalAction::OpenForm => kb.open_form.display(),
        }
    }

    // Navigation actions
    pub fn matches_nav(&self, event: &KeyEvent, action: NavAction) -> bool {
        let kb = &self.keybindings.navigation;
        match action {
            NavAction::Up => kb.up.matches(event),
            NavAction::Down => kb.down.matches(event),
            NavAction::PageUp => kb.page_up.matches(event),
            NavAction::PageDown => kb.page_down.matches(event),
            NavAction::Next => kb.next.matches(event),
            NavAction::Previous => kb.previous.matches(event),
            NavAction::Select => kb.select.matches(event),
        }
    }

    pub fn display_nav(&self, action: NavAction) -> String {
        let kb = &self.keybindings.navigation;
        match action {
            NavAction::Up => kb.up.display(),
            NavAction::Down => kb.down.display(),
            NavAction::PageUp => kb.page_up.display(),
            NavAction::PageDown => kb.page_down.display(),
            NavAction::Next => kb.next.display(),
            NavAction::Previous => kb.previous.display(),
            NavAction::Select => kb.select.display(),
        }
    }

    // Form actions
    pub fn matches_form(&self, event: &KeyEvent, action: FormAction) -> bool {
        let kb = &self.keybindings.form;
        match action {
            FormAction::Submit => kb.submit.matches(event),
            FormAction::Cancel => kb.cancel.matches(event),
            FormAction::NextField => kb.next_field.matches(event),
            FormAction::PreviousField => kb.previous_field.matches(event),
        }
    }

    pub fn display_form(&self, action: FormAction) -> String {
        let kb = &self.keybindings.form;
        match action {
            FormAction::Submit => kb.submit.display(),
            FormAction::Cancel => kb.cancel.display(),
            FormAction::NextField => kb.next_field.display(),
            FormAction::PreviousField => kb.previous_field.display(),
        }
    }
}

impl Default for KeyResolver {
    fn default() -> Self {
        Self::new(Arc::new(KeybindingsConfig::default()))
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyModifiers};

    use super::*;

    #[test]
    fn test_default_form_bindings() {
        let resolver = KeyResolver::default();
        let esc = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        let tab = KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE);
        assert!(resolver.matches_form(&esc, FormAction::Cancel));
        assert!(!resolver.matches_form(&esc, FormAction::Submit));
        assert!(resolver.matches_form(&tab, FormAction::NextField));
        assert_eq!(resolver.display_form(FormAction::PreviousField), "BackTab/Up");
    }
}
