use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, Message};

/// A declarative keybinding map.
#[derive(Clone, Default)]
pub struct Keymap {
    bindings: Vec<(KeyCode, KeyModifiers, Message)>,
}

impl Keymap {
    pub const fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Add a key binding with no modifiers.
    pub fn bind(mut self, code: KeyCode, message: Message) -> Self {
        self.bindings.push((code, KeyModifiers::NONE, message));
        self
    }

    /// Add a key binding with Ctrl modifier.
    pub fn bind_ctrl(mut self, code: KeyCode, message: Message) -> Self {
        self.bindings.push((code, KeyModifiers::CONTROL, message));
        self
    }

    /// Look up a message for a key event.
    /// Later bindings take precedence over earlier ones.
    pub fn get(&self, event: &KeyEvent) -> Option<Message> {
        self.bindings
            .iter()
            .rev()
            .find(|(code, mods, _)| *code == event.code && event.modifiers.contains(*mods))
            .map(|(_, _, msg)| msg.clone())
    }
}

/// Keys that work regardless of feed state.
pub fn global_keymap() -> Keymap {
    Keymap::new()
        .bind(KeyCode::Char('q'), Message::Quit)
        .bind_ctrl(KeyCode::Char('c'), Message::Quit)
        .bind(KeyCode::Char('`'), Message::ToggleDebug)
        .bind(KeyCode::Char('?'), Message::ToggleHelp)
}

pub fn feed_keymap() -> Keymap {
    Keymap::new()
        .bind(KeyCode::Char('j'), Message::NextArticle)
        .bind(KeyCode::Down, Message::NextArticle)
        .bind(KeyCode::Char(' '), Message::NextArticle)
        .bind(KeyCode::PageDown, Message::NextArticle)
        .bind(KeyCode::Char('k'), Message::PrevArticle)
        .bind(KeyCode::Up, Message::PrevArticle)
        .bind(KeyCode::PageUp, Message::PrevArticle)
        .bind(KeyCode::Char('g'), Message::FirstArticle)
        .bind(KeyCode::Home, Message::FirstArticle)
        .bind(KeyCode::Char('G'), Message::LastArticle)
        .bind(KeyCode::End, Message::LastArticle)
        .bind(KeyCode::Char('o'), Message::OpenArticle)
        .bind(KeyCode::Enter, Message::OpenArticle)
        .bind(KeyCode::Char('r'), Message::Retry)
        .bind(KeyCode::Char('R'), Message::Reload)
}

pub fn handle_key(key: KeyEvent, app: &App) -> Option<Message> {
    if app.show_help && key.code == KeyCode::Esc {
        return Some(Message::ToggleHelp);
    }

    if let Some(msg) = global_keymap().get(&key) {
        return Some(msg);
    }

    feed_keymap().get(&key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestAppBuilder;
    use crossterm::event::{KeyEventKind, KeyEventState};

    fn make_key(code: KeyCode) -> KeyEvent {
        make_key_with_mods(code, KeyModifiers::empty())
    }

    fn make_key_with_mods(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::empty(),
        }
    }

    #[test]
    fn test_quit_keys() {
        let app = TestAppBuilder::new().build();
        assert_eq!(
            handle_key(make_key(KeyCode::Char('q')), &app),
            Some(Message::Quit)
        );
        assert_eq!(
            handle_key(
                make_key_with_mods(KeyCode::Char('c'), KeyModifiers::CONTROL),
                &app
            ),
            Some(Message::Quit)
        );
    }

    #[test]
    fn test_navigation_keys() {
        let app = TestAppBuilder::new().build();
        for code in [KeyCode::Char('j'), KeyCode::Down, KeyCode::Char(' ')] {
            assert_eq!(handle_key(make_key(code), &app), Some(Message::NextArticle));
        }
        for code in [KeyCode::Char('k'), KeyCode::Up] {
            assert_eq!(handle_key(make_key(code), &app), Some(Message::PrevArticle));
        }
        assert_eq!(
            handle_key(make_key(KeyCode::Char('g')), &app),
            Some(Message::FirstArticle)
        );
        // Shifted letters arrive with the SHIFT modifier set
        assert_eq!(
            handle_key(
                make_key_with_mods(KeyCode::Char('G'), KeyModifiers::SHIFT),
                &app
            ),
            Some(Message::LastArticle)
        );
    }

    #[test]
    fn test_retry_and_reload_are_distinct() {
        let app = TestAppBuilder::new().build();
        assert_eq!(
            handle_key(make_key(KeyCode::Char('r')), &app),
            Some(Message::Retry)
        );
        assert_eq!(
            handle_key(make_key(KeyCode::Char('R')), &app),
            Some(Message::Reload)
        );
    }

    #[test]
    fn test_unbound_key_is_ignored() {
        let app = TestAppBuilder::new().build();
        assert_eq!(
            handle_key(
                make_key_with_mods(KeyCode::Char('x'), KeyModifiers::CONTROL),
                &app
            ),
            None
        );
    }

    #[test]
    fn test_escape_closes_help() {
        let app = TestAppBuilder::new().show_help().build();
        assert_eq!(
            handle_key(make_key(KeyCode::Esc), &app),
            Some(Message::ToggleHelp)
        );

        let app = TestAppBuilder::new().build();
        assert_eq!(handle_key(make_key(KeyCode::Esc), &app), None);
    }

    #[test]
    fn test_later_binding_wins() {
        let keymap = Keymap::new()
            .bind(KeyCode::Char('x'), Message::Quit)
            .bind(KeyCode::Char('x'), Message::Reload);
        assert_eq!(
            keymap.get(&make_key(KeyCode::Char('x'))),
            Some(Message::Reload)
        );
    }
}
