//! Keyboard input handling.
//!
//! Keys only set flags or request work on [`App`]; the main loop decides
//! what to do with the requests. New bindings also need a mention in the
//! status bar help in [`crate::ui`].

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use crate::app::App;

/// Apply one key event. Release and repeat events are ignored.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit = true,
        KeyCode::Char('r') => app.request_refresh(),
        KeyCode::Char('a') => app.request_active(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState, KeyModifiers};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn q_and_esc_quit() {
        for code in [KeyCode::Char('q'), KeyCode::Esc] {
            let mut app = App::new("l");
            handle_key_event(&mut app, press(code));
            assert!(app.quit);
        }
    }

    #[test]
    fn r_requests_refresh() {
        let mut app = App::new("l");
        handle_key_event(&mut app, press(KeyCode::Char('r')));
        assert!(app.take_refresh());
        assert!(!app.quit);
    }

    #[test]
    fn a_requests_active_count() {
        let mut app = App::new("l");
        handle_key_event(&mut app, press(KeyCode::Char('a')));
        assert!(app.take_active());
    }

    #[test]
    fn release_events_are_ignored() {
        let mut app = App::new("l");
        let release = KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        handle_key_event(&mut app, release);
        assert!(!app.quit);
    }
}
