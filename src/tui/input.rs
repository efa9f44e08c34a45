use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui_textarea::{Input, Key};

use super::app::App;
use super::event::Command;

/// Dispatch a key event into the state machine.
///
/// Order of operations:
/// 1) Ignore non-press events
/// 2) Quit (Ctrl+C) from anywhere
/// 3) Selection movement (arrows and Tab everywhere, j/k in lists)
/// 4) Activation (Enter) and back (Esc)
/// 5) List shortcuts (r = reload)
/// 6) Everything else is text for the focused form field
///
/// Returns the async command the key started, if any.
pub fn dispatch_key(app: &mut App, key: KeyEvent) -> Option<Command> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return None;
    }

    let in_list = app.view.is_list();
    let plain = key.modifiers == KeyModifiers::NONE || key.modifiers == KeyModifiers::SHIFT;

    match key.code {
        KeyCode::Up | KeyCode::BackTab => {
            app.navigate(-1);
            return None;
        }
        KeyCode::Down | KeyCode::Tab => {
            app.navigate(1);
            return None;
        }
        KeyCode::Char('k') if in_list && plain => {
            app.navigate(-1);
            return None;
        }
        KeyCode::Char('j') if in_list && plain => {
            app.navigate(1);
            return None;
        }
        KeyCode::Enter => return app.submit(),
        KeyCode::Esc => return app.back(),
        KeyCode::Char('r') if in_list && plain => return app.reload(),
        _ => {}
    }

    if app.view.is_form() {
        if let (Some(field), Some(input)) = (app.focused_field_mut(), to_textarea_input(&key)) {
            field.input(input);
        }
    }
    None
}

/// Translates a crossterm key into a textarea edit. Keys the editor has no
/// use for map to `None`.
pub fn to_textarea_input(key: &KeyEvent) -> Option<Input> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    let key = match key.code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Delete => Key::Delete,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        _ => return None,
    };

    Some(Input { key, ctrl, alt })
}
