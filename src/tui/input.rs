use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;

use super::app::{App, Focus, Mode};

pub fn handle_events(app: &mut App) -> std::io::Result<bool> {
    if event::poll(Duration::from_millis(100))? {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                handle_key_event(app, key);
            }
        }
    }
    Ok(app.should_quit)
}

pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    if ctrl && key.code == KeyCode::Char('c') {
        if app.mode == Mode::Normal {
            app.should_quit = true;
        } else {
            app.command_buffer.clear();
            app.enter_normal_mode();
        }
        return;
    }

    match app.mode {
        Mode::Normal => handle_normal_mode(app, key, ctrl),
        Mode::Insert => handle_insert_mode(app, key, ctrl),
        Mode::Command => handle_command_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent, ctrl: bool) {
    let in_query = app.focus == Focus::Query;

    match key.code {
        // Page navigation
        KeyCode::Char('d') if ctrl => app.page_down(),
        KeyCode::Char('u') if ctrl => app.page_up(),

        // Mode switching
        KeyCode::Char('i') => app.enter_insert_mode(),
        KeyCode::Char('I') => {
            app.move_cursor_start();
            app.enter_insert_mode();
        }
        KeyCode::Char('a') => {
            app.move_cursor_right();
            app.enter_insert_mode();
        }
        KeyCode::Char('A') => {
            app.move_cursor_end();
            app.enter_insert_mode();
        }
        KeyCode::Char(':') => app.enter_command_mode(),
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Tab => app.toggle_focus(),

        KeyCode::Char('h') | KeyCode::Left if in_query => app.move_cursor_left(),
        KeyCode::Char('h') | KeyCode::Left => app.scroll_results_left(),
        KeyCode::Char('l') | KeyCode::Right if in_query => app.move_cursor_right(),
        KeyCode::Char('l') | KeyCode::Right => app.scroll_results_right(),
        KeyCode::Char('j') | KeyCode::Down if in_query => app.move_cursor_down(),
        KeyCode::Char('j') | KeyCode::Down => app.scroll_results_down(),
        KeyCode::Char('k') | KeyCode::Up if in_query => app.move_cursor_up(),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_results_up(),

        KeyCode::Char('0') if in_query => app.move_cursor_start(),
        KeyCode::Char('$') if in_query => app.move_cursor_end(),
        KeyCode::Char('w') if in_query => app.move_cursor_word_forward(),
        KeyCode::Char('b') if in_query => app.move_cursor_word_backward(),
        KeyCode::Char('x') if in_query => app.delete_char_forward(),
        KeyCode::Char('D') if in_query => app.delete_to_end(),
        KeyCode::Char('g') if !in_query => app.scroll_to_top(),
        KeyCode::Char('G') if !in_query => app.scroll_to_bottom(),

        KeyCode::Enter => app.execute_query(),

        _ => {}
    }
}

fn handle_insert_mode(app: &mut App, key: KeyEvent, ctrl: bool) {
    match key.code {
        KeyCode::Esc => app.enter_normal_mode(),
        KeyCode::Enter if key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) => {
            app.insert_char('\n');
        }
        KeyCode::Enter => {
            app.execute_query();
            app.enter_normal_mode();
        }
        KeyCode::Backspace => app.delete_char(),
        KeyCode::Delete => app.delete_char_forward(),
        KeyCode::Left => app.move_cursor_left(),
        KeyCode::Right => app.move_cursor_right(),
        KeyCode::Home => app.move_cursor_start(),
        KeyCode::End => app.move_cursor_end(),
        KeyCode::Up => app.history_up(),
        KeyCode::Down => app.history_down(),

        // Ctrl shortcuts
        KeyCode::Char('w') if ctrl => app.delete_word_backward(),
        KeyCode::Char('u') if ctrl => app.delete_to_start(),
        KeyCode::Char('k') if ctrl => app.delete_to_end(),
        KeyCode::Char('a') if ctrl => app.move_cursor_start(),
        KeyCode::Char('e') if ctrl => app.move_cursor_end(),

        KeyCode::Char(c) => app.insert_char(c),

        _ => {}
    }
}

fn handle_command_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.command_buffer.clear();
            app.enter_normal_mode();
        }
        KeyCode::Enter => app.execute_command(),
        KeyCode::Backspace => {
            if app.command_buffer.pop().is_none() {
                app.enter_normal_mode();
            }
        }
        KeyCode::Char(c) => app.command_buffer.push(c),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use crate::storage::TableStore;

    fn press(app: &mut App, code: KeyCode) {
        handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_keys(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_insert_and_execute() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(Session::new(dir.path(), TableStore::new()));

        press(&mut app, KeyCode::Char('i'));
        assert_eq!(app.mode, Mode::Insert);
        type_keys(&mut app, "USE DATABASE shop;");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(app.database_name(), Some("shop"));
        assert_eq!(app.message.as_deref(), Some("Using database: shop"));
    }

    #[test]
    fn test_command_mode_quit() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(Session::new(dir.path(), TableStore::new()));

        type_keys(&mut app, ":q");
        assert_eq!(app.mode, Mode::Command);
        press(&mut app, KeyCode::Enter);
        assert!(app.should_quit);
    }

    #[test]
    fn test_shift_enter_inserts_newline() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(Session::new(dir.path(), TableStore::new()));

        press(&mut app, KeyCode::Char('i'));
        type_keys(&mut app, "SHOW");
        handle_key_event(&mut app, KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT));
        assert_eq!(app.query, "SHOW\n");
        assert_eq!(app.mode, Mode::Insert);
    }
}
