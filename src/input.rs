use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{AppState, InputMode};

/// Handle a key event and update app state accordingly
pub fn handle_key(state: &mut AppState, key: KeyEvent) {
    // Ctrl+C quits from any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        state.should_quit = true;
        return;
    }

    // Help overlay takes priority
    if state.show_help {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?')) {
            state.show_help = false;
        }
        return;
    }

    match state.mode {
        InputMode::Navigating => handle_navigation(state, key),
        InputMode::Editing => handle_editing(state, key),
    }
}

fn handle_navigation(state: &mut AppState, key: KeyEvent) {
    // Any key dismisses the previous status message
    state.status_message = None;

    match key.code {
        KeyCode::Char('q') => {
            state.should_quit = true;
        }

        KeyCode::Char('?') => {
            state.toggle_help();
        }

        // Entries
        KeyCode::Char('j') | KeyCode::Down => state.scroll(1),
        KeyCode::Char('k') | KeyCode::Up => state.scroll(-1),
        KeyCode::Char('J') | KeyCode::PageDown => state.page_down(),
        KeyCode::Char('K') | KeyCode::PageUp => state.page_up(),
        KeyCode::Char('g') | KeyCode::Home => state.go_to_top(),
        KeyCode::Char('G') | KeyCode::End => state.go_to_bottom(),

        // Pane split
        KeyCode::Char('h') => state.shrink_log_pane(),
        KeyCode::Char('l') => state.grow_log_pane(),

        // Matches
        KeyCode::Char('n') => state.next_match(),
        KeyCode::Char('N') => state.prev_match(),
        KeyCode::Char('f') => state.toggle_view_mode(),

        // Detail pane
        KeyCode::Char('d') => state.scroll_detail(1),
        KeyCode::Char('u') => state.scroll_detail(-1),
        KeyCode::Char('y') => state.copy_current_entry(),

        // Enter query mode
        KeyCode::Char('/') | KeyCode::Char(':') => state.begin_query_edit(),

        _ => {}
    }
}

fn handle_editing(state: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => state.commit_query(),
        KeyCode::Esc => state.cancel_query(),
        KeyCode::Left => state.editor.move_cursor(-1),
        KeyCode::Right => state.editor.move_cursor(1),
        KeyCode::Backspace => state.editor.delete(),
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => state.editor.clear(),
        KeyCode::Char(ch)
            if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            state.editor.insert(ch);
        }
        _ => {}
    }
}
