use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use tokio::sync::mpsc::UnboundedSender;
use companion_core::build_prompt;

use crate::app::{App, InputMode};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent, tx: &UnboundedSender<AppEvent>) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key, tx),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Chunk(chunk) => app.append_chunk(&chunk),
        AppEvent::Done(full_response) => app.finish_response(&full_response),
        AppEvent::Failed(error) => app.fail_response(&error),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent, tx: &UnboundedSender<AppEvent>) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // Popups take the keyboard while open
    if app.show_api_key_input {
        handle_api_key_input(app, key, tx);
        return;
    }
    if app.show_model_picker {
        handle_model_picker(app, key);
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key, tx),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Char('i') | KeyCode::Char('/') | KeyCode::Enter => {
            app.input_mode = InputMode::Editing;
        }

        // Chat scrolling
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(1),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_down(app.half_page());
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_up(app.half_page());
        }
        KeyCode::PageDown => app.scroll_down(app.half_page()),
        KeyCode::PageUp => app.scroll_up(app.half_page()),
        KeyCode::Char('g') | KeyCode::Home => app.chat_scroll = 0,
        KeyCode::Char('G') | KeyCode::End => app.scroll_chat_to_bottom(),

        KeyCode::Char('t') => app.toggle_thinking(),
        KeyCode::Char('M') => app.open_model_picker(),
        KeyCode::Char('K') => app.open_api_key_input(),
        KeyCode::Esc => app.status = None,

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent, tx: &UnboundedSender<AppEvent>) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => submit_query(app, tx),
        KeyCode::Backspace => {
            if app.query_cursor > 0 {
                app.query_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.query_input, app.query_cursor);
                app.query_input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.query_input.chars().count();
            if app.query_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.query_input, app.query_cursor);
                app.query_input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.query_cursor = app.query_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.query_input.chars().count();
            app.query_cursor = (app.query_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.query_cursor = 0;
        }
        KeyCode::End => {
            app.query_cursor = app.query_input.chars().count();
        }
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.query_input, app.query_cursor);
            app.query_input.insert(byte_pos, c);
            app.query_cursor += 1;
        }
        _ => {}
    }
}

/// Record the question and stream the model's answer in the background.
///
/// Chunks, completion and failure come back through `tx` as events.
fn submit_query(app: &mut App, tx: &UnboundedSender<AppEvent>) {
    if app.query_input.trim().is_empty() || app.streaming {
        return;
    }

    let Some(client) = app.client.clone() else {
        // Keep the typed question so it can be sent once a key is entered
        app.status = Some("No Groq API key configured. Set GROQ_API_KEY or enter one now.".to_string());
        app.open_api_key_input();
        return;
    };

    let question = std::mem::take(&mut app.query_input);
    app.query_cursor = 0;
    app.session.push_user(question);

    let prompt = build_prompt(app.session.messages());
    app.begin_response();

    let model = app.selected_model.clone();
    let temperature = app.temperature;
    let tx = tx.clone();

    tracing::info!(exchange = app.exchanges(), %model, "submitting question");

    tokio::spawn(async move {
        let chunk_tx = tx.clone();
        let result = client
            .stream(&model, temperature, &prompt, |chunk| {
                let _ = chunk_tx.send(AppEvent::Chunk(chunk.to_string()));
            })
            .await;

        let event = match result {
            Ok(full_response) => AppEvent::Done(full_response),
            Err(e) => AppEvent::Failed(e.to_string()),
        };
        let _ = tx.send(event);
    });
}

fn handle_api_key_input(app: &mut App, key: KeyEvent, tx: &UnboundedSender<AppEvent>) {
    match key.code {
        KeyCode::Esc => app.close_api_key_input(),
        KeyCode::Enter => {
            let entered = app.api_key_input.clone();
            app.close_api_key_input();
            if !entered.trim().is_empty() {
                app.set_api_key(&entered);
                // Send the question that was waiting for a key
                if app.input_mode == InputMode::Editing && !app.query_input.trim().is_empty() {
                    submit_query(app, tx);
                }
            }
        }
        KeyCode::Backspace => {
            if app.api_key_input_cursor > 0 {
                app.api_key_input_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.api_key_input, app.api_key_input_cursor);
                app.api_key_input.remove(byte_pos);
            }
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.api_key_input, app.api_key_input_cursor);
            app.api_key_input.insert(byte_pos, c);
            app.api_key_input_cursor += 1;
        }
        KeyCode::Left => {
            app.api_key_input_cursor = app.api_key_input_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.api_key_input.chars().count();
            app.api_key_input_cursor = (app.api_key_input_cursor + 1).min(char_count);
        }
        _ => {}
    }
}

fn handle_model_picker(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.show_model_picker = false,
        KeyCode::Char('j') | KeyCode::Down => app.model_picker_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.model_picker_nav_up(),
        KeyCode::Enter => app.select_model(),
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(3),
        MouseEventKind::ScrollUp => app.scroll_up(3),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use companion_core::Config;
    use tokio::sync::mpsc;

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn app_without_key() -> App {
        let mut app = App::new(Config::new(), None);
        app.client = None;
        app.config_path = None;
        app
    }

    fn type_text(app: &mut App, tx: &UnboundedSender<AppEvent>, text: &str) {
        for c in text.chars() {
            handle_event(app, key(KeyCode::Char(c)), tx).unwrap();
        }
    }

    #[test]
    fn test_char_to_byte_index() {
        assert_eq!(char_to_byte_index("héllo", 0), 0);
        assert_eq!(char_to_byte_index("héllo", 2), 3);
        assert_eq!(char_to_byte_index("héllo", 10), 6);
    }

    #[test]
    fn test_editing_is_utf8_safe() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = app_without_key();

        type_text(&mut app, &tx, "añb");
        handle_event(&mut app, key(KeyCode::Left), &tx).unwrap();
        handle_event(&mut app, key(KeyCode::Backspace), &tx).unwrap();
        assert_eq!(app.query_input, "ab");
        assert_eq!(app.query_cursor, 1);

        handle_event(&mut app, key(KeyCode::Char('€')), &tx).unwrap();
        assert_eq!(app.query_input, "a€b");
        handle_event(&mut app, key(KeyCode::Delete), &tx).unwrap();
        assert_eq!(app.query_input, "a€");
    }

    #[test]
    fn test_empty_input_is_not_submitted() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = app_without_key();

        type_text(&mut app, &tx, "   ");
        handle_event(&mut app, key(KeyCode::Enter), &tx).unwrap();
        assert_eq!(app.session.len(), 1);
        assert!(!app.show_api_key_input);
    }

    #[test]
    fn test_submit_without_key_prompts_for_one() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = app_without_key();

        type_text(&mut app, &tx, "fix my code");
        handle_event(&mut app, key(KeyCode::Enter), &tx).unwrap();

        assert!(app.show_api_key_input);
        assert_eq!(app.session.len(), 1);
        assert_eq!(app.query_input, "fix my code");
        assert!(!app.streaming);

        // Typing now goes to the key prompt, not the question
        type_text(&mut app, &tx, "xy");
        assert_eq!(app.api_key_input, "xy");
        handle_event(&mut app, key(KeyCode::Esc), &tx).unwrap();
        assert!(!app.show_api_key_input);
        assert_eq!(app.query_input, "fix my code");
    }

    #[tokio::test]
    async fn test_question_is_sent_once_key_is_entered() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");

        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = app_without_key();
        app.config_path = Some(config_path.clone());
        // Nothing listens here; the spawned request just fails
        app.config.base_url = Some("http://127.0.0.1:9".to_string());

        type_text(&mut app, &tx, "fix my code");
        handle_event(&mut app, key(KeyCode::Enter), &tx).unwrap();
        assert!(app.show_api_key_input);

        type_text(&mut app, &tx, "gsk_entered");
        handle_event(&mut app, key(KeyCode::Enter), &tx).unwrap();

        assert!(!app.show_api_key_input);
        assert!(app.client.is_some());
        assert!(app.streaming);
        assert_eq!(app.session.len(), 2);
        assert_eq!(app.session.last().unwrap().content, "fix my code");
        assert!(app.query_input.is_empty());

        let saved = Config::load_from(&config_path).unwrap();
        assert_eq!(saved.groq_api_key.as_deref(), Some("gsk_entered"));
    }

    #[test]
    fn test_enter_ignored_while_streaming() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = app_without_key();
        app.begin_response();

        type_text(&mut app, &tx, "second question");
        handle_event(&mut app, key(KeyCode::Enter), &tx).unwrap();
        assert_eq!(app.session.len(), 1);
        assert_eq!(app.query_input, "second question");
    }

    #[test]
    fn test_stream_events_reach_the_session() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = app_without_key();
        app.session.push_user("question");
        app.begin_response();

        handle_event(&mut app, AppEvent::Chunk("<think>hm".to_string()), &tx).unwrap();
        handle_event(&mut app, AppEvent::Chunk("</think>yes".to_string()), &tx).unwrap();
        assert_eq!(app.stream_buffer, "<think>hm</think>yes");

        handle_event(&mut app, AppEvent::Done("<think>hm</think>yes".to_string()), &tx).unwrap();
        let last = app.session.last().unwrap();
        assert_eq!(last.content, "yes");
        assert_eq!(last.thinking.as_deref(), Some("hm"));
        assert_eq!(app.session.len(), 3);
    }

    #[test]
    fn test_normal_mode_keys() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = app_without_key();

        handle_event(&mut app, key(KeyCode::Esc), &tx).unwrap();
        assert_eq!(app.input_mode, InputMode::Normal);

        handle_event(&mut app, key(KeyCode::Char('t')), &tx).unwrap();
        assert!(app.show_thinking);

        handle_event(&mut app, key(KeyCode::Char('M')), &tx).unwrap();
        assert!(app.show_model_picker);
        handle_event(&mut app, key(KeyCode::Esc), &tx).unwrap();
        assert!(!app.show_model_picker);

        handle_event(&mut app, key(KeyCode::Char('i')), &tx).unwrap();
        assert_eq!(app.input_mode, InputMode::Editing);
        handle_event(&mut app, key(KeyCode::Esc), &tx).unwrap();

        handle_event(&mut app, key(KeyCode::Char('q')), &tx).unwrap();
        assert!(app.should_quit);
    }
}
