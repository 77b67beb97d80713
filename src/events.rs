use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};

use crate::app::App;

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Dispatch a terminal event to the app.
pub fn handle_event(app: &mut App, event: Event) {
    match event {
        Event::Key(key) => handle_key_event(app, key),
        Event::Resize(width, _) => app.set_display_width(width),
        _ => {}
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    // The detail overlay follows the selection
    if app.show_detail_overlay {
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Backspace | KeyCode::Char('q') => {
                app.go_back();
            }
            KeyCode::Left | KeyCode::Char('h') => app.select_older(),
            KeyCode::Right | KeyCode::Char('l') => app.select_newer(),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit(),

        // Timepoint selection
        KeyCode::Left | KeyCode::Char('h') => app.select_older(),
        KeyCode::Right | KeyCode::Char('l') => app.select_newer(),

        // Sections and pages
        KeyCode::PageUp => app.older_section(),
        KeyCode::PageDown => app.newer_section(),
        KeyCode::Char('[') => app.older_page(),
        KeyCode::Char(']') => app.newer_page(),
        KeyCode::Home => app.jump_to_newest(),
        KeyCode::End => app.jump_to_oldest(),

        KeyCode::Enter => app.enter_detail(),
        KeyCode::Esc | KeyCode::Backspace => app.go_back(),

        // Reload
        KeyCode::Char('r') => {
            app.rebuild();
            match app.reload_data() {
                Ok(_) => app.set_status_message("Reloaded".to_string()),
                Err(e) => app.set_status_message(format!("Reload failed: {}", e)),
            }
        }

        KeyCode::Char('?') => app.toggle_help(),

        // Export
        KeyCode::Char('e') => {
            let export_path = PathBuf::from("checkwatch_export.json");
            match app.export_state(&export_path) {
                Ok(()) => {
                    app.set_status_message(format!("Exported to {}", export_path.display()));
                }
                Err(e) => {
                    app.set_status_message(format!("Export failed: {}", e));
                }
            }
        }

        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::source::{ChannelSource, ManualClock, SourceUpdate};
    use checkwatch_types::CheckConfig;
    use crossterm::event::KeyEventKind;
    use std::sync::Arc;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn loaded_app() -> App {
        let (tx, source) = ChannelSource::create("test", 4);
        let mut app = App::new(
            vec![Box::new(source)],
            Arc::new(ManualClock::new(3 * 60 * 60_000)),
            &Settings::default(),
        )
        .unwrap();
        tx.try_send(SourceUpdate::Configs(vec![CheckConfig::new(60_000, 0)])).unwrap();
        app.reload_data().unwrap();
        handle_event(&mut app, Event::Resize(22, 40));
        app
    }

    #[test]
    fn test_navigation_keys() {
        let mut app = loaded_app();
        assert_eq!(app.window.display_count(), 10);

        handle_key_event(&mut app, key(KeyCode::PageUp));
        assert_eq!(app.window.section_index(), 1);
        handle_key_event(&mut app, key(KeyCode::Char('[')));
        assert_eq!((app.window.page_index(), app.window.section_index()), (1, 0));
        handle_key_event(&mut app, key(KeyCode::End));
        assert_eq!(app.window.page_index(), app.window.pages().len() - 1);
        handle_key_event(&mut app, key(KeyCode::Home));
        assert!(app.window.is_at_newest());
    }

    #[test]
    fn test_overlays() {
        let mut app = loaded_app();
        handle_key_event(&mut app, key(KeyCode::Enter));
        assert!(app.show_detail_overlay);
        handle_key_event(&mut app, key(KeyCode::Esc));
        assert!(!app.show_detail_overlay);

        handle_key_event(&mut app, key(KeyCode::Char('?')));
        assert!(app.show_help);
        handle_key_event(&mut app, key(KeyCode::Char('x')));
        assert!(!app.show_help);

        let mut quit = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        quit.kind = KeyEventKind::Press;
        handle_key_event(&mut app, quit);
        assert!(!app.running);
    }
}
