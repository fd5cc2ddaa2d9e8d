use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::{App, FocusPane, InputMode, Screen, SearchFocus};
use crate::tui::AppEvent;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
    }
    app.poll_fetch().await;
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global quit that works in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match app.screen {
        Screen::Read => handle_read_normal(app, key),
        Screen::Search => handle_search_normal(app, key),
    }
}

fn handle_read_normal(app: &mut App, key: KeyEvent) {
    // Handle the go-to-reference input if it's open
    if app.show_goto {
        match key.code {
            KeyCode::Esc => {
                app.show_goto = false;
                app.goto_input.clear();
            }
            KeyCode::Enter => {
                let input = app.goto_input.clone();
                app.show_goto = false;
                app.goto_input.clear();
                app.goto_reference(&input);
            }
            KeyCode::Backspace => {
                app.goto_input.pop();
            }
            KeyCode::Char(c) => {
                app.goto_input.push(c);
            }
            _ => {}
        }
        return;
    }

    // Handle the translation picker if it's open
    if app.show_translation_picker {
        match key.code {
            KeyCode::Esc => {
                app.show_translation_picker = false;
            }
            KeyCode::Char('j') | KeyCode::Down => {
                app.translation_nav_down();
            }
            KeyCode::Char('k') | KeyCode::Up => {
                app.translation_nav_up();
            }
            KeyCode::Enter => {
                app.confirm_translation();
            }
            _ => {}
        }
        return;
    }

    match key.code {
        // Quit
        KeyCode::Char('q') => app.should_quit = true,

        // Navigation
        KeyCode::Char('j') | KeyCode::Down => {
            if app.focus == FocusPane::Navigation {
                app.nav_down();
            } else {
                app.select_next_verse();
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            if app.focus == FocusPane::Navigation {
                app.nav_up();
            } else {
                app.select_prev_verse();
            }
        }
        KeyCode::Char('g') => {
            if app.focus == FocusPane::Navigation {
                app.nav_first();
            } else if !app.cached_verses.is_empty() {
                app.selected_verse_idx = Some(0);
                app.content_scroll = 0;
            }
        }
        KeyCode::Char('G') => {
            if app.focus == FocusPane::Navigation {
                app.nav_last();
            } else if !app.cached_verses.is_empty() {
                let last = app.cached_verses.len().saturating_sub(1);
                app.selected_verse_idx = Some(last);
                app.content_scroll = app.total_content_lines.saturating_sub(app.content_height);
            }
        }

        // Enter/Select
        KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => {
            if app.focus == FocusPane::Navigation {
                app.nav_enter();
            }
        }

        // Back
        KeyCode::Char('h') | KeyCode::Left | KeyCode::Backspace => {
            if app.focus == FocusPane::Content {
                app.focus = FocusPane::Navigation;
            } else {
                app.nav_back();
            }
        }

        // Tab to switch focus
        KeyCode::Tab => {
            app.focus = match app.focus {
                FocusPane::Navigation => {
                    // Select first verse when entering content pane
                    if app.selected_verse_idx.is_none() && !app.cached_verses.is_empty() {
                        app.selected_verse_idx = Some(0);
                    }
                    FocusPane::Content
                }
                FocusPane::Content => FocusPane::Navigation,
            };
        }

        // Half-page scroll
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_down();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_up();
        }

        // Chapter paging, regardless of focused pane
        KeyCode::Char(']') => app.next_chapter(),
        KeyCode::Char('[') => app.prev_chapter(),

        // Copy selected verse (only when Content is focused)
        KeyCode::Char('c') => {
            if app.focus == FocusPane::Content {
                let reference = app.content_title();
                if let Some(verse) = app.get_selected_verse() {
                    let text = format!("{}:{}\n{}", reference, verse.verse, verse.text);
                    copy_to_clipboard(&text);
                }
            }
        }

        // Translation picker
        KeyCode::Char('t') => {
            app.open_translation_picker();
        }

        // Go to reference
        KeyCode::Char('o') => {
            app.show_goto = true;
            app.goto_input.clear();
        }

        // Search screen
        KeyCode::Char('/') => {
            app.screen = Screen::Search;
            app.input_mode = InputMode::Editing;
        }

        _ => {}
    }
}

fn handle_search_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        // Back to reading
        KeyCode::Esc => {
            app.screen = Screen::Read;
            app.search_input.clear();
            app.search_results.clear();
            app.search_state.select(None);
            app.search_focus = SearchFocus::Results;
        }

        // Tab cycles focus: Results -> Preview -> Results
        KeyCode::Tab => {
            app.search_focus = match app.search_focus {
                SearchFocus::Results => SearchFocus::Preview,
                SearchFocus::Preview => SearchFocus::Results,
            };
        }

        KeyCode::Char('j') | KeyCode::Down => {
            app.search_nav_down();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.search_nav_up();
        }

        // Copy the highlighted hit (when Preview focused)
        KeyCode::Char('c') => {
            if app.search_focus == SearchFocus::Preview {
                if let Some(i) = app.search_state.selected() {
                    if let Some(hit) = app.search_results.get(i) {
                        let text = format!("{}\n{}", hit.reference(), hit.text);
                        copy_to_clipboard(&text);
                    }
                }
            }
        }

        // Edit search
        KeyCode::Char('i') | KeyCode::Char('/') => {
            app.input_mode = InputMode::Editing;
        }

        // Jump to the selected result
        KeyCode::Enter => {
            if app.search_focus == SearchFocus::Results {
                if let Some(i) = app.search_state.selected() {
                    if let Some(hit) = app.search_results.get(i).cloned() {
                        app.jump_to_hit(&hit);
                    }
                }
            }
        }

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match app.screen {
        Screen::Search => handle_search_editing(app, key),
        Screen::Read => {}
    }
}

fn handle_search_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            app.perform_search();
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Backspace => {
            app.search_input.pop();
        }
        KeyCode::Char(c) => {
            app.search_input.push(c);
        }
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    // Position-based scrolling: the wheel acts on the pane under the cursor
    let in_nav = app.nav_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_content = app
        .content_area
        .map(|r| point_in_rect(x, y, r))
        .unwrap_or(false);

    match mouse.kind {
        MouseEventKind::ScrollDown => match app.screen {
            Screen::Read => {
                if in_content {
                    app.scroll_down();
                    app.scroll_down();
                    app.scroll_down();
                } else if in_nav {
                    app.nav_down();
                }
            }
            Screen::Search => {
                app.search_nav_down();
            }
        },
        MouseEventKind::ScrollUp => match app.screen {
            Screen::Read => {
                if in_content {
                    app.scroll_up();
                    app.scroll_up();
                    app.scroll_up();
                } else if in_nav {
                    app.nav_up();
                }
            }
            Screen::Search => {
                app.search_nav_up();
            }
        },
        _ => {}
    }
}

fn copy_to_clipboard(text: &str) {
    use std::io::Write;
    use std::process::{Command, Stdio};

    if let Ok(mut child) = Command::new("pbcopy").stdin(Stdio::piped()).spawn() {
        if let Some(mut stdin) = child.stdin.take() {
            let _ = stdin.write_all(text.as_bytes());
        }
    }
}
