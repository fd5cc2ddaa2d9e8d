use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Clear, List, ListItem, Paragraph, Scrollbar, ScrollbarOrientation,
        ScrollbarState, Wrap,
    },
};

use crate::app::{App, FocusPane, InputMode, NavLevel, Screen, SearchFocus};

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.screen {
        Screen::Read => render_read_screen(app, frame, body_area),
        Screen::Search => render_search_screen(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);

    // Render popups (in order of priority)
    if app.show_goto {
        render_goto_input(app, frame, area);
    } else if app.show_translation_picker {
        render_translation_picker(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let translation = app
        .current_translation()
        .map(|t| format!(" {} ", t.description))
        .unwrap_or_default();

    // Animated ellipsis while a document is on its way
    let fetch_indicator = if app.is_fetching() {
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        format!("fetching{} ", dots)
    } else {
        String::new()
    };

    let title = Line::from(vec![
        Span::styled(" Bible ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(translation, Style::default().fg(Color::White)),
        Span::styled(fetch_indicator, Style::default().fg(Color::Yellow)),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.screen {
        Screen::Read => " READ ",
        Screen::Search => " SEARCH ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = match (app.screen, app.input_mode) {
        (Screen::Read, InputMode::Normal) => {
            let mut hints = if app.focus == FocusPane::Content {
                vec![
                    Span::styled(" j/k ", key_style),
                    Span::styled(" verse ", label_style),
                    Span::styled(" c ", key_style),
                    Span::styled(" copy ", label_style),
                    Span::styled(" h ", key_style),
                    Span::styled(" back ", label_style),
                ]
            } else {
                vec![
                    Span::styled(" j/k ", key_style),
                    Span::styled(" nav ", label_style),
                    Span::styled(" Enter ", key_style),
                    Span::styled(" select ", label_style),
                    Span::styled(" h ", key_style),
                    Span::styled(" back ", label_style),
                ]
            };
            // Common hints for the read screen
            hints.extend(vec![
                Span::styled(" [/] ", key_style),
                Span::styled(" chapter ", label_style),
                Span::styled(" t ", key_style),
                Span::styled(" translation ", label_style),
                Span::styled(" o ", key_style),
                Span::styled(" goto ", label_style),
                Span::styled(" / ", key_style),
                Span::styled(" search ", label_style),
                Span::styled(" q ", key_style),
                Span::styled(" quit ", label_style),
            ]);
            hints
        }
        (Screen::Read, InputMode::Editing) => vec![],
        (Screen::Search, InputMode::Normal) => {
            let mut hints = vec![
                Span::styled(" j/k ", key_style),
                Span::styled(" nav ", label_style),
            ];
            if app.search_focus == SearchFocus::Results {
                hints.extend(vec![
                    Span::styled(" Enter ", key_style),
                    Span::styled(" view ", label_style),
                ]);
            } else {
                hints.extend(vec![
                    Span::styled(" c ", key_style),
                    Span::styled(" copy ", label_style),
                ]);
            }
            hints.extend(vec![
                Span::styled(" Tab ", key_style),
                Span::styled(" focus ", label_style),
                Span::styled(" i ", key_style),
                Span::styled(" edit ", label_style),
                Span::styled(" Esc ", key_style),
                Span::styled(" read ", label_style),
            ]);
            hints
        }
        (Screen::Search, InputMode::Editing) => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" search ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" cancel ", label_style),
        ],
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_read_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    // Split into navigation (left) and content (right)
    let [nav_area, content_area] =
        Layout::horizontal([Constraint::Length(30), Constraint::Min(0)]).areas(area);

    // Store areas for mouse hit-testing
    app.nav_area = Some(nav_area);
    app.content_area = Some(content_area);

    render_navigation(app, frame, nav_area);
    render_content(app, frame, content_area);
}

fn render_navigation(app: &mut App, frame: &mut Frame, area: Rect) {
    let nav_focused = app.focus == FocusPane::Navigation;
    let border_color = if nav_focused { Color::Cyan } else { Color::DarkGray };

    let title = app.nav_title();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {} ", title));

    let items: Vec<ListItem> = match app.nav_level {
        NavLevel::Books => app
            .cached_books
            .iter()
            .map(|b| ListItem::new(format!(" {} ", b)))
            .collect(),
        NavLevel::Chapters => app
            .cached_chapters
            .iter()
            .map(|c| ListItem::new(format!(" Chapter {} ", c)))
            .collect(),
    };

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let state = match app.nav_level {
        NavLevel::Books => &mut app.book_state,
        NavLevel::Chapters => &mut app.chapter_state,
    };

    frame.render_stateful_widget(list, area, state);
}

fn render_content(app: &mut App, frame: &mut Frame, area: Rect) {
    let content_focused = app.focus == FocusPane::Content;
    let border_color = if content_focused { Color::Cyan } else { Color::DarkGray };

    // While a fetch is in flight the pane still shows the previous
    // translation's document; label that text with its own abbreviation
    let stale_abbreviation = app
        .document_abbreviation
        .as_deref()
        .filter(|&abbr| app.selected_translation.as_deref() != Some(abbr));
    let title = match stale_abbreviation {
        Some(abbr) => format!("{} ({})", app.content_title(), abbr),
        None => app.content_title(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {} ", title));

    let inner_area = block.inner(area);
    app.content_height = inner_area.height;
    app.content_width = inner_area.width;

    if let Some(error) = &app.fetch_error {
        let abbreviation = app.selected_translation.as_deref().unwrap_or("?");
        let text = Text::from(vec![
            Line::from(Span::styled(
                format!("Could not load '{}'", abbreviation),
                Style::default().fg(Color::Red).bold(),
            )),
            Line::default(),
            Line::from(error.as_str()),
            Line::default(),
            Line::from(Span::styled(
                "Press 't' and pick the translation again to retry.",
                Style::default().fg(Color::DarkGray),
            )),
        ]);
        let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    }

    if app.cached_verses.is_empty() {
        let message = if app.document.is_none() && app.is_fetching() {
            "Loading translation..."
        } else if app.document.is_none() {
            "No translation loaded"
        } else if app.selected_book.is_none() {
            "This translation has no books"
        } else {
            "No verses in this chapter"
        };
        let placeholder = Paragraph::new(message)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    // Build verse text with formatting
    let mut lines: Vec<Line> = Vec::new();
    for (idx, verse) in app.cached_verses.iter().enumerate() {
        let is_cursor = app.selected_verse_idx == Some(idx) && app.focus == FocusPane::Content;

        let verse_num_style = if is_cursor {
            Style::default().fg(Color::Black).bg(Color::Yellow).bold()
        } else {
            Style::default().fg(Color::Yellow).bold()
        };
        let verse_text_style = if is_cursor {
            Style::default().bg(Color::DarkGray)
        } else {
            Style::default()
        };

        let verse_num = Span::styled(format!("{}  ", verse.verse), verse_num_style);
        let verse_text = Span::styled(&verse.text[..], verse_text_style);
        lines.push(Line::from(vec![verse_num, verse_text]));
        lines.push(Line::default()); // Empty line between verses
    }

    app.total_content_lines = lines.len() as u16;

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.content_scroll, 0));

    frame.render_widget(paragraph, area);

    // Render scrollbar
    if app.total_content_lines > app.content_height {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("^"))
            .end_symbol(Some("v"));

        let mut scrollbar_state = ScrollbarState::new(app.total_content_lines as usize)
            .position(app.content_scroll as usize);

        frame.render_stateful_widget(
            scrollbar,
            area.inner(ratatui::layout::Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }
}

fn render_search_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    // Layout: search input at top, results below split into list and preview
    let [input_area, results_area] =
        Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).areas(area);

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if app.input_mode == InputMode::Editing {
            Color::Yellow
        } else {
            Color::DarkGray
        }))
        .title(" Search ");

    let input = Paragraph::new(app.search_input.as_str())
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, input_area);

    // Show cursor when editing
    if app.input_mode == InputMode::Editing {
        let cursor_x = (app.search_input.chars().count() as u16)
            .min(input_area.width.saturating_sub(2));
        frame.set_cursor_position((input_area.x + 1 + cursor_x, input_area.y + 1));
    }

    // Results: list on left, preview on right
    let [list_area, preview_area] =
        Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)])
            .areas(results_area);

    let results_focused = app.search_focus == SearchFocus::Results;
    let results_border_color = if results_focused { Color::Cyan } else { Color::DarkGray };

    let results_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(results_border_color))
        .title(format!(" Results ({}) ", app.search_results.len()));

    let items: Vec<ListItem> = app
        .search_results
        .iter()
        .map(|hit| ListItem::new(format!(" {} ", hit.reference())))
        .collect();

    let list = List::new(items)
        .block(results_block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, list_area, &mut app.search_state);

    let preview_focused = app.search_focus == SearchFocus::Preview;
    let preview_border_color = if preview_focused { Color::Cyan } else { Color::DarkGray };

    let preview_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(preview_border_color))
        .title(" Preview ");

    let preview_text = if let Some(hit) = app
        .search_state
        .selected()
        .and_then(|i| app.search_results.get(i))
    {
        Text::from(vec![
            Line::from(Span::styled(
                hit.reference(),
                Style::default().fg(Color::Yellow).bold(),
            )),
            Line::default(),
            Line::from(&hit.text[..]),
        ])
    } else {
        Text::from("Select a result to preview")
    };

    let preview = Paragraph::new(preview_text)
        .block(preview_block)
        .wrap(Wrap { trim: true });

    frame.render_widget(preview, preview_area);
}

fn render_translation_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    // Calculate popup size and position (centered)
    let popup_width = 50.min(area.width.saturating_sub(4));
    let popup_height = (app.translations.len() as u16 + 2).min(area.height.saturating_sub(4));

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Select Translation (Enter to select, Esc to cancel) ");

    let items: Vec<ListItem> = app
        .translations
        .iter()
        .map(|translation| {
            let is_current =
                app.selected_translation.as_deref() == Some(translation.abbreviation.as_str());
            let style = if is_current {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let versification = if translation.distribution_versification.is_empty() {
                String::new()
            } else {
                format!(" ({})", translation.distribution_versification)
            };
            ListItem::new(format!(
                " {} - {}{} ",
                translation.abbreviation, translation.description, versification
            ))
            .style(style)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, popup_area, &mut app.translation_state);
}

fn render_goto_input(app: &App, frame: &mut Frame, area: Rect) {
    // Calculate popup size and position (centered)
    let popup_width = 44.min(area.width.saturating_sub(4));
    let popup_height = 5;

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Go to reference ");

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let instructions = Paragraph::new("e.g. gen 3:15. Enter to jump, Esc to cancel.")
        .style(Style::default().fg(Color::DarkGray));
    let instructions_area = Rect::new(inner.x, inner.y, inner.width, 1);
    frame.render_widget(instructions, instructions_area);

    let input_area = Rect::new(inner.x, inner.y + 2, inner.width, 1);
    let input = Paragraph::new(app.goto_input.as_str()).style(Style::default().fg(Color::Cyan));
    frame.render_widget(input, input_area);

    let cursor_x = (app.goto_input.chars().count() as u16).min(input_area.width);
    frame.set_cursor_position((input_area.x + cursor_x, input_area.y));
}
