use std::path::PathBuf;

use anyhow::{Context, Result};

mod api;
mod app;
mod bible;
mod config;
mod handler;
mod tui;
mod ui;

use crate::api::{BibleApi, DocumentSource, DEFAULT_API_URL};
use crate::app::App;
use crate::config::Config;
use crate::tui::{EventHandler, Tui};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().unwrap_or_else(|_| Config::new());

    // Environment overrides take precedence over the config file. A data
    // directory switches the whole app to local JSON files, which also
    // makes it usable offline.
    let data_dir = std::env::var("BIBLE_DATA_DIR")
        .ok()
        .map(PathBuf::from)
        .or_else(|| config.data_dir.clone());

    let source = match data_dir {
        Some(dir) => DocumentSource::Dir(dir),
        None => {
            let api_url = std::env::var("BIBLE_API_URL")
                .ok()
                .or_else(|| config.api_url.clone())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string());
            DocumentSource::Api(BibleApi::new(&api_url))
        }
    };

    // Without the translations index there is nothing to offer, so this
    // one is fatal. Individual document fetches never are.
    let translations = source
        .load_translations()
        .await
        .context("failed to load the translations index")?;
    anyhow::ensure!(!translations.is_empty(), "the translations index is empty");

    let mut app = App::new(translations, config.translation.as_deref(), source.clone());

    // Load the starting document before the terminal takes over, so the
    // first frame already shows chapter 1 of the first book. A failure
    // lands in the error view rather than aborting the app.
    if let Some(abbreviation) = app.selected_translation.clone() {
        match source.load_document(&abbreviation).await {
            Ok(document) => app.install_document(&abbreviation, document),
            Err(err) => app.fetch_failed(&abbreviation, &format!("{err:#}")),
        }
    }

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;
    result
}

async fn run(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;
        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }

    Ok(())
}
