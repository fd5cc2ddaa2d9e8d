use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use std::collections::HashMap;
use tokio::task::JoinHandle;

use crate::api::DocumentSource;
use crate::bible::{BibleDocument, Reference, SearchHit, Translation, Verse};
use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Read,
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavLevel {
    Books,
    Chapters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Navigation,
    Content,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchFocus {
    #[default]
    Results,
    Preview,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub screen: Screen,
    pub input_mode: InputMode,
    pub focus: FocusPane,

    // Translations on offer and the one the reader picked
    pub translations: Vec<Translation>,
    pub selected_translation: Option<String>,

    // Installed document plus everything fetched so far, keyed by
    // translation abbreviation
    pub source: DocumentSource,
    pub document: Option<BibleDocument>,
    pub document_abbreviation: Option<String>,
    pub document_cache: HashMap<String, BibleDocument>,

    // At most one fetch in flight; superseded tasks get aborted
    pub fetch: Option<(String, JoinHandle<anyhow::Result<BibleDocument>>)>,
    pub fetch_error: Option<String>,

    // Committed reading position
    pub selected_book: Option<String>,
    pub selected_chapter: u32,

    // Navigation state
    pub nav_level: NavLevel,
    pub book_state: ListState,
    pub chapter_state: ListState,

    // Content state
    pub content_scroll: u16,
    pub content_height: u16,
    pub content_width: u16,
    pub total_content_lines: u16,

    // Verse selection (for copy/jump actions)
    pub selected_verse_idx: Option<usize>,

    // Search state
    pub search_input: String,
    pub search_results: Vec<SearchHit>,
    pub search_state: ListState,
    pub search_focus: SearchFocus,

    // Go-to-reference input
    pub goto_input: String,
    pub show_goto: bool,

    // Translation picker state
    pub show_translation_picker: bool,
    pub translation_state: ListState,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Panel areas for mouse hit-testing (updated during render)
    pub nav_area: Option<Rect>,
    pub content_area: Option<Rect>,

    // Cached navigation data, rebuilt wholesale by refresh_derived
    pub cached_books: Vec<String>,
    pub cached_chapters: Vec<u32>,
    pub cached_verses: Vec<Verse>,
}

impl App {
    pub fn new(
        translations: Vec<Translation>,
        default_translation: Option<&str>,
        source: DocumentSource,
    ) -> Self {
        let selected_translation = default_translation
            .and_then(|abbr| translations.iter().find(|t| t.abbreviation == abbr))
            .or_else(|| translations.first())
            .map(|t| t.abbreviation.clone());

        Self {
            should_quit: false,
            screen: Screen::Read,
            input_mode: InputMode::Normal,
            focus: FocusPane::Navigation,

            translations,
            selected_translation,

            source,
            document: None,
            document_abbreviation: None,
            document_cache: HashMap::new(),

            fetch: None,
            fetch_error: None,

            selected_book: None,
            selected_chapter: 1,

            nav_level: NavLevel::Books,
            book_state: ListState::default(),
            chapter_state: ListState::default(),

            content_scroll: 0,
            content_height: 0,
            content_width: 0,
            total_content_lines: 0,

            selected_verse_idx: None,

            search_input: String::new(),
            search_results: Vec::new(),
            search_state: ListState::default(),
            search_focus: SearchFocus::default(),

            goto_input: String::new(),
            show_goto: false,

            show_translation_picker: false,
            translation_state: ListState::default(),

            animation_frame: 0,

            nav_area: None,
            content_area: None,

            cached_books: Vec::new(),
            cached_chapters: Vec::new(),
            cached_verses: Vec::new(),
        }
    }

    pub fn current_translation(&self) -> Option<&Translation> {
        let abbreviation = self.selected_translation.as_deref()?;
        self.translations
            .iter()
            .find(|t| t.abbreviation == abbreviation)
    }

    /// Switch translations. Unknown abbreviations are ignored, and
    /// re-picking the current one is a no-op unless its fetch failed,
    /// which makes picking it again the retry path. Cached documents
    /// install immediately; anything else starts a background fetch.
    pub fn select_translation(&mut self, abbreviation: &str) {
        if !self
            .translations
            .iter()
            .any(|t| t.abbreviation == abbreviation)
        {
            return;
        }
        if self.selected_translation.as_deref() == Some(abbreviation)
            && self.fetch_error.is_none()
        {
            return;
        }

        self.selected_translation = Some(abbreviation.to_string());
        self.fetch_error = None;

        if let Some(document) = self.document_cache.get(abbreviation).cloned() {
            self.install_document(abbreviation, document);
            return;
        }
        self.spawn_fetch(abbreviation);
    }

    fn spawn_fetch(&mut self, abbreviation: &str) {
        if let Some((_, task)) = self.fetch.take() {
            task.abort();
        }
        let source = self.source.clone();
        let abbr = abbreviation.to_string();
        let task = tokio::spawn(async move { source.load_document(&abbr).await });
        self.fetch = Some((abbreviation.to_string(), task));
    }

    /// Sweep the in-flight fetch, installing or reporting its result once
    /// the task has finished. Aborted tasks resolve as cancelled and are
    /// dropped silently.
    pub async fn poll_fetch(&mut self) {
        let finished = matches!(&self.fetch, Some((_, task)) if task.is_finished());
        if !finished {
            return;
        }

        if let Some((abbreviation, task)) = self.fetch.take() {
            match task.await {
                Ok(Ok(document)) => self.install_document(&abbreviation, document),
                Ok(Err(err)) => self.fetch_failed(&abbreviation, &format!("{err:#}")),
                Err(err) if err.is_cancelled() => {}
                Err(err) => self.fetch_failed(&abbreviation, &err.to_string()),
            }
        }
    }

    pub fn is_fetching(&self) -> bool {
        self.fetch.is_some()
    }

    /// Install a document and point the view at its first book, chapter 1.
    /// The reset happens on every install, switching back to a cached
    /// translation included. A result for a translation the reader has
    /// already moved away from only lands in the cache.
    pub fn install_document(&mut self, abbreviation: &str, document: BibleDocument) {
        self.document_cache
            .insert(abbreviation.to_string(), document.clone());

        if self.selected_translation.as_deref() != Some(abbreviation) {
            return;
        }

        self.fetch_error = None;
        self.selected_book = document.books.first().map(|b| b.name.clone());
        self.selected_chapter = 1;
        self.document = Some(document);
        self.document_abbreviation = Some(abbreviation.to_string());

        self.nav_level = NavLevel::Books;
        self.content_scroll = 0;
        self.selected_verse_idx = None;
        self.refresh_derived();
        self.sync_nav_cursors();
    }

    /// Record a failed fetch. The previous document is cleared so the view
    /// shows the error instead of keeping stale content under the newly
    /// selected translation's name.
    pub fn fetch_failed(&mut self, abbreviation: &str, message: &str) {
        if self.selected_translation.as_deref() != Some(abbreviation) {
            return;
        }
        self.fetch_error = Some(message.to_string());
        self.document = None;
        self.document_abbreviation = None;
        self.selected_book = None;
        self.selected_chapter = 1;
        self.nav_level = NavLevel::Books;
        self.content_scroll = 0;
        self.selected_verse_idx = None;
        self.refresh_derived();
        self.sync_nav_cursors();
    }

    /// Commit a book selection. Unknown names are ignored; a successful
    /// selection always resets the chapter to 1, re-selecting the current
    /// book included.
    pub fn select_book(&mut self, name: &str) {
        let resolved = match self.document.as_ref().and_then(|d| d.book(name)) {
            Some(book) => book.name.clone(),
            None => return,
        };

        self.selected_book = Some(resolved);
        self.selected_chapter = 1;
        self.content_scroll = 0;
        self.selected_verse_idx = None;
        self.refresh_derived();
        self.sync_nav_cursors();
    }

    /// Commit a chapter selection. The number is stored as-is; a chapter
    /// the current book does not have simply derives an empty verse list.
    pub fn select_chapter(&mut self, chapter: u32) {
        self.selected_chapter = chapter;
        self.content_scroll = 0;
        self.selected_verse_idx = None;
        self.refresh_derived();
        self.sync_nav_cursors();
    }

    /// Rebuild every derived list from the installed document and the
    /// committed selection in one place, so the panes can never drift
    /// from the state they claim to show.
    fn refresh_derived(&mut self) {
        match &self.document {
            Some(document) => {
                self.cached_books = document.book_names();
                match &self.selected_book {
                    Some(book) => {
                        self.cached_chapters = document.chapters_for_book(book);
                        self.cached_verses = document
                            .verses_for_chapter(book, self.selected_chapter)
                            .to_vec();
                    }
                    None => {
                        self.cached_chapters.clear();
                        self.cached_verses.clear();
                    }
                }
            }
            None => {
                self.cached_books.clear();
                self.cached_chapters.clear();
                self.cached_verses.clear();
            }
        }
    }

    fn sync_nav_cursors(&mut self) {
        let book_idx = self
            .selected_book
            .as_ref()
            .and_then(|name| self.cached_books.iter().position(|b| b == name));
        self.book_state.select(book_idx);

        let chapter_idx = self
            .cached_chapters
            .iter()
            .position(|&c| c == self.selected_chapter);
        self.chapter_state.select(chapter_idx);
    }

    // Navigation actions
    pub fn nav_down(&mut self) {
        match self.nav_level {
            NavLevel::Books => {
                let len = self.cached_books.len();
                if len > 0 {
                    let i = self.book_state.selected().unwrap_or(0);
                    self.book_state.select(Some((i + 1).min(len - 1)));
                }
            }
            NavLevel::Chapters => {
                let len = self.cached_chapters.len();
                if len > 0 {
                    let i = self.chapter_state.selected().unwrap_or(0);
                    let new_index = (i + 1).min(len - 1);
                    if let Some(&chapter) = self.cached_chapters.get(new_index) {
                        self.select_chapter(chapter);
                    }
                }
            }
        }
    }

    pub fn nav_up(&mut self) {
        match self.nav_level {
            NavLevel::Books => {
                let i = self.book_state.selected().unwrap_or(0);
                self.book_state.select(Some(i.saturating_sub(1)));
            }
            NavLevel::Chapters => {
                let i = self.chapter_state.selected().unwrap_or(0);
                if let Some(&chapter) = self.cached_chapters.get(i.saturating_sub(1)) {
                    self.select_chapter(chapter);
                }
            }
        }
    }

    /// Descend one navigation level. From the book list this commits the
    /// highlighted book and resets to chapter 1; at the chapter list,
    /// where movement already commits, Enter focuses the content pane.
    pub fn nav_enter(&mut self) {
        match self.nav_level {
            NavLevel::Books => {
                let name = self
                    .book_state
                    .selected()
                    .and_then(|i| self.cached_books.get(i).cloned());
                if let Some(name) = name {
                    self.select_book(&name);
                    self.nav_level = NavLevel::Chapters;
                }
            }
            NavLevel::Chapters => {
                self.focus = FocusPane::Content;
                if self.selected_verse_idx.is_none() && !self.cached_verses.is_empty() {
                    self.selected_verse_idx = Some(0);
                }
            }
        }
    }

    /// Ascend one navigation level, keeping the committed selection.
    pub fn nav_back(&mut self) {
        if self.nav_level == NavLevel::Chapters {
            self.nav_level = NavLevel::Books;
        }
    }

    pub fn nav_first(&mut self) {
        match self.nav_level {
            NavLevel::Books => self.book_state.select(Some(0)),
            NavLevel::Chapters => {
                if let Some(&chapter) = self.cached_chapters.first() {
                    self.select_chapter(chapter);
                }
            }
        }
    }

    pub fn nav_last(&mut self) {
        match self.nav_level {
            NavLevel::Books => {
                let len = self.cached_books.len();
                if len > 0 {
                    self.book_state.select(Some(len - 1));
                }
            }
            NavLevel::Chapters => {
                if let Some(&chapter) = self.cached_chapters.last() {
                    self.select_chapter(chapter);
                }
            }
        }
    }

    /// Page to the next chapter of the current book, clamped at the end.
    /// From a chapter the book does not have, paging lands on the first.
    pub fn next_chapter(&mut self) {
        let position = self
            .cached_chapters
            .iter()
            .position(|&c| c == self.selected_chapter);
        let next = match position {
            Some(i) => self.cached_chapters.get(i + 1).copied(),
            None => self.cached_chapters.first().copied(),
        };
        if let Some(chapter) = next {
            self.select_chapter(chapter);
        }
    }

    pub fn prev_chapter(&mut self) {
        let position = self
            .cached_chapters
            .iter()
            .position(|&c| c == self.selected_chapter);
        match position {
            Some(i) if i > 0 => {
                if let Some(&chapter) = self.cached_chapters.get(i - 1) {
                    self.select_chapter(chapter);
                }
            }
            Some(_) => {}
            None => {
                if let Some(&chapter) = self.cached_chapters.first() {
                    self.select_chapter(chapter);
                }
            }
        }
    }

    // Content scrolling
    pub fn scroll_down(&mut self) {
        if self.content_scroll < self.total_content_lines.saturating_sub(self.content_height) {
            self.content_scroll = self.content_scroll.saturating_add(1);
        }
    }

    pub fn scroll_up(&mut self) {
        self.content_scroll = self.content_scroll.saturating_sub(1);
    }

    pub fn scroll_half_page_down(&mut self) {
        let half_page = self.content_height / 2;
        let max_scroll = self.total_content_lines.saturating_sub(self.content_height);
        self.content_scroll = (self.content_scroll + half_page).min(max_scroll);
    }

    pub fn scroll_half_page_up(&mut self) {
        let half_page = self.content_height / 2;
        self.content_scroll = self.content_scroll.saturating_sub(half_page);
    }

    // Verse selection methods
    pub fn select_next_verse(&mut self) {
        let len = self.cached_verses.len();
        if len > 0 {
            let next = match self.selected_verse_idx {
                Some(i) => (i + 1).min(len - 1),
                None => 0,
            };
            self.selected_verse_idx = Some(next);
            self.scroll_to_selected_verse();
        }
    }

    pub fn select_prev_verse(&mut self) {
        if let Some(current) = self.selected_verse_idx {
            self.selected_verse_idx = Some(current.saturating_sub(1));
            self.scroll_to_selected_verse();
        } else if !self.cached_verses.is_empty() {
            self.selected_verse_idx = Some(0);
        }
    }

    pub fn get_selected_verse(&self) -> Option<&Verse> {
        self.selected_verse_idx.and_then(|idx| self.cached_verses.get(idx))
    }

    fn scroll_to_selected_verse(&mut self) {
        if let Some(idx) = self.selected_verse_idx {
            // Use the rendered pane width for wrap estimates, default to 40
            // before the first frame
            let wrap_width = if self.content_width > 0 {
                self.content_width as usize
            } else {
                40
            };
            let mut verse_start_line = 0u16;

            for (i, verse) in self.cached_verses.iter().enumerate() {
                // Use character count, not byte length, for proper UTF-8 handling
                let text_lines = (verse.text.chars().count() / wrap_width + 1) as u16;
                let verse_end_line = verse_start_line + text_lines;

                if i == idx {
                    // Check if verse is above visible area
                    if verse_start_line < self.content_scroll {
                        self.content_scroll = verse_start_line;
                    }
                    // Check if verse is below visible area
                    else if verse_end_line > self.content_scroll + self.content_height {
                        self.content_scroll = verse_end_line.saturating_sub(self.content_height);
                    }
                    break;
                }

                verse_start_line = verse_end_line + 1; // +1 for blank line between verses
            }
        }
    }

    // Search
    pub fn perform_search(&mut self) {
        if self.search_input.is_empty() {
            return;
        }
        self.search_results = match &self.document {
            Some(document) => document.search(&self.search_input, 50),
            None => Vec::new(),
        };
        if self.search_results.is_empty() {
            self.search_state.select(None);
        } else {
            self.search_state.select(Some(0));
        }
    }

    pub fn search_nav_down(&mut self) {
        let len = self.search_results.len();
        if len > 0 {
            let i = self.search_state.selected().unwrap_or(0);
            self.search_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn search_nav_up(&mut self) {
        let i = self.search_state.selected().unwrap_or(0);
        self.search_state.select(Some(i.saturating_sub(1)));
    }

    /// Jump the read screen to a search hit and park the verse cursor on it.
    /// A fetch can land while the search screen is up, so the hit is checked
    /// against the installed document first; one that no longer resolves is
    /// ignored like any other lookup miss.
    pub fn jump_to_hit(&mut self, hit: &SearchHit) {
        let valid = self
            .document
            .as_ref()
            .and_then(|d| d.book(&hit.book))
            .map(|b| b.chapters.iter().any(|c| c.chapter == hit.chapter))
            .unwrap_or(false);
        if !valid {
            return;
        }

        self.select_book(&hit.book);
        self.select_chapter(hit.chapter);
        self.nav_level = NavLevel::Chapters;
        self.screen = Screen::Read;
        self.focus = FocusPane::Content;
        if let Some(idx) = self.cached_verses.iter().position(|v| v.verse == hit.verse) {
            self.selected_verse_idx = Some(idx);
            self.scroll_to_selected_verse();
        }
    }

    /// Apply a typed reference like "gen 3:15". Anything unparseable, or
    /// pointing at a book or chapter the document does not have, is
    /// ignored like any other lookup miss.
    pub fn goto_reference(&mut self, input: &str) {
        let reference = match Reference::parse(input) {
            Some(r) => r,
            None => return,
        };
        let book = match self
            .document
            .as_ref()
            .and_then(|d| d.resolve_book(&reference.book))
        {
            Some(name) => name.to_string(),
            None => return,
        };
        let has_chapter = self
            .document
            .as_ref()
            .map(|d| d.chapters_for_book(&book).contains(&reference.chapter))
            .unwrap_or(false);
        if !has_chapter {
            return;
        }

        self.select_book(&book);
        self.select_chapter(reference.chapter);
        self.nav_level = NavLevel::Chapters;
        self.screen = Screen::Read;
        self.focus = FocusPane::Content;
        if let Some(verse) = reference.verse {
            if let Some(idx) = self.cached_verses.iter().position(|v| v.verse == verse) {
                self.selected_verse_idx = Some(idx);
                self.scroll_to_selected_verse();
            }
        }
    }

    // Translation picker methods
    pub fn open_translation_picker(&mut self) {
        if self.translations.is_empty() {
            return;
        }
        let current = self
            .selected_translation
            .as_deref()
            .and_then(|abbr| {
                self.translations
                    .iter()
                    .position(|t| t.abbreviation == abbr)
            })
            .unwrap_or(0);
        self.translation_state.select(Some(current));
        self.show_translation_picker = true;
    }

    pub fn translation_nav_down(&mut self) {
        let len = self.translations.len();
        if len > 0 {
            let i = self.translation_state.selected().unwrap_or(0);
            self.translation_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn translation_nav_up(&mut self) {
        let i = self.translation_state.selected().unwrap_or(0);
        self.translation_state.select(Some(i.saturating_sub(1)));
    }

    /// Accept the highlighted translation and remember it for next time.
    pub fn confirm_translation(&mut self) {
        let abbreviation = self
            .translation_state
            .selected()
            .and_then(|i| self.translations.get(i))
            .map(|t| t.abbreviation.clone());
        self.show_translation_picker = false;
        if let Some(abbreviation) = abbreviation {
            let _ = Config::save_translation(&abbreviation);
            self.select_translation(&abbreviation);
        }
    }

    // Title helpers
    pub fn nav_title(&self) -> String {
        match self.nav_level {
            NavLevel::Books => "Books".to_string(),
            NavLevel::Chapters => self.selected_book.clone().unwrap_or_default(),
        }
    }

    pub fn content_title(&self) -> String {
        match &self.selected_book {
            Some(book) => format!("{} {}", book, self.selected_chapter),
            None => String::new(),
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.fetch.is_some() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bible::{Book, Chapter};
    use std::path::PathBuf;
    use std::time::Duration;

    fn translation(abbreviation: &str, description: &str) -> Translation {
        Translation {
            abbreviation: abbreviation.to_string(),
            description: description.to_string(),
            distribution_versification: String::new(),
        }
    }

    fn verse(number: u32, text: &str) -> Verse {
        Verse {
            verse: number,
            text: text.to_string(),
        }
    }

    fn chapter(number: u32, verse_count: u32) -> Chapter {
        Chapter {
            chapter: number,
            verses: (1..=verse_count)
                .map(|v| verse(v, &format!("Verse {v} of chapter {number}")))
                .collect(),
        }
    }

    fn kjv_document() -> BibleDocument {
        BibleDocument {
            books: vec![
                Book {
                    name: "Genesis".to_string(),
                    chapters: vec![chapter(1, 3), chapter(2, 2), chapter(3, 4)],
                },
                Book {
                    name: "Exodus".to_string(),
                    chapters: vec![chapter(1, 2), chapter(2, 1)],
                },
            ],
        }
    }

    fn esv_document() -> BibleDocument {
        BibleDocument {
            books: vec![Book {
                name: "Matthew".to_string(),
                chapters: vec![chapter(1, 2)],
            }],
        }
    }

    fn unused_source() -> DocumentSource {
        DocumentSource::Dir(PathBuf::from("/nonexistent"))
    }

    fn test_app() -> App {
        let translations = vec![
            translation("kjv", "King James Version"),
            translation("esv", "English Standard Version"),
        ];
        let mut app = App::new(translations, None, unused_source());
        app.install_document("kjv", kjv_document());
        app
    }

    async fn wait_for_fetch(app: &mut App) {
        for _ in 0..100 {
            app.poll_fetch().await;
            if app.fetch.is_none() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("fetch did not finish in time");
    }

    #[test]
    fn new_prefers_the_configured_translation() {
        let translations = vec![translation("kjv", "KJV"), translation("esv", "ESV")];
        let app = App::new(translations.clone(), Some("esv"), unused_source());
        assert_eq!(app.selected_translation.as_deref(), Some("esv"));

        let fallback = App::new(translations.clone(), Some("nope"), unused_source());
        assert_eq!(fallback.selected_translation.as_deref(), Some("kjv"));

        let first = App::new(translations, None, unused_source());
        assert_eq!(first.selected_translation.as_deref(), Some("kjv"));
    }

    #[test]
    fn install_document_lands_on_first_book_chapter_one() {
        let app = test_app();
        assert_eq!(app.selected_book.as_deref(), Some("Genesis"));
        assert_eq!(app.selected_chapter, 1);
        assert_eq!(app.cached_books, vec!["Genesis", "Exodus"]);
        assert_eq!(app.cached_chapters, vec![1, 2, 3]);
        assert_eq!(app.cached_verses.len(), 3);
        assert_eq!(app.book_state.selected(), Some(0));
        assert_eq!(app.chapter_state.selected(), Some(0));
    }

    #[test]
    fn install_document_tolerates_an_empty_document() {
        let mut app = test_app();
        app.install_document("kjv", BibleDocument { books: Vec::new() });
        assert_eq!(app.selected_book, None);
        assert!(app.cached_books.is_empty());
        assert!(app.cached_chapters.is_empty());
        assert!(app.cached_verses.is_empty());
        assert_eq!(app.book_state.selected(), None);
    }

    #[test]
    fn select_book_resets_chapter_to_one() {
        let mut app = test_app();
        app.select_chapter(3);
        assert_eq!(app.selected_chapter, 3);

        app.select_book("Exodus");
        assert_eq!(app.selected_book.as_deref(), Some("Exodus"));
        assert_eq!(app.selected_chapter, 1);
        assert_eq!(app.cached_chapters, vec![1, 2]);
    }

    #[test]
    fn reselecting_the_current_book_still_resets_the_chapter() {
        let mut app = test_app();
        app.select_chapter(2);
        app.select_book("Genesis");
        assert_eq!(app.selected_chapter, 1);
    }

    #[test]
    fn select_book_ignores_unknown_names() {
        let mut app = test_app();
        app.select_chapter(2);
        app.select_book("Leviticus");
        assert_eq!(app.selected_book.as_deref(), Some("Genesis"));
        assert_eq!(app.selected_chapter, 2);
    }

    #[test]
    fn selecting_the_same_chapter_twice_is_stable() {
        let mut app = test_app();
        app.select_chapter(2);
        let verses = app.cached_verses.clone();
        app.select_chapter(2);
        assert_eq!(app.selected_chapter, 2);
        assert_eq!(app.cached_verses, verses);
    }

    #[test]
    fn out_of_range_chapter_derives_an_empty_verse_list() {
        let mut app = test_app();
        app.select_chapter(99);
        assert_eq!(app.selected_chapter, 99);
        assert!(app.cached_verses.is_empty());
        assert_eq!(app.chapter_state.selected(), None);

        // Valid chapters keep working afterwards
        app.select_chapter(2);
        assert_eq!(app.cached_verses.len(), 2);
    }

    #[test]
    fn nav_enter_commits_the_highlighted_book() {
        let mut app = test_app();
        app.nav_down();
        assert_eq!(app.selected_book.as_deref(), Some("Genesis"));

        app.nav_enter();
        assert_eq!(app.selected_book.as_deref(), Some("Exodus"));
        assert_eq!(app.selected_chapter, 1);
        assert_eq!(app.nav_level, NavLevel::Chapters);
    }

    #[test]
    fn chapter_cursor_movement_commits_immediately() {
        let mut app = test_app();
        app.nav_enter();
        app.nav_down();
        assert_eq!(app.selected_chapter, 2);
        app.nav_down();
        assert_eq!(app.selected_chapter, 3);
        app.nav_down();
        assert_eq!(app.selected_chapter, 3);
        app.nav_up();
        assert_eq!(app.selected_chapter, 2);
    }

    #[test]
    fn nav_back_keeps_the_committed_selection() {
        let mut app = test_app();
        app.nav_enter();
        app.nav_down();
        app.nav_back();
        assert_eq!(app.nav_level, NavLevel::Books);
        assert_eq!(app.selected_book.as_deref(), Some("Genesis"));
        assert_eq!(app.selected_chapter, 2);
        assert_eq!(app.book_state.selected(), Some(0));
    }

    #[test]
    fn chapter_paging_clamps_at_the_ends() {
        let mut app = test_app();
        app.prev_chapter();
        assert_eq!(app.selected_chapter, 1);
        app.next_chapter();
        app.next_chapter();
        assert_eq!(app.selected_chapter, 3);
        app.next_chapter();
        assert_eq!(app.selected_chapter, 3);
        app.prev_chapter();
        assert_eq!(app.selected_chapter, 2);
    }

    #[test]
    fn chapter_paging_recovers_from_an_out_of_range_chapter() {
        let mut app = test_app();
        app.select_chapter(99);
        app.next_chapter();
        assert_eq!(app.selected_chapter, 1);
    }

    #[test]
    fn goto_reference_jumps_and_selects_the_verse() {
        let mut app = test_app();
        app.goto_reference("exo 2:1");
        assert_eq!(app.selected_book.as_deref(), Some("Exodus"));
        assert_eq!(app.selected_chapter, 2);
        assert_eq!(app.selected_verse_idx, Some(0));
        assert_eq!(app.screen, Screen::Read);
        assert_eq!(app.focus, FocusPane::Content);
    }

    #[test]
    fn goto_reference_ignores_misses() {
        let mut app = test_app();
        app.goto_reference("Leviticus 1");
        assert_eq!(app.selected_book.as_deref(), Some("Genesis"));

        app.goto_reference("Genesis 99");
        assert_eq!(app.selected_chapter, 1);

        app.goto_reference("not a reference");
        assert_eq!(app.selected_book.as_deref(), Some("Genesis"));
    }

    #[test]
    fn search_populates_results_and_jump_lands_on_the_hit() {
        let mut app = test_app();
        app.search_input = "chapter 3".to_string();
        app.perform_search();
        assert!(!app.search_results.is_empty());
        assert_eq!(app.search_state.selected(), Some(0));

        let hit = app.search_results[0].clone();
        app.jump_to_hit(&hit);
        assert_eq!(app.selected_book.as_deref(), Some(hit.book.as_str()));
        assert_eq!(app.selected_chapter, hit.chapter);
        let selected = app.get_selected_verse().map(|v| v.verse);
        assert_eq!(selected, Some(hit.verse));
    }

    #[test]
    fn search_with_no_document_yields_nothing() {
        let mut app = App::new(vec![translation("kjv", "KJV")], None, unused_source());
        app.search_input = "beginning".to_string();
        app.perform_search();
        assert!(app.search_results.is_empty());
        assert_eq!(app.search_state.selected(), None);
    }

    #[tokio::test]
    async fn jump_ignores_hits_from_a_replaced_document() {
        let mut app = test_app();
        app.search_input = "chapter 2".to_string();
        app.perform_search();
        let hit = app
            .search_results
            .iter()
            .find(|h| h.book == "Exodus")
            .cloned()
            .unwrap();

        // The document changes under the open results
        app.install_document("esv", esv_document());
        app.select_translation("esv");
        app.screen = Screen::Search;

        app.jump_to_hit(&hit);
        assert_eq!(app.selected_book.as_deref(), Some("Matthew"));
        assert_eq!(app.selected_chapter, 1);
        assert_eq!(app.screen, Screen::Search);

        // Same-named book, chapter out of range: just as stale
        let stale = SearchHit {
            book: "Matthew".to_string(),
            chapter: 99,
            verse: 1,
            text: String::new(),
        };
        app.jump_to_hit(&stale);
        assert_eq!(app.selected_chapter, 1);
        assert_eq!(app.screen, Screen::Search);
    }

    #[test]
    fn verse_cursor_clamps_to_the_chapter() {
        let mut app = test_app();
        app.select_next_verse();
        assert_eq!(app.selected_verse_idx, Some(0));
        app.select_next_verse();
        app.select_next_verse();
        app.select_next_verse();
        assert_eq!(app.selected_verse_idx, Some(2));
        app.select_prev_verse();
        assert_eq!(app.selected_verse_idx, Some(1));
    }

    #[test]
    fn translation_picker_starts_on_the_current_translation() {
        let mut app = test_app();
        app.open_translation_picker();
        assert!(app.show_translation_picker);
        assert_eq!(app.translation_state.selected(), Some(0));

        app.translation_nav_down();
        assert_eq!(app.translation_state.selected(), Some(1));
        app.translation_nav_down();
        assert_eq!(app.translation_state.selected(), Some(1));
    }

    #[tokio::test]
    async fn switching_translations_resets_the_view() {
        let mut app = test_app();
        app.select_book("Exodus");
        app.select_chapter(2);

        app.install_document("esv", esv_document());
        // Not the selected translation yet, so only the cache changes
        assert_eq!(app.selected_book.as_deref(), Some("Exodus"));

        app.select_translation("esv");
        assert_eq!(app.selected_translation.as_deref(), Some("esv"));
        assert_eq!(app.selected_book.as_deref(), Some("Matthew"));
        assert_eq!(app.selected_chapter, 1);
        assert!(app.fetch.is_none(), "cached translation must not refetch");
    }

    #[tokio::test]
    async fn reselecting_the_current_translation_is_a_no_op() {
        let mut app = test_app();
        app.select_book("Exodus");
        app.select_translation("kjv");
        assert_eq!(app.selected_book.as_deref(), Some("Exodus"));
        assert!(app.fetch.is_none());
    }

    #[tokio::test]
    async fn unknown_translation_is_ignored() {
        let mut app = test_app();
        app.select_translation("nope");
        assert_eq!(app.selected_translation.as_deref(), Some("kjv"));
        assert!(app.fetch.is_none());
    }

    #[tokio::test]
    async fn stale_document_stays_visible_while_fetching() {
        let mut app = test_app();
        app.select_translation("esv");
        assert!(app.is_fetching());
        // The old document keeps rendering until the new one lands
        assert_eq!(app.document_abbreviation.as_deref(), Some("kjv"));
        assert_eq!(app.cached_books, vec!["Genesis", "Exodus"]);
    }

    #[tokio::test]
    async fn fetch_failure_surfaces_an_error_and_repicking_retries() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(
            vec![translation("kjv", "KJV"), translation("esv", "ESV")],
            None,
            DocumentSource::Dir(dir.path().to_path_buf()),
        );
        app.install_document("kjv", kjv_document());

        // Nothing on disk for esv, so the fetch fails
        app.select_translation("esv");
        assert!(app.is_fetching());
        wait_for_fetch(&mut app).await;
        assert!(app.fetch_error.is_some());
        assert!(app.document.is_none());
        assert!(app.cached_books.is_empty());

        // Re-picking the failed translation retries instead of no-opping
        let json = serde_json::to_string(&esv_document()).unwrap();
        std::fs::write(dir.path().join("esv.json"), json).unwrap();
        app.select_translation("esv");
        assert!(app.is_fetching());
        wait_for_fetch(&mut app).await;
        assert!(app.fetch_error.is_none());
        assert_eq!(app.selected_book.as_deref(), Some("Matthew"));
    }

    #[tokio::test]
    async fn latest_translation_pick_wins() {
        let dir = tempfile::tempdir().unwrap();
        let kjv_json = serde_json::to_string(&kjv_document()).unwrap();
        let esv_json = serde_json::to_string(&esv_document()).unwrap();
        std::fs::write(dir.path().join("kjv.json"), kjv_json).unwrap();
        std::fs::write(dir.path().join("esv.json"), esv_json).unwrap();

        let mut app = App::new(
            vec![
                translation("kjv", "KJV"),
                translation("esv", "ESV"),
                translation("web", "WEB"),
            ],
            None,
            DocumentSource::Dir(dir.path().to_path_buf()),
        );

        app.select_translation("esv");
        app.select_translation("web");
        app.select_translation("esv");
        let pending = app.fetch.as_ref().map(|(abbr, _)| abbr.clone());
        assert_eq!(pending.as_deref(), Some("esv"));

        wait_for_fetch(&mut app).await;
        assert_eq!(app.document_abbreviation.as_deref(), Some("esv"));
        assert_eq!(app.selected_book.as_deref(), Some("Matthew"));
    }
}
