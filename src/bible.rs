use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Translation {
    pub abbreviation: String,
    pub description: String,
    #[serde(default)]
    pub distribution_versification: String,
}

/// One translation's full text, as served per abbreviation: books in
/// canonical order, each with its chapters, each with its verses.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct BibleDocument {
    #[serde(default)]
    pub books: Vec<Book>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Book {
    pub name: String,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Chapter {
    pub chapter: u32,
    #[serde(default)]
    pub verses: Vec<Verse>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Verse {
    pub verse: u32,
    pub text: String,
}

/// A single search match, flattened out of the nested document.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub book: String,
    pub chapter: u32,
    pub verse: u32,
    pub text: String,
}

impl SearchHit {
    pub fn reference(&self) -> String {
        format!("{} {}:{}", self.book, self.chapter, self.verse)
    }
}

impl BibleDocument {
    pub async fn load_from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let document: BibleDocument = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(document)
    }

    pub fn book(&self, name: &str) -> Option<&Book> {
        self.books.iter().find(|b| b.name == name)
    }

    pub fn book_names(&self) -> Vec<String> {
        self.books.iter().map(|b| b.name.clone()).collect()
    }

    pub fn chapters_for_book(&self, name: &str) -> Vec<u32> {
        self.book(name)
            .map(|b| b.chapters.iter().map(|c| c.chapter).collect())
            .unwrap_or_default()
    }

    /// Verses of (book, chapter) in stored order. Empty for any pair the
    /// document does not contain, including out-of-range chapter numbers.
    pub fn verses_for_chapter(&self, name: &str, chapter: u32) -> &[Verse] {
        self.book(name)
            .and_then(|b| b.chapters.iter().find(|c| c.chapter == chapter))
            .map(|c| c.verses.as_slice())
            .unwrap_or(&[])
    }

    /// Match a user-typed book name: exact (case-insensitive) first, then
    /// the first book whose name starts with the query.
    pub fn resolve_book(&self, query: &str) -> Option<&str> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        if let Some(book) = self.books.iter().find(|b| b.name.eq_ignore_ascii_case(query)) {
            return Some(&book.name);
        }
        let query_lower = query.to_lowercase();
        self.books
            .iter()
            .find(|b| b.name.to_lowercase().starts_with(&query_lower))
            .map(|b| b.name.as_str())
    }

    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        let query_lower = query.to_lowercase();
        let mut hits = Vec::new();

        for book in &self.books {
            let book_matches = book.name.to_lowercase().contains(&query_lower);
            for chapter in &book.chapters {
                for verse in &chapter.verses {
                    if book_matches || verse.text.to_lowercase().contains(&query_lower) {
                        hits.push(SearchHit {
                            book: book.name.clone(),
                            chapter: chapter.chapter,
                            verse: verse.verse,
                            text: verse.text.clone(),
                        });
                        if hits.len() >= limit {
                            return hits;
                        }
                    }
                }
            }
        }

        hits
    }
}

/// A parsed "Book 3" / "Book 3:16" reference. The book part is resolved
/// against a document separately, so "gen 1:1" can match "Genesis".
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub book: String,
    pub chapter: u32,
    pub verse: Option<u32>,
}

impl Reference {
    pub fn parse(input: &str) -> Option<Self> {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let re = PATTERN.get_or_init(|| {
            Regex::new(r"^\s*(\d?\s*[A-Za-z][A-Za-z .'-]*?)\s+(\d+)(?:[:.](\d+))?\s*$")
                .expect("valid reference pattern")
        });

        let caps = re.captures(input)?;
        let book = caps[1].trim().to_string();
        let chapter = caps[2].parse().ok()?;
        let verse = caps.get(3).and_then(|m| m.as_str().parse().ok());
        Some(Self { book, chapter, verse })
    }
}

// The translations index is published either as an ordered array or as a
// map keyed by abbreviation. A map is flattened in key order.
#[derive(Deserialize)]
#[serde(untagged)]
enum TranslationsFile {
    List(Vec<Translation>),
    Map(BTreeMap<String, Translation>),
}

pub fn parse_translations(json: &str) -> Result<Vec<Translation>> {
    let file: TranslationsFile =
        serde_json::from_str(json).context("malformed translations index")?;
    Ok(match file {
        TranslationsFile::List(list) => list,
        TranslationsFile::Map(map) => map.into_values().collect(),
    })
}
