//! In-memory scripture index built from a flat CSV corpus.
//!
//! The corpus has one row per verse with the columns `CanonBookName`,
//! `CanonBookChapter`, `CanonChapterVerse`, `Version` and `Text`. Loading
//! produces a verse lookup, per-chapter verse counts, the books present in
//! canonical order, and the sorted set of versions.

mod canon;

pub use canon::{CANONICAL_ORDER, UNKNOWN_BOOK_ORDER, canon_book, canonical_order};

use std::collections::{BTreeSet, HashMap};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::types::{CanonBook, CanonChapter};

/// Version label used for rows with a blank `Version` column.
pub const DEFAULT_VERSION: &str = "KJV";

#[derive(Debug, Deserialize)]
struct ScriptureRow {
    #[serde(rename = "CanonBookName")]
    book: String,
    #[serde(rename = "CanonBookChapter")]
    chapter: u32,
    #[serde(rename = "CanonChapterVerse")]
    verse: u32,
    #[serde(rename = "Version", default)]
    version: Option<String>,
    #[serde(rename = "Text", default)]
    text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct VerseKey {
    book: String,
    chapter: u32,
    version: String,
    verse: u32,
}

#[derive(Debug, Default)]
pub struct ScriptureIndex {
    verses: HashMap<VerseKey, String>,
    chapter_counts: HashMap<(String, u32), u32>,
    books: Vec<CanonBook>,
    versions: Vec<String>,
}

impl ScriptureIndex {
    /// Loads the corpus at `path`. A missing file yields an empty index.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!("Scripture source {} not found; serving an empty index", path.display());
            return Ok(Self::default());
        }

        let file = std::fs::File::open(path)?;
        let index = Self::from_reader(file)?;
        info!(
            "Loaded {} verses across {} books and {} versions from {}",
            index.verses.len(),
            index.books.len(),
            index.versions.len(),
            path.display()
        );
        Ok(index)
    }

    /// Builds an index from CSV data with a header row.
    /// Rows that fail to parse are skipped; I/O failures are returned.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut verses = HashMap::new();
        let mut chapter_counts: HashMap<(String, u32), u32> = HashMap::new();
        let mut versions = BTreeSet::new();
        let mut seen_books = BTreeSet::new();

        for (line, result) in csv_reader.deserialize::<ScriptureRow>().enumerate() {
            let row = match result {
                Ok(row) => row,
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => {
                    warn!("Skipping scripture row {}: {e}", line + 2);
                    continue;
                }
            };

            let version = row
                .version
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_VERSION.to_string());

            let key = VerseKey {
                book: row.book.clone(),
                chapter: row.chapter,
                version: version.clone(),
                verse: row.verse,
            };
            if verses
                .insert(key, row.text.unwrap_or_default())
                .is_some()
            {
                debug!(
                    "Duplicate verse {} {}:{} ({version}); keeping the later row",
                    row.book, row.chapter, row.verse
                );
            }

            let max = chapter_counts
                .entry((row.book.clone(), row.chapter))
                .or_insert(0);
            *max = (*max).max(row.verse);

            versions.insert(version);
            seen_books.insert(row.book);
        }

        let mut books: Vec<CanonBook> = seen_books.iter().map(|b| canon_book(b)).collect();
        books.sort_by_key(|b| b.canonical_order);

        Ok(Self {
            verses,
            chapter_counts,
            books,
            versions: versions.into_iter().collect(),
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.verses.is_empty()
    }

    /// Sorted, de-duplicated version labels. Empty when nothing was loaded.
    #[must_use]
    pub fn versions(&self) -> &[String] {
        &self.versions
    }

    /// Books present in the corpus, in canonical order.
    #[must_use]
    pub fn books(&self) -> &[CanonBook] {
        &self.books
    }

    /// Highest verse number seen for a chapter across all versions; 0 if unknown.
    #[must_use]
    pub fn chapter_count(&self, book: &str, chapter: u32) -> u32 {
        self.chapter_counts
            .get(&(book.to_string(), chapter))
            .copied()
            .unwrap_or(0)
    }

    /// Chapters of a book with their verse counts, ordered by chapter number.
    #[must_use]
    pub fn chapters_of(&self, book: &str) -> Vec<CanonChapter> {
        let mut chapters: Vec<CanonChapter> = self
            .chapter_counts
            .iter()
            .filter(|((name, _), _)| name == book)
            .map(|((name, chapter), count)| CanonChapter {
                book_name: name.clone(),
                chapter: *chapter,
                verse_count: *count,
            })
            .collect();
        chapters.sort_by_key(|c| c.chapter);
        chapters
    }

    /// Text of verses `start..=end`, each prefixed with its number and joined
    /// by spaces. Returns `None` if any verse in the range is missing; a
    /// partial passage is never produced.
    #[must_use]
    pub fn passage_text(
        &self,
        book: &str,
        chapter: u32,
        start: u32,
        end: u32,
        version: &str,
    ) -> Option<String> {
        if start == 0 || end < start {
            return None;
        }

        let mut key = VerseKey {
            book: book.to_string(),
            chapter,
            version: version.to_string(),
            verse: start,
        };

        let mut parts = Vec::new();
        for verse in start..=end {
            key.verse = verse;
            let text = self.verses.get(&key)?;
            parts.push(format!("{verse} {text}").trim().to_string());
        }
        Some(parts.join(" "))
    }
}

/// Process-wide scripture index, built on first use and never reloaded.
///
/// Concurrent first callers block on the same build; every later call returns
/// the cached index.
pub struct SharedScripture {
    path: PathBuf,
    index: OnceLock<ScriptureIndex>,
}

impl SharedScripture {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            index: OnceLock::new(),
        }
    }

    /// Wraps an already-built index.
    #[must_use]
    pub fn preloaded(index: ScriptureIndex) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(index);
        Self {
            path: PathBuf::new(),
            index: cell,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.index.get().is_some()
    }

    pub fn get(&self) -> &ScriptureIndex {
        self.index.get_or_init(|| {
            ScriptureIndex::load(&self.path).unwrap_or_else(|e| {
                tracing::error!(
                    "Failed to load scripture from {}: {e}",
                    self.path.display()
                );
                ScriptureIndex::default()
            })
        })
    }
}
