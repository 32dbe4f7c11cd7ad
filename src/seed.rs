use tracing::info;

use crate::error::Result;
use crate::scripture::{DEFAULT_VERSION, ScriptureIndex};
use crate::store::Store;
use crate::types::Bible;

/// Bible every new account is granted access to.
pub const DEFAULT_BIBLE_ID: i64 = 1;

#[derive(Debug, Clone)]
pub struct DefaultBible {
    pub name: String,
    pub language: String,
}

impl Default for DefaultBible {
    fn default() -> Self {
        Self {
            name: "Sample Bible".to_string(),
            language: "English".to_string(),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub books: usize,
    pub chapters: usize,
}

/// Populates canon reference data and the default Bible's books and chapters
/// from the scripture index. Safe to run on every start.
pub fn seed(store: &dyn Store, index: &ScriptureIndex, bible: &DefaultBible) -> Result<SeedSummary> {
    let version = index
        .versions()
        .first()
        .map(String::as_str)
        .unwrap_or(DEFAULT_VERSION);

    store.upsert_bible(&Bible {
        id: DEFAULT_BIBLE_ID,
        name: bible.name.clone(),
        language: bible.language.clone(),
        version: version.to_string(),
    })?;

    let mut summary = SeedSummary::default();

    for book in index.books() {
        store.upsert_canon_book(book)?;
        let book_id = store.ensure_book(DEFAULT_BIBLE_ID, &book.name)?;
        summary.books += 1;

        for chapter in index.chapters_of(&book.name) {
            store.ensure_canon_chapter(&chapter)?;
            store.ensure_chapter(book_id, &book.name, chapter.chapter)?;
            summary.chapters += 1;
        }
    }

    info!(
        "Seeded bible {DEFAULT_BIBLE_ID} ({version}) with {} books and {} chapters",
        summary.books, summary.chapters
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use tempfile::TempDir;

    const CORPUS: &str = "\
CanonBookName,CanonBookChapter,CanonChapterVerse,Version,Text
John,1,1,WEB,In the beginning was the Word.
Genesis,1,1,KJV,In the beginning.
Genesis,1,2,KJV,And the earth.
Genesis,2,1,KJV,Thus the heavens.
";

    #[test]
    fn test_seed_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        let index = ScriptureIndex::from_reader(CORPUS.as_bytes()).unwrap();

        let first = seed(&store, &index, &DefaultBible::default()).unwrap();
        let second = seed(&store, &index, &DefaultBible::default()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.books, 2);
        assert_eq!(first.chapters, 3);

        let bible = store.get_bible(DEFAULT_BIBLE_ID).unwrap().unwrap();
        assert_eq!(bible.version, "KJV");

        let books = store.list_books_with_canon(DEFAULT_BIBLE_ID).unwrap();
        let names: Vec<&str> = books.iter().map(|(b, _)| b.canon_book_name.as_str()).collect();
        assert_eq!(names, vec!["Genesis", "John"]);

        let chapters = store.list_chapters_with_canon(books[0].0.id).unwrap();
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].1.verse_count, 2);
        assert_eq!(chapters[1].1.verse_count, 1);
    }

    #[test]
    fn test_seed_empty_index_uses_default_version() {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();

        let summary = seed(&store, &ScriptureIndex::default(), &DefaultBible::default()).unwrap();
        assert_eq!(summary, SeedSummary::default());
        let bible = store.get_bible(DEFAULT_BIBLE_ID).unwrap().unwrap();
        assert_eq!(bible.version, "KJV");
        assert_eq!(bible.name, "Sample Bible");
    }
}
