mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::*;

/// Partial update of a recording's metadata. `None` leaves a field untouched;
/// the derived `word_count`/`wpm` pair is always written alongside.
#[derive(Debug, Clone, Default)]
pub struct RecordingUpdate {
    pub verse_index_start: Option<u32>,
    pub verse_index_end: Option<u32>,
    pub transcription_text: Option<String>,
    pub duration_seconds: Option<f64>,
    pub word_count: Option<u32>,
    pub wpm: Option<f64>,
}

/// Store defines the database interface.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // User operations
    fn create_user(&self, username: &str, name: &str, email: &str, password_hash: &str)
    -> Result<User>;
    fn get_user(&self, id: i64) -> Result<Option<User>>;
    fn get_user_by_login(&self, username_or_email: &str) -> Result<Option<User>>;
    fn user_exists(&self, username: &str, email: &str) -> Result<bool>;

    // Auth identity operations
    fn create_auth(&self, user_id: i64) -> Result<AuthIdentity>;
    fn get_auth_for_user(&self, user_id: i64) -> Result<Option<AuthIdentity>>;

    // Grant operations
    fn add_grant(&self, auth_id: i64, bible_id: i64, capability: Capability) -> Result<()>;
    fn has_grant(&self, auth_id: i64, bible_id: i64, capability: Capability) -> Result<bool>;
    fn list_granted_bible_ids(&self, auth_id: i64, capability: Capability) -> Result<Vec<i64>>;

    // Bible operations
    fn upsert_bible(&self, bible: &Bible) -> Result<()>;
    fn create_bible(&self, name: &str, language: &str, version: &str) -> Result<Bible>;
    fn get_bible(&self, id: i64) -> Result<Option<Bible>>;
    fn list_bibles_by_ids(&self, ids: &[i64]) -> Result<Vec<Bible>>;

    // Canon reference data
    fn upsert_canon_book(&self, book: &CanonBook) -> Result<()>;
    fn ensure_canon_chapter(&self, chapter: &CanonChapter) -> Result<()>;
    fn get_canon_chapter(&self, book_name: &str, chapter: u32) -> Result<Option<CanonChapter>>;

    // Book and chapter operations
    fn ensure_book(&self, bible_id: i64, canon_book_name: &str) -> Result<i64>;
    fn get_book(&self, id: i64) -> Result<Option<Book>>;
    fn list_books_with_canon(&self, bible_id: i64) -> Result<Vec<(Book, CanonBook)>>;
    fn ensure_chapter(&self, book_id: i64, canon_book_name: &str, chapter: u32) -> Result<i64>;
    fn get_chapter(&self, id: i64) -> Result<Option<Chapter>>;
    fn get_chapter_context(&self, chapter_id: i64) -> Result<Option<ChapterContext>>;
    fn list_chapters_with_canon(&self, book_id: i64) -> Result<Vec<(Chapter, CanonChapter)>>;

    // Recording operations
    fn create_recording(&self, recording: &NewRecording) -> Result<i64>;
    fn get_recording(&self, id: i64) -> Result<Option<Recording>>;
    /// Like `get_recording`, but leaves `file` empty.
    fn get_recording_meta(&self, id: i64) -> Result<Option<Recording>>;
    fn list_bible_recordings(&self, bible_id: i64) -> Result<Vec<BibleRecording>>;
    /// Like `list_bible_recordings`, but leaves every `file` empty.
    fn list_bible_recording_meta(&self, bible_id: i64) -> Result<Vec<BibleRecording>>;
    /// Bumps the play counter and last-accessed time in a single statement,
    /// returning the updated row.
    fn record_access(&self, id: i64, at: DateTime<Utc>) -> Result<Option<Recording>>;
    fn update_recording(&self, id: i64, update: &RecordingUpdate) -> Result<()>;
    fn delete_recording(&self, id: i64) -> Result<bool>;

    // Token operations
    fn create_token(&self, token: &Token) -> Result<()>;
    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>>;
    fn update_token_last_used(&self, id: &str) -> Result<()>;

    fn close(&self) -> Result<()>;
}
