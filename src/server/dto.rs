use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::metrics::{RecordingMetrics, listing_wpm};
use crate::types::{Book, BibleRecording, CanonBook, CanonChapter, Chapter, User};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username_or_email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct BookEntry {
    pub book: Book,
    pub canon: CanonBook,
}

#[derive(Debug, Serialize)]
pub struct ChapterEntry {
    pub chapter: Chapter,
    pub canon: CanonChapter,
}

/// Query for `GET /verses`. Bounds are signed so out-of-range input reaches
/// validation instead of failing extraction.
#[derive(Debug, Deserialize)]
pub struct VersesQuery {
    pub book: String,
    pub chapter: u32,
    pub start: i64,
    pub end: i64,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PassageResponse {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct RecordingResponse {
    pub recording_id: i64,
    pub book_name: String,
    pub chapter_number: u32,
    pub verse_start: u32,
    pub verse_end: u32,
    pub date_recorded: DateTime<Utc>,
    pub accessed_count: i64,
    pub duration_seconds: Option<f64>,
    pub transcription_text: Option<String>,
    pub word_count: Option<u32>,
    pub computed_wpm: Option<f64>,
}

impl From<&BibleRecording> for RecordingResponse {
    fn from(row: &BibleRecording) -> Self {
        let rec = &row.recording;
        Self {
            recording_id: rec.id,
            book_name: row.book_name.clone(),
            chapter_number: row.chapter_number,
            verse_start: rec.verse_index_start,
            verse_end: rec.verse_index_end,
            date_recorded: rec.date_recorded,
            accessed_count: rec.accessed_count,
            duration_seconds: rec.duration_seconds,
            transcription_text: rec.transcription_text.clone(),
            word_count: RecordingMetrics::effective(rec).word_count,
            computed_wpm: listing_wpm(rec),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedRecording {
    pub recording_id: i64,
    pub word_count: Option<u32>,
    pub wpm: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecordingUpdateRequest {
    #[serde(default)]
    pub verse_index_start: Option<i64>,
    #[serde(default)]
    pub verse_index_end: Option<i64>,
    #[serde(default)]
    pub transcription_text: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}
