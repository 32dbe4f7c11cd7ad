use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// The identity record grants hang off. Every registered user gets one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthIdentity {
    pub id: i64,
    pub user_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bible {
    pub id: i64,
    pub name: String,
    pub language: String,
    pub version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Testament {
    Old,
    New,
}

impl Testament {
    /// Books 1..=39 in canonical order are Old Testament, the rest New.
    #[must_use]
    pub const fn from_order(order: u32) -> Self {
        if order <= 39 {
            Testament::Old
        } else {
            Testament::New
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Testament::Old => "Old",
            Testament::New => "New",
        }
    }

    pub fn parse(s: &str) -> Option<Testament> {
        match s {
            "Old" => Some(Testament::Old),
            "New" => Some(Testament::New),
            _ => None,
        }
    }
}

impl fmt::Display for Testament {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonBook {
    pub name: String,
    pub canonical_order: u32,
    pub testament: Testament,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonChapter {
    pub book_name: String,
    pub chapter: u32,
    pub verse_count: u32,
}

/// A canon book as it appears inside one Bible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub bible_id: i64,
    pub canon_book_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub id: i64,
    pub book_id: i64,
    pub canon_book_name: String,
    pub canon_book_chapter: u32,
}

/// A chapter together with the book (and therefore Bible) that owns it.
#[derive(Debug, Clone)]
pub struct ChapterContext {
    pub chapter: Chapter,
    pub book: Book,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recording {
    pub id: i64,
    pub user_id: i64,
    pub chapter_id: i64,
    pub date_recorded: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_last_accessed: Option<DateTime<Utc>>,
    pub verse_index_start: u32,
    pub verse_index_end: u32,
    pub accessed_count: i64,
    #[serde(skip)]
    pub file: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_mime: Option<String>,
    pub duration_seconds: Option<f64>,
    pub transcription_text: Option<String>,
    pub word_count: Option<u32>,
    pub wpm: Option<f64>,
}

/// Fields supplied when a recording is uploaded; the store assigns the id and
/// starts the play counter at zero.
#[derive(Debug, Clone)]
pub struct NewRecording {
    pub user_id: i64,
    pub chapter_id: i64,
    pub date_recorded: DateTime<Utc>,
    pub verse_index_start: u32,
    pub verse_index_end: u32,
    pub file: Vec<u8>,
    pub file_mime: Option<String>,
    pub duration_seconds: Option<f64>,
    pub transcription_text: Option<String>,
    pub word_count: Option<u32>,
    pub wpm: Option<f64>,
}

/// A recording joined with the canon location of its chapter.
#[derive(Debug, Clone)]
pub struct BibleRecording {
    pub recording: Recording,
    pub book_name: String,
    pub chapter_number: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub id: String,
    #[serde(skip)]
    pub token_hash: String,
    #[serde(skip)]
    pub token_lookup: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
}
