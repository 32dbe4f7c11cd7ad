use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

use super::schema::SCHEMA;
use super::{RecordingUpdate, Store};
use crate::error::{Error, Result};
use crate::types::*;

const RECORDING_COLUMNS: &str = "r.id, r.user_id, r.chapter_id, r.date_recorded, r.date_last_accessed,
     r.verse_index_start, r.verse_index_end, r.accessed_count, r.file, r.file_mime,
     r.duration_seconds, r.transcription_text, r.word_count, r.wpm";

/// Same shape as `RECORDING_COLUMNS` with the audio blob replaced by an empty
/// one, so metadata reads never pull audio off disk.
const RECORDING_META_COLUMNS: &str = "r.id, r.user_id, r.chapter_id, r.date_recorded, r.date_last_accessed,
     r.verse_index_start, r.verse_index_end, r.accessed_count, X'' AS file, r.file_mime,
     r.duration_seconds, r.transcription_text, r.word_count, r.wpm";

const RECORDING_FIELDS: &str = "id, user_id, chapter_id, date_recorded, date_last_accessed,
     verse_index_start, verse_index_end, accessed_count, file, file_mime,
     duration_seconds, transcription_text, word_count, wpm";

const USER_COLUMNS: &str = "id, username, name, email, password_hash, created_at";

const TOKEN_COLUMNS: &str =
    "id, token_hash, token_lookup, user_id, created_at, expires_at, last_used_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn query_recording(&self, columns: &str, id: i64) -> Result<Option<Recording>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {columns} FROM recordings r WHERE r.id = ?1"),
            params![id],
            recording_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn query_bible_recordings(&self, columns: &str, bible_id: i64) -> Result<Vec<BibleRecording>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {columns}, c.canon_book_name, c.canon_book_chapter
             FROM recordings r
             JOIN chapters c ON c.id = r.chapter_id
             JOIN books b ON b.id = c.book_id
             WHERE b.bible_id = ?1
             ORDER BY r.id"
        ))?;

        let rows = stmt.query_map(params![bible_id], |row| {
            Ok(BibleRecording {
                recording: recording_from_row(row)?,
                book_name: row.get(14)?,
                chapter_number: row.get(15)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        password_hash: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
    })
}

fn recording_from_row(row: &Row<'_>) -> rusqlite::Result<Recording> {
    Ok(Recording {
        id: row.get(0)?,
        user_id: row.get(1)?,
        chapter_id: row.get(2)?,
        date_recorded: parse_datetime(&row.get::<_, String>(3)?),
        date_last_accessed: row.get::<_, Option<String>>(4)?.map(|s| parse_datetime(&s)),
        verse_index_start: row.get(5)?,
        verse_index_end: row.get(6)?,
        accessed_count: row.get(7)?,
        file: row.get(8)?,
        file_mime: row.get(9)?,
        duration_seconds: row.get(10)?,
        transcription_text: row.get(11)?,
        word_count: row.get(12)?,
        wpm: row.get(13)?,
    })
}

fn token_from_row(row: &Row<'_>) -> rusqlite::Result<Token> {
    Ok(Token {
        id: row.get(0)?,
        token_hash: row.get(1)?,
        token_lookup: row.get(2)?,
        user_id: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
        expires_at: row.get::<_, Option<String>>(5)?.map(|s| parse_datetime(&s)),
        last_used_at: row.get::<_, Option<String>>(6)?.map(|s| parse_datetime(&s)),
    })
}

fn canon_book_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<CanonBook> {
    let canonical_order: u32 = row.get(offset + 1)?;
    let testament: String = row.get(offset + 2)?;
    Ok(CanonBook {
        name: row.get(offset)?,
        canonical_order,
        testament: Testament::parse(&testament)
            .unwrap_or_else(|| Testament::from_order(canonical_order)),
    })
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // User operations

    fn create_user(
        &self,
        username: &str,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User> {
        let conn = self.conn();
        let now = Utc::now();
        let result = conn.execute(
            "INSERT INTO users (username, name, email, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![username, name, email, password_hash, format_datetime(&now)],
        );

        match result {
            Ok(_) => Ok(User {
                id: conn.last_insert_rowid(),
                username: username.to_string(),
                name: name.to_string(),
                email: email.to_string(),
                password_hash: password_hash.to_string(),
                created_at: now,
            }),
            Err(e) if is_constraint_violation(&e) => Err(Error::AlreadyExists),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id],
            user_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_user_by_login(&self, username_or_email: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!(
                "SELECT {USER_COLUMNS} FROM users WHERE username = ?1 OR email = ?1
                 ORDER BY id LIMIT 1"
            ),
            params![username_or_email],
            user_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn user_exists(&self, username: &str, email: &str) -> Result<bool> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM users WHERE username = ?1 OR email = ?2",
            params![username, email],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // Auth identity operations

    fn create_auth(&self, user_id: i64) -> Result<AuthIdentity> {
        let conn = self.conn();
        conn.execute("INSERT INTO auths (user_id) VALUES (?1)", params![user_id])?;
        Ok(AuthIdentity {
            id: conn.last_insert_rowid(),
            user_id,
        })
    }

    fn get_auth_for_user(&self, user_id: i64) -> Result<Option<AuthIdentity>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, user_id FROM auths WHERE user_id = ?1 ORDER BY id LIMIT 1",
            params![user_id],
            |row| {
                Ok(AuthIdentity {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    // Grant operations

    fn add_grant(&self, auth_id: i64, bible_id: i64, capability: Capability) -> Result<()> {
        self.conn().execute(
            &format!(
                "INSERT OR IGNORE INTO {} (auth_id, bible_id) VALUES (?1, ?2)",
                capability.table()
            ),
            params![auth_id, bible_id],
        )?;
        Ok(())
    }

    fn has_grant(&self, auth_id: i64, bible_id: i64, capability: Capability) -> Result<bool> {
        let count: i64 = self.conn().query_row(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE auth_id = ?1 AND bible_id = ?2",
                capability.table()
            ),
            params![auth_id, bible_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn list_granted_bible_ids(&self, auth_id: i64, capability: Capability) -> Result<Vec<i64>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT bible_id FROM {} WHERE auth_id = ?1 ORDER BY bible_id",
            capability.table()
        ))?;

        let rows = stmt.query_map(params![auth_id], |row| row.get(0))?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Bible operations

    fn upsert_bible(&self, bible: &Bible) -> Result<()> {
        self.conn().execute(
            "INSERT INTO bibles (id, name, language, version) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET version = excluded.version",
            params![bible.id, bible.name, bible.language, bible.version],
        )?;
        Ok(())
    }

    fn create_bible(&self, name: &str, language: &str, version: &str) -> Result<Bible> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO bibles (name, language, version) VALUES (?1, ?2, ?3)",
            params![name, language, version],
        )?;
        Ok(Bible {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            language: language.to_string(),
            version: version.to_string(),
        })
    }

    fn get_bible(&self, id: i64) -> Result<Option<Bible>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name, language, version FROM bibles WHERE id = ?1",
            params![id],
            |row| {
                Ok(Bible {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    language: row.get(2)?,
                    version: row.get(3)?,
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_bibles_by_ids(&self, ids: &[i64]) -> Result<Vec<Bible>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT id, name, language, version FROM bibles WHERE id IN ({placeholders}) ORDER BY id"
        ))?;

        let rows = stmt.query_map(params_from_iter(ids.iter()), |row| {
            Ok(Bible {
                id: row.get(0)?,
                name: row.get(1)?,
                language: row.get(2)?,
                version: row.get(3)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Canon reference data

    fn upsert_canon_book(&self, book: &CanonBook) -> Result<()> {
        self.conn().execute(
            "INSERT INTO canon_books (name, canonical_order, testament) VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO UPDATE SET
                canonical_order = excluded.canonical_order,
                testament = excluded.testament",
            params![book.name, book.canonical_order, book.testament.as_str()],
        )?;
        Ok(())
    }

    fn ensure_canon_chapter(&self, chapter: &CanonChapter) -> Result<()> {
        self.conn().execute(
            "INSERT OR IGNORE INTO canon_chapters (book_name, chapter, verse_count)
             VALUES (?1, ?2, ?3)",
            params![chapter.book_name, chapter.chapter, chapter.verse_count],
        )?;
        Ok(())
    }

    fn get_canon_chapter(&self, book_name: &str, chapter: u32) -> Result<Option<CanonChapter>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT book_name, chapter, verse_count FROM canon_chapters
             WHERE book_name = ?1 AND chapter = ?2",
            params![book_name, chapter],
            |row| {
                Ok(CanonChapter {
                    book_name: row.get(0)?,
                    chapter: row.get(1)?,
                    verse_count: row.get(2)?,
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    // Book and chapter operations

    fn ensure_book(&self, bible_id: i64, canon_book_name: &str) -> Result<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR IGNORE INTO books (bible_id, canon_book_name) VALUES (?1, ?2)",
            params![bible_id, canon_book_name],
        )?;
        conn.query_row(
            "SELECT id FROM books WHERE bible_id = ?1 AND canon_book_name = ?2",
            params![bible_id, canon_book_name],
            |row| row.get(0),
        )
        .map_err(Error::from)
    }

    fn get_book(&self, id: i64) -> Result<Option<Book>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, bible_id, canon_book_name FROM books WHERE id = ?1",
            params![id],
            |row| {
                Ok(Book {
                    id: row.get(0)?,
                    bible_id: row.get(1)?,
                    canon_book_name: row.get(2)?,
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_books_with_canon(&self, bible_id: i64) -> Result<Vec<(Book, CanonBook)>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT b.id, b.bible_id, b.canon_book_name, c.name, c.canonical_order, c.testament
             FROM books b
             JOIN canon_books c ON c.name = b.canon_book_name
             WHERE b.bible_id = ?1
             ORDER BY c.canonical_order",
        )?;

        let rows = stmt.query_map(params![bible_id], |row| {
            Ok((
                Book {
                    id: row.get(0)?,
                    bible_id: row.get(1)?,
                    canon_book_name: row.get(2)?,
                },
                canon_book_from_row(row, 3)?,
            ))
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn ensure_chapter(&self, book_id: i64, canon_book_name: &str, chapter: u32) -> Result<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR IGNORE INTO chapters (book_id, canon_book_name, canon_book_chapter)
             VALUES (?1, ?2, ?3)",
            params![book_id, canon_book_name, chapter],
        )?;
        conn.query_row(
            "SELECT id FROM chapters WHERE book_id = ?1 AND canon_book_chapter = ?2",
            params![book_id, chapter],
            |row| row.get(0),
        )
        .map_err(Error::from)
    }

    fn get_chapter(&self, id: i64) -> Result<Option<Chapter>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, book_id, canon_book_name, canon_book_chapter FROM chapters WHERE id = ?1",
            params![id],
            |row| {
                Ok(Chapter {
                    id: row.get(0)?,
                    book_id: row.get(1)?,
                    canon_book_name: row.get(2)?,
                    canon_book_chapter: row.get(3)?,
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_chapter_context(&self, chapter_id: i64) -> Result<Option<ChapterContext>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT c.id, c.book_id, c.canon_book_name, c.canon_book_chapter,
                    b.id, b.bible_id, b.canon_book_name
             FROM chapters c
             JOIN books b ON b.id = c.book_id
             WHERE c.id = ?1",
            params![chapter_id],
            |row| {
                Ok(ChapterContext {
                    chapter: Chapter {
                        id: row.get(0)?,
                        book_id: row.get(1)?,
                        canon_book_name: row.get(2)?,
                        canon_book_chapter: row.get(3)?,
                    },
                    book: Book {
                        id: row.get(4)?,
                        bible_id: row.get(5)?,
                        canon_book_name: row.get(6)?,
                    },
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_chapters_with_canon(&self, book_id: i64) -> Result<Vec<(Chapter, CanonChapter)>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT c.id, c.book_id, c.canon_book_name, c.canon_book_chapter,
                    cc.book_name, cc.chapter, cc.verse_count
             FROM chapters c
             JOIN canon_chapters cc
               ON cc.book_name = c.canon_book_name AND cc.chapter = c.canon_book_chapter
             WHERE c.book_id = ?1
             ORDER BY cc.chapter",
        )?;

        let rows = stmt.query_map(params![book_id], |row| {
            Ok((
                Chapter {
                    id: row.get(0)?,
                    book_id: row.get(1)?,
                    canon_book_name: row.get(2)?,
                    canon_book_chapter: row.get(3)?,
                },
                CanonChapter {
                    book_name: row.get(4)?,
                    chapter: row.get(5)?,
                    verse_count: row.get(6)?,
                },
            ))
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Recording operations

    fn create_recording(&self, recording: &NewRecording) -> Result<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO recordings (user_id, chapter_id, date_recorded, verse_index_start,
                verse_index_end, accessed_count, file, file_mime, duration_seconds,
                transcription_text, word_count, wpm)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                recording.user_id,
                recording.chapter_id,
                format_datetime(&recording.date_recorded),
                recording.verse_index_start,
                recording.verse_index_end,
                recording.file,
                recording.file_mime,
                recording.duration_seconds,
                recording.transcription_text,
                recording.word_count,
                recording.wpm,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn get_recording(&self, id: i64) -> Result<Option<Recording>> {
        self.query_recording(RECORDING_COLUMNS, id)
    }

    fn get_recording_meta(&self, id: i64) -> Result<Option<Recording>> {
        self.query_recording(RECORDING_META_COLUMNS, id)
    }

    fn list_bible_recordings(&self, bible_id: i64) -> Result<Vec<BibleRecording>> {
        self.query_bible_recordings(RECORDING_COLUMNS, bible_id)
    }

    fn list_bible_recording_meta(&self, bible_id: i64) -> Result<Vec<BibleRecording>> {
        self.query_bible_recordings(RECORDING_META_COLUMNS, bible_id)
    }

    fn record_access(&self, id: i64, at: DateTime<Utc>) -> Result<Option<Recording>> {
        let conn = self.conn();
        conn.query_row(
            &format!(
                "UPDATE recordings
                 SET accessed_count = accessed_count + 1, date_last_accessed = ?1
                 WHERE id = ?2
                 RETURNING {RECORDING_FIELDS}"
            ),
            params![format_datetime(&at), id],
            recording_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn update_recording(&self, id: i64, update: &RecordingUpdate) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE recordings SET
                verse_index_start = COALESCE(?1, verse_index_start),
                verse_index_end = COALESCE(?2, verse_index_end),
                transcription_text = COALESCE(?3, transcription_text),
                duration_seconds = COALESCE(?4, duration_seconds),
                word_count = ?5,
                wpm = ?6
             WHERE id = ?7",
            params![
                update.verse_index_start,
                update.verse_index_end,
                update.transcription_text,
                update.duration_seconds,
                update.word_count,
                update.wpm,
                id,
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_recording(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM recordings WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Token operations

    fn create_token(&self, token: &Token) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO tokens (id, token_hash, token_lookup, user_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                token.id,
                token.token_hash,
                token.token_lookup,
                token.user_id,
                format_datetime(&token.created_at),
                token.expires_at.as_ref().map(format_datetime),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(Error::TokenLookupCollision),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {TOKEN_COLUMNS} FROM tokens WHERE token_lookup = ?1"),
            params![lookup],
            token_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn update_token_last_used(&self, id: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE tokens SET last_used_at = ?1 WHERE id = ?2",
            params![format_datetime(&Utc::now()), id],
        )?;
        Ok(())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}
