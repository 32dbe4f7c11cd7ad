pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,       -- argon2id PHC string
    created_at TEXT DEFAULT (datetime('now'))
);

-- Auth identities: grants attach here rather than to users directly
CREATE TABLE IF NOT EXISTS auths (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS bibles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    language TEXT NOT NULL,
    version TEXT NOT NULL
);

-- Listen grants: read access to a bible
CREATE TABLE IF NOT EXISTS listen_auths (
    auth_id INTEGER NOT NULL REFERENCES auths(id) ON DELETE CASCADE,
    bible_id INTEGER NOT NULL REFERENCES bibles(id) ON DELETE CASCADE,
    PRIMARY KEY (auth_id, bible_id)
);

-- Manage grants: write access to a bible (listen is checked separately)
CREATE TABLE IF NOT EXISTS manage_auths (
    auth_id INTEGER NOT NULL REFERENCES auths(id) ON DELETE CASCADE,
    bible_id INTEGER NOT NULL REFERENCES bibles(id) ON DELETE CASCADE,
    PRIMARY KEY (auth_id, bible_id)
);

-- Reference data derived from the scripture corpus
CREATE TABLE IF NOT EXISTS canon_books (
    name TEXT PRIMARY KEY,
    canonical_order INTEGER NOT NULL,
    testament TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS canon_chapters (
    book_name TEXT NOT NULL REFERENCES canon_books(name),
    chapter INTEGER NOT NULL,
    verse_count INTEGER NOT NULL,
    PRIMARY KEY (book_name, chapter)
);

CREATE TABLE IF NOT EXISTS books (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    bible_id INTEGER NOT NULL REFERENCES bibles(id) ON DELETE CASCADE,
    canon_book_name TEXT NOT NULL REFERENCES canon_books(name),
    UNIQUE(bible_id, canon_book_name)
);

CREATE TABLE IF NOT EXISTS chapters (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    book_id INTEGER NOT NULL REFERENCES books(id) ON DELETE CASCADE,
    canon_book_name TEXT NOT NULL,
    canon_book_chapter INTEGER NOT NULL,
    UNIQUE(book_id, canon_book_chapter),
    FOREIGN KEY (canon_book_name, canon_book_chapter)
        REFERENCES canon_chapters(book_name, chapter)
);

CREATE TABLE IF NOT EXISTS recordings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    chapter_id INTEGER NOT NULL REFERENCES chapters(id) ON DELETE CASCADE,
    date_recorded TEXT NOT NULL,
    date_last_accessed TEXT,
    verse_index_start INTEGER NOT NULL,
    verse_index_end INTEGER NOT NULL,
    accessed_count INTEGER NOT NULL DEFAULT 0,
    file BLOB NOT NULL,
    file_mime TEXT,
    duration_seconds REAL,
    transcription_text TEXT,

    -- Derived at write time; NULL on rows written before these existed
    word_count INTEGER,
    wpm REAL
);

-- Tokens are bearer credentials for users
CREATE TABLE IF NOT EXISTS tokens (
    id TEXT PRIMARY KEY,
    token_hash TEXT NOT NULL,          -- argon2id hash with embedded salt
    token_lookup TEXT NOT NULL,        -- random 8 chars for fast lookup
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TEXT DEFAULT (datetime('now')),
    expires_at TEXT,                   -- NULL = never
    last_used_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_auths_user ON auths(user_id);
CREATE INDEX IF NOT EXISTS idx_books_bible ON books(bible_id);
CREATE INDEX IF NOT EXISTS idx_chapters_book ON chapters(book_id);
CREATE INDEX IF NOT EXISTS idx_recordings_chapter ON recordings(chapter_id);
CREATE UNIQUE INDEX IF NOT EXISTS idx_tokens_lookup ON tokens(token_lookup);
CREATE INDEX IF NOT EXISTS idx_tokens_user ON tokens(user_id);
"#;
