//! HTTP integration tests driving the router in-process.

mod common;

use std::io::{Cursor, Read};

use axum::http::{Method, StatusCode, header};
use serde_json::json;

use common::TestApp;
use lectern::seed::DEFAULT_BIBLE_ID;
use lectern::store::Store;
use lectern::types::Capability;

async fn upload_genesis(app: &TestApp, token: &str, text: &str, duration: &str) -> i64 {
    let chapter_id = app.chapter_id("Genesis", 1).to_string();
    let resp = app
        .upload(
            token,
            &[
                ("chapter_id", chapter_id.as_str()),
                ("verse_index_start", "1"),
                ("verse_index_end", "3"),
                ("duration_seconds", duration),
                ("transcription_text", text),
            ],
            "audio/webm",
            b"webm-bytes",
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED, "{:?}", resp.json());
    resp.json()["data"]["recording_id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let resp = app.get("/health", None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.bytes, b"OK");
}

#[tokio::test]
async fn test_register_login_and_me() {
    let app = TestApp::new();
    let token = app.register("ann").await;

    let resp = app.get("/api/me", Some(&token)).await;
    assert_eq!(resp.status, StatusCode::OK);
    let me = resp.json();
    assert_eq!(me["data"]["username"], "ann");
    assert!(me["data"].get("password_hash").is_none());

    let resp = app
        .json(
            Method::POST,
            "/api/login",
            None,
            json!({"username_or_email": "ann@example.com", "password": "hunter22"}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["data"]["token_type"], "bearer");
    assert!(body["data"]["access_token"].as_str().unwrap().starts_with("lectern_"));
}

#[tokio::test]
async fn test_register_accepts_display_style_usernames() {
    let app = TestApp::new();

    let resp = app
        .json(
            Method::POST,
            "/api/register",
            None,
            json!({"username": "Ruth Boaz", "name": "Ruth", "email": "ruth@example.com", "password": "pw"}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{:?}", resp.json());
    assert_eq!(resp.json()["data"]["user"]["username"], "Ruth Boaz");

    let resp = app
        .json(
            Method::POST,
            "/api/login",
            None,
            json!({"username_or_email": "Ruth Boaz", "password": "pw"}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);

    let resp = app
        .json(
            Method::POST,
            "/api/register",
            None,
            json!({"username": "ruth@home", "name": "Ruth", "email": "other@example.com", "password": "pw"}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_duplicate_and_bad_login() {
    let app = TestApp::new();
    app.register("ann").await;

    let resp = app
        .json(
            Method::POST,
            "/api/register",
            None,
            json!({"username": "ann", "name": "Other", "email": "other@example.com", "password": "pw"}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.json()["error"], "User already exists");

    let resp = app
        .json(
            Method::POST,
            "/api/login",
            None,
            json!({"username_or_email": "ann", "password": "wrong"}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.json()["error"], "Incorrect credentials");
}

#[tokio::test]
async fn test_requires_bearer_token() {
    let app = TestApp::new();

    let resp = app.get("/api/me", None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert!(resp.headers.contains_key(header::WWW_AUTHENTICATE));
    assert!(resp.json()["data"].is_null());

    let resp = app
        .get("/api/me", Some("lectern_abcdefgh_abcdefghijklmnopqrstuvwx"))
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_versions_and_verses() {
    let app = TestApp::new();
    let token = app.register("ann").await;

    let resp = app.get("/api/versions", Some(&token)).await;
    assert_eq!(resp.json()["data"], json!(["KJV", "WEB"]));

    let resp = app
        .get("/api/verses?book=Genesis&chapter=1&start=1&end=2", Some(&token))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(
        resp.json()["data"]["text"],
        "1 In the beginning God created the heaven and the earth. 2 And the earth was without form, and void."
    );

    let resp = app
        .get("/api/verses?book=Genesis&chapter=1&start=0&end=2", Some(&token))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = app
        .get("/api/verses?book=Genesis&chapter=1&start=3&end=2", Some(&token))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = app
        .get("/api/verses?book=Genesis&chapter=1&start=1&end=4", Some(&token))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.json()["error"], "Verse end exceeds chapter");

    // WEB only carries verse 1 of the chapter.
    let resp = app
        .get(
            "/api/verses?book=Genesis&chapter=1&start=1&end=2&version=WEB",
            Some(&token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    let resp = app
        .get("/api/verses?book=Exodus&chapter=1&start=1&end=1", Some(&token))
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_verses_query_uses_json_envelope() {
    let app = TestApp::new();
    let token = app.register("ann").await;

    for uri in [
        "/api/verses?book=Genesis&chapter=1&end=2",
        "/api/verses?book=Genesis&chapter=one&start=1&end=2",
    ] {
        let resp = app.get(uri, Some(&token)).await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST, "{uri}");
        let body = resp.json();
        assert!(body["data"].is_null(), "{uri}");
        assert!(body["error"].is_string(), "{uri}");
    }
}

#[tokio::test]
async fn test_books_and_chapters_in_canonical_order() {
    let app = TestApp::new();
    let token = app.register("ann").await;

    let resp = app.get("/api/bibles", Some(&token)).await;
    let bibles = resp.json();
    assert_eq!(bibles["data"][0]["id"], DEFAULT_BIBLE_ID);
    assert_eq!(bibles["data"][0]["version"], "KJV");

    let resp = app.get("/api/bibles/1/books", Some(&token)).await;
    assert_eq!(resp.status, StatusCode::OK);
    let books = resp.json()["data"].as_array().unwrap().clone();
    let names: Vec<&str> = books
        .iter()
        .map(|b| b["canon"]["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Genesis", "John"]);

    let book_id = books[0]["book"]["id"].as_i64().unwrap();
    let resp = app
        .get(&format!("/api/books/{book_id}/chapters"), Some(&token))
        .await;
    let chapters = resp.json();
    assert_eq!(chapters["data"][0]["canon"]["verse_count"], 3);

    let resp = app.get("/api/books/9999/chapters", Some(&token)).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_recording_lifecycle() {
    let app = TestApp::new();
    let token = app.register("ann").await;

    let id = upload_genesis(&app, &token, "one two three four", "2").await;

    let resp = app.get("/api/bibles/1/recordings", Some(&token)).await;
    let list = resp.json();
    assert_eq!(list["data"][0]["recording_id"], id);
    assert_eq!(list["data"][0]["book_name"], "Genesis");
    assert_eq!(list["data"][0]["word_count"], 4);
    assert_eq!(list["data"][0]["computed_wpm"], 120.0);

    for expected in 1..=2 {
        let resp = app
            .get(&format!("/api/recordings/{id}/audio"), Some(&token))
            .await;
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.headers[header::CONTENT_TYPE], "audio/webm");
        assert_eq!(resp.bytes, b"webm-bytes");
        let stored = app.store.get_recording(id).unwrap().unwrap();
        assert_eq!(stored.accessed_count, expected);
        assert!(stored.date_last_accessed.is_some());
    }

    let resp = app
        .json(
            Method::PUT,
            &format!("/api/recordings/{id}"),
            Some(&token),
            json!({"transcription_text": "one two", "verse_index_end": 2}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let updated = resp.json();
    assert_eq!(updated["data"]["verse_index_end"], 2);
    assert_eq!(updated["data"]["word_count"], 2);
    assert_eq!(updated["data"]["wpm"], 60.0);

    let resp = app.delete(&format!("/api/recordings/{id}"), &token).await;
    assert_eq!(resp.status, StatusCode::OK);
    let resp = app
        .get(&format!("/api/recordings/{id}/audio"), Some(&token))
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_rejects_bad_input() {
    let app = TestApp::new();
    let token = app.register("ann").await;
    let chapter_id = app.chapter_id("Genesis", 1).to_string();

    let resp = app
        .upload(
            &token,
            &[
                ("chapter_id", chapter_id.as_str()),
                ("verse_index_start", "2"),
                ("verse_index_end", "4"),
            ],
            "audio/wav",
            b"x",
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = app
        .upload(
            &token,
            &[
                ("chapter_id", chapter_id.as_str()),
                ("verse_index_start", "1"),
                ("verse_index_end", "1"),
            ],
            "audio/wav",
            b"",
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.json()["error"], "Empty file");

    let resp = app
        .upload(
            &token,
            &[
                ("chapter_id", "9999"),
                ("verse_index_start", "1"),
                ("verse_index_end", "1"),
            ],
            "audio/wav",
            b"x",
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.json()["error"], "Invalid chapter");
}

#[tokio::test]
async fn test_upload_rejects_invalid_duration() {
    let app = TestApp::new();
    let token = app.register("ann").await;
    let chapter_id = app.chapter_id("Genesis", 1).to_string();

    for duration in ["inf", "-30", "NaN"] {
        let resp = app
            .upload(
                &token,
                &[
                    ("chapter_id", chapter_id.as_str()),
                    ("verse_index_start", "1"),
                    ("verse_index_end", "3"),
                    ("duration_seconds", duration),
                    ("transcription_text", "in the beginning"),
                ],
                "audio/webm",
                b"webm-bytes",
            )
            .await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST, "{duration}");
        assert_eq!(resp.json()["error"], "Invalid duration_seconds");
    }

    let resp = app.get("/api/bibles/1/analytics", Some(&token)).await;
    assert_eq!(resp.json()["data"]["total_recordings"], 0);

    let id = upload_genesis(&app, &token, "in the beginning", "30").await;
    let resp = app
        .json(
            Method::PUT,
            &format!("/api/recordings/{id}"),
            Some(&token),
            json!({"duration_seconds": -5.0}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.json()["error"], "Invalid duration_seconds");

    let resp = app
        .json(
            Method::PUT,
            &format!("/api/recordings/{id}"),
            Some(&token),
            json!({"duration_seconds": "slow"}),
        )
        .await;
    assert!(resp.status.is_client_error());
    assert!(resp.json()["data"].is_null());

    let stored = app.store.get_recording(id).unwrap().unwrap();
    assert_eq!(stored.duration_seconds, Some(30.0));
}

#[tokio::test]
async fn test_analytics() {
    let app = TestApp::new();
    let token = app.register("ann").await;

    let resp = app.get("/api/bibles/1/analytics", Some(&token)).await;
    let empty = resp.json();
    assert_eq!(empty["data"]["total_recordings"], 0);
    assert!(empty["data"]["avg_word_count"].is_null());
    assert_eq!(empty["data"]["wpm_stats"]["count"], 0);

    upload_genesis(&app, &token, "one two three four", "2").await;
    upload_genesis(&app, &token, "one two", "2").await;

    let resp = app.get("/api/bibles/1/analytics", Some(&token)).await;
    let data = &resp.json()["data"];
    assert_eq!(data["total_recordings"], 2);
    assert_eq!(data["total_words"], 6);
    assert_eq!(data["avg_word_count"], 3.0);
    assert_eq!(data["avg_duration_seconds"], 2.0);
    assert_eq!(data["wpm_stats"]["mean"], 90.0);
    assert_eq!(data["wpm_stats"]["median"], 90.0);
    assert_eq!(data["wpm_stats"]["std"], 30.0);
}

#[tokio::test]
async fn test_download_archive() {
    let app = TestApp::new();
    let token = app.register("ann").await;
    upload_genesis(&app, &token, "a", "1").await;
    upload_genesis(&app, &token, "b", "1").await;

    let resp = app.get("/api/bibles/1/download", Some(&token)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.headers[header::CONTENT_TYPE], "application/zip");
    assert_eq!(
        resp.headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"bible.zip\""
    );

    let mut archive = zip::ZipArchive::new(Cursor::new(resp.bytes)).unwrap();
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    assert_eq!(names, vec!["Genesis/01.webm", "Genesis/01_002.webm"]);

    let mut contents = Vec::new();
    archive
        .by_name("Genesis/01.webm")
        .unwrap()
        .read_to_end(&mut contents)
        .unwrap();
    assert_eq!(contents, b"webm-bytes");
}

#[tokio::test]
async fn test_access_is_gated_per_bible() {
    let app = TestApp::new();
    let owner = app.register("owner").await;
    let reader = app.register("reader").await;
    let id = upload_genesis(&app, &owner, "a b", "1").await;

    // A second Bible nobody has been granted.
    let other = app.store.create_bible("Other", "English", "KJV").unwrap();
    let resp = app
        .get(&format!("/api/bibles/{}/books", other.id), Some(&reader))
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    assert_eq!(resp.json()["error"], "No listen access");

    // Listen-only on the second Bible: can browse, cannot upload.
    let user = app.store.get_user_by_login("reader").unwrap().unwrap();
    let auth = app.store.get_auth_for_user(user.id).unwrap().unwrap();
    app.store
        .add_grant(auth.id, other.id, Capability::Listen)
        .unwrap();
    let book_id = app.store.ensure_book(other.id, "Genesis").unwrap();
    let chapter_id = app.store.ensure_chapter(book_id, "Genesis", 1).unwrap();

    let resp = app
        .get(&format!("/api/bibles/{}/recordings", other.id), Some(&reader))
        .await;
    assert_eq!(resp.status, StatusCode::OK);

    let chapter_id = chapter_id.to_string();
    let resp = app
        .upload(
            &reader,
            &[
                ("chapter_id", chapter_id.as_str()),
                ("verse_index_start", "1"),
                ("verse_index_end", "1"),
            ],
            "audio/wav",
            b"x",
        )
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    assert_eq!(resp.json()["error"], "No manage access");

    // Registration granted manage on the default Bible, so the reader may
    // remove the owner's recording there.
    let resp = app.delete(&format!("/api/recordings/{id}"), &reader).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(app.store.get_recording(id).unwrap().is_none());

    let listed = app.get("/api/bibles", Some(&reader)).await.json();
    assert_eq!(listed["data"].as_array().unwrap().len(), 2);
}
