use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use lectern::auth::TokenGenerator;
use lectern::scripture::{ScriptureIndex, SharedScripture};
use lectern::seed::{DEFAULT_BIBLE_ID, DefaultBible, seed};
use lectern::server::{AppState, create_router};
use lectern::store::{SqliteStore, Store};

pub const CORPUS: &str = "\
CanonBookName,CanonBookChapter,CanonChapterVerse,Version,Text
Genesis,1,1,KJV,In the beginning God created the heaven and the earth.
Genesis,1,2,KJV,\"And the earth was without form, and void.\"
Genesis,1,3,KJV,\"And God said, Let there be light: and there was light.\"
Genesis,1,1,WEB,In the beginning God created the heavens and the earth.
John,3,16,KJV,For God so loved the world.
";

const BOUNDARY: &str = "lectern-test-boundary";

pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub bytes: Vec<u8>,
}

impl Response {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.bytes).expect("response body is JSON")
    }
}

/// In-process server over a seeded temp database.
pub struct TestApp {
    _temp: TempDir,
    pub store: Arc<SqliteStore>,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("create temp dir");
        let store = Arc::new(SqliteStore::new(temp.path().join("lectern.db")).expect("open store"));
        store.initialize().expect("initialize store");

        let index = ScriptureIndex::from_reader(CORPUS.as_bytes()).expect("parse corpus");
        seed(store.as_ref(), &index, &DefaultBible::default()).expect("seed");

        let state = Arc::new(AppState {
            store: store.clone(),
            scripture: Arc::new(SharedScripture::preloaded(index)),
            tokens: TokenGenerator::new(),
            token_ttl_minutes: 60,
        });

        Self {
            _temp: temp,
            store,
            router: create_router(state),
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body")
            .to_vec();
        Response {
            status,
            headers,
            bytes,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response {
        self.send(build(Method::GET, uri, token, None, Body::empty())).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> Response {
        self.send(build(Method::DELETE, uri, Some(token), None, Body::empty()))
            .await
    }

    pub async fn json(&self, method: Method, uri: &str, token: Option<&str>, body: Value) -> Response {
        self.send(build(
            method,
            uri,
            token,
            Some("application/json"),
            Body::from(body.to_string()),
        ))
        .await
    }

    pub async fn upload(&self, token: &str, fields: &[(&str, &str)], mime: &str, file: &[u8]) -> Response {
        let content_type = format!("multipart/form-data; boundary={BOUNDARY}");
        let body = multipart_body(fields, mime, file);
        self.send(build(
            Method::POST,
            "/api/recordings",
            Some(token),
            Some(&content_type),
            Body::from(body),
        ))
        .await
    }

    /// Registers `username` and returns their access token.
    pub async fn register(&self, username: &str) -> String {
        let resp = self
            .json(
                Method::POST,
                "/api/register",
                None,
                serde_json::json!({
                    "username": username,
                    "name": username,
                    "email": format!("{username}@example.com"),
                    "password": "hunter22",
                }),
            )
            .await;
        assert_eq!(resp.status, StatusCode::OK, "register {username}");
        resp.json()["data"]["access_token"]
            .as_str()
            .expect("access token")
            .to_string()
    }

    /// Chapter id of `book` `chapter` in the default Bible.
    pub fn chapter_id(&self, book: &str, chapter: u32) -> i64 {
        let books = self
            .store
            .list_books_with_canon(DEFAULT_BIBLE_ID)
            .expect("list books");
        let (book, _) = books
            .iter()
            .find(|(b, _)| b.canon_book_name == book)
            .expect("book seeded");
        let chapters = self.store.list_chapters_with_canon(book.id).expect("list chapters");
        chapters
            .iter()
            .find(|(c, _)| c.canon_book_chapter == chapter)
            .map(|(c, _)| c.id)
            .expect("chapter seeded")
    }
}

fn build(method: Method, uri: &str, token: Option<&str>, content_type: Option<&str>, body: Body) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    builder.body(body).expect("valid request")
}

fn multipart_body(fields: &[(&str, &str)], mime: &str, file: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"reading\"\r\nContent-Type: {mime}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(file);
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}
