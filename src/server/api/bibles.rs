use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::IntoResponse,
};

use crate::access::{accessible_bibles, ensure_listen};
use crate::archive::build_bible_archive;
use crate::auth::RequireUser;
use crate::metrics::BibleAnalytics;
use crate::server::AppState;
use crate::server::dto::{BookEntry, ChapterEntry, RecordingResponse};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};

/// GET /bibles - Bibles the user can listen to or manage
pub async fn list_bibles(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let bibles = accessible_bibles(state.store.as_ref(), &auth.user)?;
    Ok(Json(ApiResponse::success(bibles)))
}

/// GET /bibles/{id}/books - Books in canonical order
pub async fn list_books(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(bible_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.store.as_ref();
    ensure_listen(store, &auth.user, bible_id)?;

    let books: Vec<BookEntry> = store
        .list_books_with_canon(bible_id)
        .api_err("Failed to list books")?
        .into_iter()
        .map(|(book, canon)| BookEntry { book, canon })
        .collect();

    Ok(Json(ApiResponse::success(books)))
}

/// GET /books/{id}/chapters - Chapters with their verse counts
pub async fn list_chapters(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.store.as_ref();
    let book = store
        .get_book(book_id)
        .api_err("Failed to get book")?
        .or_not_found("Book not found")?;

    ensure_listen(store, &auth.user, book.bible_id)?;

    let chapters: Vec<ChapterEntry> = store
        .list_chapters_with_canon(book.id)
        .api_err("Failed to list chapters")?
        .into_iter()
        .map(|(chapter, canon)| ChapterEntry { chapter, canon })
        .collect();

    Ok(Json(ApiResponse::success(chapters)))
}

/// GET /bibles/{id}/recordings - Recordings with their reading pace
pub async fn list_recordings(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(bible_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.store.as_ref();
    ensure_listen(store, &auth.user, bible_id)?;

    let recordings: Vec<RecordingResponse> = store
        .list_bible_recording_meta(bible_id)
        .api_err("Failed to list recordings")?
        .iter()
        .map(RecordingResponse::from)
        .collect();

    Ok(Json(ApiResponse::success(recordings)))
}

/// GET /bibles/{id}/analytics - Word and pace statistics across all recordings
pub async fn get_analytics(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(bible_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.store.as_ref();
    ensure_listen(store, &auth.user, bible_id)?;

    let rows = store
        .list_bible_recording_meta(bible_id)
        .api_err("Failed to list recordings")?;
    let analytics = BibleAnalytics::compute(bible_id, rows.iter().map(|row| &row.recording));

    Ok(Json(ApiResponse::success(analytics)))
}

/// GET /bibles/{id}/download - Every recording as a zip attachment
pub async fn download_bible(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(bible_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.store.as_ref();
    ensure_listen(store, &auth.user, bible_id)?;

    let rows = store
        .list_bible_recordings(bible_id)
        .api_err("Failed to list recordings")?;
    let body = build_bible_archive(&rows).api_err("Failed to build archive")?;

    tracing::debug!("Packed {} recordings for bible {bible_id}", rows.len());

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/zip"));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static("attachment; filename=\"bible.zip\""),
    );

    Ok((StatusCode::OK, headers, body))
}
