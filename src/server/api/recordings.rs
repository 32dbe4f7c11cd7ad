use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, Path, State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;

use crate::access::{ensure_listen, ensure_manage};
use crate::auth::RequireUser;
use crate::metrics::RecordingMetrics;
use crate::server::AppState;
use crate::server::dto::{CreatedRecording, OkResponse, RecordingUpdateRequest};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::{validate_duration, validate_verse_range};
use crate::store::{RecordingUpdate, Store};
use crate::types::{ChapterContext, NewRecording, Recording};

pub const MAX_UPLOAD_SIZE: usize = 100 * 1024 * 1024;

#[derive(Debug, Default)]
struct UploadForm {
    bible_id: Option<i64>,
    chapter_id: Option<i64>,
    verse_index_start: Option<i64>,
    verse_index_end: Option<i64>,
    duration_seconds: Option<f64>,
    transcription_text: Option<String>,
    file: Option<Vec<u8>>,
    file_mime: Option<String>,
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<Option<T>, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| ApiError::bad_request(format!("Invalid {name}")))
}

async fn parse_upload_form(multipart: &mut Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read multipart: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == "file" {
            form.file_mime = field.content_type().map(str::to_string);
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("Failed to read file: {e}")))?;
            if data.len() > MAX_UPLOAD_SIZE {
                return Err(ApiError::payload_too_large(format!(
                    "File size ({} bytes) exceeds maximum allowed size ({MAX_UPLOAD_SIZE} bytes)",
                    data.len()
                )));
            }
            form.file = Some(data.to_vec());
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read {name}: {e}")))?;

        match name.as_str() {
            "bible_id" => form.bible_id = parse_number(&name, &value)?,
            "chapter_id" => form.chapter_id = parse_number(&name, &value)?,
            "verse_index_start" => form.verse_index_start = parse_number(&name, &value)?,
            "verse_index_end" => form.verse_index_end = parse_number(&name, &value)?,
            "duration_seconds" => form.duration_seconds = parse_number(&name, &value)?,
            "transcription_text" => form.transcription_text = Some(value),
            _ => {}
        }
    }

    Ok(form)
}

/// Loads a recording's metadata, without audio, together with the chapter and
/// book that place it in a Bible.
fn load_recording(store: &dyn Store, id: i64) -> Result<(Recording, ChapterContext), ApiError> {
    let recording = store
        .get_recording_meta(id)
        .api_err("Failed to get recording")?
        .or_not_found("Recording not found")?;
    let context = store
        .get_chapter_context(recording.chapter_id)
        .api_err("Failed to get chapter")?
        .or_not_found("Chapter missing")?;
    Ok((recording, context))
}

fn canon_verse_count(store: &dyn Store, context: &ChapterContext) -> Result<u32, ApiError> {
    let canon = store
        .get_canon_chapter(
            &context.chapter.canon_book_name,
            context.chapter.canon_book_chapter,
        )
        .api_err("Failed to get canon chapter")?
        .ok_or_else(|| ApiError::bad_request("Missing canon data"))?;
    Ok(canon.verse_count)
}

/// POST /recordings - Upload a reading of a verse range
pub async fn create_recording(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.store.as_ref();
    let form = parse_upload_form(&mut multipart).await?;

    let chapter_id = form
        .chapter_id
        .ok_or_else(|| ApiError::bad_request("chapter_id is required"))?;
    let context = store
        .get_chapter_context(chapter_id)
        .api_err("Failed to get chapter")?
        .ok_or_else(|| ApiError::bad_request("Invalid chapter"))?;

    ensure_manage(store, &auth.user, context.book.bible_id)?;

    if form.bible_id.is_some_and(|id| id != context.book.bible_id) {
        return Err(ApiError::bad_request("Chapter does not belong to bible"));
    }

    let verse_count = canon_verse_count(store, &context)?;
    let (start, end) = match (form.verse_index_start, form.verse_index_end) {
        (Some(start), Some(end)) => validate_verse_range(start, end, Some(verse_count))?,
        _ => return Err(ApiError::bad_request("Verse range is required")),
    };

    let duration_seconds = validate_duration(form.duration_seconds)?;

    let file = form
        .file
        .ok_or_else(|| ApiError::bad_request("File field is required"))?;
    if file.is_empty() {
        return Err(ApiError::bad_request("Empty file"));
    }

    let metrics = RecordingMetrics::derive(form.transcription_text.as_deref(), duration_seconds);
    let new = NewRecording {
        user_id: auth.user.id,
        chapter_id,
        date_recorded: Utc::now(),
        verse_index_start: start,
        verse_index_end: end,
        file,
        file_mime: form.file_mime,
        duration_seconds,
        transcription_text: form.transcription_text,
        word_count: metrics.word_count,
        wpm: metrics.wpm,
    };

    let recording_id = store
        .create_recording(&new)
        .api_err("Failed to save recording")?;

    tracing::info!(
        "Stored recording {recording_id} for {} {}:{start}-{end}",
        context.book.canon_book_name,
        context.chapter.canon_book_chapter
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(CreatedRecording {
            recording_id,
            word_count: metrics.word_count,
            wpm: metrics.wpm,
        })),
    ))
}

/// GET /recordings/{id} - Recording metadata
pub async fn get_recording(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.store.as_ref();
    let (recording, context) = load_recording(store, id)?;
    ensure_listen(store, &auth.user, context.book.bible_id)?;

    Ok(Json(ApiResponse::success(recording)))
}

/// GET /recordings/{id}/audio - Audio bytes; counts as one play
pub async fn stream_audio(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.store.as_ref();
    let (_, context) = load_recording(store, id)?;
    ensure_listen(store, &auth.user, context.book.bible_id)?;

    let recording = store
        .record_access(id, Utc::now())
        .api_err("Failed to record play")?
        .or_not_found("Recording not found")?;

    let content_type = recording
        .file_mime
        .as_deref()
        .and_then(|mime| HeaderValue::from_str(mime).ok())
        .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));

    Ok(([(header::CONTENT_TYPE, content_type)], recording.file))
}

/// PUT /recordings/{id} - Change the verse range, transcription or duration
pub async fn update_recording(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    req: Result<Json<RecordingUpdateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = req?;
    let store = state.store.as_ref();
    let (recording, context) = load_recording(store, id)?;
    ensure_manage(store, &auth.user, context.book.bible_id)?;

    let duration_seconds = validate_duration(req.duration_seconds)?;
    let start = req
        .verse_index_start
        .unwrap_or(i64::from(recording.verse_index_start));
    let end = req
        .verse_index_end
        .unwrap_or(i64::from(recording.verse_index_end));
    let verse_count = canon_verse_count(store, &context)?;
    let (start, end) = validate_verse_range(start, end, Some(verse_count))?;

    let transcription = req
        .transcription_text
        .as_deref()
        .or(recording.transcription_text.as_deref());
    let duration = duration_seconds.or(recording.duration_seconds);
    let metrics = RecordingMetrics::derive(transcription, duration);

    let update = RecordingUpdate {
        verse_index_start: Some(start),
        verse_index_end: Some(end),
        transcription_text: req.transcription_text,
        duration_seconds,
        word_count: metrics.word_count,
        wpm: metrics.wpm,
    };
    store
        .update_recording(id, &update)
        .api_err("Failed to update recording")?;

    let updated = store
        .get_recording_meta(id)
        .api_err("Failed to get recording")?
        .or_not_found("Recording not found")?;

    Ok(Json(ApiResponse::success(updated)))
}

/// DELETE /recordings/{id}
pub async fn delete_recording(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.store.as_ref();
    let (_, context) = load_recording(store, id)?;
    ensure_manage(store, &auth.user, context.book.bible_id)?;

    if !store
        .delete_recording(id)
        .api_err("Failed to delete recording")?
    {
        return Err(ApiError::not_found("Recording not found"));
    }

    Ok(Json(ApiResponse::success(OkResponse { ok: true })))
}
