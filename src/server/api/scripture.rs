use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    response::IntoResponse,
};

use crate::auth::RequireUser;
use crate::scripture::DEFAULT_VERSION;
use crate::server::AppState;
use crate::server::dto::{PassageResponse, VersesQuery};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt};
use crate::server::validation::validate_verse_range;

/// GET /versions - Versions present in the scripture corpus
pub async fn list_versions(_auth: RequireUser, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let versions = state.scripture.get().versions();
    let versions = if versions.is_empty() {
        vec![DEFAULT_VERSION.to_string()]
    } else {
        versions.to_vec()
    };
    Json(ApiResponse::success(versions))
}

/// GET /verses - Text of a verse range in one version
pub async fn get_verses(
    _auth: RequireUser,
    State(state): State<Arc<AppState>>,
    query: Result<Query<VersesQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let index = state.scripture.get();
    let known = index.chapter_count(&query.book, query.chapter);
    let (start, end) = validate_verse_range(query.start, query.end, (known > 0).then_some(known))?;

    let version = query.version.as_deref().unwrap_or(DEFAULT_VERSION);
    let text = index
        .passage_text(&query.book, query.chapter, start, end, version)
        .or_not_found("Passage not found")?;

    Ok(Json(ApiResponse::success(PassageResponse { text })))
}
