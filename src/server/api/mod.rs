mod account;
mod bibles;
mod recordings;
mod scripture;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::server::AppState;

use recordings::MAX_UPLOAD_SIZE;

pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Accounts
        .route("/register", post(account::register))
        .route("/login", post(account::login))
        .route("/me", get(account::me))
        // Bibles
        .route("/bibles", get(bibles::list_bibles))
        .route("/bibles/{id}/books", get(bibles::list_books))
        .route("/bibles/{id}/recordings", get(bibles::list_recordings))
        .route("/bibles/{id}/analytics", get(bibles::get_analytics))
        .route("/bibles/{id}/download", get(bibles::download_bible))
        .route("/books/{id}/chapters", get(bibles::list_chapters))
        // Scripture text
        .route("/versions", get(scripture::list_versions))
        .route("/verses", get(scripture::get_verses))
        // Recordings
        .route(
            "/recordings",
            post(recordings::create_recording).layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE)),
        )
        .route("/recordings/{id}/audio", get(recordings::stream_audio))
        .route(
            "/recordings/{id}",
            get(recordings::get_recording)
                .put(recordings::update_recording)
                .delete(recordings::delete_recording),
        )
}
