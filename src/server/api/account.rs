use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::IntoResponse,
};

use crate::access::grant_default_access;
use crate::auth::{RequireUser, hash_password, verify_password};
use crate::error::Error;
use crate::seed::DEFAULT_BIBLE_ID;
use crate::server::AppState;
use crate::server::dto::{LoginRequest, RegisterRequest, TokenResponse};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::validation::{validate_email, validate_password, validate_username};
use crate::types::User;

fn token_response(state: &AppState, user: User) -> Result<TokenResponse, ApiError> {
    let (access_token, token) = state
        .tokens
        .issue(state.store.as_ref(), user.id, state.token_ttl_minutes)
        .api_err("Failed to issue token")?;

    Ok(TokenResponse {
        access_token,
        token_type: "bearer",
        expires_at: token.expires_at,
        user,
    })
}

/// POST /register - Create an account with access to the default Bible
pub async fn register(
    State(state): State<Arc<AppState>>,
    req: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = req?;
    let store = state.store.as_ref();

    validate_username(&req.username)?;
    validate_email(&req.email)?;
    validate_password(&req.password)?;

    if store
        .user_exists(&req.username, &req.email)
        .api_err("Failed to check user")?
    {
        return Err(ApiError::bad_request("User already exists"));
    }

    let password_hash = hash_password(&req.password).api_err("Failed to hash password")?;
    let user = match store.create_user(&req.username, &req.name, &req.email, &password_hash) {
        Ok(user) => user,
        Err(Error::AlreadyExists) => return Err(ApiError::bad_request("User already exists")),
        Err(e) => return Err(e.into()),
    };

    let auth = store
        .create_auth(user.id)
        .api_err("Failed to create auth record")?;
    grant_default_access(store, &auth, DEFAULT_BIBLE_ID).api_err("Failed to grant access")?;

    tracing::info!("Registered user {} ({})", user.username, user.id);

    let response = token_response(&state, user)?;
    Ok(Json(ApiResponse::success(response)))
}

/// POST /login - Exchange a username or email and password for a token
pub async fn login(
    State(state): State<Arc<AppState>>,
    req: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = req?;
    let Some(user) = state
        .store
        .get_user_by_login(&req.username_or_email)
        .api_err("Failed to look up user")?
    else {
        return Err(ApiError::bad_request("Incorrect credentials"));
    };

    if !verify_password(&req.password, &user.password_hash).api_err("Failed to verify password")? {
        return Err(ApiError::bad_request("Incorrect credentials"));
    }

    let response = token_response(&state, user)?;
    Ok(Json(ApiResponse::success(response)))
}

/// GET /me - The signed-in user
pub async fn me(auth: RequireUser) -> impl IntoResponse {
    Json(ApiResponse::success(auth.user))
}
