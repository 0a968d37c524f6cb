//! Authentication and profile handlers

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AppError, AppState, SessionToken, SuccessResponse};
use finlytics_core::models::{Theme, User};

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Session issued at sign-up/sign-in
#[derive(Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

/// POST /api/auth/signup - Register a new owner
pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignUpRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let (user, session) = state.db.sign_up(&req.name, &req.email, &req.password)?;
    info!(user_id = user.id, "New account registered");

    Ok(Json(SessionResponse {
        token: session.token,
        expires_at: session.expires_at,
        user,
    }))
}

/// POST /api/auth/signin - Open a session
pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignInRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let (user, session) = state.db.sign_in(&req.email, &req.password)?;
    info!(user_id = user.id, "Signed in");

    Ok(Json(SessionResponse {
        token: session.token,
        expires_at: session.expires_at,
        user,
    }))
}

/// POST /api/auth/signout - Revoke the current session
pub async fn sign_out(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<SessionToken>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.sign_out(&token.0)?;
    Ok(Json(SuccessResponse { success: true }))
}

/// GET /api/me - The authenticated owner's profile
pub async fn get_me(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}

#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    pub name: Option<String>,
    pub theme: Option<Theme>,
}

/// PUT /api/me/settings - Update profile name and/or theme
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(req): Json<UpdateSettingsRequest>,
) -> Result<Json<User>, AppError> {
    let updated = state
        .db
        .update_settings(user.id, req.name.as_deref(), req.theme)?;
    Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// PUT /api/me/password - Change the password
pub async fn update_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(req): Json<UpdatePasswordRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    if req.new_password != req.confirm_password {
        return Err(AppError::bad_request(
            "New password and confirmation do not match",
        ));
    }

    state
        .db
        .update_password(user.id, &req.current_password, &req.new_password)?;
    Ok(Json(SuccessResponse { success: true }))
}

#[derive(Debug, Deserialize)]
pub struct DeleteAccountRequest {
    pub confirmation: String,
}

/// DELETE /api/me - Permanently delete the account and everything it owns
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(req): Json<DeleteAccountRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.delete_account(user.id, &req.confirmation)?;
    info!(user_id = user.id, "Account deleted");
    Ok(Json(SuccessResponse { success: true }))
}
