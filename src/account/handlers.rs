//! HTTP handlers for the account routes.
//!
//! Handlers stay thin: they hand the raw body to [`AccountService`] and
//! shape the success payload. Failure shaping lives entirely in
//! [`AppError`]'s response conversion.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;

use crate::directory::User;
use crate::error::AppError;
use crate::session::Claims;

use super::AppState;

/// Success payload carrying a user record.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub message: &'static str,
    pub user: User,
}

/// Success payload carrying a user record and a session token.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub user: User,
    pub token: String,
}

/// `POST /signup`
pub async fn signup(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let user = state.service.register(&body).await?;
    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            message: "User created successfully",
            user,
        }),
    ))
}

/// `POST /login`
pub async fn login(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AuthResponse>, AppError> {
    let (user, token) = state.service.authenticate(&body).await?;
    Ok(Json(AuthResponse {
        message: "Login successful",
        user,
        token,
    }))
}

/// `POST /profile/image` (bearer-protected)
pub async fn upload_profile_image(
    State(state): State<AppState>,
    claims: Claims,
    body: Bytes,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.service.attach_profile_image(&claims, &body).await?;
    Ok(Json(UserResponse {
        message: "Profile image updated successfully",
        user,
    }))
}
