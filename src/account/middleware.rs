//! Bearer-token authentication for protected routes.
//!
//! The middleware verifies the `Authorization` header before the request
//! body is read and inserts the verified [`Claims`] into the request
//! extensions; handlers recover them with the [`Claims`] extractor. A
//! request that fails here is rejected with the opaque unauthorized
//! response and never reaches the handler.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::session::{self, Claims};

use super::AppState;

/// Verify the bearer token and stash the claims for the handler.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = session::authorize(request.headers(), &state.config.jwt_secret)?;
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Extractor recovering the claims inserted by [`require_session`].
impl<S> FromRequestParts<S> for Claims
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .ok_or_else(AppError::unauthorized)
    }
}
