//! Account HTTP surface.
//!
//! Assembles the three account routes over a shared [`AppState`]:
//!
//! - `POST /signup`: register an account
//! - `POST /login`: authenticate and issue a session token
//! - `POST /profile/image`: attach a profile image (bearer-protected)
//!
//! # Usage
//!
//! ```ignore
//! let state = AppState::new(config, directory, images);
//! let app = account::router(state);
//! axum::serve(listener, app).await?;
//! ```

use axum::{middleware as axum_middleware, routing::post, Router};
use std::sync::Arc;

use crate::blobs::ImageStore;
use crate::config::AppConfig;
use crate::directory::UserDirectory;

mod handlers;
mod middleware;
mod service;

pub use handlers::{AuthResponse, UserResponse};
pub use middleware::require_session;
pub use service::AccountService;

/// Shared state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub service: AccountService,
}

impl AppState {
    /// Wire the service over the given collaborators.
    pub fn new(
        config: Arc<AppConfig>,
        directory: Arc<dyn UserDirectory>,
        images: Arc<dyn ImageStore>,
    ) -> Self {
        let service = AccountService::new(config.clone(), directory, images);
        Self { config, service }
    }
}

/// Build the account router.
///
/// The protected route carries the bearer-token middleware; the public
/// routes do not.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/profile/image", post(handlers::upload_profile_image))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::new()
        .route("/signup", post(handlers::signup))
        .route("/login", post(handlers::login))
        .merge(protected)
        .with_state(state)
}
