//! # Portcullis
//!
//! Account registration, credential verification, and stateless session
//! issuance for a multi-tenant user directory, served over an [axum] HTTP
//! surface.
//!
//! The crate is organized around three use-case flows and the seams they
//! depend on:
//!
//! - [`schema`]: declarative request validation with per-field violations
//! - [`credentials`]: bcrypt password hashing and verification
//! - [`session`]: HS256 bearer tokens with a fixed 24-hour lifetime
//! - [`directory`]: the user-record store behind the [`directory::UserDirectory`] trait
//! - [`blobs`]: profile-image decoding and storage behind [`blobs::ImageStore`]
//! - [`account`]: the orchestrating service, handlers, and router
//! - [`config`]: environment-derived process configuration
//! - [`error`]: the one error type every failure renders through
//!
//! # Usage
//!
//! ```ignore
//! use portcullis::account::{self, AppState};
//! use portcullis::blobs::InMemoryImageStore;
//! use portcullis::config::AppConfig;
//! use portcullis::directory::InMemoryDirectory;
//! use std::sync::Arc;
//!
//! let config = Arc::new(AppConfig::from_env()?);
//! let directory = Arc::new(InMemoryDirectory::new(config.user_table.clone()));
//! let images = Arc::new(InMemoryImageStore::new(config.profile_images_bucket.clone()));
//!
//! let app = account::router(AppState::new(config, directory, images));
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! ```
//!
//! Every failure, from a malformed request body to an exhausted store,
//! renders as a JSON `{ "message": ... }` body with the appropriate status
//! code; internal failure detail is logged, never returned to the client.

pub mod account;
pub mod blobs;
pub mod config;
pub mod credentials;
pub mod directory;
pub mod error;
pub mod schema;
pub mod session;

pub use account::{AccountService, AppState};
pub use config::AppConfig;
pub use error::{AppError, ErrorKind};
