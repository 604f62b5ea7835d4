//! Account use-case flows.
//!
//! [`AccountService`] composes the schema validator, credential manager,
//! session issuer, directory gateway, and blob store into the three flows
//! the system exposes: registration, authentication, and profile-image
//! attachment. Each flow runs its steps in a fixed order and short-circuits
//! on the first failure; untrusted input never reaches a side-effecting
//! operation without passing validation first.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::blobs::{decode_image_payload, image_key, BlobError, ImageStore};
use crate::config::AppConfig;
use crate::credentials::CredentialManager;
use crate::directory::{DirectoryError, ProfileUpdate, User, UserDirectory};
use crate::error::AppError;
use crate::schema::{image_upload_schema, login_schema, signup_schema, CompiledSchema, Outcome};
use crate::session::{self, Claims};

// ============================================================================
// Validated Inputs
// ============================================================================

#[derive(Debug, Deserialize)]
struct SignupInput {
    email: String,
    password: String,
    name: String,
    #[serde(rename = "profileImage")]
    profile_image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginInput {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct ImageUploadInput {
    image: String,
}

/// Validate raw bytes against a schema and deserialize the narrowed data.
fn parse<T: DeserializeOwned>(schema: &CompiledSchema, body: &[u8]) -> Result<T, AppError> {
    match schema.validate(body) {
        Outcome::Valid(data) => serde_json::from_value(Value::Object(data))
            .map_err(|e| AppError::unexpected(format!("validated payload failed to deserialize: {}", e))),
        Outcome::Invalid(errors) => Err(AppError::validation(errors)),
    }
}

// ============================================================================
// Account Service
// ============================================================================

/// Orchestrates the account use-case flows over injected collaborators.
///
/// Constructed once at startup and cloned per handler; never mutated.
#[derive(Clone)]
pub struct AccountService {
    config: Arc<AppConfig>,
    directory: Arc<dyn UserDirectory>,
    images: Arc<dyn ImageStore>,
    credentials: CredentialManager,
}

impl AccountService {
    /// Build a service over the given collaborators.
    pub fn new(
        config: Arc<AppConfig>,
        directory: Arc<dyn UserDirectory>,
        images: Arc<dyn ImageStore>,
    ) -> Self {
        let credentials = CredentialManager::new(config.work_factor);
        Self {
            config,
            directory,
            images,
            credentials,
        }
    }

    /// Register a new account.
    ///
    /// Validates the body, checks for an existing account (fast-path
    /// conflict), hashes the password, stores an optional profile image,
    /// then inserts with the gateway's atomic conditional insert. A
    /// uniqueness conflict detected at insert time (a registration race
    /// lost) reports the same conflict as the fast path.
    pub async fn register(&self, body: &[u8]) -> Result<User, AppError> {
        let input: SignupInput = parse(signup_schema(), body)?;

        // Fast-path duplicate check; the conditional insert below remains
        // the authoritative uniqueness guard.
        let existing = self
            .directory
            .get_by_email(&input.email)
            .await
            .map_err(|e| AppError::unexpected(e.to_string()))?;
        if existing.is_some() {
            return Err(AppError::conflict("User already exists"));
        }

        let password_hash = self
            .credentials
            .hash(&input.password)
            .map_err(|e| AppError::unexpected(e.to_string()))?;

        let mut profile_image_url = None;
        let mut stored_key = None;
        if let Some(payload) = &input.profile_image {
            let (key, url) = self.store_image("profileImage", payload).await?;
            stored_key = Some(key);
            profile_image_url = Some(url);
        }

        let now = chrono::Utc::now();
        let user = User {
            email: input.email,
            password_hash,
            name: input.name,
            profile_image_url,
            created_at: now,
            updated_at: now,
        };

        match self.directory.insert_if_absent(user.clone()).await {
            Ok(()) => {
                info!(event = "user.registered", email = %user.email, "account created");
                Ok(user)
            }
            Err(DirectoryError::AlreadyExists) => {
                // Blob writes are not transactional with the insert: the
                // stored image is orphaned, not rolled back.
                if let Some(key) = stored_key {
                    warn!(event = "blob.orphaned", key = %key, "profile image stored for a registration that lost the insert race");
                }
                Err(AppError::conflict("User already exists"))
            }
            Err(e) => {
                if let Some(key) = stored_key {
                    warn!(event = "blob.orphaned", key = %key, "profile image stored for a registration whose insert failed");
                }
                Err(AppError::unexpected(e.to_string()))
            }
        }
    }

    /// Authenticate an account and issue a session token.
    ///
    /// An unknown email and a wrong password produce one indistinguishable
    /// failure; neither half is ever revealed.
    pub async fn authenticate(&self, body: &[u8]) -> Result<(User, String), AppError> {
        let input: LoginInput = parse(login_schema(), body)?;

        let user = self
            .directory
            .get_by_email(&input.email)
            .await
            .map_err(|e| AppError::unexpected(e.to_string()))?;

        let user = match user {
            Some(user) => user,
            None => {
                warn!(event = "auth.failed", email = %input.email, "authentication failed");
                return Err(AppError::invalid_credentials());
            }
        };

        if !self.credentials.verify(&input.password, &user.password_hash) {
            warn!(event = "auth.failed", email = %input.email, "authentication failed");
            return Err(AppError::invalid_credentials());
        }

        let token = session::issue(&user.email, &user.name, &self.config.jwt_secret)?;
        info!(event = "auth.success", email = %user.email, "session issued");
        Ok((user, token))
    }

    /// Attach a profile image to the authenticated account.
    ///
    /// The bearer token has already been verified by the route middleware,
    /// before the body was read, so an unauthenticated request never learns
    /// the schema shape. This flow validates the body, stores the decoded
    /// image, updates the record, and re-reads it.
    pub async fn attach_profile_image(
        &self,
        claims: &Claims,
        body: &[u8],
    ) -> Result<User, AppError> {
        let input: ImageUploadInput = parse(image_upload_schema(), body)?;

        let (key, url) = self.store_image("image", &input.image).await?;

        let update = ProfileUpdate {
            profile_image_url: url,
            updated_at: chrono::Utc::now(),
        };
        match self.directory.update_fields(&claims.email, update).await {
            Ok(()) => {}
            Err(DirectoryError::NotFound) => {
                // A verified token for an account the directory no longer
                // holds: treat it like any other stale credential.
                warn!(event = "blob.orphaned", key = %key, "profile image stored for an account that no longer exists");
                return Err(AppError::unauthorized());
            }
            Err(e) => {
                warn!(event = "blob.orphaned", key = %key, "profile image stored but the record update failed");
                return Err(AppError::unexpected(e.to_string()));
            }
        }

        let user = self
            .directory
            .get_by_email(&claims.email)
            .await
            .map_err(|e| AppError::unexpected(e.to_string()))?
            .ok_or_else(|| AppError::unexpected("record missing after update"))?;

        info!(event = "profile.image_attached", email = %user.email, "profile image updated");
        Ok(user)
    }

    /// Decode a data-URL payload and store it, returning the object key and
    /// its public URL. A decode failure is reported as a validation error on
    /// the named request field.
    async fn store_image(
        &self,
        field: &'static str,
        payload: &str,
    ) -> Result<(String, String), AppError> {
        let bytes = match decode_image_payload(payload) {
            Ok(bytes) => bytes,
            Err(BlobError::InvalidPayload(_)) => {
                return Err(AppError::validation(vec![
                    crate::schema::FieldViolation::for_field(
                        field,
                        "must be valid base64 image data",
                    ),
                ]));
            }
            Err(e) => return Err(AppError::unexpected(e.to_string())),
        };

        let key = image_key();
        let url = self
            .images
            .put_image(&key, bytes)
            .await
            .map_err(|e| AppError::unexpected(e.to_string()))?;
        Ok((key, url))
    }
}
