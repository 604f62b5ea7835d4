//! Process-wide configuration.
//!
//! Loaded once at startup from environment variables and shared read-only
//! for the life of the process; nothing here is rotated or mutated at
//! runtime.

use anyhow::{Context, Result};

use crate::credentials::DEFAULT_WORK_FACTOR;

/// Application configuration established at process start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Symmetric secret for signing session tokens.
    pub jwt_secret: String,
    /// Identifier of the directory table holding user records.
    pub user_table: String,
    /// Identifier of the bucket holding uploaded profile images.
    pub profile_images_bucket: String,
    /// Password hashing work factor (bcrypt rounds).
    pub work_factor: u32,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// `JWT_SECRET` is required and must be at least 32 characters;
    /// `USER_TABLE`, `PROFILE_IMAGES_BUCKET`, and `PASSWORD_WORK_FACTOR`
    /// fall back to defaults.
    pub fn from_env() -> Result<Self> {
        let jwt_secret = std::env::var("JWT_SECRET")
            .context("JWT_SECRET environment variable required")?;
        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters");
        }

        let user_table =
            std::env::var("USER_TABLE").unwrap_or_else(|_| "users".to_string());
        let profile_images_bucket = std::env::var("PROFILE_IMAGES_BUCKET")
            .unwrap_or_else(|_| "profile-images".to_string());

        let work_factor = match std::env::var("PASSWORD_WORK_FACTOR") {
            Ok(raw) => raw.parse().context("Invalid PASSWORD_WORK_FACTOR")?,
            Err(_) => DEFAULT_WORK_FACTOR,
        };

        Ok(Self {
            jwt_secret,
            user_table,
            profile_images_bucket,
            work_factor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Environment variables are process-global, so everything from_env
    // touches is exercised in a single test.
    #[test]
    fn test_from_env() {
        std::env::remove_var("JWT_SECRET");
        std::env::remove_var("USER_TABLE");
        std::env::remove_var("PROFILE_IMAGES_BUCKET");
        std::env::remove_var("PASSWORD_WORK_FACTOR");

        assert!(AppConfig::from_env().is_err());

        std::env::set_var("JWT_SECRET", "too short");
        assert!(AppConfig::from_env().is_err());

        std::env::set_var("JWT_SECRET", "a-signing-secret-of-sufficient-length");
        let config = AppConfig::from_env().expect("loads");
        assert_eq!(config.user_table, "users");
        assert_eq!(config.profile_images_bucket, "profile-images");
        assert_eq!(config.work_factor, DEFAULT_WORK_FACTOR);

        std::env::set_var("USER_TABLE", "accounts");
        std::env::set_var("PROFILE_IMAGES_BUCKET", "avatars");
        std::env::set_var("PASSWORD_WORK_FACTOR", "12");
        let config = AppConfig::from_env().expect("loads");
        assert_eq!(config.user_table, "accounts");
        assert_eq!(config.profile_images_bucket, "avatars");
        assert_eq!(config.work_factor, 12);

        std::env::set_var("PASSWORD_WORK_FACTOR", "not a number");
        assert!(AppConfig::from_env().is_err());

        std::env::remove_var("JWT_SECRET");
        std::env::remove_var("USER_TABLE");
        std::env::remove_var("PROFILE_IMAGES_BUCKET");
        std::env::remove_var("PASSWORD_WORK_FACTOR");
    }
}
