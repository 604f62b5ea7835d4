//! User directory gateway.
//!
//! The durable key-value store holding user records is an external
//! collaborator; [`UserDirectory`] is the thin contract the core requires
//! from it: lookup by unique key, atomic conditional insert, and field-level
//! update. The conditional insert is the authoritative uniqueness guard for
//! registration; the orchestrator's earlier existence check is only a
//! fast-path courtesy, never the correctness mechanism.
//!
//! [`InMemoryDirectory`] backs the demo binary and the tests. Its
//! conditional insert holds the write lock across check-and-insert, so two
//! concurrent registrations for the same email see exactly one success.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tokio::sync::RwLock;

// ============================================================================
// User Record
// ============================================================================

/// A user record as held in the directory.
///
/// `email` is the immutable primary key. The password hash is never
/// serialized outward; wire field names are camelCase.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique, case-sensitive account key.
    pub email: String,
    /// Stored credential secret. Write-once; stripped from every response.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Display name.
    pub name: String,
    /// Public URL of the attached profile image, if any.
    pub profile_image_url: Option<String>,
    /// Creation time, server-set.
    pub created_at: DateTime<Utc>,
    /// Last mutation time, server-set.
    pub updated_at: DateTime<Utc>,
}

/// Field-level update applied by the profile-image attachment flow.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    /// New public image URL.
    pub profile_image_url: String,
    /// New last-mutation time.
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Gateway Contract
// ============================================================================

/// Failures from the directory collaborator.
#[derive(Debug)]
pub enum DirectoryError {
    /// Conditional insert lost to an existing record with the same key.
    AlreadyExists,
    /// Update target does not exist.
    NotFound,
    /// The store itself failed.
    Unavailable(String),
}

impl fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyExists => write!(f, "a record with this key already exists"),
            Self::NotFound => write!(f, "no record with this key exists"),
            Self::Unavailable(reason) => write!(f, "directory unavailable: {}", reason),
        }
    }
}

impl std::error::Error for DirectoryError {}

/// The contract the core requires from the durable store.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fetch a record by its unique key.
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DirectoryError>;

    /// Insert a record only if no record with the same key exists.
    ///
    /// Atomic: on [`DirectoryError::AlreadyExists`] no partial record is
    /// created, and there is no window in which two concurrent inserts for
    /// the same key both succeed.
    async fn insert_if_absent(&self, user: User) -> Result<(), DirectoryError>;

    /// Apply a field-level update to an existing record.
    async fn update_fields(
        &self,
        email: &str,
        update: ProfileUpdate,
    ) -> Result<(), DirectoryError>;
}

// ============================================================================
// In-Memory Implementation
// ============================================================================

/// In-memory directory keyed by email.
#[derive(Debug)]
pub struct InMemoryDirectory {
    table: String,
    records: RwLock<HashMap<String, User>>,
}

impl InMemoryDirectory {
    /// Create a directory for the given table identifier.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored records.
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DirectoryError> {
        Ok(self.records.read().await.get(email).cloned())
    }

    async fn insert_if_absent(&self, user: User) -> Result<(), DirectoryError> {
        // Check-and-insert under one write lock: the conditional insert
        // must be atomic.
        let mut records = self.records.write().await;
        if records.contains_key(&user.email) {
            return Err(DirectoryError::AlreadyExists);
        }
        tracing::debug!(table = %self.table, email = %user.email, "record inserted");
        records.insert(user.email.clone(), user);
        Ok(())
    }

    async fn update_fields(
        &self,
        email: &str,
        update: ProfileUpdate,
    ) -> Result<(), DirectoryError> {
        let mut records = self.records.write().await;
        let user = records.get_mut(email).ok_or(DirectoryError::NotFound)?;
        user.profile_image_url = Some(update.profile_image_url);
        user.updated_at = update.updated_at;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn user(email: &str) -> User {
        let now = Utc::now();
        User {
            email: email.to_string(),
            password_hash: "$2b$04$stub".to_string(),
            name: "Ann".to_string(),
            profile_image_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_then_get() {
        let directory = InMemoryDirectory::new("users");
        directory.insert_if_absent(user("a@b.com")).await.expect("inserts");

        let found = directory.get_by_email("a@b.com").await.expect("reads");
        assert_eq!(found.map(|u| u.email), Some("a@b.com".to_string()));

        let missing = directory.get_by_email("other@b.com").await.expect("reads");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_conditional_insert_rejects_duplicates() {
        let directory = InMemoryDirectory::new("users");
        directory.insert_if_absent(user("a@b.com")).await.expect("inserts");

        let mut second = user("a@b.com");
        second.name = "Impostor".to_string();
        let err = directory.insert_if_absent(second).await.unwrap_err();
        assert!(matches!(err, DirectoryError::AlreadyExists));

        // The original record is untouched.
        let kept = directory
            .get_by_email("a@b.com")
            .await
            .expect("reads")
            .expect("present");
        assert_eq!(kept.name, "Ann");
    }

    #[tokio::test]
    async fn test_concurrent_inserts_have_one_winner() {
        let directory = Arc::new(InMemoryDirectory::new("users"));
        let (left, right) = tokio::join!(
            directory.insert_if_absent(user("a@b.com")),
            directory.insert_if_absent(user("a@b.com")),
        );
        assert_eq!(left.is_ok() as u8 + right.is_ok() as u8, 1);
        assert_eq!(directory.record_count().await, 1);
    }

    #[tokio::test]
    async fn test_update_fields() {
        let directory = InMemoryDirectory::new("users");
        directory.insert_if_absent(user("a@b.com")).await.expect("inserts");

        let later = Utc::now();
        directory
            .update_fields(
                "a@b.com",
                ProfileUpdate {
                    profile_image_url: "https://bucket.s3.amazonaws.com/key.jpg".to_string(),
                    updated_at: later,
                },
            )
            .await
            .expect("updates");

        let updated = directory
            .get_by_email("a@b.com")
            .await
            .expect("reads")
            .expect("present");
        assert_eq!(
            updated.profile_image_url.as_deref(),
            Some("https://bucket.s3.amazonaws.com/key.jpg")
        );
        assert_eq!(updated.updated_at, later);
    }

    #[tokio::test]
    async fn test_update_missing_record_is_not_found() {
        let directory = InMemoryDirectory::new("users");
        let err = directory
            .update_fields(
                "ghost@b.com",
                ProfileUpdate {
                    profile_image_url: "https://x/y.jpg".to_string(),
                    updated_at: Utc::now(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::NotFound));
    }

    #[test]
    fn test_password_hash_never_serializes() {
        let value = serde_json::to_value(user("a@b.com")).expect("serializes");
        assert!(value.get("password").is_none());
        assert!(value.get("passwordHash").is_none());
        assert!(value.get("password_hash").is_none());
        assert_eq!(value.get("email"), Some(&serde_json::json!("a@b.com")));
        // camelCase wire names.
        assert!(value.as_object().expect("object").contains_key("profileImageUrl"));
        assert!(value.as_object().expect("object").contains_key("createdAt"));
    }
}
