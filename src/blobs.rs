//! Blob-store collaborator for profile images.
//!
//! The core treats image storage as an external put-and-get service that
//! returns a public URL. [`ImageStore`] is the seam; [`InMemoryImageStore`]
//! backs the demo binary and the tests. Uploads arrive as base64 data URLs
//! and are decoded here before storage.
//!
//! Blob writes are not transactional with directory writes: a stored image
//! whose follow-up directory write fails is orphaned, and the orchestrator
//! logs that rather than masking it.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::collections::HashMap;
use std::fmt;
use tokio::sync::RwLock;
use uuid::Uuid;

// ============================================================================
// Errors
// ============================================================================

/// Failures from the blob-store collaborator.
#[derive(Debug)]
pub enum BlobError {
    /// The payload was not decodable base64.
    InvalidPayload(String),
    /// The store itself failed.
    Unavailable(String),
}

impl fmt::Display for BlobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPayload(reason) => write!(f, "invalid image payload: {}", reason),
            Self::Unavailable(reason) => write!(f, "image store unavailable: {}", reason),
        }
    }
}

impl std::error::Error for BlobError {}

// ============================================================================
// Data-URL Handling
// ============================================================================

/// Split an image data URL into its subtype and base64 payload.
///
/// Accepts the `data:image/<subtype>;base64,<payload>` shape, where the
/// subtype is any run (possibly empty) of ASCII letters. Returns `None` for
/// anything else.
pub fn split_image_data_url(value: &str) -> Option<(&str, &str)> {
    let rest = value.strip_prefix("data:image/")?;
    let semi = rest.find(";base64,")?;
    let subtype = &rest[..semi];
    if !subtype.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some((subtype, &rest[semi + ";base64,".len()..]))
}

/// Decode the base64 payload of an image data URL.
///
/// The data-URL prefix is stripped if present; input without the prefix is
/// decoded as-is (the schema has already vetted the shape by the time the
/// orchestrator calls this).
pub fn decode_image_payload(value: &str) -> Result<Vec<u8>, BlobError> {
    let payload = match split_image_data_url(value) {
        Some((_, payload)) => payload,
        None => value,
    };
    BASE64
        .decode(payload)
        .map_err(|e| BlobError::InvalidPayload(e.to_string()))
}

/// Fresh object key for an uploaded image.
pub fn image_key() -> String {
    format!("{}.jpg", Uuid::new_v4())
}

// ============================================================================
// Image Store
// ============================================================================

/// The contract the core requires from the blob store: store bytes under a
/// key, get back a public URL.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store an image and return its public URL.
    async fn put_image(&self, key: &str, bytes: Vec<u8>) -> Result<String, BlobError>;
}

/// In-memory image store returning S3-shaped public URLs.
#[derive(Debug)]
pub struct InMemoryImageStore {
    bucket: String,
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryImageStore {
    /// Create a store publishing under the given bucket identifier.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored objects.
    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }
}

#[async_trait]
impl ImageStore for InMemoryImageStore {
    async fn put_image(&self, key: &str, bytes: Vec<u8>) -> Result<String, BlobError> {
        self.objects.write().await.insert(key.to_string(), bytes);
        Ok(format!("https://{}.s3.amazonaws.com/{}", self.bucket, key))
    }
}

// ============================================================================
// Tests
// ============================================================================
