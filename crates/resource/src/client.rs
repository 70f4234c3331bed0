use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use thiserror::Error;
use time::OffsetDateTime;
use url::Url;

/// Finite, forward-only sequence of blob content chunks.
pub type ByteStream = BoxStream<'static, Result<Bytes, StorageError>>;

/// Read-through snapshot of a remote blob's metadata. Never cached; every
/// query is a fresh round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobProperties {
    pub content_length: u64,
    pub last_modified: OffsetDateTime,
}

/// Failure surfaced by a storage collaborator.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The remote store reported that the container or blob does not exist.
    #[error("blob or container does not exist")]
    NotFound,

    /// Container creation raced with another writer that won.
    #[error("container already exists")]
    AlreadyExists,

    /// Transport, authorization, quota, or server-side failure.
    #[error("{message}")]
    Service {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl StorageError {
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Service {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Ambient storage-account client. Shared by every handle derived from it
/// and owned by the caller; the adapter never closes it.
pub trait StorageService: Send + Sync {
    /// Derives a container client. No remote call is made.
    fn container(&self, name: &str) -> Arc<dyn StorageContainer>;
}

/// Client for one container of the storage account.
#[async_trait]
pub trait StorageContainer: Send + Sync {
    fn name(&self) -> &str;

    /// Derives a blob client under this container. No remote call is made.
    fn blob(&self, name: &str) -> Arc<dyn StorageBlob>;

    async fn exists(&self) -> Result<bool, StorageError>;

    async fn create(&self) -> Result<(), StorageError>;
}

/// Client for one blob.
#[async_trait]
pub trait StorageBlob: Send + Sync {
    fn name(&self) -> &str;

    /// Canonical URL the service publishes for this blob.
    fn url(&self) -> Result<Url, StorageError>;

    async fn exists(&self) -> Result<bool, StorageError>;

    async fn properties(&self) -> Result<BlobProperties, StorageError>;

    /// Opens the blob content as a chunk stream. The stream is lazy;
    /// absence surfaces as an error on the first poll.
    fn open_read(&self) -> ByteStream;

    /// Atomically commits `body` as the new blob content.
    async fn put(&self, body: Bytes, content_type: &str) -> Result<(), StorageError>;
}
