use std::path::PathBuf;
use std::sync::Arc;

use url::Url;

use crate::client::{BlobProperties, StorageBlob, StorageContainer, StorageError, StorageService};
use crate::error::{ResourceError, ResourceResult};
use crate::io::{BlobReader, BlobWriter};
use crate::location::BlobLocation;

/// Handle to one blob behind a uniform readable/writable resource surface.
///
/// A handle is cheap, immutable after construction, and holds no network
/// state of its own; the service client is shared and externally owned.
/// Authority over content and metadata stays with the remote store.
pub struct BlobResource {
    location: String,
    service: Arc<dyn StorageService>,
    container: Arc<dyn StorageContainer>,
    blob: Arc<dyn StorageBlob>,
    auto_create: bool,
    content_type: String,
}

impl std::fmt::Debug for BlobResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobResource")
            .field("location", &self.location)
            .field("auto_create", &self.auto_create)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

impl BlobResource {
    /// Strict handle: writes to a missing blob fail, and the content type
    /// is derived from the blob name's extension.
    pub fn new(service: Arc<dyn StorageService>, location: &str) -> ResourceResult<Self> {
        Self::with_options(service, location, false, None)
    }

    /// Handle with explicit auto-create and content-type settings. An empty
    /// or omitted content type falls back to extension derivation.
    pub fn with_options(
        service: Arc<dyn StorageService>,
        location: &str,
        auto_create: bool,
        content_type: Option<String>,
    ) -> ResourceResult<Self> {
        let parsed = BlobLocation::parse(location)?;
        let container = service.container(parsed.container());
        let blob = container.blob(parsed.name());
        let content_type = content_type
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| parsed.content_type().to_string());
        Ok(Self {
            location: location.to_string(),
            service,
            container,
            blob,
            auto_create,
            content_type,
        })
    }

    /// The location string this handle was constructed from.
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn auto_create(&self) -> bool {
        self.auto_create
    }

    /// Effective content type applied to new writes, never to reads.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// True iff both the container and the blob exist.
    ///
    /// Existence is total: categorical absence and transport failures both
    /// yield `false`. Swallowed failures are logged; the follow-up read or
    /// write surfaces the real error.
    pub async fn exists(&self) -> bool {
        match self.probe().await {
            Ok(present) => present,
            Err(err) => {
                tracing::warn!(location = %self.location, error = %err, "existence probe failed");
                false
            }
        }
    }

    /// Existence with absence folded to `Ok(false)` and transport failures
    /// kept as errors, so callers can tell the two apart.
    async fn probe(&self) -> Result<bool, StorageError> {
        match self.container.exists().await {
            Ok(false) | Err(StorageError::NotFound) => return Ok(false),
            Ok(true) => {}
            Err(err) => return Err(err),
        }
        match self.blob.exists().await {
            Err(StorageError::NotFound) => Ok(false),
            other => other,
        }
    }

    /// Opens the blob content for reading, failing fast when the blob or
    /// its container is absent.
    pub async fn open_read(&self) -> ResourceResult<BlobReader> {
        match self.probe().await {
            Ok(true) => {}
            Ok(false) => {
                return Err(ResourceError::NotFound {
                    location: self.location.clone(),
                });
            }
            Err(err) => {
                tracing::error!(location = %self.location, error = %err, "failed to open blob for reading");
                return Err(ResourceError::storage("failed to open blob for reading", err));
            }
        }
        Ok(BlobReader::new(
            self.blob.open_read(),
            self.location.clone(),
        ))
    }

    /// Opens a write session; the blob is committed when the session
    /// closes, carrying the handle's effective content type.
    ///
    /// With auto-create disabled, a missing blob is an error and nothing is
    /// mutated remotely. With auto-create enabled, the container is created
    /// if absent; the blob itself comes into being on the committed write.
    pub async fn open_write(&self) -> ResourceResult<BlobWriter> {
        let present = match self.probe().await {
            Ok(present) => present,
            Err(err) => {
                tracing::error!(location = %self.location, error = %err, "failed to open blob for writing");
                return Err(ResourceError::storage("failed to open blob for writing", err));
            }
        };
        if !present {
            if self.auto_create {
                self.ensure_container().await?;
            } else {
                return Err(ResourceError::NotFound {
                    location: self.location.clone(),
                });
            }
        }
        Ok(BlobWriter::new(
            Arc::clone(&self.blob),
            self.content_type.clone(),
            self.location.clone(),
        ))
    }

    async fn ensure_container(&self) -> ResourceResult<()> {
        match self.container.exists().await {
            Ok(true) => return Ok(()),
            Ok(false) | Err(StorageError::NotFound) => {}
            Err(err) => {
                tracing::error!(container = %self.container.name(), error = %err, "failed to check container existence");
                return Err(ResourceError::storage(
                    "failed to check container existence",
                    err,
                ));
            }
        }
        tracing::debug!(container = %self.container.name(), "blob container does not exist, creating it");
        match self.container.create().await {
            // A concurrent writer won the creation race; the container is
            // there, which is all this path needs.
            Ok(()) | Err(StorageError::AlreadyExists) => Ok(()),
            Err(err) => {
                tracing::error!(container = %self.container.name(), error = %err, "failed to create blob container");
                Err(ResourceError::storage(
                    "failed to create blob container",
                    err,
                ))
            }
        }
    }

    /// Size of the current blob content in bytes.
    pub async fn content_length(&self) -> ResourceResult<u64> {
        Ok(self.properties().await?.content_length)
    }

    /// Last modification time as epoch seconds.
    pub async fn last_modified(&self) -> ResourceResult<i64> {
        Ok(self.properties().await?.last_modified.unix_timestamp())
    }

    async fn properties(&self) -> ResourceResult<BlobProperties> {
        self.blob.properties().await.map_err(|err| {
            tracing::error!(location = %self.location, error = %err, "failed to read blob properties");
            ResourceError::storage("failed to read blob properties", err)
        })
    }

    /// Canonical URL the service publishes for the blob.
    pub fn url(&self) -> ResourceResult<Url> {
        self.blob.url().map_err(|err| {
            tracing::error!(location = %self.location, error = %err, "failed to build blob url");
            ResourceError::storage("failed to build blob url", err)
        })
    }

    /// Final segment of the blob name.
    pub fn filename(&self) -> &str {
        let name = self.blob.name();
        name.rsplit('/').next().unwrap_or(name)
    }

    /// Stable human-readable identity for logs and error messages.
    pub fn description(&self) -> String {
        format!(
            "Azure storage account blob resource [container='{}', blob='{}']",
            self.container.name(),
            self.blob.name(),
        )
    }

    /// Derives a handle for `<location>/<relative_path>` under the same
    /// service client. Auto-create is inherited; the content type is
    /// re-derived from the new name. No path normalization is applied.
    pub fn relative(&self, relative_path: &str) -> ResourceResult<BlobResource> {
        let location = format!("{}/{relative_path}", self.location);
        Self::with_options(
            Arc::clone(&self.service),
            &location,
            self.auto_create,
            None,
        )
    }

    /// Blobs have no local filesystem path.
    pub fn as_file(&self) -> ResourceResult<PathBuf> {
        Err(ResourceError::Unsupported {
            operation: "local file path resolution".to_string(),
            resource: self.description(),
        })
    }
}
