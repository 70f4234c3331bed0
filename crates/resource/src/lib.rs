#![forbid(unsafe_code)]

//! Azure Storage blobs behind a uniform read/write resource handle.
//!
//! A [`BlobResource`] addresses one blob with a `blob://container/name`
//! location string and exposes existence checks, byte-stream sessions,
//! metadata, and relative navigation on top of a shared storage-service
//! client. The wire protocol, credentials, and upload chunking live in the
//! storage SDK behind the [`client`] traits; [`mock`] provides an in-memory
//! collaborator for tests.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use blob_resource::{AzureStorageService, BlobResource, StorageConfig};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let config = StorageConfig::from_env()?;
//! let service = Arc::new(AzureStorageService::from_config(&config)?);
//! let resource = BlobResource::new(service, "blob://data/reports/2024.csv")?;
//! if resource.exists().await {
//!     let content = resource.open_read().await?.bytes().await?;
//!     println!("{} bytes", content.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod azure;
pub mod client;
pub mod config;
pub mod content_type;
pub mod error;
pub mod io;
pub mod location;
pub mod mock;
pub mod resource;

pub use azure::AzureStorageService;
pub use client::{
    BlobProperties, ByteStream, StorageBlob, StorageContainer, StorageError, StorageService,
};
pub use config::{CredentialSource, StorageConfig};
pub use error::{ResourceError, ResourceResult};
pub use io::{BlobReader, BlobWriter};
pub use location::{BLOB_SCHEME, BlobLocation};
pub use resource::BlobResource;
