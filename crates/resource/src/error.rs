use thiserror::Error;

use crate::client::StorageError;

/// Result alias for resource operations.
pub type ResourceResult<T> = Result<T, ResourceError>;

/// Unified error across the resource adapter.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("malformed blob location `{location}`: {reason}")]
    MalformedLocation { location: String, reason: String },

    #[error("blob not found: {location}")]
    NotFound { location: String },

    #[error("{operation} is not supported by {resource}")]
    Unsupported { operation: String, resource: String },

    #[error("{context}")]
    Storage {
        context: String,
        #[source]
        source: StorageError,
    },
}

impl ResourceError {
    pub(crate) fn storage(context: impl Into<String>, source: StorageError) -> Self {
        Self::Storage {
            context: context.into(),
            source,
        }
    }
}
