use std::fmt;
use std::str::FromStr;

use crate::content_type;
use crate::error::ResourceError;

/// Scheme literal for blob locations.
pub const BLOB_SCHEME: &str = "blob";

/// Parsed form of a `blob://container/name` location string.
///
/// The blob name is an opaque key: further `/` separators are preserved
/// verbatim and no normalization is applied. Case is preserved for both
/// segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobLocation {
    container: String,
    name: String,
}

impl BlobLocation {
    /// Splits a location string into its container and blob name.
    pub fn parse(location: &str) -> Result<Self, ResourceError> {
        let (scheme, rest) = location
            .split_once("://")
            .ok_or_else(|| malformed(location, "missing URI scheme"))?;
        if scheme != BLOB_SCHEME {
            return Err(malformed(location, "scheme is not `blob`"));
        }
        let (container, name) = rest
            .split_once('/')
            .ok_or_else(|| malformed(location, "missing blob name"))?;
        if container.is_empty() {
            return Err(malformed(location, "empty container"));
        }
        if name.is_empty() {
            return Err(malformed(location, "empty blob name"));
        }
        Ok(Self {
            container: container.to_string(),
            name: name.to_string(),
        })
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Final segment of the blob name.
    pub fn filename(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// MIME type derived from the filename extension.
    pub fn content_type(&self) -> &'static str {
        content_type::from_name(self.filename())
    }
}

fn malformed(location: &str, reason: &str) -> ResourceError {
    ResourceError::MalformedLocation {
        location: location.to_string(),
        reason: reason.to_string(),
    }
}

impl FromStr for BlobLocation {
    type Err = ResourceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl fmt::Display for BlobLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{BLOB_SCHEME}://{}/{}", self.container, self.name)
    }
}
