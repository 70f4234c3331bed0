use std::env;

use anyhow::{Context, Result, bail};
use url::Url;

/// Environment-driven configuration for the storage account client.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage account name; may be empty when the connection string
    /// carries it.
    pub account: String,
    pub credentials: CredentialSource,
    /// Custom blob endpoint, e.g. a local Azurite emulator.
    pub endpoint: Option<Url>,
    /// Default auto-create flag for handles built from this configuration.
    pub auto_create: bool,
}

/// Where the account credentials come from. Precedence: connection string,
/// then SAS token, then access key, else anonymous.
#[derive(Debug, Clone)]
pub enum CredentialSource {
    ConnectionString(String),
    SasToken(String),
    AccessKey(String),
    Anonymous,
}

impl StorageConfig {
    /// Builds a [`StorageConfig`] by reading the documented AZURE_STORAGE_*
    /// variables (`AZURE_STORAGE_ACCOUNT`, `AZURE_STORAGE_CONNECTION_STRING`,
    /// `AZURE_STORAGE_SAS_TOKEN`, `AZURE_STORAGE_ACCESS_KEY`,
    /// `AZURE_STORAGE_ENDPOINT`) plus `BLOB_AUTO_CREATE`.
    pub fn from_env() -> Result<Self> {
        let connection_string = env::var("AZURE_STORAGE_CONNECTION_STRING").ok();
        let account = match env::var("AZURE_STORAGE_ACCOUNT") {
            Ok(account) => account,
            Err(_) if connection_string.is_some() => String::new(),
            Err(_) => bail!("AZURE_STORAGE_ACCOUNT is required when no connection string is set"),
        };

        let credentials = if let Some(value) = connection_string {
            CredentialSource::ConnectionString(value)
        } else if let Ok(token) = env::var("AZURE_STORAGE_SAS_TOKEN") {
            CredentialSource::SasToken(token)
        } else if let Ok(key) = env::var("AZURE_STORAGE_ACCESS_KEY") {
            CredentialSource::AccessKey(key)
        } else {
            CredentialSource::Anonymous
        };

        let endpoint = env::var("AZURE_STORAGE_ENDPOINT")
            .ok()
            .map(|value| {
                Url::parse(&value).context("AZURE_STORAGE_ENDPOINT is not a valid URL")
            })
            .transpose()?;

        let auto_create = env::var("BLOB_AUTO_CREATE")
            .map(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            account,
            credentials,
            endpoint,
            auto_create,
        })
    }
}
