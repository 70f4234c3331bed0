use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use azure_core::StatusCode;
use azure_storage::{CloudLocation, ConnectionString, StorageCredentials};
use azure_storage_blobs::prelude::{BlobClient, BlobServiceClient, ClientBuilder, ContainerClient};
use bytes::Bytes;
use futures::StreamExt;
use url::Url;

use crate::client::{
    BlobProperties, ByteStream, StorageBlob, StorageContainer, StorageError, StorageService,
};
use crate::config::{CredentialSource, StorageConfig};

/// Production storage collaborator backed by the Azure Storage blob SDK.
///
/// The wrapped [`BlobServiceClient`] is shared by every handle derived from
/// this service; the adapter does not own its lifecycle and never closes it.
pub struct AzureStorageService {
    client: BlobServiceClient,
}

impl AzureStorageService {
    /// Wraps an externally built service client.
    pub fn new(client: BlobServiceClient) -> Self {
        Self { client }
    }

    /// Builds a service client from environment-driven configuration.
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        let mut endpoint = config
            .endpoint
            .as_ref()
            .map(|url| url.as_str().trim_end_matches('/').to_string());

        let (account, credentials) = match &config.credentials {
            CredentialSource::ConnectionString(raw) => {
                let parsed = ConnectionString::new(raw)
                    .context("invalid AZURE_STORAGE_CONNECTION_STRING")?;
                let account = parsed
                    .account_name
                    .map(str::to_string)
                    .or_else(|| (!config.account.is_empty()).then(|| config.account.clone()))
                    .context("connection string does not name a storage account")?;
                if endpoint.is_none() {
                    endpoint = parsed
                        .blob_endpoint
                        .map(|value| value.trim_end_matches('/').to_string());
                }
                let credentials = parsed
                    .storage_credentials()
                    .context("connection string carries no usable credentials")?;
                (account, credentials)
            }
            CredentialSource::SasToken(token) => (
                config.account.clone(),
                StorageCredentials::sas_token(token.clone())
                    .context("invalid AZURE_STORAGE_SAS_TOKEN")?,
            ),
            CredentialSource::AccessKey(key) => (
                config.account.clone(),
                StorageCredentials::access_key(config.account.clone(), key.clone()),
            ),
            CredentialSource::Anonymous => {
                (config.account.clone(), StorageCredentials::anonymous())
            }
        };

        let builder = match endpoint {
            Some(uri) => ClientBuilder::with_location(
                CloudLocation::Custom {
                    account: account.clone(),
                    uri,
                },
                credentials,
            ),
            None => ClientBuilder::new(account, credentials),
        };

        Ok(Self::new(builder.blob_service_client()))
    }
}

impl StorageService for AzureStorageService {
    fn container(&self, name: &str) -> Arc<dyn StorageContainer> {
        Arc::new(AzureContainer {
            client: self.client.container_client(name),
        })
    }
}

struct AzureContainer {
    client: ContainerClient,
}

#[async_trait]
impl StorageContainer for AzureContainer {
    fn name(&self) -> &str {
        self.client.container_name()
    }

    fn blob(&self, name: &str) -> Arc<dyn StorageBlob> {
        Arc::new(AzureBlob {
            client: self.client.blob_client(name),
        })
    }

    async fn exists(&self) -> Result<bool, StorageError> {
        self.client.exists().await.map_err(translate)
    }

    async fn create(&self) -> Result<(), StorageError> {
        self.client.create().await.map(|_| ()).map_err(translate)
    }
}

struct AzureBlob {
    client: BlobClient,
}

#[async_trait]
impl StorageBlob for AzureBlob {
    fn name(&self) -> &str {
        self.client.blob_name()
    }

    fn url(&self) -> Result<Url, StorageError> {
        self.client.url().map_err(translate)
    }

    async fn exists(&self) -> Result<bool, StorageError> {
        self.client.exists().await.map_err(translate)
    }

    async fn properties(&self) -> Result<BlobProperties, StorageError> {
        let response = self.client.get_properties().await.map_err(translate)?;
        Ok(BlobProperties {
            content_length: response.blob.properties.content_length,
            last_modified: response.blob.properties.last_modified,
        })
    }

    fn open_read(&self) -> ByteStream {
        let pages = self.client.get().into_stream();
        Box::pin(pages.then(|page| async {
            let page = page.map_err(translate)?;
            page.data.collect().await.map_err(translate)
        }))
    }

    async fn put(&self, body: Bytes, content_type: &str) -> Result<(), StorageError> {
        self.client
            .put_block_blob(body)
            .content_type(content_type.to_string())
            .await
            .map(|_| ())
            .map_err(translate)
    }
}

/// Collapses SDK failures into the collaborator taxonomy. Categorical
/// absence and the container-creation race keep their identity; everything
/// else keeps the SDK error as its cause.
fn translate(err: azure_core::Error) -> StorageError {
    match err.as_http_error().map(|http| http.status()) {
        Some(StatusCode::NotFound) => StorageError::NotFound,
        Some(StatusCode::Conflict) => StorageError::AlreadyExists,
        _ => StorageError::with_source("storage request failed", err),
    }
}
