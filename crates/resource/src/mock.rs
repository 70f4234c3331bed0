//! In-memory storage collaborator for tests and local development.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use parking_lot::Mutex;
use time::OffsetDateTime;
use url::Url;

use crate::client::{
    BlobProperties, ByteStream, StorageBlob, StorageContainer, StorageError, StorageService,
};

const MOCK_ENDPOINT: &str = "https://testaccount.blob.core.windows.net";

/// Largest chunk emitted by a mock read stream.
const READ_CHUNK: usize = 4 * 1024;

#[derive(Default)]
struct AccountState {
    containers: Mutex<HashMap<String, ContainerState>>,
    creates: AtomicUsize,
    outage: AtomicBool,
    race_on_create: AtomicBool,
}

impl AccountState {
    fn check_outage(&self) -> Result<(), StorageError> {
        if self.outage.load(Ordering::SeqCst) {
            Err(StorageError::service("injected transport outage"))
        } else {
            Ok(())
        }
    }
}

#[derive(Default)]
struct ContainerState {
    blobs: HashMap<String, StoredBlob>,
}

#[derive(Clone)]
struct StoredBlob {
    data: Bytes,
    content_type: String,
    last_modified: OffsetDateTime,
}

/// In-memory [`StorageService`] with seeding helpers and the failure
/// switches the tests drive.
#[derive(Clone, Default)]
pub struct MemoryStorageService {
    state: Arc<AccountState>,
}

impl MemoryStorageService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an empty container without going through the resource surface.
    pub fn put_container(&self, container: &str) {
        self.state
            .containers
            .lock()
            .entry(container.to_string())
            .or_default();
    }

    /// Seeds a blob (and its container) with fixed content and timestamp.
    pub fn put_blob(&self, container: &str, name: &str, data: &[u8], last_modified: OffsetDateTime) {
        let mut containers = self.state.containers.lock();
        containers
            .entry(container.to_string())
            .or_default()
            .blobs
            .insert(
                name.to_string(),
                StoredBlob {
                    data: Bytes::copy_from_slice(data),
                    content_type: String::new(),
                    last_modified,
                },
            );
    }

    pub fn blob_content(&self, container: &str, name: &str) -> Option<Bytes> {
        let containers = self.state.containers.lock();
        containers
            .get(container)
            .and_then(|state| state.blobs.get(name))
            .map(|blob| blob.data.clone())
    }

    pub fn blob_content_type(&self, container: &str, name: &str) -> Option<String> {
        let containers = self.state.containers.lock();
        containers
            .get(container)
            .and_then(|state| state.blobs.get(name))
            .map(|blob| blob.content_type.clone())
    }

    pub fn container_exists(&self, container: &str) -> bool {
        self.state.containers.lock().contains_key(container)
    }

    /// How many containers were created through the client surface.
    pub fn create_count(&self) -> usize {
        self.state.creates.load(Ordering::SeqCst)
    }

    /// Makes every remote call fail with a transport error until cleared.
    pub fn set_outage(&self, on: bool) {
        self.state.outage.store(on, Ordering::SeqCst);
    }

    /// Makes the next container creation lose the creation race: the
    /// container comes into being, but the call reports "already exists".
    pub fn fail_next_create_with_already_exists(&self) {
        self.state.race_on_create.store(true, Ordering::SeqCst);
    }
}

impl StorageService for MemoryStorageService {
    fn container(&self, name: &str) -> Arc<dyn StorageContainer> {
        Arc::new(MemoryContainer {
            state: Arc::clone(&self.state),
            name: name.to_string(),
        })
    }
}

struct MemoryContainer {
    state: Arc<AccountState>,
    name: String,
}

#[async_trait]
impl StorageContainer for MemoryContainer {
    fn name(&self) -> &str {
        &self.name
    }

    fn blob(&self, name: &str) -> Arc<dyn StorageBlob> {
        Arc::new(MemoryBlob {
            state: Arc::clone(&self.state),
            container: self.name.clone(),
            name: name.to_string(),
        })
    }

    async fn exists(&self) -> Result<bool, StorageError> {
        self.state.check_outage()?;
        Ok(self.state.containers.lock().contains_key(&self.name))
    }

    async fn create(&self) -> Result<(), StorageError> {
        self.state.check_outage()?;
        if self.state.race_on_create.swap(false, Ordering::SeqCst) {
            self.state
                .containers
                .lock()
                .entry(self.name.clone())
                .or_default();
            return Err(StorageError::AlreadyExists);
        }
        let mut containers = self.state.containers.lock();
        if containers.contains_key(&self.name) {
            return Err(StorageError::AlreadyExists);
        }
        containers.insert(self.name.clone(), ContainerState::default());
        self.state.creates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct MemoryBlob {
    state: Arc<AccountState>,
    container: String,
    name: String,
}

impl MemoryBlob {
    fn lookup(&self) -> Result<StoredBlob, StorageError> {
        self.state.check_outage()?;
        let containers = self.state.containers.lock();
        containers
            .get(&self.container)
            .and_then(|state| state.blobs.get(&self.name))
            .cloned()
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl StorageBlob for MemoryBlob {
    fn name(&self) -> &str {
        &self.name
    }

    fn url(&self) -> Result<Url, StorageError> {
        let raw = format!("{MOCK_ENDPOINT}/{}/{}", self.container, self.name);
        Url::parse(&raw).map_err(|err| StorageError::with_source("invalid blob url", err))
    }

    async fn exists(&self) -> Result<bool, StorageError> {
        self.state.check_outage()?;
        let containers = self.state.containers.lock();
        Ok(containers
            .get(&self.container)
            .is_some_and(|state| state.blobs.contains_key(&self.name)))
    }

    async fn properties(&self) -> Result<BlobProperties, StorageError> {
        let stored = self.lookup()?;
        Ok(BlobProperties {
            content_length: stored.data.len() as u64,
            last_modified: stored.last_modified,
        })
    }

    fn open_read(&self) -> ByteStream {
        // Mirrors the SDK: the stream is lazy and absence surfaces on the
        // first poll.
        let chunks = match self.lookup() {
            Ok(stored) => {
                let mut data = stored.data;
                let mut chunks = Vec::new();
                while data.len() > READ_CHUNK {
                    chunks.push(Ok(data.split_to(READ_CHUNK)));
                }
                chunks.push(Ok(data));
                chunks
            }
            Err(err) => vec![Err(err)],
        };
        Box::pin(stream::iter(chunks))
    }

    async fn put(&self, body: Bytes, content_type: &str) -> Result<(), StorageError> {
        self.state.check_outage()?;
        let mut containers = self.state.containers.lock();
        let container = containers
            .get_mut(&self.container)
            .ok_or(StorageError::NotFound)?;
        container.blobs.insert(
            self.name.clone(),
            StoredBlob {
                data: body,
                content_type: content_type.to_string(),
                last_modified: OffsetDateTime::now_utc(),
            },
        );
        Ok(())
    }
}
