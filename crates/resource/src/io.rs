use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use tokio_util::io::StreamReader;

use crate::client::{ByteStream, StorageBlob, StorageError};
use crate::error::{ResourceError, ResourceResult};

/// Finite, forward-only reader over a blob's content.
///
/// Owned by its opener; not for concurrent use.
pub struct BlobReader {
    stream: ByteStream,
    location: String,
}

impl BlobReader {
    pub(crate) fn new(stream: ByteStream, location: String) -> Self {
        Self { stream, location }
    }

    /// Drains the remaining content into a single buffer.
    pub async fn bytes(mut self) -> ResourceResult<Bytes> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.stream.next().await {
            let chunk = chunk.map_err(|err| read_failed(&self.location, err))?;
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }

    /// Adapts the reader into `AsyncRead` for io-style consumers.
    pub fn into_async_read(self) -> impl tokio::io::AsyncBufRead + Send + Unpin {
        let location = self.location;
        StreamReader::new(self.stream.map(move |chunk| {
            chunk.map_err(|err| io::Error::other(read_failed(&location, err)))
        }))
    }
}

impl std::fmt::Debug for BlobReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobReader")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl Stream for BlobReader {
    type Item = ResourceResult<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.stream.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(chunk))) => Poll::Ready(Some(Ok(chunk))),
            Poll::Ready(Some(Err(err))) => {
                let failure = read_failed(&self.location, err);
                Poll::Ready(Some(Err(failure)))
            }
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

fn read_failed(location: &str, err: StorageError) -> ResourceError {
    match err {
        StorageError::NotFound => ResourceError::NotFound {
            location: location.to_string(),
        },
        other => {
            tracing::error!(location, error = %other, "failed to read blob content");
            ResourceError::storage("failed to read blob content", other)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Open,
    Closed,
}

/// Write session that buffers appended bytes and commits them as the new
/// blob content on close.
///
/// Owned by its opener; not for concurrent use. Closing is terminal: a
/// failed commit leaves the remote blob in an unspecified state and callers
/// must treat the write as not having happened.
pub struct BlobWriter {
    blob: Arc<dyn StorageBlob>,
    content_type: String,
    location: String,
    buffer: BytesMut,
    state: WriterState,
}

impl std::fmt::Debug for BlobWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobWriter")
            .field("location", &self.location)
            .field("content_type", &self.content_type)
            .field("state", &self.state)
            .field("buffered", &self.buffer.len())
            .finish_non_exhaustive()
    }
}

impl BlobWriter {
    pub(crate) fn new(blob: Arc<dyn StorageBlob>, content_type: String, location: String) -> Self {
        Self {
            blob,
            content_type,
            location,
            buffer: BytesMut::new(),
            state: WriterState::Open,
        }
    }

    /// Appends bytes to the session. Nothing is visible remotely until
    /// [`close`](Self::close) commits.
    pub fn write(&mut self, data: &[u8]) -> ResourceResult<()> {
        if self.state == WriterState::Closed {
            return Err(ResourceError::storage(
                "write to closed blob writer",
                StorageError::service("writer session is closed"),
            ));
        }
        self.buffer.extend_from_slice(data);
        Ok(())
    }

    /// Commits the buffered bytes with the session's content type. Closing
    /// an already closed session is a no-op.
    pub async fn close(&mut self) -> ResourceResult<()> {
        if self.state == WriterState::Closed {
            return Ok(());
        }
        self.state = WriterState::Closed;
        let body = self.buffer.split().freeze();
        self.blob
            .put(body, &self.content_type)
            .await
            .map_err(|err| {
                tracing::error!(location = %self.location, error = %err, "failed to commit blob content");
                ResourceError::storage("failed to commit blob content", err)
            })
    }
}
