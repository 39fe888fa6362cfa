//! Response body that triggers input cleanup once it is finished with.

use bytes::Bytes;
use futures::Stream;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};

const CHUNK_SIZE: usize = 64 * 1024;

/// Files to remove once the response body is gone, whether it was sent in full or
/// abandoned by the client.
#[derive(Debug)]
pub struct CleanupGuard {
    request_id: String,
    filename: String,
    locations: Vec<PathBuf>,
    delivered: bool,
}

impl CleanupGuard {
    pub fn new(request_id: String, filename: String, locations: Vec<PathBuf>) -> Self {
        Self {
            request_id,
            filename,
            locations,
            delivered: false,
        }
    }

    fn mark_delivered(&mut self) {
        if !self.delivered {
            self.delivered = true;
            tracing::info!(
                request_id = %self.request_id,
                filename = %self.filename,
                "Delivered"
            );
        }
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if !self.delivered {
            tracing::warn!(
                request_id = %self.request_id,
                filename = %self.filename,
                "Delivery failed: response body dropped before completion"
            );
        }

        remove_files(&self.locations);
    }
}

/// Synchronous unlink for use from `Drop`, so the files are gone by the time the owner is.
/// Missing files are fine.
pub(crate) fn remove_files(paths: &[PathBuf]) {
    for path in paths {
        match std::fs::remove_file(path) {
            Ok(()) => tracing::debug!(path = %path.display(), "Removed file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %path.display(),
                error = %e,
                "Cleanup failed"
            ),
        }
    }
}

/// Streams an in-memory payload in fixed-size chunks
#[derive(Debug)]
pub struct DeliveryStream {
    remaining: Bytes,
    guard: CleanupGuard,
}

impl DeliveryStream {
    pub fn new(payload: Bytes, guard: CleanupGuard) -> Self {
        Self {
            remaining: payload,
            guard,
        }
    }

    pub fn len(&self) -> usize {
        self.remaining.len()
    }

    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }
}

impl Stream for DeliveryStream {
    type Item = Result<Bytes, std::io::Error>;

    fn poll_next(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.remaining.is_empty() {
            self.guard.mark_delivered();
            return Poll::Ready(None);
        }

        let take = self.remaining.len().min(CHUNK_SIZE);
        let chunk = self.remaining.split_to(take);
        if self.remaining.is_empty() {
            self.guard.mark_delivered();
        }
        Poll::Ready(Some(Ok(chunk)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let chunks = self.remaining.len().div_ceil(CHUNK_SIZE);
        (chunks, Some(chunks))
    }
}
