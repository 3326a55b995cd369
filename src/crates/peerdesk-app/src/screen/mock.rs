//! Canned screen source for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use super::{ScreenCapture, ScreenError};

/// Returns the same frame bytes on every capture and counts calls.
pub struct MockScreenCapture {
    frame: Vec<u8>,
    captures: Arc<AtomicUsize>,
}

impl MockScreenCapture {
    pub fn new(frame: Vec<u8>) -> Self {
        Self {
            frame,
            captures: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Capture source reporting into an existing counter.
    pub fn with_counter(frame: Vec<u8>, captures: Arc<AtomicUsize>) -> Self {
        Self { frame, captures }
    }

    /// Shared capture counter, for pacing assertions.
    pub fn capture_count(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.captures)
    }
}

#[async_trait]
impl ScreenCapture for MockScreenCapture {
    async fn capture_jpeg(&mut self) -> Result<Vec<u8>, ScreenError> {
        self.captures.fetch_add(1, Ordering::Relaxed);
        Ok(self.frame.clone())
    }
}
